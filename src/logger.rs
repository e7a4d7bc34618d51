use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
    process,
    sync::mpsc,
    thread,
};

pub use data::log::Error;

const MAX_LOG_FILE_SIZE: u64 = 50 * 1024 * 1024;

enum LogMessage {
    Content(Vec<u8>),
    Flush,
    Shutdown,
}

/// راه‌اندازی لاگ‌گیری؛ در حالت دیباگ روی کنسول و در غیر این صورت در فایل
pub fn setup(is_debug: bool) -> Result<(), Error> {
    let default_level = if is_debug {
        log::Level::Debug
    } else {
        log::Level::Info
    };

    let level_filter = std::env::var("RUST_LOG")
        .ok()
        .as_deref()
        .map(str::parse::<log::Level>)
        .transpose()?
        .unwrap_or(default_level)
        .to_level_filter();

    let mut io_sink = fern::Dispatch::new().format(|out, message, record| {
        out.finish(format_args!(
            "{}:{} [{}] {}",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            record.level(),
            record.target(),
            message
        ));
    });

    if is_debug {
        io_sink = io_sink.chain(std::io::stdout());
    } else {
        let log_path = data::log::path()?;
        data::log::rotate(&log_path)?;

        let writer: Box<dyn Write + Send> = Box::new(BackgroundWriter::new(log_path)?);
        io_sink = io_sink.chain(writer);
    }

    fern::Dispatch::new()
        .level(log::LevelFilter::Off)
        .level_for("panic", log::LevelFilter::Error)
        .level_for("iced_wgpu", log::LevelFilter::Info)
        .level_for("data", level_filter)
        .level_for("sarafchart", level_filter)
        .chain(io_sink)
        .apply()?;

    Ok(())
}

/// نوشتن فایل لاگ در یک ترد جدا تا رندر منتظر دیسک نماند
struct BackgroundWriter {
    sender: mpsc::Sender<LogMessage>,
    _thread_handle: thread::JoinHandle<()>,
}

impl BackgroundWriter {
    fn new(path: PathBuf) -> io::Result<Self> {
        let (sender, receiver) = mpsc::channel();

        let thread_handle = thread::Builder::new()
            .name("sarafchart-log".to_string())
            .spawn(move || {
                let mut file = match SizedFile::open(&path) {
                    Ok(file) => file,
                    Err(e) => {
                        eprintln!("Failed to open log file {}: {e}", path.display());
                        return;
                    }
                };

                while let Ok(message) = receiver.recv() {
                    let result = match message {
                        LogMessage::Content(bytes) => file.write_all(&bytes),
                        LogMessage::Flush => file.flush(),
                        LogMessage::Shutdown => break,
                    };
                    if let Err(e) = result {
                        eprintln!("Logging error: {e}");
                    }
                }
            })?;

        Ok(Self {
            sender,
            _thread_handle: thread_handle,
        })
    }

    fn send(&self, message: LogMessage) -> io::Result<()> {
        self.sender
            .send(message)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "Logger thread disconnected"))
    }
}

impl Write for BackgroundWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.send(LogMessage::Content(buf.to_vec()))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send(LogMessage::Flush)
    }
}

impl Drop for BackgroundWriter {
    fn drop(&mut self) {
        let _ = self.sender.send(LogMessage::Shutdown);
    }
}

/// فایل لاگ با سقف اندازه
struct SizedFile {
    file: fs::File,
    current_size: u64,
}

impl SizedFile {
    fn open(path: &PathBuf) -> io::Result<Self> {
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        let current_size = file.metadata()?.len();

        Ok(Self { file, current_size })
    }
}

impl Write for SizedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.current_size + buf.len() as u64 > MAX_LOG_FILE_SIZE {
            let error_msg = format!(
                "\n{}:FATAL -- Log file would exceed {MAX_LOG_FILE_SIZE} bytes\n",
                chrono::Local::now().format("%H:%M:%S%.3f"),
            );
            eprintln!("{error_msg}");

            let _ = self.file.write_all(error_msg.as_bytes());
            let _ = self.file.flush();

            process::abort();
        }

        let bytes = self.file.write(buf)?;
        self.current_size += bytes as u64;

        Ok(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

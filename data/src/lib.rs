// ماژول‌های اصلی کتابخانه داده‌های نمودار
pub mod chart;
pub mod config;
pub mod feed;
pub mod log;
pub mod storage;
pub mod util;

pub use config::ScaleFactor;
pub use config::settings::ChartSettings;
pub use config::state::State;
pub use config::theme::{ChartPalette, ChartTheme};
pub use config::timezone::UserTimezone;
pub use storage::{FileStore, MemoryStore, Storage};

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;

pub const SAVED_STATE_PATH: &str = "saved-state.json";

/// خطاهای داخلی که به لایه رابط کاربری گزارش می‌شوند
#[derive(thiserror::Error, Debug, Clone)]
pub enum InternalError {
    #[error("Feed error: {0}")]
    Feed(String), // خطای بارگذاری کندل‌ها
    #[error("Data folder error: {0}")]
    DataFolder(String), // خطای باز کردن پوشه داده‌ها
}

/// خواندن وضعیت ذخیره شده برنامه از پوشه داده‌ها
pub fn read_from_file(file_name: &str) -> Result<State, Box<dyn std::error::Error>> {
    let path = data_path(Some(file_name));

    let file_open_result = File::open(&path);
    let mut file = match file_open_result {
        Ok(file) => file,
        Err(e) => return Err(Box::new(e)),
    };

    let mut contents = String::new();
    if let Err(e) = file.read_to_string(&mut contents) {
        return Err(Box::new(e));
    }

    match serde_json::from_str(&contents) {
        Ok(state) => Ok(state),
        Err(e) => {
            // نگه داشتن یک نسخه از فایل خراب برای بررسی بعدی
            let backup_file_name = if let Some(pos) = file_name.rfind('.') {
                format!("{}_old{}", &file_name[..pos], &file_name[pos..])
            } else {
                format!("{}_old", file_name)
            };
            let backup_path = data_path(Some(&backup_file_name));

            if let Err(rename_err) = fs::rename(&path, &backup_path) {
                ::log::warn!(
                    "Failed to backup corrupted state file '{}' to '{}': {}",
                    path.display(),
                    backup_path.display(),
                    rename_err
                );
            } else {
                ::log::info!(
                    "Backed up corrupted state file to '{}'. It may be recovered manually.",
                    backup_path.display()
                );
            }

            Err(Box::new(e))
        }
    }
}

/// نوشتن یک رشته JSON در فایلی داخل پوشه داده‌ها
pub fn write_json_to_file(json: &str, file_name: &str) -> std::io::Result<()> {
    let path = data_path(Some(file_name));

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

/// مسیر پوشه داده‌های برنامه (یا یک فایل داخل آن)
///
/// متغیر محیطی `SARAFCHART_DATA_PATH` بر مسیر پیش‌فرض سیستم اولویت دارد.
pub fn data_path(path_name: Option<&str>) -> PathBuf {
    let root = match std::env::var("SARAFCHART_DATA_PATH") {
        Ok(path) => PathBuf::from(path),
        Err(_) => dirs_next::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sarafchart"),
    };

    match path_name {
        Some(path_name) => root.join(path_name),
        None => root,
    }
}

/// باز کردن پوشه داده‌ها در مدیر فایل سیستم‌عامل
pub fn open_data_folder() -> Result<(), InternalError> {
    let pathbuf = data_path(None);

    if pathbuf.exists() {
        if let Err(err) = open::that(&pathbuf) {
            Err(InternalError::DataFolder(format!(
                "Failed to open data folder: {pathbuf:?}, error: {err}"
            )))
        } else {
            ::log::info!("Opened data folder: {pathbuf:?}");
            Ok(())
        }
    } else {
        Err(InternalError::DataFolder(format!(
            "Data folder does not exist: {pathbuf:?}"
        )))
    }
}

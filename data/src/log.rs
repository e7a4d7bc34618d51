use std::path::PathBuf;
use std::{fs, io};

use crate::data_path;

const LOG_FILE: &str = "sarafchart-current.log";
const PREVIOUS_LOG_FILE: &str = "sarafchart-previous.log";

/// مسیر کامل فایل لاگ؛ پوشه آن در صورت نبود ساخته می‌شود
pub fn path() -> Result<PathBuf, Error> {
    let full_path = data_path(Some(LOG_FILE));

    let parent = full_path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Invalid log file path"))?;

    if !parent.exists() {
        fs::create_dir_all(parent)?;
    }

    Ok(full_path)
}

/// لاگ اجرای قبلی کنار فایل فعلی با نام دیگری نگه داشته می‌شود
pub fn rotate(current: &PathBuf) -> Result<(), Error> {
    let previous = current
        .parent()
        .map_or_else(
            || PathBuf::from(PREVIOUS_LOG_FILE),
            |dir| dir.join(PREVIOUS_LOG_FILE),
        );

    if previous.exists() {
        fs::remove_file(&previous)?;
    }
    if current.exists() {
        fs::rename(current, &previous)?;
    }

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    SetLog(#[from] log::SetLoggerError),
    #[error(transparent)]
    ParseLevel(#[from] log::ParseLevelError),
}

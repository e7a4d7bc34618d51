use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::{fs, io};

use regex::{Captures, Regex};
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;

const DRAWINGS_PREFIX: &str = "drawings_";
const SETTINGS_PREFIX: &str = "chart_settings_";

static UNSAFE_KEY_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9\-.]").expect("valid key pattern"));

/// کلید ذخیره ترسیم‌های یک نماد
pub fn drawings_key(symbol: &str) -> String {
    format!("{DRAWINGS_PREFIX}{symbol}")
}

/// کلید ذخیره تنظیمات نمایش یک نماد
pub fn settings_key(symbol: &str) -> String {
    format!("{SETTINGS_PREFIX}{symbol}")
}

/// خطاهای ذخیره‌سازی
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

/// انبار کلید-مقدار که توسط برنامه میزبان فراهم می‌شود
///
/// مقادیر رشته‌های JSON هستند؛ نبودن کلید خطا نیست و `None` برمی‌گرداند.
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>, Error>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error>;

    fn remove(&mut self, key: &str) -> Result<(), Error>;
}

/// خواندن و دی‌سریال کردن یک مقدار
///
/// خطای خواندن و محتوای خراب هر دو به `None` ختم می‌شوند و فقط لاگ می‌شوند.
pub fn load_json<T: DeserializeOwned>(store: &dyn Storage, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(raw) => raw?,
        Err(err) => {
            log::error!("Failed to read '{key}' from storage: {err}");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("Discarding corrupt payload under '{key}': {err}");
            None
        }
    }
}

/// سریال کردن و نوشتن یک مقدار؛ در صورت خطا فقط لاگ می‌شود
pub fn save_json<T: Serialize>(store: &mut dyn Storage, key: &str, value: &T) -> bool {
    let result = serde_json::to_string(value)
        .map_err(Error::from)
        .and_then(|json| store.set(key, &json));

    match result {
        Ok(()) => true,
        Err(err) => {
            log::error!("Failed to write '{key}' to storage: {err}");
            false
        }
    }
}

/// انبار فایلی: هر کلید یک فایل JSON در پوشه داده‌ها
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// انبار پیش‌فرض در پوشه `store` داخل مسیر داده‌های برنامه
    pub fn in_data_dir() -> Self {
        Self::new(crate::data_path(Some("store")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, Error> {
        let sanitized = sanitize_key(key);
        if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
            return Err(Error::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{sanitized}.json")))
    }
}

impl Storage for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let path = self.path_for(key)?;

        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        let path = self.path_for(key)?;

        if !self.root.exists() {
            fs::create_dir_all(&self.root)?;
        }
        fs::write(path, value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), Error> {
        let path = self.path_for(key)?;

        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// انبار حافظه‌ای برای تست‌ها و اجرای بدون دیسک
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: FxHashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Storage for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), Error> {
        self.entries.remove(key);
        Ok(())
    }
}

/// تبدیل کلید به نام فایل امن
///
/// هر نویسه غیرمجاز (از جمله `_` و `%`) به بایت‌های `%XX` تبدیل می‌شود، پس دو کلید
/// متفاوت هرگز به یک فایل نمی‌رسند.
pub fn sanitize_key(key: &str) -> String {
    UNSAFE_KEY_CHARS
        .replace_all(key, |caps: &Captures| {
            caps[0].bytes().map(|byte| format!("%{byte:02X}")).collect::<String>()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> FileStore {
        let dir = std::env::temp_dir().join(format!(
            "sarafchart-store-{name}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        FileStore::new(dir)
    }

    #[test]
    fn key_conventions() {
        assert_eq!(drawings_key("USD/AFN"), "drawings_USD/AFN");
        assert_eq!(settings_key("EURUSD"), "chart_settings_EURUSD");
    }

    #[test]
    fn keys_are_sanitized_for_files() {
        assert_eq!(sanitize_key("drawings_USD/AFN"), "drawings%5FUSD%2FAFN");
        assert_eq!(sanitize_key("../etc passwd"), "..%2Fetc%20passwd");
        assert_eq!(sanitize_key("EUR-USD.1"), "EUR-USD.1");
    }

    #[test]
    fn distinct_keys_never_share_a_file() {
        let keys = [
            "drawings_USD/AFN",
            "drawings_USD_AFN",
            "drawings_USD%5FAFN",
            "drawings_USD AFN",
            "drawings_دلار",
        ];
        let sanitized: Vec<String> = keys.iter().map(|key| sanitize_key(key)).collect();

        for (i, a) in sanitized.iter().enumerate() {
            for b in &sanitized[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn slash_and_underscore_symbols_stay_separate() {
        let mut store = temp_store("separate");

        store.set(&drawings_key("USD/AFN"), "[1]").expect("set");
        assert_eq!(store.get(&drawings_key("USD_AFN")).expect("get"), None);

        store.set(&drawings_key("USD_AFN"), "[2]").expect("set");
        assert_eq!(
            store.get(&drawings_key("USD/AFN")).expect("get").as_deref(),
            Some("[1]")
        );
        assert_eq!(
            store.get(&drawings_key("USD_AFN")).expect("get").as_deref(),
            Some("[2]")
        );

        let _ = fs::remove_dir_all(store.root());
    }

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::new();

        assert!(save_json(&mut store, "k", &vec![1, 2, 3]));
        assert_eq!(load_json::<Vec<i32>>(&store, "k"), Some(vec![1, 2, 3]));

        store.remove("k").expect("remove");
        assert!(store.is_empty());
        assert_eq!(load_json::<Vec<i32>>(&store, "k"), None);
    }

    #[test]
    fn corrupt_payload_reads_as_none() {
        let mut store = MemoryStore::new();
        store.set("k", "{not json").expect("set");

        assert_eq!(load_json::<Vec<i32>>(&store, "k"), None);
    }

    #[test]
    fn file_store_round_trip() {
        let mut store = temp_store("roundtrip");

        assert_eq!(store.get("drawings_USD/AFN").expect("get"), None);
        store.set("drawings_USD/AFN", "[]").expect("set");
        assert_eq!(
            store.get("drawings_USD/AFN").expect("get").as_deref(),
            Some("[]")
        );
        assert!(store.root().join("drawings%5FUSD%2FAFN.json").exists());

        store.remove("drawings_USD/AFN").expect("remove");
        store.remove("drawings_USD/AFN").expect("remove twice");
        assert_eq!(store.get("drawings_USD/AFN").expect("get"), None);

        let _ = fs::remove_dir_all(store.root());
    }

    #[test]
    fn dot_only_keys_are_rejected() {
        let store = temp_store("dots");
        assert!(matches!(store.get(".."), Err(Error::InvalidKey(_))));
    }
}

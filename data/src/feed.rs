//! بارگذاری کندل‌ها از فایل (CSV یا JSON) به جای سرویس داده بازار

use std::io::{BufReader, Read};
use std::path::Path;
use std::{fs, io};

use csv::{ReaderBuilder, Trim};

use crate::chart::candle::{self, Candle};

/// زمان‌های کوچک‌تر از این مقدار ثانیه در نظر گرفته می‌شوند نه میلی‌ثانیه
const SECONDS_THRESHOLD: u64 = 100_000_000_000;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),
    #[error("no usable candles in {0}")]
    Empty(String),
}

/// خواندن فایل کندل بر اساس پسوند آن و پاک‌سازی داده‌ها
pub fn load(path: &Path) -> Result<Vec<Candle>, Error> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let file = BufReader::new(fs::File::open(path)?);
    let raw = match extension.as_str() {
        "csv" => from_csv(file)?,
        "json" => from_json(file)?,
        other => return Err(Error::UnsupportedFormat(other.to_string())),
    };

    let candles = candle::clean(raw);
    if candles.is_empty() {
        return Err(Error::Empty(path.display().to_string()));
    }

    log::info!("Read {} candle(s) from {}", candles.len(), path.display());
    Ok(candles)
}

/// ستون‌ها: time,open,high,low,close,volume
///
/// سطر عنوان و سطرهای نامعتبر نادیده گرفته می‌شوند.
pub fn from_csv(reader: impl Read) -> Result<Vec<Candle>, Error> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut candles = Vec::new();
    let mut skipped = 0usize;

    for record in csv_reader.records() {
        let record = record?;

        let parsed = (|| {
            let time = normalize_time(record.get(0)?.parse::<f64>().ok()?)?;
            let field = |i: usize| record.get(i).and_then(|v| v.parse::<f64>().ok());

            Some(Candle::new(
                time,
                field(1)?,
                field(2)?,
                field(3)?,
                field(4)?,
                field(5).unwrap_or(0.0),
            ))
        })();

        match parsed {
            Some(candle) => candles.push(candle),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        log::debug!("Skipped {skipped} CSV row(s) that were not candles");
    }
    Ok(candles)
}

/// آرایه JSON از کندل‌ها با فیلدهای `time, open, high, low, close, volume`
pub fn from_json(reader: impl Read) -> Result<Vec<Candle>, Error> {
    let candles: Vec<Candle> = serde_json::from_reader(reader)?;

    Ok(candles
        .into_iter()
        .map(|candle| Candle {
            time: normalize_time(candle.time as f64).unwrap_or(candle.time),
            ..candle
        })
        .collect())
}

fn normalize_time(time: f64) -> Option<u64> {
    if !(time.is_finite() && time >= 0.0) {
        return None;
    }
    let time = time as u64;

    Some(if time < SECONDS_THRESHOLD {
        time * 1_000
    } else {
        time
    })
}

/// سری نمونه برای اجرای برنامه بدون فایل داده
///
/// یک گام تصادفی قطعی (وابسته به نماد) با کندل‌های ساعتی.
pub fn sample(symbol: &str, count: usize, end_time: u64) -> Vec<Candle> {
    const HOUR_MS: u64 = 3_600_000;

    let mut seed = symbol
        .bytes()
        .fold(0x9E37_79B9_7F4A_7C15_u64, |acc, b| {
            (acc ^ u64::from(b)).wrapping_mul(0x0100_0000_01B3)
        });
    let mut next = move || {
        // xorshift64 برای نویز قابل تکرار
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        (seed >> 11) as f64 / (1u64 << 53) as f64
    };

    let start = end_time.saturating_sub(count as u64 * HOUR_MS) / HOUR_MS * HOUR_MS;
    let mut close = 60.0 + next() * 40.0;

    (0..count)
        .map(|i| {
            let open = close;
            let drift = (next() - 0.5) * open * 0.02;
            close = (open + drift).max(0.01);

            let high = open.max(close) * (1.0 + next() * 0.006);
            let low = open.min(close) * (1.0 - next() * 0.006);
            let volume = (500.0 + next() * 4_500.0).round();

            Candle::new(start + i as u64 * HOUR_MS, open, high, low, close, volume)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_with_header_and_seconds() {
        let data = "\
time,open,high,low,close,volume
1700000000,10,12,9,11,100
1700000060, 11, 13, 10, 12, 150
garbage,row
";
        let candles = from_csv(data.as_bytes()).expect("csv");

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].time, 1_700_000_000_000);
        assert_eq!(candles[1].close, 12.0);
    }

    #[test]
    fn json_array() {
        let data = r#"[
            {"time": 1700000000000, "open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5, "volume": 10.0},
            {"time": 1700000060000, "open": 1.5, "high": 2.5, "low": 1.0, "close": 2.0, "volume": 12.0}
        ]"#;
        let candles = from_json(data.as_bytes()).expect("json");

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[1].time, 1_700_000_060_000);
    }

    #[test]
    fn unsupported_extension() {
        let path = std::env::temp_dir().join(format!("sarafchart-feed-{}.txt", std::process::id()));
        fs::write(&path, "1,2,3").expect("write");

        assert!(matches!(load(&path), Err(Error::UnsupportedFormat(_))));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn sample_is_clean_and_deterministic() {
        let a = sample("USDAFN", 300, 1_700_000_000_000);
        let b = sample("USDAFN", 300, 1_700_000_000_000);

        assert_eq!(a, b);
        assert_eq!(candle::clean(a.clone()).len(), 300);
        assert_ne!(a, sample("EURUSD", 300, 1_700_000_000_000));
    }
}

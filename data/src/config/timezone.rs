use std::fmt;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

const MINUTE_MS: u64 = 60_000;
const DAY_MS: u64 = 86_400_000;

/// انواع مناطق زمانی قابل انتخاب توسط کاربر
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserTimezone {
    #[default]
    Utc,
    Local,
}

impl UserTimezone {
    pub const ALL: [UserTimezone; 2] = [UserTimezone::Utc, UserTimezone::Local];

    /// برچسب محور زمان بر اساس فاصله کندل‌ها (میلی‌ثانیه)
    pub fn format_axis_label(&self, time_ms: u64, interval_ms: u64) -> String {
        let Some(datetime) = from_millis(time_ms) else {
            return String::new();
        };

        match self {
            UserTimezone::Utc => {
                Self::axis_label(&datetime.with_timezone(&chrono::Utc), interval_ms)
            }
            UserTimezone::Local => {
                Self::axis_label(&datetime.with_timezone(&chrono::Local), interval_ms)
            }
        }
    }

    fn axis_label<Tz: chrono::TimeZone>(datetime: &DateTime<Tz>, interval_ms: u64) -> String
    where
        Tz::Offset: fmt::Display,
    {
        if interval_ms >= DAY_MS {
            datetime.format("%b %-d").to_string()
        } else if interval_ms < MINUTE_MS {
            datetime.format("%H:%M:%S").to_string()
        } else if datetime.format("%H:%M").to_string() == "00:00" {
            // شروع روز جدید
            datetime.format("%-d %b").to_string()
        } else {
            datetime.format("%H:%M").to_string()
        }
    }

    /// برچسب کامل زمان برای نشانگر (Crosshair) و نوار قیمت
    pub fn format_crosshair(&self, time_ms: u64, interval_ms: u64) -> String {
        let Some(datetime) = from_millis(time_ms) else {
            return String::new();
        };
        let pattern = if interval_ms >= DAY_MS {
            "%a %b %-d %Y"
        } else {
            "%a %b %-d %H:%M"
        };

        match self {
            UserTimezone::Utc => datetime.format(pattern).to_string(),
            UserTimezone::Local => datetime
                .with_timezone(&chrono::Local)
                .format(pattern)
                .to_string(),
        }
    }
}

fn from_millis(time_ms: u64) -> Option<DateTime<chrono::Utc>> {
    i64::try_from(time_ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}

impl fmt::Display for UserTimezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserTimezone::Utc => write!(f, "UTC"),
            UserTimezone::Local => {
                let local_offset = chrono::Local::now().offset().local_minus_utc();
                let hours = local_offset / 3600;
                let minutes = (local_offset % 3600).abs() / 60;
                write!(f, "Local (UTC {hours:+03}:{minutes:02})")
            }
        }
    }
}

impl<'de> Deserialize<'de> for UserTimezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let timezone_str = String::deserialize(deserializer)?;
        match timezone_str.to_lowercase().as_str() {
            "utc" => Ok(UserTimezone::Utc),
            "local" => Ok(UserTimezone::Local),
            _ => Err(serde::de::Error::custom("Invalid UserTimezone")),
        }
    }
}

impl Serialize for UserTimezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            UserTimezone::Utc => serializer.serialize_str("UTC"),
            UserTimezone::Local => serializer.serialize_str("Local"),
        }
    }
}

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ScaleFactor;
use super::timezone::UserTimezone;

pub const DEFAULT_SYMBOL: &str = "USDAFN";

/// ساختار کلی وضعیت برنامه برای ذخیره و بازیابی بین اجراها
///
/// تنظیمات هر نماد جداگانه در انبار ذخیره می‌شوند، نه اینجا.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct State {
    pub symbol: String,                  // آخرین نماد باز شده
    pub candle_file: Option<PathBuf>,    // آخرین فایل کندل بارگذاری شده
    pub main_window: Option<WindowSpec>, // مشخصات پنجره اصلی
    pub timezone: UserTimezone,
    pub scale_factor: ScaleFactor,
}

impl Default for State {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            candle_file: None,
            main_window: None,
            timezone: UserTimezone::default(),
            scale_factor: ScaleFactor::default(),
        }
    }
}

/// ابعاد و موقعیت یک پنجره
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct WindowSpec {
    pub width: f32,
    pub height: f32,
    pub pos_x: f32,
    pub pos_y: f32,
}

impl WindowSpec {
    pub fn size(&self) -> iced_core::Size {
        iced_core::Size::new(self.width, self.height)
    }

    pub fn position(&self) -> iced_core::Point {
        iced_core::Point::new(self.pos_x, self.pos_y)
    }
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
            pos_x: 0.0,
            pos_y: 0.0,
        }
    }
}

impl From<(&iced_core::Point, &iced_core::Size)> for WindowSpec {
    fn from((point, size): (&iced_core::Point, &iced_core::Size)) -> Self {
        Self {
            width: size.width,
            height: size.height,
            pos_x: point.x,
            pos_y: point.y,
        }
    }
}

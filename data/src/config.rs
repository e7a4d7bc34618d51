use serde::{Deserialize, Serialize};

pub mod settings;
pub mod state;
pub mod theme;
pub mod timezone;

pub const MIN_SCALE: f32 = 0.8;
pub const MAX_SCALE: f32 = 1.5;

/// ضریب مقیاس‌دهی رابط کاربری
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(from = "f32", into = "f32")]
pub struct ScaleFactor(f32);

impl Default for ScaleFactor {
    fn default() -> Self {
        Self(1.0)
    }
}

impl From<f32> for ScaleFactor {
    fn from(value: f32) -> Self {
        if value.is_finite() {
            ScaleFactor(value.clamp(MIN_SCALE, MAX_SCALE))
        } else {
            ScaleFactor::default()
        }
    }
}

impl From<ScaleFactor> for f32 {
    fn from(value: ScaleFactor) -> Self {
        value.0
    }
}

use serde::{Deserialize, Serialize};

use super::theme::ChartTheme;
use crate::chart::ChartKind;
use crate::chart::indicator::{IndicatorId, IndicatorSpec};
use crate::storage::{self, Storage};
use crate::util::ok_or_default;

pub const MIN_OPACITY: f32 = 0.1;

/// تنظیمات نمایش نمودار برای هر نماد
///
/// فیلدهای ناشناخته یا خراب به مقدار پیش‌فرض برمی‌گردند.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartSettings {
    #[serde(deserialize_with = "ok_or_default")]
    pub indicators: Vec<IndicatorSpec>,
    #[serde(rename = "chartType", deserialize_with = "ok_or_default")]
    pub kind: ChartKind,
    #[serde(deserialize_with = "ok_or_default")]
    pub theme: ChartTheme,
    pub show_volume: bool,
    pub show_grid: bool,
    pub show_crosshair: bool,
    pub opacity: f32, // شفافیت سری اصلی
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            indicators: vec![IndicatorSpec::from(IndicatorId::Sma)],
            kind: ChartKind::default(),
            theme: ChartTheme::default(),
            show_volume: true,
            show_grid: true,
            show_crosshair: true,
            opacity: 1.0,
        }
    }
}

impl ChartSettings {
    /// تنظیمات ذخیره‌شده نماد، یا پیش‌فرض اگر وجود نداشته یا خراب باشد
    pub fn load(store: &dyn Storage, symbol: &str) -> Self {
        storage::load_json::<Self>(store, &storage::settings_key(symbol))
            .map(Self::sanitized)
            .unwrap_or_default()
    }

    pub fn save(&self, store: &mut dyn Storage, symbol: &str) -> bool {
        storage::save_json(store, &storage::settings_key(symbol), self)
    }

    fn sanitized(mut self) -> Self {
        self.set_opacity(self.opacity);
        self
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = if opacity.is_finite() {
            opacity.clamp(MIN_OPACITY, 1.0)
        } else {
            1.0
        };
    }

    pub fn is_enabled(&self, id: IndicatorId) -> bool {
        self.indicators.iter().any(|spec| spec.id() == id && spec.enabled)
    }

    /// روشن/خاموش کردن اندیکاتور؛ اگر تنظیمی برای آن نباشد با پارامترهای پیش‌فرض اضافه می‌شود
    pub fn toggle_indicator(&mut self, id: IndicatorId) {
        if let Some(spec) = self.indicators.iter_mut().find(|spec| spec.id() == id) {
            spec.enabled = !spec.enabled;
        } else {
            self.indicators.push(IndicatorSpec::from(id));
        }
    }

    /// تعداد پنل‌های اسیلاتور فعال
    pub fn oscillator_count(&self) -> usize {
        self.indicators
            .iter()
            .filter(|spec| {
                spec.enabled && spec.placement == crate::chart::indicator::Placement::Oscillator
            })
            .count()
    }
}

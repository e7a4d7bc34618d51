pub mod calc;

use std::fmt::{self, Display};
use std::sync::LazyLock;

use enum_map::{Enum, EnumMap, enum_map};
use iced_core::Color;
use serde::{Deserialize, Serialize};

use super::candle::{Candle, CandleSeries};

/// شناسه اندیکاتورهای پشتیبانی شده
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Enum)]
pub enum IndicatorId {
    Sma,
    Ema,
    Wma,
    Bollinger,
    Rsi,
    Macd,
    Stochastic,
    Vwap,
}

impl IndicatorId {
    // ترتیب دکمه‌های اندیکاتور در نوار ابزار از این آرایه می‌آید
    pub const ALL: [IndicatorId; 8] = [
        IndicatorId::Sma,
        IndicatorId::Ema,
        IndicatorId::Wma,
        IndicatorId::Bollinger,
        IndicatorId::Vwap,
        IndicatorId::Rsi,
        IndicatorId::Macd,
        IndicatorId::Stochastic,
    ];

    /// پارامترهای پیش‌فرض هر اندیکاتور
    pub fn default_params(self) -> IndicatorParams {
        DEFAULTS[self].params
    }

    /// محل نمایش پیش‌فرض: روی نمودار قیمت یا پنل جداگانه
    pub fn default_placement(self) -> Placement {
        DEFAULTS[self].placement
    }

    pub fn default_color(self) -> Color {
        DEFAULTS[self].color
    }
}

#[derive(Debug, Clone, Copy)]
struct Defaults {
    params: IndicatorParams,
    placement: Placement,
    color: Color,
}

const fn overlay(params: IndicatorParams, color: Color) -> Defaults {
    Defaults {
        params,
        placement: Placement::Overlay,
        color,
    }
}

const fn oscillator(params: IndicatorParams, color: Color) -> Defaults {
    Defaults {
        params,
        placement: Placement::Oscillator,
        color,
    }
}

static DEFAULTS: LazyLock<EnumMap<IndicatorId, Defaults>> = LazyLock::new(|| {
    enum_map! {
        IndicatorId::Sma => overlay(
            IndicatorParams::Sma { period: 20 },
            Color::from_rgb8(41, 98, 255),
        ),
        IndicatorId::Ema => overlay(
            IndicatorParams::Ema { period: 20 },
            Color::from_rgb8(255, 152, 0),
        ),
        IndicatorId::Wma => overlay(
            IndicatorParams::Wma { period: 20 },
            Color::from_rgb8(156, 39, 176),
        ),
        IndicatorId::Bollinger => overlay(
            IndicatorParams::Bollinger {
                period: 20,
                std_dev: 2.0,
            },
            Color::from_rgb8(33, 150, 243),
        ),
        IndicatorId::Rsi => oscillator(
            IndicatorParams::Rsi { period: 14 },
            Color::from_rgb8(126, 87, 194),
        ),
        IndicatorId::Macd => oscillator(
            IndicatorParams::Macd {
                fast: 12,
                slow: 26,
                signal: 9,
            },
            Color::from_rgb8(38, 166, 154),
        ),
        IndicatorId::Stochastic => oscillator(
            IndicatorParams::Stochastic {
                k_period: 14,
                d_period: 3,
            },
            Color::from_rgb8(239, 83, 80),
        ),
        IndicatorId::Vwap => overlay(IndicatorParams::Vwap, Color::from_rgb8(255, 235, 59)),
    }
});

impl Display for IndicatorId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IndicatorId::Sma => write!(f, "SMA"),
            IndicatorId::Ema => write!(f, "EMA"),
            IndicatorId::Wma => write!(f, "WMA"),
            IndicatorId::Bollinger => write!(f, "Bollinger Bands"),
            IndicatorId::Rsi => write!(f, "RSI"),
            IndicatorId::Macd => write!(f, "MACD"),
            IndicatorId::Stochastic => write!(f, "Stochastic"),
            IndicatorId::Vwap => write!(f, "VWAP"),
        }
    }
}

/// پارامترهای هر اندیکاتور؛ هر نوع فقط پارامترهایی را دارد که واقعاً استفاده می‌کند
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(tag = "id", rename_all = "lowercase")]
pub enum IndicatorParams {
    Sma { period: usize },
    Ema { period: usize },
    Wma { period: usize },
    Bollinger {
        period: usize,
        #[serde(rename = "stdDev")]
        std_dev: f64,
    },
    Rsi { period: usize },
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Stochastic {
        #[serde(rename = "kPeriod")]
        k_period: usize,
        #[serde(rename = "dPeriod")]
        d_period: usize,
    },
    Vwap,
}

impl IndicatorParams {
    pub fn id(&self) -> IndicatorId {
        match self {
            IndicatorParams::Sma { .. } => IndicatorId::Sma,
            IndicatorParams::Ema { .. } => IndicatorId::Ema,
            IndicatorParams::Wma { .. } => IndicatorId::Wma,
            IndicatorParams::Bollinger { .. } => IndicatorId::Bollinger,
            IndicatorParams::Rsi { .. } => IndicatorId::Rsi,
            IndicatorParams::Macd { .. } => IndicatorId::Macd,
            IndicatorParams::Stochastic { .. } => IndicatorId::Stochastic,
            IndicatorParams::Vwap => IndicatorId::Vwap,
        }
    }

    fn validate(&self) -> Result<(), Error> {
        let check_period = |name: &'static str, period: usize| {
            if period == 0 {
                Err(Error::InvalidPeriod(name))
            } else {
                Ok(())
            }
        };

        match *self {
            IndicatorParams::Sma { period }
            | IndicatorParams::Ema { period }
            | IndicatorParams::Wma { period }
            | IndicatorParams::Rsi { period } => check_period("period", period),
            IndicatorParams::Bollinger { period, std_dev } => {
                check_period("period", period)?;
                if !std_dev.is_finite() || std_dev < 0.0 {
                    return Err(Error::InvalidParameter(format!(
                        "stdDev must be a non-negative number, got {std_dev}"
                    )));
                }
                Ok(())
            }
            IndicatorParams::Macd { fast, slow, signal } => {
                check_period("fast", fast)?;
                check_period("slow", slow)?;
                check_period("signal", signal)?;
                if fast >= slow {
                    return Err(Error::InvalidParameter(format!(
                        "fast period ({fast}) must be shorter than slow period ({slow})"
                    )));
                }
                Ok(())
            }
            IndicatorParams::Stochastic { k_period, d_period } => {
                check_period("kPeriod", k_period)?;
                check_period("dPeriod", d_period)
            }
            IndicatorParams::Vwap => Ok(()),
        }
    }
}

impl Display for IndicatorParams {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IndicatorParams::Sma { period }
            | IndicatorParams::Ema { period }
            | IndicatorParams::Wma { period }
            | IndicatorParams::Rsi { period } => write!(f, "{} {period}", self.id()),
            IndicatorParams::Bollinger { period, std_dev } => write!(f, "BB {period} {std_dev}"),
            IndicatorParams::Macd { fast, slow, signal } => {
                write!(f, "MACD {fast} {slow} {signal}")
            }
            IndicatorParams::Stochastic { k_period, d_period } => {
                write!(f, "Stoch {k_period} {d_period}")
            }
            IndicatorParams::Vwap => write!(f, "VWAP"),
        }
    }
}

/// محل رسم اندیکاتور
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    #[default]
    Overlay, // روی نمودار قیمت
    Oscillator, // پنل جداگانه زیر نمودار
    Volume,     // روی پنل حجم
}

/// تنظیمات یک اندیکاتور فعال
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct IndicatorSpec {
    #[serde(flatten)]
    pub params: IndicatorParams,
    #[serde(rename = "kind")]
    pub placement: Placement,
    pub enabled: bool,
    pub color: Color,
}

impl IndicatorSpec {
    pub fn new(params: IndicatorParams) -> Self {
        let id = params.id();
        Self {
            params,
            placement: id.default_placement(),
            enabled: true,
            color: id.default_color(),
        }
    }

    pub fn id(&self) -> IndicatorId {
        self.params.id()
    }

    /// محاسبه سری اندیکاتور روی کل کندل‌ها
    pub fn compute(&self, candles: &[Candle]) -> Result<IndicatorSeries, Error> {
        self.params.validate()?;

        let series = match self.params {
            IndicatorParams::Sma { period } => calc::sma(candles, period),
            IndicatorParams::Ema { period } => calc::ema(candles, period),
            IndicatorParams::Wma { period } => calc::wma(candles, period),
            IndicatorParams::Bollinger { period, std_dev } => {
                calc::bollinger(candles, period, std_dev)
            }
            IndicatorParams::Rsi { period } => calc::rsi(candles, period),
            IndicatorParams::Macd { fast, slow, signal } => calc::macd(candles, fast, slow, signal),
            IndicatorParams::Stochastic { k_period, d_period } => {
                calc::stochastic(candles, k_period, d_period)
            }
            IndicatorParams::Vwap => calc::vwap(candles),
        };

        if let Some(point) = series.iter().find(|p| !p.value.is_finite()) {
            return Err(Error::NonFinite(point.time));
        }

        Ok(series)
    }
}

impl From<IndicatorId> for IndicatorSpec {
    fn from(id: IndicatorId) -> Self {
        Self::new(id.default_params())
    }
}

/// مقدار یک نقطه از سری اندیکاتور؛ اندیکاتورهای چندخطی چند مقدار دارند
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    Single(f64),
    Bands { upper: f64, middle: f64, lower: f64 },
    Macd { macd: f64, signal: f64, histogram: f64 },
    Stochastic { k: f64, d: f64 },
}

impl IndicatorValue {
    pub fn is_finite(&self) -> bool {
        self.components().iter().all(|v| v.is_finite())
    }

    /// تمام مقادیر این نقطه (برای محاسبه محدوده پنل‌ها)
    pub fn components(&self) -> Vec<f64> {
        match *self {
            IndicatorValue::Single(v) => vec![v],
            IndicatorValue::Bands {
                upper,
                middle,
                lower,
            } => vec![upper, middle, lower],
            IndicatorValue::Macd {
                macd,
                signal,
                histogram,
            } => vec![macd, signal, histogram],
            IndicatorValue::Stochastic { k, d } => vec![k, d],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPoint {
    pub time: u64,
    pub value: IndicatorValue,
}

pub type IndicatorSeries = Vec<IndicatorPoint>;

/// خطاهای محاسبه اندیکاتور
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("{0} must be greater than zero")]
    InvalidPeriod(&'static str),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("non-finite value at {0}")]
    NonFinite(u64),
}

/// کش سری‌های اندیکاتور به ازای (بازبینی کندل‌ها، تنظیمات اندیکاتور)
#[derive(Debug, Default)]
pub struct IndicatorCache {
    revision: u64,
    entries: Vec<(IndicatorSpec, Result<IndicatorSeries, Error>)>,
}

impl IndicatorCache {
    /// به‌روزرسانی کش؛ فقط اندیکاتورهای تغییر یافته دوباره محاسبه می‌شوند
    pub fn refresh(&mut self, candles: &CandleSeries, specs: &[IndicatorSpec]) {
        if self.revision != candles.revision() {
            self.entries.clear();
            self.revision = candles.revision();
        }

        let mut previous = std::mem::take(&mut self.entries);

        for spec in specs.iter().filter(|spec| spec.enabled) {
            let position = previous.iter().position(|(cached, _)| cached == spec);

            let entry = match position {
                Some(index) => previous.swap_remove(index),
                None => {
                    let result = spec.compute(candles.as_slice());
                    if let Err(err) = &result {
                        log::warn!("Indicator {} skipped: {err}", spec.params);
                    }
                    (*spec, result)
                }
            };
            self.entries.push(entry);
        }
    }

    /// سری‌های محاسبه شده موفق به ترتیب تنظیمات؛ اندیکاتورهای خطادار حذف می‌شوند
    pub fn computed(&self) -> impl Iterator<Item = (&IndicatorSpec, &IndicatorSeries)> {
        self.entries
            .iter()
            .filter_map(|(spec, result)| result.as_ref().ok().map(|series| (spec, series)))
    }

    pub fn get(&self, spec: &IndicatorSpec) -> Option<&IndicatorSeries> {
        self.entries
            .iter()
            .find(|(cached, _)| cached == spec)
            .and_then(|(_, result)| result.as_ref().ok())
    }

    pub fn overlays(&self) -> impl Iterator<Item = (&IndicatorSpec, &IndicatorSeries)> {
        self.by_placement(Placement::Overlay)
    }

    pub fn oscillators(&self) -> impl Iterator<Item = (&IndicatorSpec, &IndicatorSeries)> {
        self.by_placement(Placement::Oscillator)
    }

    pub fn volumes(&self) -> impl Iterator<Item = (&IndicatorSpec, &IndicatorSeries)> {
        self.by_placement(Placement::Volume)
    }

    fn by_placement(
        &self,
        placement: Placement,
    ) -> impl Iterator<Item = (&IndicatorSpec, &IndicatorSeries)> {
        self.entries
            .iter()
            .filter(move |(spec, _)| spec.placement == placement)
            .filter_map(|(spec, result)| result.as_ref().ok().map(|series| (spec, series)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::candle::tests::candles_from_closes;

    #[test]
    fn defaults_cover_every_indicator() {
        for id in IndicatorId::ALL {
            let spec = IndicatorSpec::from(id);

            assert_eq!(spec.id(), id);
            assert!(spec.params.validate().is_ok());
        }

        assert_eq!(IndicatorId::Rsi.default_placement(), Placement::Oscillator);
        assert_eq!(IndicatorId::Vwap.default_placement(), Placement::Overlay);
        assert_ne!(
            IndicatorId::Sma.default_color(),
            IndicatorId::Ema.default_color()
        );
    }

    #[test]
    fn invalid_parameters_are_reported() {
        let candles = candles_from_closes(&[1.0, 2.0, 3.0]);

        let zero = IndicatorSpec::new(IndicatorParams::Sma { period: 0 });
        assert_eq!(zero.compute(&candles), Err(Error::InvalidPeriod("period")));

        let inverted = IndicatorSpec::new(IndicatorParams::Macd {
            fast: 26,
            slow: 12,
            signal: 9,
        });
        assert!(matches!(
            inverted.compute(&candles),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn cache_skips_failing_indicator_only() {
        let series = CandleSeries::new(candles_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]));
        let specs = [
            IndicatorSpec::new(IndicatorParams::Sma { period: 2 }),
            IndicatorSpec::new(IndicatorParams::Ema { period: 0 }),
            IndicatorSpec::new(IndicatorParams::Rsi { period: 2 }),
        ];

        let mut cache = IndicatorCache::default();
        cache.refresh(&series, &specs);

        let ids: Vec<IndicatorId> = cache.computed().map(|(spec, _)| spec.id()).collect();
        assert_eq!(ids, vec![IndicatorId::Sma, IndicatorId::Rsi]);
        assert_eq!(cache.overlays().count(), 1);
        assert_eq!(cache.oscillators().count(), 1);
    }

    #[test]
    fn cache_recomputes_on_new_revision() {
        let mut series = CandleSeries::new(candles_from_closes(&[1.0, 2.0, 3.0]));
        let spec = IndicatorSpec::new(IndicatorParams::Sma { period: 2 });

        let mut cache = IndicatorCache::default();
        cache.refresh(&series, &[spec]);
        assert_eq!(cache.get(&spec).map(Vec::len), Some(2));

        series.replace(candles_from_closes(&[1.0, 2.0, 3.0, 4.0]));
        cache.refresh(&series, &[spec]);
        assert_eq!(cache.get(&spec).map(Vec::len), Some(3));
    }

    #[test]
    fn disabled_specs_are_not_computed() {
        let series = CandleSeries::new(candles_from_closes(&[1.0, 2.0, 3.0]));
        let mut spec = IndicatorSpec::new(IndicatorParams::Vwap);
        spec.enabled = false;

        let mut cache = IndicatorCache::default();
        cache.refresh(&series, &[spec]);
        assert_eq!(cache.computed().count(), 0);
    }

    #[test]
    fn spec_serializes_as_tagged_union() {
        let spec = IndicatorSpec::new(IndicatorParams::Bollinger {
            period: 20,
            std_dev: 2.0,
        });
        let json = serde_json::to_value(spec).expect("serialize");

        assert_eq!(json["id"], "bollinger");
        assert_eq!(json["stdDev"], 2.0);
        assert_eq!(json["kind"], "overlay");

        let back: IndicatorSpec = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, spec);
    }
}

//! محاسبات خالص اندیکاتورهای تکنیکال روی سری کندل‌ها
//!
//! تمام توابع ورودی تمیزشده می‌گیرند (`candle::clean`) و هرگز panic نمی‌کنند؛
//! ورودی کوتاه‌تر از دوره لازم، سری خالی برمی‌گرداند.

use super::{IndicatorPoint, IndicatorSeries, IndicatorValue};
use crate::chart::candle::Candle;

/// میانگین ساده روی پنجره‌های متوالی یک آرایه عددی
///
/// خروجی برای ایندکس `period - 1` به بعد است.
pub fn sma_values(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return vec![];
    }

    let mut out = Vec::with_capacity(values.len() - period + 1);
    let mut sum: f64 = values[..period].iter().sum();
    out.push(sum / period as f64);

    for i in period..values.len() {
        sum += values[i] - values[i - period];
        out.push(sum / period as f64);
    }
    out
}

/// میانگین نمایی که با اولین مقدار مقداردهی اولیه می‌شود
///
/// برخلاف SMA، برای هر ورودی یک خروجی تولید می‌شود.
pub fn ema_values(values: &[f64], period: usize) -> Vec<f64> {
    let Some(&first) = values.first() else {
        return vec![];
    };
    if period == 0 {
        return vec![];
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev = first;
    out.push(prev);

    for &value in &values[1..] {
        prev = value * k + prev * (1.0 - k);
        out.push(prev);
    }
    out
}

fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

fn single(candles: &[Candle], offset: usize, values: Vec<f64>) -> IndicatorSeries {
    candles[offset..]
        .iter()
        .zip(values)
        .map(|(candle, value)| IndicatorPoint {
            time: candle.time,
            value: IndicatorValue::Single(value),
        })
        .collect()
}

/// ورودی خالی یا تک‌کندلی برای اندیکاتورهای پنجره‌ای سری خالی می‌دهد
fn too_short(candles: &[Candle], period: usize) -> bool {
    candles.len() < 2 || candles.len() < period
}

pub fn sma(candles: &[Candle], period: usize) -> IndicatorSeries {
    if too_short(candles, period) {
        return vec![];
    }
    single(candles, period - 1, sma_values(&closes(candles), period))
}

pub fn ema(candles: &[Candle], period: usize) -> IndicatorSeries {
    if too_short(candles, period) {
        return vec![];
    }
    single(candles, 0, ema_values(&closes(candles), period))
}

/// میانگین وزنی خطی؛ سنگین‌ترین وزن متعلق به جدیدترین کندل است
pub fn wma(candles: &[Candle], period: usize) -> IndicatorSeries {
    if too_short(candles, period) {
        return vec![];
    }

    let denominator = (period * (period + 1)) as f64 / 2.0;
    let values = candles
        .windows(period)
        .map(|window| {
            window
                .iter()
                .enumerate()
                .map(|(j, c)| c.close * (j + 1) as f64)
                .sum::<f64>()
                / denominator
        })
        .collect();

    single(candles, period - 1, values)
}

/// باندهای بولینگر با انحراف معیار جامعه (population)
pub fn bollinger(candles: &[Candle], period: usize, std_dev: f64) -> IndicatorSeries {
    if too_short(candles, period) {
        return vec![];
    }

    candles
        .windows(period)
        .map(|window| {
            let mean = window.iter().map(|c| c.close).sum::<f64>() / period as f64;
            let variance = window
                .iter()
                .map(|c| (c.close - mean).powi(2))
                .sum::<f64>()
                / period as f64;
            let band = std_dev * variance.sqrt();

            IndicatorPoint {
                time: window[period - 1].time,
                value: IndicatorValue::Bands {
                    upper: mean + band,
                    middle: mean,
                    lower: mean - band,
                },
            }
        })
        .collect()
}

/// RSI با میانگین ساده سود و زیان روی `period` تغییر آخر
///
/// وقتی میانگین زیان صفر است مقدار ۱ جایگزین آن می‌شود تا تقسیم بر صفر رخ ندهد.
pub fn rsi(candles: &[Candle], period: usize) -> IndicatorSeries {
    if period == 0 || candles.len() < period + 1 {
        return vec![];
    }

    let deltas: Vec<f64> = candles
        .windows(2)
        .map(|w| w[1].close - w[0].close)
        .collect();

    deltas
        .windows(period)
        .enumerate()
        .map(|(i, window)| {
            let avg_gain = window.iter().filter(|d| **d > 0.0).sum::<f64>() / period as f64;
            let avg_loss = window
                .iter()
                .filter(|d| **d < 0.0)
                .map(|d| d.abs())
                .sum::<f64>()
                / period as f64;

            let avg_loss = if avg_loss == 0.0 { 1.0 } else { avg_loss };
            let rs = avg_gain / avg_loss;

            IndicatorPoint {
                time: candles[i + period].time,
                value: IndicatorValue::Single(100.0 - 100.0 / (1.0 + rs)),
            }
        })
        .collect()
}

/// MACD = EMA(fast) - EMA(slow)، خط سیگنال = EMA(MACD, signal)
pub fn macd(candles: &[Candle], fast: usize, slow: usize, signal: usize) -> IndicatorSeries {
    if too_short(candles, slow.max(fast)) {
        return vec![];
    }

    let closes = closes(candles);
    let fast_line = ema_values(&closes, fast);
    let slow_line = ema_values(&closes, slow);

    let macd_line: Vec<f64> = fast_line
        .iter()
        .zip(&slow_line)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_values(&macd_line, signal);

    candles
        .iter()
        .zip(macd_line.iter().zip(&signal_line))
        .map(|(candle, (&macd, &signal))| IndicatorPoint {
            time: candle.time,
            value: IndicatorValue::Macd {
                macd,
                signal,
                histogram: macd - signal,
            },
        })
        .collect()
}

/// استوکاستیک: %K روی `k_period` و %D میانگین ساده %K روی `d_period`
///
/// وقتی بالاترین و پایین‌ترین قیمت پنجره برابرند، %K مقدار خنثی ۵۰ می‌گیرد.
pub fn stochastic(candles: &[Candle], k_period: usize, d_period: usize) -> IndicatorSeries {
    if too_short(candles, k_period) || d_period == 0 {
        return vec![];
    }

    let k_line: Vec<f64> = candles
        .windows(k_period)
        .map(|window| {
            let highest = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
            let lowest = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
            let close = window[k_period - 1].close;

            if highest > lowest {
                100.0 * (close - lowest) / (highest - lowest)
            } else {
                50.0
            }
        })
        .collect();

    let d_line = sma_values(&k_line, d_period);
    let offset = k_period - 1 + d_period - 1;

    candles
        .iter()
        .skip(offset)
        .zip(k_line.iter().skip(d_period - 1).zip(&d_line))
        .map(|(candle, (&k, &d))| IndicatorPoint {
            time: candle.time,
            value: IndicatorValue::Stochastic { k, d },
        })
        .collect()
}

/// VWAP تجمعی از ابتدای سری؛ بازنشانی بر عهده فراخواننده است
pub fn vwap(candles: &[Candle]) -> IndicatorSeries {
    let mut cumulative_pv = 0.0;
    let mut cumulative_volume = 0.0;

    candles
        .iter()
        .map(|candle| {
            cumulative_pv += candle.typical_price() * candle.volume;
            cumulative_volume += candle.volume;

            let value = if cumulative_volume > 0.0 {
                cumulative_pv / cumulative_volume
            } else {
                candle.typical_price()
            };

            IndicatorPoint {
                time: candle.time,
                value: IndicatorValue::Single(value),
            }
        })
        .collect()
}

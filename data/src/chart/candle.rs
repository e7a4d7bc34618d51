use serde::{Deserialize, Serialize};

/// یک کندل OHLCV
///
/// `time` زمان شروع کندل به میلی‌ثانیه (epoch) است و در یک سری باید یکتا و اکیداً صعودی باشد.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: u64,   // زمان شروع کندل
    pub open: f64,   // قیمت باز شدن
    pub high: f64,   // بالاترین قیمت
    pub low: f64,    // پایین‌ترین قیمت
    pub close: f64,  // قیمت بسته شدن
    pub volume: f64, // حجم معاملات
}

impl Candle {
    pub fn new(time: u64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// کندل صعودی: قیمت بسته شدن بالاتر از قیمت باز شدن
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// قیمت نمونه (High + Low + Close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }

    fn is_well_formed(&self) -> bool {
        self.is_finite()
            && self.volume >= 0.0
            && self.low <= self.open.min(self.close)
            && self.open.max(self.close) <= self.high
    }
}

/// حذف کندل‌های نامعتبر پیش از محاسبه اندیکاتورها و رسم
///
/// کندل‌هایی با مقادیر غیرمتناهی، حجم منفی، OHLC ناسازگار یا زمان غیرصعودی کنار گذاشته می‌شوند.
pub fn clean(candles: impl IntoIterator<Item = Candle>) -> Vec<Candle> {
    let mut cleaned: Vec<Candle> = Vec::new();
    let mut dropped = 0usize;

    for candle in candles {
        let monotonic = cleaned.last().is_none_or(|last| candle.time > last.time);

        if candle.is_well_formed() && monotonic {
            cleaned.push(candle);
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        log::warn!("Dropped {dropped} malformed candle(s) during cleaning");
    }

    cleaned
}

/// سری کندل‌ها به همراه شماره بازبینی
///
/// هر بار که آرایه کندل‌ها جایگزین می‌شود شماره بازبینی افزایش می‌یابد؛
/// کش اندیکاتورها از همین شماره به عنوان هویت آرایه استفاده می‌کند.
#[derive(Debug, Clone, Default)]
pub struct CandleSeries {
    candles: Vec<Candle>,
    revision: u64,
}

impl CandleSeries {
    pub fn new(candles: impl IntoIterator<Item = Candle>) -> Self {
        Self {
            candles: clean(candles),
            revision: 1,
        }
    }

    /// جایگزینی کامل داده‌ها (مثلاً پس از دریافت داده جدید)
    pub fn replace(&mut self, candles: impl IntoIterator<Item = Candle>) {
        self.candles = clean(candles);
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// ایندکس کندلی که دقیقاً در زمان داده شده شروع می‌شود
    pub fn index_of(&self, time: u64) -> Option<usize> {
        self.candles.binary_search_by_key(&time, |c| c.time).ok()
    }

    /// ایندکس کسری یک زمان دلخواه روی محور کندل‌ها
    ///
    /// بین دو کندل به صورت خطی درون‌یابی می‌شود و بیرون از محدوده داده‌ها
    /// با فاصله آخرین (یا اولین) دو کندل برون‌یابی می‌شود.
    pub fn fractional_index(&self, time: u64) -> Option<f64> {
        let candles = &self.candles;
        let first = candles.first()?;
        let last = candles.last()?;

        if candles.len() == 1 {
            return Some(0.0);
        }

        let time_f = time as f64;

        if time <= first.time {
            let step = (candles[1].time - first.time) as f64;
            return Some((time_f - first.time as f64) / step);
        }
        if time >= last.time {
            let prev = candles[candles.len() - 2];
            let step = (last.time - prev.time) as f64;
            return Some(
                (candles.len() - 1) as f64 + (time_f - last.time as f64) / step,
            );
        }

        match candles.binary_search_by_key(&time, |c| c.time) {
            Ok(index) => Some(index as f64),
            Err(upper) => {
                let lower = upper - 1;
                let (t0, t1) = (candles[lower].time as f64, candles[upper].time as f64);
                Some(lower as f64 + (time_f - t0) / (t1 - t0))
            }
        }
    }

    /// زمان متناظر با یک ایندکس کسری (عکس `fractional_index`)
    pub fn time_at(&self, index: f64) -> Option<u64> {
        let candles = &self.candles;
        let first = candles.first()?;

        if candles.len() == 1 {
            return Some(first.time);
        }

        let last_index = candles.len() - 1;
        let (lower, step) = if index <= 0.0 {
            (0, (candles[1].time - first.time) as f64)
        } else if index >= last_index as f64 {
            (
                last_index,
                (candles[last_index].time - candles[last_index - 1].time) as f64,
            )
        } else {
            let lower = index.floor() as usize;
            (
                lower,
                (candles[lower + 1].time - candles[lower].time) as f64,
            )
        };

        let time = candles[lower].time as f64 + (index - lower as f64) * step;
        Some(time.max(0.0).round() as u64)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let open = if i == 0 { close } else { closes[i - 1] };
                Candle::new(
                    (i as u64 + 1) * 60_000,
                    open,
                    open.max(close) + 1.0,
                    open.min(close) - 1.0,
                    close,
                    100.0 + i as f64,
                )
            })
            .collect()
    }

    #[test]
    fn clean_drops_non_finite_and_unordered() {
        let mut candles = candles_from_closes(&[10.0, 11.0, 12.0, 13.0]);
        candles[1].high = f64::NAN;
        candles.push(Candle::new(60_000, 5.0, 6.0, 4.0, 5.0, 1.0));

        let cleaned = clean(candles);

        assert_eq!(cleaned.len(), 3);
        assert!(cleaned.windows(2).all(|w| w[0].time < w[1].time));
    }

    #[test]
    fn clean_drops_inconsistent_ohlc() {
        let candles = vec![
            Candle::new(1, 10.0, 9.0, 8.0, 9.5, 1.0),
            Candle::new(2, 10.0, 11.0, 9.0, 10.5, -1.0),
            Candle::new(3, 10.0, 11.0, 9.0, 10.5, 1.0),
        ];

        let cleaned = clean(candles);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].time, 3);
    }

    #[test]
    fn replace_bumps_revision() {
        let mut series = CandleSeries::new(candles_from_closes(&[1.0, 2.0]));
        let before = series.revision();
        series.replace(candles_from_closes(&[1.0, 2.0, 3.0]));

        assert_ne!(before, series.revision());
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn fractional_index_interpolates_and_extrapolates() {
        let series = CandleSeries::new(candles_from_closes(&[1.0, 2.0, 3.0]));

        assert_eq!(series.fractional_index(120_000), Some(1.0));
        assert_eq!(series.fractional_index(150_000), Some(1.5));
        assert_eq!(series.fractional_index(240_000), Some(3.0));
        assert_eq!(series.time_at(1.5), Some(150_000));
        assert_eq!(series.time_at(3.0), Some(240_000));
    }
}

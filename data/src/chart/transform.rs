use super::candle::Candle;

/// تبدیل کندل‌ها به هیکن‌آشی
///
/// هر کندل به کندل قبلی وابسته است، پس تبدیل همیشه روی کل سری انجام می‌شود
/// تا نتیجه هنگام جابجایی نمودار ثابت بماند.
pub fn heikin_ashi(candles: &[Candle]) -> Vec<Candle> {
    let mut out: Vec<Candle> = Vec::with_capacity(candles.len());

    for candle in candles {
        let ha_close = (candle.open + candle.high + candle.low + candle.close) / 4.0;
        let ha_open = match out.last() {
            Some(prev) => (prev.open + prev.close) / 2.0,
            None => (candle.open + candle.close) / 2.0,
        };

        out.push(Candle {
            time: candle.time,
            open: ha_open,
            high: candle.high.max(ha_open).max(ha_close),
            low: candle.low.min(ha_open).min(ha_close),
            close: ha_close,
            volume: candle.volume,
        });
    }
    out
}

/// یک آجر رنکو که به ستون کندل مربوطه در بازه قابل مشاهده تعلق دارد
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brick {
    pub index: usize, // ایندکس کندل در بازه قابل مشاهده
    pub open: f64,
    pub close: f64,
}

impl Brick {
    pub fn is_up(&self) -> bool {
        self.close > self.open
    }
}

/// اندازه آجر: یک درصد از محدوده قیمت قابل مشاهده
pub fn renko_brick_size(visible: &[Candle]) -> Option<f64> {
    let high = visible.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let low = visible.iter().map(|c| c.low).fold(f64::MAX, f64::min);

    let size = (high - low) * 0.01;
    (size.is_finite() && size > 0.0).then_some(size)
}

/// کوانتیزه کردن قیمت‌های بسته شدن به آجرهای هم‌اندازه
///
/// آجرها در ستون کندلی رسم می‌شوند که باعث ایجادشان شده است (زمان نادیده گرفته نمی‌شود).
pub fn renko(visible: &[Candle], brick_size: f64) -> Vec<Brick> {
    let Some(first) = visible.first() else {
        return vec![];
    };
    if !(brick_size.is_finite() && brick_size > 0.0) {
        return vec![];
    }

    let mut bricks = Vec::new();
    let mut last = (first.close / brick_size).floor() * brick_size;

    for (index, candle) in visible.iter().enumerate() {
        while candle.close >= last + brick_size {
            bricks.push(Brick {
                index,
                open: last,
                close: last + brick_size,
            });
            last += brick_size;
        }
        while candle.close <= last - brick_size {
            bricks.push(Brick {
                index,
                open: last,
                close: last - brick_size,
            });
            last -= brick_size;
        }
    }
    bricks
}

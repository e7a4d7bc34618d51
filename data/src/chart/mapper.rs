use iced_core::{Point, Rectangle};

use super::candle::Candle;

/// حداقل عرض هر کندل به پیکسل
pub const MIN_CANDLE_WIDTH: f32 = 2.0;
/// نسبت عرض بدنه کندل به فاصله دو کندل (۲۰٪ فاصله خالی)
pub const CANDLE_BODY_RATIO: f32 = 0.8;
/// حاشیه بالا و پایین محدوده قیمت
pub const PRICE_BUFFER: f64 = 0.1;

/// محدوده قیمت (یا مقدار) قابل نمایش روی محور عمودی
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    /// محدوده بدون حاشیه؛ محدوده صفر کمی باز می‌شود تا تقسیم بر صفر رخ ندهد
    pub fn new(min: f64, max: f64) -> Self {
        if max > min {
            Self { min, max }
        } else {
            let pad = if min.abs() > 0.0 { min.abs() * 0.01 } else { 1.0 };
            Self {
                min: min - pad,
                max: max + pad,
            }
        }
    }

    /// محدوده بالاترین/پایین‌ترین قیمت کندل‌ها با ۱۰٪ حاشیه در هر طرف
    pub fn of_candles(candles: &[Candle]) -> Option<Self> {
        if candles.is_empty() {
            return None;
        }

        let high = candles.iter().map(|c| c.high).fold(f64::MIN, f64::max);
        let low = candles.iter().map(|c| c.low).fold(f64::MAX, f64::min);

        Some(Self::new(low, high).buffered(PRICE_BUFFER))
    }

    pub fn buffered(self, ratio: f64) -> Self {
        let pad = (self.max - self.min) * ratio;
        Self {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// نگاشت بین فضای داده (ایندکس کندل، قیمت) و فضای پیکسلی یک پنل
///
/// مرکز کندل‌ها با فاصله یکسان چیده می‌شوند و فاصله زمانی واقعی بین کندل‌ها
/// (تعطیلات، آخر هفته) فشرده نمی‌شود.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mapper {
    pub area: Rectangle,
    pub visible_count: usize,
    pub range: PriceRange,
}

impl Mapper {
    pub fn new(area: Rectangle, visible_count: usize, range: PriceRange) -> Self {
        Self {
            area,
            visible_count: visible_count.max(1),
            range,
        }
    }

    /// فاصله افقی بین مرکز دو کندل متوالی
    pub fn step(&self) -> f32 {
        self.area.width / self.visible_count as f32
    }

    pub fn candle_width(&self) -> f32 {
        (self.step() * CANDLE_BODY_RATIO).max(MIN_CANDLE_WIDTH)
    }

    /// مختصات x مرکز کندل با ایندکس داده شده (نسبت به ابتدای بازه قابل مشاهده)
    pub fn x(&self, index: usize) -> f32 {
        self.x_fractional(index as f64)
    }

    pub fn x_fractional(&self, index: f64) -> f32 {
        self.area.x + ((index + 0.5) as f32) * self.step()
    }

    pub fn y(&self, price: f64) -> f32 {
        let ratio = (self.range.max - price) / self.range.span();
        self.area.y + (ratio as f32) * self.area.height
    }

    /// ایندکس کندل زیر مختصات x (گرد به پایین و محدود به بازه قابل مشاهده)
    pub fn index_at(&self, x: f32) -> usize {
        let raw = ((x - self.area.x) / self.step()).floor();
        if raw <= 0.0 {
            0
        } else {
            (raw as usize).min(self.visible_count - 1)
        }
    }

    /// ایندکس کسری بدون محدودیت (عکس `x_fractional`)
    pub fn fractional_index_at(&self, x: f32) -> f64 {
        f64::from((x - self.area.x) / self.step()) - 0.5
    }

    pub fn price_at(&self, y: f32) -> f64 {
        let ratio = f64::from((y - self.area.y) / self.area.height);
        self.range.max - ratio * self.range.span()
    }

    /// اندازه یک پیکسل عمودی بر حسب قیمت
    pub fn price_per_pixel(&self) -> f64 {
        self.range.span() / f64::from(self.area.height)
    }

    pub fn point(&self, index: usize, price: f64) -> Point {
        Point::new(self.x(index), self.y(price))
    }

    pub fn contains(&self, point: Point) -> bool {
        self.area.contains(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::candle::tests::candles_from_closes;
    use iced_core::Size;

    fn mapper() -> Mapper {
        let candles = candles_from_closes(&[100.0, 110.0, 105.0, 120.0, 115.0]);
        let range = PriceRange::of_candles(&candles).expect("range");
        Mapper::new(
            Rectangle::new(Point::new(10.0, 20.0), Size::new(500.0, 300.0)),
            5,
            range,
        )
    }

    #[test]
    fn range_is_buffered_ten_percent() {
        let candles = candles_from_closes(&[100.0, 110.0]);
        // low = 99, high = 111
        let range = PriceRange::of_candles(&candles).expect("range");

        assert!((range.min - (99.0 - 1.2)).abs() < 1e-9);
        assert!((range.max - (111.0 + 1.2)).abs() < 1e-9);
    }

    #[test]
    fn flat_range_is_widened() {
        let range = PriceRange::new(50.0, 50.0);
        assert!(range.span() > 0.0);
    }

    #[test]
    fn candle_centres_are_evenly_spaced() {
        let mapper = mapper();

        assert_eq!(mapper.x(0), 60.0);
        assert_eq!(mapper.x(4), 460.0);
        assert_eq!(mapper.candle_width(), 80.0);
    }

    #[test]
    fn candle_width_has_floor() {
        let mapper = Mapper::new(
            Rectangle::new(Point::ORIGIN, Size::new(100.0, 100.0)),
            500,
            PriceRange::new(0.0, 1.0),
        );
        assert_eq!(mapper.candle_width(), MIN_CANDLE_WIDTH);
    }

    #[test]
    fn y_increases_downward() {
        let mapper = mapper();

        assert!(mapper.y(120.0) < mapper.y(100.0));
        assert!((mapper.y(mapper.range.max) - 20.0).abs() < 1e-4);
        assert!((mapper.y(mapper.range.min) - 320.0).abs() < 1e-3);
    }

    #[test]
    fn pixel_round_trip() {
        let mapper = mapper();

        for index in 0..5 {
            for price in [100.0, 107.3, 119.9] {
                let point = mapper.point(index, price);

                let back_index = mapper.index_at(point.x);
                assert!(back_index.abs_diff(index) <= 1);

                let back_price = mapper.price_at(point.y);
                assert!((back_price - price).abs() <= mapper.price_per_pixel());
            }
        }
    }

    #[test]
    fn index_is_clamped() {
        let mapper = mapper();

        assert_eq!(mapper.index_at(-100.0), 0);
        assert_eq!(mapper.index_at(5_000.0), 4);
    }
}

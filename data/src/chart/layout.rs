use iced_core::{Point, Rectangle, Size};

/// عرض ستون قیمت در سمت راست
pub const PRICE_GUTTER: f32 = 68.0;
/// ارتفاع محور زمان در پایین نمودار
pub const TIME_AXIS_HEIGHT: f32 = 24.0;
/// فاصله بالای پنل قیمت
pub const TOP_PADDING: f32 = 8.0;

const VOLUME_SPLIT: f32 = 0.15;
const OSCILLATOR_SPLIT: f32 = 0.2;
const MIN_MAIN_SPLIT: f32 = 0.4;
const PANEL_GAP: f32 = 4.0;

/// پنلی که یک نقطه در آن قرار دارد
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Price,
    Volume,
    Oscillator(usize),
    Gutter,
    TimeAxis,
}

impl Panel {
    /// پنل‌های ناحیه رسم (بدون ستون قیمت و محور زمان)
    pub fn is_plot(&self) -> bool {
        matches!(self, Panel::Price | Panel::Volume | Panel::Oscillator(_))
    }
}

/// چیدمان پنل‌های نمودار: قیمت، حجم، اسیلاتورها، ستون قیمت و محور زمان
#[derive(Debug, Clone, PartialEq)]
pub struct PanelLayout {
    pub bounds: Size,
    pub price: Rectangle,
    pub volume: Option<Rectangle>,
    pub oscillators: Vec<Rectangle>,
    pub gutter: Rectangle,
    pub time_axis: Rectangle,
}

impl PanelLayout {
    /// برای ابعاد صفر یا خیلی کوچک `None` برمی‌گرداند؛ در این حالت چیزی رسم نمی‌شود
    pub fn new(bounds: Size, show_volume: bool, oscillators: usize) -> Option<Self> {
        let plot_width = bounds.width - PRICE_GUTTER;
        let plot_height = bounds.height - TIME_AXIS_HEIGHT - TOP_PADDING;

        if !(plot_width > 0.0 && plot_height > 0.0) {
            return None;
        }

        let splits = calc_splits(show_volume, oscillators);

        let mut y = TOP_PADDING;
        let mut panel = |fraction: f32, gap: f32| {
            let height = (plot_height * fraction - gap).max(1.0);
            let rect = Rectangle::new(Point::new(0.0, y + gap), Size::new(plot_width, height));
            y += plot_height * fraction;
            rect
        };

        let price = panel(splits.main, 0.0);
        let volume = show_volume.then(|| panel(splits.volume, PANEL_GAP));
        let oscillators = (0..oscillators)
            .map(|_| panel(splits.oscillator, PANEL_GAP))
            .collect();

        Some(Self {
            bounds,
            price,
            volume,
            oscillators,
            gutter: Rectangle::new(
                Point::new(plot_width, 0.0),
                Size::new(PRICE_GUTTER, bounds.height - TIME_AXIS_HEIGHT),
            ),
            time_axis: Rectangle::new(
                Point::new(0.0, bounds.height - TIME_AXIS_HEIGHT),
                Size::new(bounds.width, TIME_AXIS_HEIGHT),
            ),
        })
    }

    /// ناحیه کامل رسم (همه پنل‌ها بدون ستون قیمت و محور زمان)
    pub fn plot(&self) -> Rectangle {
        Rectangle::new(Point::ORIGIN, Size::new(self.gutter.x, self.time_axis.y))
    }

    /// پنلی که نقطه در آن است؛ فاصله بین پنل‌ها به هیچ پنلی تعلق ندارد
    pub fn panel_at(&self, point: Point) -> Option<Panel> {
        if self.price.contains(point) {
            return Some(Panel::Price);
        }
        if self.volume.is_some_and(|rect| rect.contains(point)) {
            return Some(Panel::Volume);
        }
        if let Some(index) = self.oscillators.iter().position(|r| r.contains(point)) {
            return Some(Panel::Oscillator(index));
        }
        if self.gutter.contains(point) {
            return Some(Panel::Gutter);
        }
        if self.time_axis.contains(point) {
            return Some(Panel::TimeAxis);
        }
        None
    }
}

struct Splits {
    main: f32,
    volume: f32,
    oscillator: f32,
}

/// سهم هر پنل از ارتفاع؛ پنل قیمت هیچ‌وقت کمتر از `MIN_MAIN_SPLIT` نمی‌شود
fn calc_splits(show_volume: bool, oscillators: usize) -> Splits {
    let volume = if show_volume { VOLUME_SPLIT } else { 0.0 };
    let oscillator_total = oscillators as f32 * OSCILLATOR_SPLIT;
    let sub_total = volume + oscillator_total;

    let scale = if sub_total > 1.0 - MIN_MAIN_SPLIT {
        (1.0 - MIN_MAIN_SPLIT) / sub_total
    } else {
        1.0
    };

    Splits {
        main: 1.0 - sub_total * scale,
        volume: volume * scale,
        oscillator: OSCILLATOR_SPLIT * scale,
    }
}

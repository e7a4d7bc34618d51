pub mod candle;
pub mod drawing;
pub mod indicator;
pub mod interaction;
pub mod layout;
pub mod mapper;
pub mod transform;
pub mod viewport;

use std::fmt;

use iced_core::{Point, Size};
use serde::{Deserialize, Serialize};

use crate::config::settings::ChartSettings;
use crate::storage::Storage;
use candle::{Candle, CandleSeries};
use drawing::{Anchor, DrawingManager};
use indicator::IndicatorCache;
use interaction::Hover;
use layout::PanelLayout;
use mapper::{Mapper, PriceRange};
use viewport::Viewport;

/// نوع نمایش سری اصلی
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    #[default]
    Candlestick,
    Ohlc,
    Line,
    Area,
    HeikinAshi,
    Renko,
}

impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        ChartKind::Candlestick,
        ChartKind::Ohlc,
        ChartKind::Line,
        ChartKind::Area,
        ChartKind::HeikinAshi,
        ChartKind::Renko,
    ];
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChartKind::Candlestick => "Candlestick",
            ChartKind::Ohlc => "OHLC Bars",
            ChartKind::Line => "Line",
            ChartKind::Area => "Area",
            ChartKind::HeikinAshi => "Heikin-Ashi",
            ChartKind::Renko => "Renko",
        };
        write!(f, "{name}")
    }
}

/// وضعیت کامل یک نمودار: داده‌ها، نما، ترسیم‌ها و تنظیمات یک نماد
///
/// انبار در اختیار برنامه میزبان است و هنگام هر تغییر ماندگار به متدها داده می‌شود.
pub struct ChartState {
    symbol: String,
    series: CandleSeries,
    heikin_ashi: Vec<Candle>,
    pub settings: ChartSettings,
    pub viewport: Viewport,
    pub drawings: DrawingManager,
    indicators: IndicatorCache,
    bounds: Size,
    hover: Option<Hover>,
}

impl ChartState {
    /// ساخت نمودار یک نماد با تنظیمات و ترسیم‌های ذخیره‌شده آن
    pub fn new(symbol: &str, store: &dyn Storage) -> Self {
        let settings = ChartSettings::load(store, symbol);
        let drawings = DrawingManager::load(store, symbol);

        Self {
            symbol: symbol.to_string(),
            series: CandleSeries::default(),
            heikin_ashi: vec![],
            settings,
            viewport: Viewport::default(),
            drawings,
            indicators: IndicatorCache::default(),
            bounds: Size::ZERO,
            hover: None,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn series(&self) -> &CandleSeries {
        &self.series
    }

    pub fn candles(&self) -> &[Candle] {
        self.series.as_slice()
    }

    pub fn indicators(&self) -> &IndicatorCache {
        &self.indicators
    }

    pub fn hover(&self) -> Option<Hover> {
        self.hover
    }

    pub fn bounds(&self) -> Size {
        self.bounds
    }

    /// جایگزینی داده‌های کندل (پس از پاک‌سازی)
    ///
    /// نما فقط در اولین بارگذاری به آخرین کندل‌ها منتقل می‌شود.
    pub fn set_candles(&mut self, candles: impl IntoIterator<Item = Candle>) {
        self.series.replace(candles);
        self.heikin_ashi = transform::heikin_ashi(self.series.as_slice());
        self.viewport.on_data(self.series.len());
        self.refresh_indicators();

        log::info!(
            "Loaded {} candle(s) for {} (revision {})",
            self.series.len(),
            self.symbol,
            self.series.revision()
        );
    }

    /// تعویض نماد: ترسیم‌ها و تنظیمات نماد جدید از انبار خوانده می‌شوند
    pub fn switch_symbol(
        &mut self,
        symbol: &str,
        candles: impl IntoIterator<Item = Candle>,
        store: &dyn Storage,
    ) {
        log::info!("Switching chart from {} to {symbol}", self.symbol);

        self.symbol = symbol.to_string();
        self.settings = ChartSettings::load(store, symbol);
        self.drawings.switch_symbol(store, symbol);
        self.hover = None;

        self.series.replace(candles);
        self.heikin_ashi = transform::heikin_ashi(self.series.as_slice());
        self.viewport.remount(self.series.len());
        self.refresh_indicators();
    }

    pub fn save_settings(&self, store: &mut dyn Storage) -> bool {
        self.settings.save(store, &self.symbol)
    }

    pub fn save_drawings(&self, store: &mut dyn Storage) -> bool {
        self.drawings.save(store)
    }

    /// پس از تغییر تنظیمات اندیکاتورها فراخوانی می‌شود
    pub fn refresh_indicators(&mut self) {
        self.indicators.refresh(&self.series, &self.settings.indicators);
    }

    pub fn set_kind(&mut self, kind: ChartKind) {
        self.settings.kind = kind;
    }

    /// تغییر اندازه ناحیه رسم؛ اندازه صفر نادیده گرفته می‌شود
    pub fn resize(&mut self, bounds: Size) -> bool {
        if bounds.width <= 0.0 || bounds.height <= 0.0 || bounds == self.bounds {
            return false;
        }
        self.bounds = bounds;
        true
    }

    /// کندل‌هایی که با نوع نمایش فعلی رسم می‌شوند (هیکن‌آشی یا کندل واقعی)
    pub fn display_candles(&self) -> &[Candle] {
        match self.settings.kind {
            ChartKind::HeikinAshi => &self.heikin_ashi,
            _ => self.series.as_slice(),
        }
    }

    /// بخش قابل مشاهده کندل‌های نمایشی
    pub fn visible(&self) -> &[Candle] {
        let candles = self.display_candles();
        let range = self.viewport.visible_range();

        candles.get(range).unwrap_or(&[])
    }

    pub fn panel_layout(&self) -> Option<PanelLayout> {
        PanelLayout::new(
            self.bounds,
            self.settings.show_volume,
            self.settings.oscillator_count(),
        )
    }

    /// نگاشت مختصات پنل قیمت؛ بدون داده یا اندازه معتبر `None` است
    pub fn mapper(&self) -> Option<Mapper> {
        let layout = self.panel_layout()?;
        self.price_mapper(&layout)
    }

    pub fn price_mapper(&self, layout: &PanelLayout) -> Option<Mapper> {
        let visible = self.visible();
        let range = PriceRange::of_candles(visible)?;

        Some(Mapper::new(layout.price, visible.len(), range))
    }

    /// تبدیل نقطه پیکسلی پنل قیمت به نقطه داده (زمان و قیمت)
    pub fn anchor_at(&self, mapper: &Mapper, point: Point) -> Option<Anchor> {
        let index = self.viewport.view_start() as f64 + mapper.fractional_index_at(point.x);
        let time = self.series.time_at(index)?;

        Some(Anchor::new(time, mapper.price_at(point.y)))
    }

    /// تبدیل نقطه داده به مختصات پیکسلی پنل قیمت
    pub fn project(&self, mapper: &Mapper, anchor: Anchor) -> Option<Point> {
        interaction::project_with(&self.series, self.viewport.view_start(), mapper, anchor)
    }

    /// فاصله زمانی معمول بین کندل‌ها (برای قالب‌بندی برچسب‌ها)
    pub fn interval_ms(&self) -> u64 {
        let candles = self.series.as_slice();
        match candles {
            [.., a, b] => b.time - a.time,
            _ => 60_000,
        }
    }
}

use data::chart::ChartState;
use data::chart::candle::Candle;
use data::chart::layout::PanelLayout;
use data::chart::mapper::Mapper;
use data::config::theme::ChartPalette;
use data::{UserTimezone, util};
use iced::{Point, Rectangle, Size};

use super::painter::{Anchor, Layer, Line, Painter, text_width};
use super::{annotation, overlay, series};

/// فاصله تقریبی خطوط افقی شبکه (پیکسل)
const GRID_ROW_HEIGHT: f32 = 30.0;
/// تعداد خطوط عمودی شبکه
const GRID_COLUMNS: usize = 10;
const TAG_HEIGHT: f32 = 18.0;

/// داده‌های مشترک یک فریم که بین لایه‌ها دست‌به‌دست می‌شود
pub struct Scene<'a> {
    pub chart: &'a ChartState,
    pub palette: ChartPalette,
    pub timezone: UserTimezone,
    pub layout: PanelLayout,
    /// بدون داده `None` است و فقط پس‌زمینه رسم می‌شود
    pub mapper: Option<Mapper>,
    pub price_step: f64,
    pub decimals: usize,
}

impl<'a> Scene<'a> {
    pub fn new(chart: &'a ChartState, timezone: UserTimezone) -> Option<Self> {
        let layout = chart.panel_layout()?;
        let mapper = chart.price_mapper(&layout);

        let rows = (layout.price.height / GRID_ROW_HEIGHT).floor().max(2.0) as usize;
        let price_step = mapper.map_or(1.0, |mapper| util::nice_step(mapper.range.span(), rows));

        Some(Self {
            chart,
            palette: chart.settings.theme.palette(),
            timezone,
            layout,
            mapper,
            price_step,
            decimals: util::decimals_for_step(price_step),
        })
    }

    pub fn visible(&self) -> &'a [Candle] {
        self.chart.visible()
    }

    /// ستون یک زمان در بازه قابل مشاهده
    pub fn column_of(&self, time: u64) -> Option<usize> {
        let index = self.chart.series().index_of(time)?;
        index
            .checked_sub(self.chart.viewport.view_start())
            .filter(|column| *column < self.visible().len())
    }

    pub fn opacity(&self) -> f32 {
        self.chart.settings.opacity
    }

    pub fn candle_color(&self, candle: &Candle) -> iced::Color {
        if candle.is_bullish() {
            self.palette.bullish
        } else {
            self.palette.bearish
        }
    }

    pub fn format_price(&self, price: f64) -> String {
        util::format_price(price, self.decimals)
    }
}

/// لایه‌های ۱ تا ۸ (کش اصلی)
pub fn paint_main(scene: &Scene, painter: &mut dyn Painter) {
    for layer in Layer::MAIN {
        paint_layer(scene, layer, painter);
    }
}

/// لایه‌های ۹ و ۱۰ (کش رویی که با هر حرکت نشانگر دوباره ساخته می‌شود)
pub fn paint_overlay(scene: &Scene, painter: &mut dyn Painter) {
    for layer in Layer::OVERLAY {
        paint_layer(scene, layer, painter);
    }
}

fn paint_layer(scene: &Scene, layer: Layer, painter: &mut dyn Painter) {
    painter.layer(layer);

    if layer == Layer::Background {
        let bounds = scene.layout.bounds;
        painter.fill_rect(
            Rectangle::new(Point::ORIGIN, bounds),
            scene.palette.background,
        );
        return;
    }

    let Some(mapper) = scene.mapper else {
        return;
    };

    match layer {
        Layer::Background => {}
        Layer::Grid => {
            if scene.chart.settings.show_grid {
                grid(scene, &mapper, painter);
            }
        }
        Layer::PriceScale => price_scale(scene, &mapper, painter),
        Layer::Overlays => overlay::overlays(scene, &mapper, painter),
        Layer::Series => series::primary(scene, &mapper, painter),
        Layer::Volume => series::volume(scene, &mapper, painter),
        Layer::Oscillators => overlay::oscillators(scene, &mapper, painter),
        Layer::Drawings => annotation::drawings(scene, &mapper, painter),
        Layer::Pending => annotation::pending(scene, &mapper, painter),
        Layer::Crosshair => crosshair(scene, &mapper, painter),
    }
}

/// قیمت‌های خطوط افقی شبکه در محدوده پنل قیمت
fn price_levels(scene: &Scene, mapper: &Mapper) -> Vec<f64> {
    let step = scene.price_step;
    let mut price = util::round_to_next_step(mapper.range.min, step, false);
    let mut levels = vec![];

    while price <= mapper.range.max && levels.len() < 64 {
        levels.push(price);
        price += step;
    }
    levels
}

/// ستون‌های خطوط عمودی شبکه و برچسب‌های زمان
fn time_columns(scene: &Scene) -> Vec<usize> {
    let count = scene.visible().len();
    let every = count.div_ceil(GRID_COLUMNS).max(1);

    (0..count).step_by(every).collect()
}

fn grid(scene: &Scene, mapper: &Mapper, painter: &mut dyn Painter) {
    let plot = scene.layout.plot();
    let line = Line::solid(scene.palette.grid, 1.0);

    for price in price_levels(scene, mapper) {
        let y = mapper.y(price);
        painter.line(
            Point::new(plot.x, y),
            Point::new(plot.x + plot.width, y),
            line,
        );
    }

    for column in time_columns(scene) {
        let x = mapper.x(column);
        painter.line(Point::new(x, plot.y), Point::new(x, plot.y + plot.height), line);
    }
}

fn price_scale(scene: &Scene, mapper: &Mapper, painter: &mut dyn Painter) {
    let palette = &scene.palette;
    let layout = &scene.layout;

    painter.fill_rect(layout.gutter, palette.gutter);
    painter.fill_rect(layout.time_axis, palette.gutter);

    let border = Line::solid(palette.grid, 1.0);
    painter.line(
        layout.gutter.position(),
        Point::new(layout.gutter.x, layout.time_axis.y),
        border,
    );
    painter.line(
        layout.time_axis.position(),
        Point::new(
            layout.time_axis.x + layout.time_axis.width,
            layout.time_axis.y,
        ),
        border,
    );

    let label_x = layout.gutter.x + 6.0;
    for price in price_levels(scene, mapper) {
        painter.text(
            &scene.format_price(price),
            Point::new(label_x, mapper.y(price)),
            palette.weak_text,
            Anchor::Left,
        );
    }

    let visible = scene.visible();
    let interval = scene.chart.interval_ms();
    let label_y = layout.time_axis.y + layout.time_axis.height / 2.0;

    for column in time_columns(scene) {
        if let Some(candle) = visible.get(column) {
            painter.text(
                &scene.timezone.format_axis_label(candle.time, interval),
                Point::new(mapper.x(column), label_y),
                palette.weak_text,
                Anchor::Center,
            );
        }
    }

    if let Some(last) = scene.chart.series().last() {
        let y = mapper.y(last.close);
        let price = layout.price;

        if y >= price.y && y <= price.y + price.height {
            let color = scene.candle_color(last);
            painter.line(
                Point::new(price.x, y),
                Point::new(price.x + price.width, y),
                Line::dashed(color.scale_alpha(0.6), 1.0),
            );
            price_tag(scene, y, &scene.format_price(last.close), color, painter);
        }
    }
}

/// برچسب رنگی قیمت در ستون قیمت با یک مثلث اشاره‌گر
pub fn price_tag(
    scene: &Scene,
    y: f32,
    label: &str,
    color: iced::Color,
    painter: &mut dyn Painter,
) {
    let gutter = scene.layout.gutter;
    let half = TAG_HEIGHT / 2.0;
    let pointer = 5.0;

    painter.fill_polygon(
        &[
            Point::new(gutter.x, y),
            Point::new(gutter.x + pointer, y - half),
            Point::new(gutter.x + pointer, y + half),
        ],
        color,
    );
    painter.fill_rect(
        Rectangle::new(
            Point::new(gutter.x + pointer, y - half),
            Size::new(gutter.width - pointer, TAG_HEIGHT),
        ),
        color,
    );
    painter.text(
        label,
        Point::new(gutter.x + pointer + 2.0, y),
        scene.palette.background,
        Anchor::Left,
    );
}

fn crosshair(scene: &Scene, mapper: &Mapper, painter: &mut dyn Painter) {
    let chart = scene.chart;
    if !chart.settings.show_crosshair || chart.drawings.tool().is_drawing() {
        return;
    }
    let Some(hover) = chart.hover().filter(|hover| hover.visible) else {
        return;
    };

    let palette = &scene.palette;
    let layout = &scene.layout;
    let plot = layout.plot();

    let column = mapper.index_at(hover.x);
    let x = mapper.x(column);
    let line = Line::dashed(palette.crosshair, 1.0);

    painter.line(Point::new(x, plot.y), Point::new(x, plot.y + plot.height), line);
    painter.line(
        Point::new(plot.x, hover.y),
        Point::new(plot.x + plot.width, hover.y),
        line,
    );

    if layout.price.contains(Point::new(layout.price.x, hover.y)) {
        price_tag(
            scene,
            hover.y,
            &scene.format_price(hover.price),
            palette.crosshair.scale_alpha(1.6),
            painter,
        );
    }

    let time_label = scene
        .timezone
        .format_crosshair(hover.time, chart.interval_ms());
    let width = text_width(&time_label) + 12.0;
    let axis = layout.time_axis;
    let left = (x - width / 2.0).clamp(axis.x, (axis.x + axis.width - width).max(axis.x));

    painter.fill_rect(
        Rectangle::new(Point::new(left, axis.y), Size::new(width, axis.height)),
        palette.crosshair.scale_alpha(1.6),
    );
    painter.text(
        &time_label,
        Point::new(left + width / 2.0, axis.y + axis.height / 2.0),
        palette.background,
        Anchor::Center,
    );

    if let Some(candle) = chart
        .series()
        .index_of(hover.time)
        .and_then(|index| chart.candles().get(index))
    {
        let change = if candle.open == 0.0 {
            0.0
        } else {
            (candle.close - candle.open) / candle.open * 100.0
        };
        let summary = format!(
            "O {}  H {}  L {}  C {}  {}  V {}",
            scene.format_price(candle.open),
            scene.format_price(candle.high),
            scene.format_price(candle.low),
            scene.format_price(candle.close),
            util::pct_change(change),
            util::abbr_large_numbers(candle.volume),
        );

        painter.text(
            &summary,
            Point::new(layout.price.x + 8.0, layout.price.y + 8.0),
            scene.candle_color(candle),
            Anchor::Left,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::painter::recording::{Op, Recorder};
    use data::MemoryStore;
    use data::chart::ChartKind;
    use data::chart::candle::Candle;
    use data::chart::drawing::{DrawingKind, ToolMode};
    use data::chart::indicator::{IndicatorId, IndicatorSpec};
    use data::chart::interaction::Input;

    fn candles(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let base = 100.0 + (i % 13) as f64;
                let close = if i % 2 == 0 { base + 1.5 } else { base - 1.5 };
                Candle::new(
                    1_700_000_000_000 + i as u64 * 60_000,
                    base,
                    base + 3.0,
                    base - 3.0,
                    close,
                    1_000.0 + i as f64,
                )
            })
            .collect()
    }

    fn chart(n: usize) -> (ChartState, MemoryStore) {
        let store = MemoryStore::new();
        let mut chart = ChartState::new("USDAFN", &store);
        chart.resize(Size::new(900.0, 600.0));
        chart.set_candles(candles(n));
        (chart, store)
    }

    fn record(chart: &ChartState) -> Recorder {
        let scene = Scene::new(chart, UserTimezone::Utc).expect("scene");
        let mut recorder = Recorder::default();
        paint_main(&scene, &mut recorder);
        paint_overlay(&scene, &mut recorder);
        recorder
    }

    #[test]
    fn layers_are_painted_in_fixed_order() {
        let (mut chart, mut store) = chart(200);
        chart.settings.indicators = vec![
            IndicatorSpec::from(IndicatorId::Bollinger),
            IndicatorSpec::from(IndicatorId::Rsi),
        ];
        chart.refresh_indicators();

        chart.set_tool(ToolMode::Draw(DrawingKind::Line));
        chart.handle(Input::PointerDown(Point::new(100.0, 100.0)), &mut store);
        chart.handle(Input::PointerMove(Point::new(300.0, 150.0)), &mut store);
        chart.handle(Input::PointerUp(Point::new(300.0, 150.0)), &mut store);
        chart.handle(Input::PointerDown(Point::new(400.0, 120.0)), &mut store);
        chart.handle(Input::PointerMove(Point::new(480.0, 170.0)), &mut store);
        assert_eq!(chart.drawings.drawings().len(), 1);
        assert!(chart.drawings.pending().is_some());

        let recorder = record(&chart);

        assert_eq!(
            recorder.layers,
            vec![
                Layer::Background,
                Layer::Grid,
                Layer::PriceScale,
                Layer::Overlays,
                Layer::Series,
                Layer::Volume,
                Layer::Oscillators,
                Layer::Drawings,
                Layer::Pending,
                Layer::Crosshair,
            ]
        );
        let drawn = recorder.drawn_layers();
        assert!(drawn.windows(2).all(|pair| pair[0] < pair[1]));
        for layer in Layer::MAIN.iter().chain(&Layer::OVERLAY[..1]) {
            assert!(drawn.contains(layer), "{layer:?} drew nothing");
        }
    }

    #[test]
    fn empty_series_paints_only_background() {
        let (chart, _) = chart(0);
        let recorder = record(&chart);

        assert_eq!(recorder.drawn_layers(), vec![Layer::Background]);
        assert_eq!(recorder.layers.len(), 10);
    }

    #[test]
    fn zero_size_has_no_scene() {
        let store = MemoryStore::new();
        let chart = ChartState::new("USDAFN", &store);

        assert!(Scene::new(&chart, UserTimezone::Utc).is_none());
    }

    #[test]
    fn bullish_candles_are_hollow() {
        let (mut chart, _) = chart(4);
        chart.set_kind(ChartKind::Candlestick);
        let recorder = record(&chart);

        let hollow = recorder
            .ops_in(Layer::Series)
            .filter(|op| matches!(op, Op::StrokeRect(..)))
            .count();
        let filled = recorder
            .ops_in(Layer::Series)
            .filter(|op| matches!(op, Op::FillRect(..)))
            .count();

        assert_eq!(hollow, 2);
        assert_eq!(filled, 2);
    }

    #[test]
    fn crosshair_follows_hover_and_hides_while_drawing() {
        let (mut chart, mut store) = chart(120);
        chart.handle(Input::PointerMove(Point::new(200.0, 150.0)), &mut store);

        let recorder = record(&chart);
        assert!(recorder.ops_in(Layer::Crosshair).count() > 0);
        assert!(
            recorder
                .texts(Layer::Crosshair)
                .iter()
                .any(|text| text.starts_with("O "))
        );

        chart.set_tool(ToolMode::Draw(DrawingKind::Horizontal));
        let recorder = record(&chart);
        assert_eq!(recorder.ops_in(Layer::Crosshair).count(), 0);

        chart.set_tool(ToolMode::None);
        chart.handle(Input::PointerLeave, &mut store);
        let recorder = record(&chart);
        assert_eq!(recorder.ops_in(Layer::Crosshair).count(), 0);
    }

    #[test]
    fn grid_toggle_is_honoured() {
        let (mut chart, _) = chart(50);
        chart.settings.show_grid = false;

        let recorder = record(&chart);
        assert_eq!(recorder.ops_in(Layer::Grid).count(), 0);
        assert!(recorder.ops_in(Layer::PriceScale).count() > 0);
    }

    #[test]
    fn every_chart_kind_renders() {
        for kind in ChartKind::ALL {
            let (mut chart, _) = chart(80);
            chart.set_kind(kind);

            let recorder = record(&chart);
            assert!(
                recorder.ops_in(Layer::Series).count() > 0,
                "{kind} drew nothing"
            );
        }
    }

    #[test]
    fn fibonacci_labels_each_level() {
        let (mut chart, mut store) = chart(60);
        chart.set_tool(ToolMode::Draw(DrawingKind::Fibonacci));
        chart.handle(Input::PointerDown(Point::new(100.0, 300.0)), &mut store);
        chart.handle(Input::PointerMove(Point::new(400.0, 80.0)), &mut store);
        chart.handle(Input::PointerUp(Point::new(400.0, 80.0)), &mut store);
        assert_eq!(chart.drawings.drawings().len(), 1);

        let labels = record(&chart).texts(Layer::Drawings);
        assert_eq!(labels.len(), 7);
        assert!(labels[0].starts_with("0.0%"));
        assert!(labels[6].starts_with("100.0%"));
    }
}

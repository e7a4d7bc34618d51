use data::chart::ChartKind;
use data::chart::indicator::IndicatorValue;
use data::chart::mapper::Mapper;
use data::chart::transform;
use iced::{Point, Rectangle, Size};

use super::painter::{Line, Painter};
use super::render::Scene;

/// سری اصلی بر اساس نوع نمودار
pub fn primary(scene: &Scene, mapper: &Mapper, painter: &mut dyn Painter) {
    let area = mapper.area;

    painter.clipped(area, &mut |painter| match scene.chart.settings.kind {
        ChartKind::Candlestick | ChartKind::HeikinAshi => candles(scene, mapper, painter),
        ChartKind::Ohlc => ohlc_bars(scene, mapper, painter),
        ChartKind::Line => line(scene, mapper, painter, false),
        ChartKind::Area => line(scene, mapper, painter, true),
        ChartKind::Renko => renko(scene, mapper, painter),
    });
}

/// بدنه توخالی برای کندل صعودی و توپر برای کندل نزولی
fn candles(scene: &Scene, mapper: &Mapper, painter: &mut dyn Painter) {
    let width = mapper.candle_width();
    let opacity = scene.opacity();

    for (index, candle) in scene.visible().iter().enumerate() {
        let x = mapper.x(index);
        let color = scene.candle_color(candle).scale_alpha(opacity);

        let top = mapper.y(candle.open.max(candle.close));
        let bottom = mapper.y(candle.open.min(candle.close));

        if candle.is_bullish() {
            painter.line(
                Point::new(x, mapper.y(candle.high)),
                Point::new(x, top),
                Line::solid(color, 1.0),
            );
            painter.line(
                Point::new(x, bottom),
                Point::new(x, mapper.y(candle.low)),
                Line::solid(color, 1.0),
            );
            painter.stroke_rect(
                Rectangle::new(
                    Point::new(x - width / 2.0, top),
                    Size::new(width, (bottom - top).max(1.0)),
                ),
                Line::solid(color, 1.0),
            );
        } else {
            painter.line(
                Point::new(x, mapper.y(candle.high)),
                Point::new(x, mapper.y(candle.low)),
                Line::solid(color, 1.0),
            );
            painter.fill_rect(
                Rectangle::new(
                    Point::new(x - width / 2.0, top),
                    Size::new(width, (bottom - top).max(1.0)),
                ),
                color,
            );
        }
    }
}

fn ohlc_bars(scene: &Scene, mapper: &Mapper, painter: &mut dyn Painter) {
    let tick = mapper.candle_width() / 2.0;
    let opacity = scene.opacity();

    for (index, candle) in scene.visible().iter().enumerate() {
        let x = mapper.x(index);
        let stroke = Line::solid(scene.candle_color(candle).scale_alpha(opacity), 1.0);

        painter.line(
            Point::new(x, mapper.y(candle.high)),
            Point::new(x, mapper.y(candle.low)),
            stroke,
        );

        let open = mapper.y(candle.open);
        painter.line(Point::new(x - tick, open), Point::new(x, open), stroke);

        let close = mapper.y(candle.close);
        painter.line(Point::new(x, close), Point::new(x + tick, close), stroke);
    }
}

/// خط بسته شدن؛ نمودار ناحیه‌ای زیر خط را تا کف پنل با گرادیان پر می‌کند
fn line(scene: &Scene, mapper: &Mapper, painter: &mut dyn Painter, filled: bool) {
    let points: Vec<Point> = scene
        .visible()
        .iter()
        .enumerate()
        .map(|(index, candle)| mapper.point(index, candle.close))
        .collect();

    let (Some(first), Some(last)) = (points.first().copied(), points.last().copied()) else {
        return;
    };
    let color = scene.palette.accent.scale_alpha(scene.opacity());

    if filled {
        let floor = mapper.area.y + mapper.area.height;
        let top = points.iter().map(|p| p.y).fold(floor, f32::min);

        let mut polygon = points.clone();
        polygon.push(Point::new(last.x, floor));
        polygon.push(Point::new(first.x, floor));

        painter.fill_gradient(
            &polygon,
            (top, color.scale_alpha(0.4)),
            (floor, color.scale_alpha(0.02)),
        );
    }

    painter.polyline(&points, Line::solid(color, 2.0));
}

fn renko(scene: &Scene, mapper: &Mapper, painter: &mut dyn Painter) {
    let visible = scene.visible();
    let Some(brick_size) = transform::renko_brick_size(visible) else {
        return;
    };
    let width = mapper.candle_width();
    let opacity = scene.opacity();

    for brick in transform::renko(visible, brick_size) {
        let color = if brick.is_up() {
            scene.palette.bullish
        } else {
            scene.palette.bearish
        }
        .scale_alpha(opacity);

        let x = mapper.x(brick.index);
        let top = mapper.y(brick.open.max(brick.close));
        let bottom = mapper.y(brick.open.min(brick.close));
        let rect = Rectangle::new(
            Point::new(x - width / 2.0, top),
            Size::new(width, (bottom - top).max(1.0)),
        );

        painter.fill_rect(rect, color.scale_alpha(0.8));
        painter.stroke_rect(rect, Line::solid(color, 1.0));
    }
}

/// میله‌های حجم نسبت به بیشترین حجم بازه قابل مشاهده
pub fn volume(scene: &Scene, mapper: &Mapper, painter: &mut dyn Painter) {
    let Some(panel) = scene.layout.volume else {
        return;
    };
    let visible = scene.visible();

    let max_volume = visible.iter().map(|c| c.volume).fold(0.0_f64, f64::max);
    if max_volume <= 0.0 {
        return;
    }

    let floor = panel.y + panel.height;
    let height_of = |volume: f64| ((volume / max_volume) as f32 * panel.height).max(0.0);
    let width = mapper.candle_width();

    for (index, candle) in visible.iter().enumerate() {
        let height = height_of(candle.volume);
        if height <= 0.0 {
            continue;
        }
        let x = mapper.x(index);

        painter.fill_rect(
            Rectangle::new(
                Point::new(x - width / 2.0, floor - height),
                Size::new(width, height),
            ),
            scene.candle_color(candle).scale_alpha(0.5 * scene.opacity()),
        );
    }

    for (spec, series) in scene.chart.indicators().volumes() {
        let points: Vec<Point> = series
            .iter()
            .filter_map(|point| {
                let column = scene.column_of(point.time)?;
                match point.value {
                    IndicatorValue::Single(value) => {
                        Some(Point::new(mapper.x(column), floor - height_of(value)))
                    }
                    _ => None,
                }
            })
            .collect();

        painter.clipped(panel, &mut |painter| {
            painter.polyline(&points, Line::solid(spec.color, 1.5));
        });
    }
}

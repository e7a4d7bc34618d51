use data::chart::indicator::{IndicatorId, IndicatorPoint, IndicatorSpec, IndicatorValue, Placement};
use data::chart::mapper::{Mapper, PriceRange};
use data::util;
use iced::{Point, Rectangle, Size};

use super::painter::{Anchor, Line, Painter};
use super::render::Scene;

/// نقاط قابل مشاهده یک سری با مقدار انتخاب‌شده از هر نقطه
fn project(
    scene: &Scene,
    mapper: &Mapper,
    series: &[IndicatorPoint],
    value: impl Fn(&IndicatorValue) -> Option<f64>,
) -> Vec<Point> {
    series
        .iter()
        .filter_map(|point| {
            let column = scene.column_of(point.time)?;
            let value = value(&point.value)?;
            Some(mapper.point(column, value))
        })
        .collect()
}

/// اندیکاتورهای روی نمودار قیمت (پیش از سری اصلی رسم می‌شوند)
pub fn overlays(scene: &Scene, mapper: &Mapper, painter: &mut dyn Painter) {
    let indicators = scene.chart.indicators();

    painter.clipped(mapper.area, &mut |painter| {
        for (spec, series) in indicators.overlays() {
            let color = spec.color;

            if spec.id() == IndicatorId::Bollinger {
                let upper = project(scene, mapper, series, |v| match v {
                    IndicatorValue::Bands { upper, .. } => Some(*upper),
                    _ => None,
                });
                let middle = project(scene, mapper, series, |v| match v {
                    IndicatorValue::Bands { middle, .. } => Some(*middle),
                    _ => None,
                });
                let lower = project(scene, mapper, series, |v| match v {
                    IndicatorValue::Bands { lower, .. } => Some(*lower),
                    _ => None,
                });

                let band: Vec<Point> = upper.iter().chain(lower.iter().rev()).copied().collect();
                painter.fill_polygon(&band, color.scale_alpha(0.08));

                painter.polyline(&upper, Line::solid(color, 1.0));
                painter.polyline(&middle, Line::solid(color.scale_alpha(0.7), 1.0));
                painter.polyline(&lower, Line::solid(color, 1.0));
            } else {
                let points = project(scene, mapper, series, |v| match v {
                    IndicatorValue::Single(value) => Some(*value),
                    _ => None,
                });
                painter.polyline(&points, Line::solid(color, 1.5));
            }
        }
    });

    legend(scene, mapper.area, painter);
}

/// نام اندیکاتورهای روی نمودار در گوشه بالای پنل قیمت
fn legend(scene: &Scene, area: Rectangle, painter: &mut dyn Painter) {
    let mut y = area.y + 26.0;

    for (spec, _) in scene.chart.indicators().overlays() {
        painter.text(
            &spec.params.to_string(),
            Point::new(area.x + 8.0, y),
            spec.color,
            Anchor::Left,
        );
        y += 14.0;
    }
}

/// محدوده عمودی ثابت اسیلاتورها با خطوط مرجع
fn reference_levels(id: IndicatorId) -> Option<(PriceRange, [f64; 2])> {
    match id {
        IndicatorId::Rsi => Some((PriceRange::new(0.0, 100.0), [30.0, 70.0])),
        IndicatorId::Stochastic => Some((PriceRange::new(0.0, 100.0), [20.0, 80.0])),
        _ => None,
    }
}

/// یک پنل برای هر اسیلاتور فعال، به ترتیب تنظیمات
pub fn oscillators(scene: &Scene, mapper: &Mapper, painter: &mut dyn Painter) {
    let specs = scene
        .chart
        .settings
        .indicators
        .iter()
        .filter(|spec| spec.enabled && spec.placement == Placement::Oscillator);

    for (spec, panel) in specs.zip(scene.layout.oscillators.iter().copied()) {
        oscillator_panel(scene, mapper, spec, panel, painter);
    }
}

fn oscillator_panel(
    scene: &Scene,
    price_mapper: &Mapper,
    spec: &IndicatorSpec,
    panel: Rectangle,
    painter: &mut dyn Painter,
) {
    let palette = &scene.palette;

    painter.line(
        Point::new(panel.x, panel.y),
        Point::new(panel.x + panel.width, panel.y),
        Line::solid(palette.grid, 1.0),
    );
    painter.text(
        &spec.params.to_string(),
        Point::new(panel.x + 8.0, panel.y + 10.0),
        spec.color,
        Anchor::Left,
    );

    let Some(series) = scene.chart.indicators().get(spec) else {
        return;
    };
    let visible: Vec<&IndicatorPoint> = series
        .iter()
        .filter(|point| scene.column_of(point.time).is_some())
        .collect();

    let (range, references) = match reference_levels(spec.id()) {
        Some((range, levels)) => (range, levels.to_vec()),
        None => {
            if visible.is_empty() {
                return;
            }
            let (min, max) = visible
                .iter()
                .flat_map(|point| point.value.components())
                .fold((0.0_f64, 0.0_f64), |(min, max), v| (min.min(v), max.max(v)));

            (PriceRange::new(min, max).buffered(0.1), vec![0.0])
        }
    };
    let mapper = Mapper::new(panel, price_mapper.visible_count, range);

    for level in references {
        let y = mapper.y(level);
        painter.line(
            Point::new(panel.x, y),
            Point::new(panel.x + panel.width, y),
            Line::dashed(palette.weak_text.scale_alpha(0.5), 1.0),
        );
        painter.text(
            &util::format_price(level, 0),
            Point::new(scene.layout.gutter.x + 6.0, y),
            palette.weak_text,
            Anchor::Left,
        );
    }

    painter.clipped(panel, &mut |painter| match spec.id() {
        IndicatorId::Macd => {
            let zero = mapper.y(0.0);
            let width = mapper.candle_width();

            for point in &visible {
                let (Some(column), IndicatorValue::Macd { histogram, .. }) =
                    (scene.column_of(point.time), point.value)
                else {
                    continue;
                };
                let y = mapper.y(histogram);
                let color = if histogram >= 0.0 {
                    palette.bullish
                } else {
                    palette.bearish
                };

                painter.fill_rect(
                    Rectangle::new(
                        Point::new(mapper.x(column) - width / 2.0, y.min(zero)),
                        Size::new(width, (y - zero).abs().max(1.0)),
                    ),
                    color.scale_alpha(0.5),
                );
            }

            let macd = project(scene, &mapper, series, |v| match v {
                IndicatorValue::Macd { macd, .. } => Some(*macd),
                _ => None,
            });
            let signal = project(scene, &mapper, series, |v| match v {
                IndicatorValue::Macd { signal, .. } => Some(*signal),
                _ => None,
            });
            painter.polyline(&macd, Line::solid(spec.color, 1.5));
            painter.polyline(&signal, Line::solid(palette.warning, 1.5));
        }
        IndicatorId::Stochastic => {
            let k = project(scene, &mapper, series, |v| match v {
                IndicatorValue::Stochastic { k, .. } => Some(*k),
                _ => None,
            });
            let d = project(scene, &mapper, series, |v| match v {
                IndicatorValue::Stochastic { d, .. } => Some(*d),
                _ => None,
            });
            painter.polyline(&k, Line::solid(spec.color, 1.5));
            painter.polyline(&d, Line::solid(palette.warning, 1.5));
        }
        _ => {
            let points = project(scene, &mapper, series, |v| match v {
                IndicatorValue::Single(value) => Some(*value),
                _ => None,
            });
            painter.polyline(&points, Line::solid(spec.color, 1.5));
        }
    });
}

use data::chart::drawing::{Drawing, DrawingKind, DrawingStyle, FIB_LEVELS};
use data::chart::mapper::Mapper;
use iced::{Color, Point, Rectangle, Size};

use super::painter::{Anchor, Line, Painter};
use super::render::Scene;

const HANDLE_SIZE: f32 = 6.0;

/// ترسیم‌های ثبت‌شده؛ ترسیم انتخاب‌شده با رنگ متمایز و دستگیره‌های گوشه
pub fn drawings(scene: &Scene, mapper: &Mapper, painter: &mut dyn Painter) {
    let manager = &scene.chart.drawings;

    painter.clipped(mapper.area, &mut |painter| {
        for drawing in manager.drawings() {
            let selected = manager.is_selected(drawing);
            let color = if selected {
                scene.palette.selection
            } else {
                drawing.color
            };
            let line = Line {
                color: color.scale_alpha(drawing.style.opacity),
                width: drawing.style.line_width,
                dash: &drawing.style.dash,
            };

            let Some(points) = shape(scene, mapper, drawing, line, painter) else {
                continue;
            };
            if selected {
                handles(points, drawing.kind, color, painter);
            }
        }
    });
}

/// ترسیم نیمه‌کاره به صورت خط‌چین
pub fn pending(scene: &Scene, mapper: &Mapper, painter: &mut dyn Painter) {
    let manager = &scene.chart.drawings;
    let Some(pending) = manager.pending() else {
        return;
    };

    let preview = Drawing {
        id: String::new(),
        kind: pending.kind,
        start_time: pending.start.time,
        end_time: pending.end.time,
        start_price: pending.start.price,
        end_price: pending.end.price,
        color: manager.color,
        style: DrawingStyle::default(),
        fib_levels: (pending.kind == DrawingKind::Fibonacci).then(|| FIB_LEVELS.to_vec()),
        channel_width: None,
    };

    painter.clipped(mapper.area, &mut |painter| {
        shape(
            scene,
            mapper,
            &preview,
            Line::dashed(manager.color, 1.5),
            painter,
        );
    });
}

/// هندسه هر نوع ترسیم؛ نقاط لنگر پیکسلی را برمی‌گرداند
fn shape(
    scene: &Scene,
    mapper: &Mapper,
    drawing: &Drawing,
    line: Line<'_>,
    painter: &mut dyn Painter,
) -> Option<(Point, Point)> {
    let start = scene.chart.project(mapper, drawing.start())?;
    let end = scene.chart.project(mapper, drawing.end())?;
    let area = mapper.area;
    let right = area.x + area.width;

    match drawing.kind {
        DrawingKind::Line => painter.line(start, end, line),
        DrawingKind::Trendline => {
            let far = if end.x > start.x {
                let slope = (end.y - start.y) / (end.x - start.x);
                Point::new(right, start.y + slope * (right - start.x))
            } else {
                end
            };
            painter.line(start, far, line);
        }
        DrawingKind::Horizontal => {
            painter.line(
                Point::new(area.x, start.y),
                Point::new(right, start.y),
                line,
            );
            painter.text(
                &scene.format_price(drawing.start_price),
                Point::new(right - 4.0, start.y - 8.0),
                line.color,
                Anchor::Right,
            );
        }
        DrawingKind::Vertical => {
            painter.line(
                Point::new(start.x, area.y),
                Point::new(start.x, area.y + area.height),
                line,
            );
        }
        DrawingKind::Rectangle => {
            let rect = Rectangle::new(
                Point::new(start.x.min(end.x), start.y.min(end.y)),
                Size::new((end.x - start.x).abs(), (end.y - start.y).abs()),
            );
            painter.fill_rect(rect, line.color.scale_alpha(0.1));
            painter.stroke_rect(rect, line);
        }
        DrawingKind::Fibonacci => {
            let (left, right) = (start.x.min(end.x), start.x.max(end.x));

            for (level, price) in drawing.fib_prices() {
                let y = mapper.y(price);
                painter.line(Point::new(left, y), Point::new(right, y), line);
                painter.text(
                    &format!("{:.1}% ({})", level * 100.0, scene.format_price(price)),
                    Point::new(left + 4.0, y - 7.0),
                    line.color,
                    Anchor::Left,
                );
            }
        }
        DrawingKind::Channel => {
            let offset = drawing.channel_offset();
            let parallel_start = Point::new(start.x, mapper.y(drawing.start_price + offset));
            let parallel_end = Point::new(end.x, mapper.y(drawing.end_price + offset));

            painter.fill_polygon(
                &[start, end, parallel_end, parallel_start],
                line.color.scale_alpha(0.08),
            );
            painter.line(start, end, line);
            painter.line(parallel_start, parallel_end, line);
        }
    }

    Some((start, end))
}

fn handles(points: (Point, Point), kind: DrawingKind, color: Color, painter: &mut dyn Painter) {
    let corners = if kind.is_single_anchor() {
        vec![points.0]
    } else {
        vec![points.0, points.1]
    };

    for corner in corners {
        let rect = Rectangle::new(
            Point::new(corner.x - HANDLE_SIZE / 2.0, corner.y - HANDLE_SIZE / 2.0),
            Size::new(HANDLE_SIZE, HANDLE_SIZE),
        );
        painter.fill_rect(rect, Color::WHITE);
        painter.stroke_rect(rect, Line::solid(color, 1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::painter::Layer;
    use crate::chart::painter::recording::{Op, Recorder};
    use data::chart::ChartState;
    use data::chart::candle::Candle;
    use data::chart::drawing::ToolMode;
    use data::chart::interaction::{Input, Key};
    use data::{MemoryStore, UserTimezone};

    fn chart() -> (ChartState, MemoryStore) {
        let store = MemoryStore::new();
        let mut chart = ChartState::new("USDAFN", &store);
        chart.resize(Size::new(900.0, 600.0));
        chart.set_candles((0..80u32).map(|i| {
            let price = 50.0 + f64::from(i % 10);
            let time = 60_000 * (u64::from(i) + 1);
            Candle::new(time, price, price + 2.0, price - 2.0, price + 1.0, 10.0)
        }));
        (chart, store)
    }

    fn paint(chart: &ChartState, layer: fn(&Scene, &Mapper, &mut dyn Painter)) -> Recorder {
        let scene = Scene::new(chart, UserTimezone::Utc).expect("scene");
        let mapper = scene.mapper.expect("mapper");
        let mut recorder = Recorder::default();
        recorder.layer(Layer::Drawings);
        layer(&scene, &mapper, &mut recorder);
        recorder
    }

    #[test]
    fn selected_drawing_gets_handles() {
        let (mut chart, mut store) = chart();
        chart.set_tool(ToolMode::Draw(DrawingKind::Rectangle));
        chart.handle(Input::PointerDown(Point::new(120.0, 100.0)), &mut store);
        chart.handle(Input::PointerMove(Point::new(260.0, 200.0)), &mut store);
        chart.handle(Input::PointerUp(Point::new(260.0, 200.0)), &mut store);

        let selected = chart.settings.theme.palette().selection;
        let ops = paint(&chart, drawings).ops;
        let handle_strokes = ops
            .iter()
            .filter(|(_, op)| matches!(op, Op::StrokeRect(_, color) if *color == selected))
            .count();
        // کادر به همراه دو دستگیره گوشه
        assert_eq!(handle_strokes, 3);

        chart.handle(Input::Key(Key::Escape), &mut store);
        chart.handle(Input::PointerDown(Point::new(600.0, 300.0)), &mut store);
        let ops = paint(&chart, drawings).ops;
        assert!(
            ops.iter()
                .all(|(_, op)| !matches!(op, Op::StrokeRect(_, color) if *color == selected))
        );
    }

    #[test]
    fn pending_preview_is_dashed_and_transient() {
        let (mut chart, mut store) = chart();
        chart.set_tool(ToolMode::Draw(DrawingKind::Channel));
        chart.handle(Input::PointerDown(Point::new(120.0, 100.0)), &mut store);
        chart.handle(Input::PointerMove(Point::new(300.0, 160.0)), &mut store);

        let ops = paint(&chart, pending).ops;
        assert_eq!(
            ops.iter().filter(|(_, op)| matches!(op, Op::Line(..))).count(),
            2
        );

        chart.handle(Input::Key(Key::Escape), &mut store);
        assert!(paint(&chart, pending).ops.is_empty());
        assert!(chart.drawings.drawings().is_empty());
    }
}

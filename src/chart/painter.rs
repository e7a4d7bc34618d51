use iced::widget::canvas::{self, Fill, Frame, LineDash, Path, Stroke};
use iced::{Alignment, Color, Pixels, Point, Rectangle, Vector};

use crate::style;

pub const TEXT_SIZE: f32 = 11.0;

/// لایه‌های رسم به ترتیب ثابت؛ هر لایه روی لایه قبلی کشیده می‌شود
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    Background,
    Grid,
    PriceScale,
    Overlays,
    Series,
    Volume,
    Oscillators,
    Drawings,
    Pending,
    Crosshair,
}

impl Layer {
    pub const MAIN: [Layer; 8] = [
        Layer::Background,
        Layer::Grid,
        Layer::PriceScale,
        Layer::Overlays,
        Layer::Series,
        Layer::Volume,
        Layer::Oscillators,
        Layer::Drawings,
    ];

    pub const OVERLAY: [Layer; 2] = [Layer::Pending, Layer::Crosshair];
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line<'a> {
    pub color: Color,
    pub width: f32,
    pub dash: &'a [f32],
}

impl Line<'static> {
    pub fn solid(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            dash: &[],
        }
    }

    pub fn dashed(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            dash: &[4.0, 4.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Left,
    Center,
    Right,
}

/// سطح رسم دوبعدی که رندرکننده روی آن می‌کشد
///
/// پیاده‌سازی اصلی روی `canvas::Frame` است؛ تست‌ها از یک ضبط‌کننده استفاده می‌کنند.
pub trait Painter {
    /// اعلام شروع یک لایه جدید
    fn layer(&mut self, _layer: Layer) {}

    fn fill_rect(&mut self, rect: Rectangle, color: Color);

    fn stroke_rect(&mut self, rect: Rectangle, line: Line<'_>);

    fn line(&mut self, from: Point, to: Point, line: Line<'_>);

    fn polyline(&mut self, points: &[Point], line: Line<'_>);

    fn fill_polygon(&mut self, points: &[Point], color: Color);

    /// پر کردن چندضلعی با گرادیان عمودی از `top` تا `bottom`
    fn fill_gradient(&mut self, points: &[Point], top: (f32, Color), bottom: (f32, Color));

    /// متن تک‌خطی که `position` آن مرکز عمودی و لبه افقی بر اساس `anchor` است
    fn text(&mut self, content: &str, position: Point, color: Color, anchor: Anchor);

    /// رسم محدود به یک ناحیه
    fn clipped(&mut self, region: Rectangle, draw: &mut dyn FnMut(&mut dyn Painter));
}

/// تقریب عرض متن با فونت تک‌فاصله
pub fn text_width(content: &str) -> f32 {
    content.chars().count() as f32 * TEXT_SIZE * 0.62
}

pub struct FramePainter<'a> {
    frame: &'a mut Frame,
    offset: Vector,
}

impl<'a> FramePainter<'a> {
    pub fn new(frame: &'a mut Frame) -> Self {
        Self {
            frame,
            offset: Vector::ZERO,
        }
    }

    fn at(&self, point: Point) -> Point {
        point - self.offset
    }

    fn path(&self, points: &[Point], close: bool) -> Option<Path> {
        let (first, rest) = points.split_first()?;

        Some(Path::new(|builder| {
            builder.move_to(self.at(*first));
            for point in rest {
                builder.line_to(self.at(*point));
            }
            if close {
                builder.close();
            }
        }))
    }

    fn stroke<'b>(line: Line<'b>) -> Stroke<'b> {
        Stroke::with_color(
            Stroke {
                width: line.width,
                line_dash: LineDash {
                    segments: line.dash,
                    offset: 0,
                },
                ..Default::default()
            },
            line.color,
        )
    }
}

impl Painter for FramePainter<'_> {
    fn fill_rect(&mut self, rect: Rectangle, color: Color) {
        self.frame
            .fill_rectangle(self.at(rect.position()), rect.size(), color);
    }

    fn stroke_rect(&mut self, rect: Rectangle, line: Line<'_>) {
        let path = Path::rectangle(self.at(rect.position()), rect.size());
        self.frame.stroke(&path, Self::stroke(line));
    }

    fn line(&mut self, from: Point, to: Point, line: Line<'_>) {
        let path = Path::line(self.at(from), self.at(to));
        self.frame.stroke(&path, Self::stroke(line));
    }

    fn polyline(&mut self, points: &[Point], line: Line<'_>) {
        if points.len() < 2 {
            return;
        }
        if let Some(path) = self.path(points, false) {
            self.frame.stroke(&path, Self::stroke(line));
        }
    }

    fn fill_polygon(&mut self, points: &[Point], color: Color) {
        if points.len() < 3 {
            return;
        }
        if let Some(path) = self.path(points, true) {
            self.frame.fill(&path, color);
        }
    }

    fn fill_gradient(&mut self, points: &[Point], top: (f32, Color), bottom: (f32, Color)) {
        if points.len() < 3 {
            return;
        }
        let Some(path) = self.path(points, true) else {
            return;
        };

        let start = self.at(Point::new(0.0, top.0));
        let end = self.at(Point::new(0.0, bottom.0));
        let linear = canvas::gradient::Linear::new(start, end)
            .add_stop(0.0, top.1)
            .add_stop(1.0, bottom.1);

        self.frame.fill(
            &path,
            Fill {
                style: canvas::Style::Gradient(canvas::Gradient::Linear(linear)),
                ..Fill::default()
            },
        );
    }

    fn text(&mut self, content: &str, position: Point, color: Color, anchor: Anchor) {
        let align_x = match anchor {
            Anchor::Left => Alignment::Start,
            Anchor::Center => Alignment::Center,
            Anchor::Right => Alignment::End,
        };

        self.frame.fill_text(canvas::Text {
            content: content.to_string(),
            position: self.at(position),
            color,
            size: Pixels(TEXT_SIZE),
            align_x: align_x.into(),
            align_y: Alignment::Center.into(),
            font: style::MONO_FONT,
            ..Default::default()
        });
    }

    fn clipped(&mut self, region: Rectangle, draw: &mut dyn FnMut(&mut dyn Painter)) {
        let origin = self.at(region.position());
        let offset = self.offset + Vector::new(origin.x, origin.y);

        self.frame
            .with_clip(Rectangle::new(origin, region.size()), |frame| {
                draw(&mut FramePainter { frame, offset });
            });
    }
}

#[cfg(test)]
pub mod recording {
    use super::*;

    /// یک فراخوانی رسم که با لایه جاری برچسب خورده است
    #[derive(Debug, Clone, PartialEq)]
    pub enum Op {
        FillRect(Rectangle, Color),
        StrokeRect(Rectangle, Color),
        Line(Point, Point, Color),
        Polyline(usize, Color),
        Polygon(usize, Color),
        Gradient(usize),
        Text(String),
    }

    #[derive(Debug, Default)]
    pub struct Recorder {
        pub current: Option<Layer>,
        pub ops: Vec<(Layer, Op)>,
        pub layers: Vec<Layer>,
    }

    impl Recorder {
        fn push(&mut self, op: Op) {
            if let Some(layer) = self.current {
                self.ops.push((layer, op));
            }
        }

        pub fn ops_in(&self, layer: Layer) -> impl Iterator<Item = &Op> {
            self.ops.iter().filter(move |(l, _)| *l == layer).map(|(_, op)| op)
        }

        pub fn texts(&self, layer: Layer) -> Vec<String> {
            self.ops_in(layer)
                .filter_map(|op| match op {
                    Op::Text(text) => Some(text.clone()),
                    _ => None,
                })
                .collect()
        }

        /// لایه‌هایی که حداقل یک فراخوانی رسم دارند، به ترتیب اولین رخداد
        pub fn drawn_layers(&self) -> Vec<Layer> {
            let mut layers: Vec<Layer> = vec![];
            for (layer, _) in &self.ops {
                if layers.last() != Some(layer) {
                    layers.push(*layer);
                }
            }
            layers
        }
    }

    impl Painter for Recorder {
        fn layer(&mut self, layer: Layer) {
            self.current = Some(layer);
            self.layers.push(layer);
        }

        fn fill_rect(&mut self, rect: Rectangle, color: Color) {
            self.push(Op::FillRect(rect, color));
        }

        fn stroke_rect(&mut self, rect: Rectangle, line: Line<'_>) {
            self.push(Op::StrokeRect(rect, line.color));
        }

        fn line(&mut self, from: Point, to: Point, line: Line<'_>) {
            self.push(Op::Line(from, to, line.color));
        }

        fn polyline(&mut self, points: &[Point], line: Line<'_>) {
            self.push(Op::Polyline(points.len(), line.color));
        }

        fn fill_polygon(&mut self, points: &[Point], color: Color) {
            self.push(Op::Polygon(points.len(), color));
        }

        fn fill_gradient(&mut self, points: &[Point], _top: (f32, Color), _bottom: (f32, Color)) {
            self.push(Op::Gradient(points.len()));
        }

        fn text(&mut self, content: &str, _position: Point, _color: Color, _anchor: Anchor) {
            self.push(Op::Text(content.to_string()));
        }

        fn clipped(&mut self, _region: Rectangle, draw: &mut dyn FnMut(&mut dyn Painter)) {
            draw(self);
        }
    }
}

use iced_core::{Point, Rectangle};

use super::ChartState;
use super::candle::CandleSeries;
use super::drawing::{Anchor, ToolMode};
use super::layout::{Panel, PanelLayout};
use super::mapper::Mapper;
use crate::storage::Storage;

/// رویداد ورودی یکسان‌شده (ماوس و لمس هر دو به یک مختصات پیکسلی تبدیل می‌شوند)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    PointerLeave,
    /// `delta_y > 0` یعنی چرخش رو به پایین
    Wheel {
        delta_y: f32,
    },
    Key(Key),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Delete,
}

/// اطلاعات نشانگر که برای ویجت‌های همسایه (مثل نوار قیمت) منتشر می‌شود
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hover {
    pub x: f32,
    pub y: f32,
    pub visible: bool,
    pub price: f64,
    pub time: u64,
}

impl Hover {
    fn hidden() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            visible: false,
            price: 0.0,
            time: 0,
        }
    }
}

/// کدام لایه‌ها باید دوباره رسم شوند
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord)]
pub enum Redraw {
    #[default]
    None,
    /// فقط لایه‌های رویی (ترسیم نیمه‌کاره و نشانگر)
    Overlay,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Outcome {
    pub redraw: Redraw,
    /// مقدار جدید نشانگر، اگر تغییر کرده باشد
    pub hover: Option<Hover>,
    pub drawings_changed: bool,
}

impl Outcome {
    fn redraw(redraw: Redraw) -> Self {
        Self {
            redraw,
            ..Self::default()
        }
    }

    fn merge(mut self, other: Outcome) -> Self {
        self.redraw = self.redraw.max(other.redraw);
        self.hover = other.hover.or(self.hover);
        self.drawings_changed |= other.drawings_changed;
        self
    }
}

/// تبدیل نقطه داده به پیکسل با سری و شروع نمای داده شده
pub(super) fn project_with(
    series: &CandleSeries,
    view_start: usize,
    mapper: &Mapper,
    anchor: Anchor,
) -> Option<Point> {
    let index = series.fractional_index(anchor.time)?;
    let x = mapper.x_fractional(index - view_start as f64);
    Some(Point::new(x, mapper.y(anchor.price)))
}

fn clamp_into(rect: Rectangle, point: Point) -> Point {
    Point::new(
        point.x.clamp(rect.x, rect.x + rect.width),
        point.y.clamp(rect.y, rect.y + rect.height),
    )
}

impl ChartState {
    /// توزیع ورودی بین کنترل‌کننده نما و مدیر ترسیم‌ها
    ///
    /// در حالت ابزار عادی کشیدن نمودار را جابجا می‌کند، در حالت ترسیم نقطه‌گذاری
    /// انجام می‌شود و در حالت حذف ترسیم زیر نشانگر حذف می‌شود. چرخ ماوس همیشه
    /// بزرگنمایی را تغییر می‌دهد. هر تغییر در ترسیم‌ها بلافاصله در انبار ذخیره می‌شود.
    pub fn handle(&mut self, input: Input, store: &mut dyn Storage) -> Outcome {
        let Some(layout) = self.panel_layout() else {
            return Outcome::default();
        };

        let outcome = match input {
            Input::PointerDown(point) => self.pointer_down(point, &layout),
            Input::PointerMove(point) => self.pointer_move(point, &layout),
            Input::PointerUp(point) => self.pointer_up(point, &layout),
            Input::PointerLeave => {
                self.viewport.end_pan();
                let was_visible = self.hover.take().is_some_and(|hover| hover.visible);

                Outcome {
                    redraw: Redraw::Overlay,
                    hover: was_visible.then(Hover::hidden),
                    drawings_changed: false,
                }
            }
            Input::Wheel { delta_y } => {
                self.viewport.wheel(delta_y);
                Outcome::redraw(Redraw::All)
            }
            Input::Key(Key::Escape) => {
                self.drawings.cancel();
                Outcome::redraw(Redraw::All)
            }
            Input::Key(Key::Delete) => match self.drawings.delete_selected() {
                Some(removed) => {
                    log::debug!("Deleted selected drawing {}", removed.id);
                    Outcome {
                        redraw: Redraw::All,
                        hover: None,
                        drawings_changed: true,
                    }
                }
                None => Outcome::default(),
            },
        };

        if outcome.drawings_changed {
            self.save_drawings(store);
        }
        outcome
    }

    fn pointer_down(&mut self, point: Point, layout: &PanelLayout) -> Outcome {
        let Some(panel) = layout.panel_at(point).filter(Panel::is_plot) else {
            return Outcome::default();
        };
        let mapper = self.price_mapper(layout);

        match self.drawings.tool() {
            ToolMode::None => {
                let series = &self.series;
                let view_start = self.viewport.view_start();

                let selection_changed = mapper.is_some_and(|mapper| {
                    self.drawings.select_at(point, |anchor| {
                        project_with(series, view_start, &mapper, anchor)
                    })
                });
                self.viewport.begin_pan(point.x);

                Outcome::redraw(if selection_changed {
                    Redraw::All
                } else {
                    Redraw::None
                })
            }
            ToolMode::Draw(_) => {
                let Some(mapper) = mapper.filter(|_| panel == Panel::Price) else {
                    return Outcome::default();
                };
                let Some(anchor) = self.anchor_at(&mapper, point) else {
                    return Outcome::default();
                };

                let committed = self.drawings.pointer_down(anchor);
                Outcome {
                    redraw: Redraw::All,
                    hover: None,
                    drawings_changed: committed,
                }
            }
            ToolMode::Delete => {
                let Some(mapper) = mapper else {
                    return Outcome::default();
                };
                let series = &self.series;
                let view_start = self.viewport.view_start();

                let removed = self.drawings.delete_at(point, |anchor| {
                    project_with(series, view_start, &mapper, anchor)
                });

                match removed {
                    Some(drawing) => {
                        log::debug!("Deleted drawing {} at pointer", drawing.id);
                        Outcome {
                            redraw: Redraw::All,
                            hover: None,
                            drawings_changed: true,
                        }
                    }
                    None => Outcome::default(),
                }
            }
        }
    }

    fn pointer_move(&mut self, point: Point, layout: &PanelLayout) -> Outcome {
        let mut outcome = Outcome::default();

        if self.viewport.is_panning() && self.viewport.pan_to(point.x, layout.price.width) != 0 {
            outcome.redraw = Redraw::All;
        }

        if self.drawings.pending().is_some()
            && let Some(mapper) = self.price_mapper(layout)
            && let Some(anchor) = self.anchor_at(&mapper, clamp_into(layout.price, point))
            && self.drawings.pointer_move(anchor)
        {
            outcome = outcome.merge(Outcome::redraw(Redraw::Overlay));
        }

        outcome.merge(self.update_hover(point, layout))
    }

    fn pointer_up(&mut self, point: Point, layout: &PanelLayout) -> Outcome {
        self.viewport.end_pan();

        if self.drawings.pending().is_none() {
            return Outcome::default();
        }

        let anchor = self
            .price_mapper(layout)
            .and_then(|mapper| self.anchor_at(&mapper, clamp_into(layout.price, point)));

        let committed = match anchor {
            Some(anchor) => self.drawings.pointer_up(anchor),
            None => {
                self.drawings.discard_pending();
                false
            }
        };

        Outcome {
            redraw: Redraw::All,
            hover: None,
            drawings_changed: committed,
        }
    }

    fn update_hover(&mut self, point: Point, layout: &PanelLayout) -> Outcome {
        let mapper = self.price_mapper(layout);

        let hover = match mapper {
            Some(mapper) if layout.plot().contains(point) => {
                let index = self.viewport.view_start() + mapper.index_at(point.x);

                self.series.as_slice().get(index).map(|candle| Hover {
                    x: point.x,
                    y: point.y,
                    visible: true,
                    price: mapper.price_at(point.y),
                    time: candle.time,
                })
            }
            _ => None,
        };

        match hover {
            Some(hover) => {
                self.hover = Some(hover);
                Outcome {
                    redraw: Redraw::Overlay,
                    hover: Some(hover),
                    drawings_changed: false,
                }
            }
            None => {
                let was_visible = self.hover.take().is_some_and(|hover| hover.visible);
                Outcome {
                    redraw: if was_visible {
                        Redraw::Overlay
                    } else {
                        Redraw::None
                    },
                    hover: was_visible.then(Hover::hidden),
                    drawings_changed: false,
                }
            }
        }
    }

    pub fn set_tool(&mut self, tool: ToolMode) {
        self.viewport.end_pan();
        self.drawings.set_tool(tool);
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
    }

    pub fn fit_view(&mut self) {
        self.viewport.fit();
    }

    /// پاک کردن همه ترسیم‌های نماد فعلی
    pub fn clear_drawings(&mut self, store: &mut dyn Storage) {
        log::info!("Clearing all drawings for {}", self.symbol);
        self.drawings.clear();
        self.save_drawings(store);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::drawing::DrawingKind;
    use crate::chart::tests::chart_with;
    use crate::storage::{self, MemoryStore};

    fn closes(n: i32) -> Vec<f64> {
        (0..n).map(|i| 100.0 + f64::from(i % 11)).collect()
    }

    #[test]
    fn drag_without_tool_pans_whole_candles() {
        let (mut chart, mut store) = chart_with(&closes(150));
        // ۱۰۰ کندل در ۸۰۰ پیکسل: هر کندل ۸ پیکسل
        assert_eq!(chart.viewport.view_start(), 50);

        chart.handle(Input::PointerDown(Point::new(400.0, 100.0)), &mut store);
        let outcome = chart.handle(Input::PointerMove(Point::new(424.0, 100.0)), &mut store);
        assert_eq!(outcome.redraw, Redraw::All);
        assert_eq!(chart.viewport.view_start(), 47);

        chart.handle(Input::PointerUp(Point::new(424.0, 100.0)), &mut store);
        chart.handle(Input::PointerMove(Point::new(600.0, 100.0)), &mut store);
        assert_eq!(chart.viewport.view_start(), 47);
    }

    #[test]
    fn drawing_tool_creates_and_persists() {
        let (mut chart, mut store) = chart_with(&closes(150));
        chart.set_tool(ToolMode::Draw(DrawingKind::Trendline));

        chart.handle(Input::PointerDown(Point::new(100.0, 100.0)), &mut store);
        chart.handle(Input::PointerMove(Point::new(300.0, 200.0)), &mut store);
        let outcome = chart.handle(Input::PointerUp(Point::new(300.0, 200.0)), &mut store);

        assert!(outcome.drawings_changed);
        assert_eq!(chart.drawings.drawings().len(), 1);
        // نمودار هنگام ترسیم جابجا نمی‌شود
        assert_eq!(chart.viewport.view_start(), 50);

        let saved = store
            .get(&storage::drawings_key("USDAFN"))
            .expect("get")
            .expect("persisted");
        assert!(saved.contains("\"trendline\""));
    }

    #[test]
    fn escape_before_pointer_up_leaves_list_unchanged() {
        let (mut chart, mut store) = chart_with(&closes(150));
        chart.set_tool(ToolMode::Draw(DrawingKind::Trendline));

        chart.handle(Input::PointerDown(Point::new(100.0, 100.0)), &mut store);
        chart.handle(Input::PointerMove(Point::new(300.0, 200.0)), &mut store);
        chart.handle(Input::Key(Key::Escape), &mut store);
        chart.handle(Input::PointerUp(Point::new(300.0, 200.0)), &mut store);

        assert!(chart.drawings.drawings().is_empty());
        assert_eq!(chart.drawings.tool(), ToolMode::None);
        assert!(store.is_empty());
    }

    #[test]
    fn delete_mode_removes_hit_drawing() {
        let (mut chart, mut store) = chart_with(&closes(150));
        chart.set_tool(ToolMode::Draw(DrawingKind::Line));
        chart.handle(Input::PointerDown(Point::new(100.0, 100.0)), &mut store);
        chart.handle(Input::PointerUp(Point::new(300.0, 200.0)), &mut store);
        assert_eq!(chart.drawings.drawings().len(), 1);

        chart.set_tool(ToolMode::Delete);
        chart.handle(Input::PointerDown(Point::new(300.0, 200.0)), &mut store);
        assert_eq!(chart.drawings.drawings().len(), 1);

        let outcome = chart.handle(Input::PointerDown(Point::new(110.0, 105.0)), &mut store);
        assert!(outcome.drawings_changed);
        assert!(chart.drawings.drawings().is_empty());
    }

    #[test]
    fn delete_key_removes_selected_drawing() {
        let (mut chart, mut store) = chart_with(&closes(150));
        chart.set_tool(ToolMode::Draw(DrawingKind::Horizontal));
        chart.handle(Input::PointerDown(Point::new(100.0, 100.0)), &mut store);
        chart.set_tool(ToolMode::None);

        // کلیک روی نقطه شروع آن را انتخاب می‌کند
        chart.handle(Input::PointerDown(Point::new(102.0, 101.0)), &mut store);
        chart.handle(Input::PointerUp(Point::new(102.0, 101.0)), &mut store);
        assert!(chart.drawings.selected().is_some());

        chart.handle(Input::Key(Key::Delete), &mut store);
        assert!(chart.drawings.drawings().is_empty());
    }

    #[test]
    fn presses_are_routed_by_panel() {
        let (mut chart, mut store) = chart_with(&closes(150));
        let volume = chart
            .panel_layout()
            .and_then(|layout| layout.volume)
            .expect("volume panel");
        let in_volume = Point::new(100.0, volume.center_y());

        // ستون قیمت نه ترسیم می‌کند نه نمودار را جابجا می‌کند
        chart.handle(Input::PointerDown(Point::new(840.0, 100.0)), &mut store);
        assert!(!chart.viewport.is_panning());

        chart.handle(Input::PointerDown(in_volume), &mut store);
        assert!(chart.viewport.is_panning());
        chart.handle(Input::PointerUp(in_volume), &mut store);

        chart.set_tool(ToolMode::Draw(DrawingKind::Horizontal));
        chart.handle(Input::PointerDown(in_volume), &mut store);
        assert!(chart.drawings.drawings().is_empty());

        chart.handle(Input::PointerDown(Point::new(100.0, 100.0)), &mut store);
        assert_eq!(chart.drawings.drawings().len(), 1);
    }

    #[test]
    fn wheel_zooms_in_any_tool_mode() {
        let (mut chart, mut store) = chart_with(&closes(300));
        chart.set_tool(ToolMode::Draw(DrawingKind::Fibonacci));

        chart.handle(Input::Wheel { delta_y: 1.0 }, &mut store);
        assert!((chart.viewport.zoom() - 1.1).abs() < 1e-9);
        assert_eq!(chart.viewport.visible_count(), 90);
    }

    #[test]
    fn hover_is_published_and_cleared() {
        let (mut chart, mut store) = chart_with(&closes(150));

        let outcome = chart.handle(Input::PointerMove(Point::new(404.0, 100.0)), &mut store);
        let hover = outcome.hover.expect("hover");
        assert!(hover.visible);
        assert_eq!(hover.time, chart.candles()[100].time);
        assert_eq!(chart.hover(), Some(hover));

        chart.handle(Input::PointerDown(Point::new(404.0, 100.0)), &mut store);
        let outcome = chart.handle(Input::PointerLeave, &mut store);
        assert_eq!(outcome.hover.map(|h| h.visible), Some(false));
        assert!(chart.hover().is_none());
        assert!(!chart.viewport.is_panning());
    }

    #[test]
    fn empty_chart_ignores_input() {
        let mut store = MemoryStore::new();
        let mut chart = ChartState::new("USDAFN", &store);

        let outcome = chart.handle(Input::PointerMove(Point::new(10.0, 10.0)), &mut store);
        assert_eq!(outcome, Outcome::default());
    }
}

use std::fmt;

use iced_core::{Color, Point};
use serde::{Deserialize, Serialize};

use crate::storage::{self, Storage};

/// سطوح پیش‌فرض فیبوناچی
pub const FIB_LEVELS: [f64; 7] = [0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0];

/// شعاع انتخاب و حذف ترسیم‌ها (فاصله از نقطه شروع)
pub const HIT_RADIUS: f32 = 20.0;

pub const DEFAULT_COLOR: Color = Color::from_rgb(0.16, 0.59, 0.95);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawingKind {
    Line,
    Trendline,
    Horizontal,
    Vertical,
    Rectangle,
    Fibonacci,
    Channel,
}

impl DrawingKind {
    pub const ALL: [DrawingKind; 7] = [
        DrawingKind::Line,
        DrawingKind::Trendline,
        DrawingKind::Horizontal,
        DrawingKind::Vertical,
        DrawingKind::Rectangle,
        DrawingKind::Fibonacci,
        DrawingKind::Channel,
    ];

    /// خطوط افقی و عمودی با یک کلیک ثبت می‌شوند
    pub fn is_single_anchor(&self) -> bool {
        matches!(self, DrawingKind::Horizontal | DrawingKind::Vertical)
    }
}

impl fmt::Display for DrawingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DrawingKind::Line => "Line",
            DrawingKind::Trendline => "Trend Line",
            DrawingKind::Horizontal => "Horizontal",
            DrawingKind::Vertical => "Vertical",
            DrawingKind::Rectangle => "Rectangle",
            DrawingKind::Fibonacci => "Fibonacci",
            DrawingKind::Channel => "Channel",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingStyle {
    pub line_width: f32,
    #[serde(default)]
    pub dash: Vec<f32>, // الگوی خط‌چین؛ خالی یعنی خط پیوسته
    pub opacity: f32,
}

impl Default for DrawingStyle {
    fn default() -> Self {
        Self {
            line_width: 1.5,
            dash: vec![],
            opacity: 1.0,
        }
    }
}

/// یک نقطه در فضای داده (زمان و قیمت)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub time: u64,
    pub price: f64,
}

impl Anchor {
    pub fn new(time: u64, price: f64) -> Self {
        Self { time, price }
    }
}

/// ترسیم ذخیره‌شده روی نمودار
///
/// نقاط در فضای داده نگهداری می‌شوند تا با جابجایی، بزرگنمایی یا تغییر اندازه
/// نمودار در جای درست باقی بمانند.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Drawing {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: DrawingKind,
    pub start_time: u64,
    pub end_time: u64,
    pub start_price: f64,
    pub end_price: f64,
    pub color: Color,
    #[serde(default)]
    pub style: DrawingStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fib_levels: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_width: Option<f64>,
}

impl Drawing {
    pub fn new(kind: DrawingKind, start: Anchor, end: Anchor, color: Color) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            start_time: start.time,
            end_time: end.time,
            start_price: start.price,
            end_price: end.price,
            color,
            style: DrawingStyle::default(),
            fib_levels: (kind == DrawingKind::Fibonacci).then(|| FIB_LEVELS.to_vec()),
            channel_width: None,
        }
    }

    pub fn start(&self) -> Anchor {
        Anchor::new(self.start_time, self.start_price)
    }

    pub fn end(&self) -> Anchor {
        Anchor::new(self.end_time, self.end_price)
    }

    /// قیمت هر سطح فیبوناچی
    ///
    /// در روند صعودی سطح صفر روی نقطه شروع است و در روند نزولی روی نقطه پایان؛
    /// در هر دو حالت سطح صفر پایین‌ترین و سطح یک بالاترین قیمت است.
    pub fn fib_prices(&self) -> Vec<(f64, f64)> {
        let levels = self.fib_levels.as_deref().unwrap_or(&FIB_LEVELS);

        levels
            .iter()
            .map(|&level| {
                let price = if self.end_price >= self.start_price {
                    self.start_price + (self.end_price - self.start_price) * level
                } else {
                    self.end_price + (self.start_price - self.end_price) * level
                };
                (level, price)
            })
            .collect()
    }

    /// فاصله قیمتی خط موازی کانال (پیش‌فرض نصف دامنه قیمت دو نقطه)
    pub fn channel_offset(&self) -> f64 {
        self.channel_width
            .unwrap_or_else(|| (self.end_price - self.start_price).abs() / 2.0)
    }
}

/// ابزار فعال نمودار
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolMode {
    #[default]
    None,
    Draw(DrawingKind),
    Delete,
}

impl ToolMode {
    pub fn is_drawing(&self) -> bool {
        matches!(self, ToolMode::Draw(_))
    }
}

/// مرحله ترسیم در حال انجام
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Anchoring,
    Dragging,
}

/// ترسیمی که هنوز ثبت نشده است
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pending {
    pub kind: DrawingKind,
    pub start: Anchor,
    pub end: Anchor,
    dragged: bool,
}

/// مدیریت ترسیم‌های یک نماد: ایجاد، انتخاب، حذف و ذخیره‌سازی
#[derive(Debug, Clone)]
pub struct DrawingManager {
    symbol: String,
    drawings: Vec<Drawing>,
    tool: ToolMode,
    pending: Option<Pending>,
    selected: Option<String>,
    pub color: Color,
}

impl DrawingManager {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            drawings: vec![],
            tool: ToolMode::None,
            pending: None,
            selected: None,
            color: DEFAULT_COLOR,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn drawings(&self) -> &[Drawing] {
        &self.drawings
    }

    pub fn tool(&self) -> ToolMode {
        self.tool
    }

    pub fn pending(&self) -> Option<&Pending> {
        self.pending.as_ref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_selected(&self, drawing: &Drawing) -> bool {
        self.selected.as_deref() == Some(drawing.id.as_str())
    }

    pub fn phase(&self) -> Phase {
        match self.pending {
            None => Phase::Idle,
            Some(Pending { dragged: false, .. }) => Phase::Anchoring,
            Some(Pending { dragged: true, .. }) => Phase::Dragging,
        }
    }

    /// تغییر ابزار؛ ترسیم نیمه‌کاره کنار گذاشته می‌شود
    pub fn set_tool(&mut self, tool: ToolMode) {
        self.pending = None;
        self.tool = tool;
    }

    /// شروع ترسیم با ابزار فعال
    ///
    /// خطوط تک‌نقطه‌ای بلافاصله ثبت می‌شوند و `true` برمی‌گردد.
    pub fn pointer_down(&mut self, anchor: Anchor) -> bool {
        let ToolMode::Draw(kind) = self.tool else {
            return false;
        };

        if kind.is_single_anchor() {
            self.commit(Drawing::new(kind, anchor, anchor, self.color));
            return true;
        }

        self.pending = Some(Pending {
            kind,
            start: anchor,
            end: anchor,
            dragged: false,
        });
        false
    }

    pub fn pointer_move(&mut self, anchor: Anchor) -> bool {
        match self.pending.as_mut() {
            Some(pending) => {
                pending.end = anchor;
                pending.dragged = true;
                true
            }
            None => false,
        }
    }

    /// پایان کشیدن و ثبت ترسیم؛ ترسیم با دو نقطه یکسان دور ریخته می‌شود
    pub fn pointer_up(&mut self, anchor: Anchor) -> bool {
        let Some(mut pending) = self.pending.take() else {
            return false;
        };
        pending.end = anchor;

        if pending.start == pending.end {
            return false;
        }

        self.commit(Drawing::new(
            pending.kind,
            pending.start,
            pending.end,
            self.color,
        ));
        true
    }

    fn commit(&mut self, drawing: Drawing) {
        log::debug!("Committed {} drawing on {}", drawing.kind, self.symbol);
        self.selected = Some(drawing.id.clone());
        self.drawings.push(drawing);
    }

    pub fn discard_pending(&mut self) {
        self.pending = None;
    }

    /// Escape: ترسیم نیمه‌کاره لغو و ابزار به حالت عادی برمی‌گردد
    pub fn cancel(&mut self) {
        self.pending = None;
        self.tool = ToolMode::None;
    }

    /// یافتن بالاترین ترسیمی که نقطه شروعش کمتر از `HIT_RADIUS` با نقطه فاصله دارد
    pub fn hit_test(
        &self,
        point: Point,
        project: impl Fn(Anchor) -> Option<Point>,
    ) -> Option<usize> {
        self.drawings.iter().rposition(|drawing| {
            project(drawing.start()).is_some_and(|start| start.distance(point) < HIT_RADIUS)
        })
    }

    pub fn select_at(&mut self, point: Point, project: impl Fn(Anchor) -> Option<Point>) -> bool {
        let hit = self
            .hit_test(point, project)
            .map(|index| self.drawings[index].id.clone());

        let changed = hit != self.selected;
        self.selected = hit;
        changed
    }

    /// حذف ترسیم زیر نشانگر در حالت ابزار حذف
    pub fn delete_at(
        &mut self,
        point: Point,
        project: impl Fn(Anchor) -> Option<Point>,
    ) -> Option<Drawing> {
        let index = self.hit_test(point, project)?;
        Some(self.remove(index))
    }

    /// کلید Delete: حذف ترسیم انتخاب‌شده
    pub fn delete_selected(&mut self) -> Option<Drawing> {
        let id = self.selected.as_deref()?;
        let index = self.drawings.iter().position(|d| d.id == id)?;
        Some(self.remove(index))
    }

    fn remove(&mut self, index: usize) -> Drawing {
        let removed = self.drawings.remove(index);
        if self.selected.as_deref() == Some(removed.id.as_str()) {
            self.selected = None;
        }
        removed
    }

    pub fn clear(&mut self) {
        self.drawings.clear();
        self.pending = None;
        self.selected = None;
    }

    /// ذخیره کل فهرست برای نماد فعلی؛ خطا فقط لاگ می‌شود
    pub fn save(&self, store: &mut dyn Storage) -> bool {
        storage::save_json(store, &storage::drawings_key(&self.symbol), &self.drawings)
    }

    /// بارگذاری فهرست نماد از انبار؛ داده نبود یا خراب بود فهرست خالی می‌شود
    pub fn load(store: &dyn Storage, symbol: &str) -> Self {
        let drawings: Vec<Drawing> =
            storage::load_json(store, &storage::drawings_key(symbol)).unwrap_or_default();

        Self {
            drawings,
            ..Self::new(symbol)
        }
    }

    /// تعویض نماد: حالت ترسیم حفظ می‌شود ولی فهرست از انبار خوانده می‌شود
    pub fn switch_symbol(&mut self, store: &dyn Storage, symbol: &str) {
        let color = self.color;
        *self = Self::load(store, symbol);
        self.color = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn anchor(time: u64, price: f64) -> Anchor {
        Anchor::new(time, price)
    }

    /// تصویر ساده: هر دقیقه ۱۰ پیکسل و هر واحد قیمت ۱ پیکسل
    fn project(anchor: Anchor) -> Option<Point> {
        Some(Point::new(
            (anchor.time / 60_000) as f32 * 10.0,
            500.0 - anchor.price as f32,
        ))
    }

    fn draw(manager: &mut DrawingManager, kind: DrawingKind, start: Anchor, end: Anchor) {
        manager.set_tool(ToolMode::Draw(kind));
        manager.pointer_down(start);
        manager.pointer_move(end);
        assert!(manager.pointer_up(end));
    }

    #[test]
    fn drag_lifecycle_commits() {
        let mut manager = DrawingManager::new("USDAFN");
        manager.set_tool(ToolMode::Draw(DrawingKind::Trendline));

        assert_eq!(manager.phase(), Phase::Idle);
        manager.pointer_down(anchor(60_000, 100.0));
        assert_eq!(manager.phase(), Phase::Anchoring);
        manager.pointer_move(anchor(120_000, 104.0));
        assert_eq!(manager.phase(), Phase::Dragging);
        assert!(manager.pointer_up(anchor(180_000, 108.0)));

        assert_eq!(manager.phase(), Phase::Idle);
        assert_eq!(manager.drawings().len(), 1);
        let drawing = &manager.drawings()[0];
        assert_eq!(drawing.end(), anchor(180_000, 108.0));
        assert!(manager.is_selected(drawing));
    }

    #[test]
    fn escape_discards_in_progress_drawing() {
        let mut manager = DrawingManager::new("USDAFN");
        draw(
            &mut manager,
            DrawingKind::Line,
            anchor(60_000, 100.0),
            anchor(120_000, 110.0),
        );
        let before = manager.drawings().to_vec();

        manager.set_tool(ToolMode::Draw(DrawingKind::Trendline));
        manager.pointer_down(anchor(60_000, 90.0));
        manager.pointer_move(anchor(240_000, 95.0));
        manager.cancel();

        assert_eq!(manager.drawings(), before.as_slice());
        assert_eq!(manager.tool(), ToolMode::None);
        assert!(!manager.pointer_up(anchor(240_000, 95.0)));
        assert_eq!(manager.drawings(), before.as_slice());
    }

    #[test]
    fn single_anchor_kinds_commit_on_click() {
        let mut manager = DrawingManager::new("USDAFN");
        manager.set_tool(ToolMode::Draw(DrawingKind::Horizontal));

        assert!(manager.pointer_down(anchor(60_000, 100.0)));
        assert_eq!(manager.drawings().len(), 1);
        assert_eq!(manager.phase(), Phase::Idle);
    }

    #[test]
    fn zero_length_drag_is_discarded() {
        let mut manager = DrawingManager::new("USDAFN");
        manager.set_tool(ToolMode::Draw(DrawingKind::Rectangle));

        manager.pointer_down(anchor(60_000, 100.0));
        assert!(!manager.pointer_up(anchor(60_000, 100.0)));
        assert!(manager.drawings().is_empty());
    }

    #[test]
    fn delete_tool_hits_within_radius_of_start() {
        let mut manager = DrawingManager::new("USDAFN");
        // نقطه شروع در پیکسل (10, 400)
        draw(
            &mut manager,
            DrawingKind::Line,
            anchor(60_000, 100.0),
            anchor(600_000, 300.0),
        );
        manager.set_tool(ToolMode::Delete);

        // نزدیک نقطه پایان: حذف نمی‌شود
        assert!(manager.delete_at(Point::new(100.0, 200.0), project).is_none());
        assert!(manager.delete_at(Point::new(10.0, 421.0), project).is_none());

        assert!(manager.delete_at(Point::new(22.0, 410.0), project).is_some());
        assert!(manager.drawings().is_empty());
    }

    #[test]
    fn delete_key_removes_selection() {
        let mut manager = DrawingManager::new("USDAFN");
        draw(
            &mut manager,
            DrawingKind::Line,
            anchor(60_000, 100.0),
            anchor(120_000, 105.0),
        );
        draw(
            &mut manager,
            DrawingKind::Line,
            anchor(300_000, 100.0),
            anchor(360_000, 105.0),
        );
        manager.set_tool(ToolMode::None);

        assert!(manager.select_at(Point::new(12.0, 401.0), project));
        let removed = manager.delete_selected().expect("selected drawing");
        assert_eq!(removed.start_time, 60_000);
        assert_eq!(manager.drawings().len(), 1);
        assert!(manager.delete_selected().is_none());
    }

    #[test]
    fn persistence_round_trip() {
        let mut store = MemoryStore::new();
        let mut manager = DrawingManager::new("EURUSD");
        draw(
            &mut manager,
            DrawingKind::Fibonacci,
            anchor(60_000, 1.5),
            anchor(180_000, 2.5),
        );
        draw(
            &mut manager,
            DrawingKind::Channel,
            anchor(60_000, 1.25),
            anchor(240_000, 1.75),
        );
        assert!(manager.save(&mut store));

        let reloaded = DrawingManager::load(&store, "EURUSD");
        assert_eq!(reloaded.drawings(), manager.drawings());

        assert!(DrawingManager::load(&store, "USDAFN").drawings().is_empty());
    }

    #[test]
    fn mapped_prices_survive_reload_bit_for_bit() {
        use crate::chart::mapper::{Mapper, PriceRange};
        use iced_core::{Rectangle, Size};

        let mapper = Mapper::new(
            Rectangle::new(Point::ORIGIN, Size::new(733.0, 419.0)),
            120,
            PriceRange::new(71.318, 72.9047),
        );

        let mut store = MemoryStore::new();
        let mut manager = DrawingManager::new("USDAFN");
        for step in 0..400_u16 {
            let y = f32::from(step) * 1.037 + 0.13;
            let start = anchor(u64::from(step) * 60_000, mapper.price_at(y));
            let end = anchor(u64::from(step + 3) * 60_000, mapper.price_at(419.0 - y));
            draw(&mut manager, DrawingKind::Line, start, end);
        }
        assert!(manager.save(&mut store));

        let reloaded = DrawingManager::load(&store, "USDAFN");
        assert_eq!(reloaded.drawings().len(), 400);
        assert_eq!(reloaded.drawings(), manager.drawings());
    }

    #[test]
    fn persisted_fields_are_camel_case() {
        let drawing = Drawing::new(
            DrawingKind::Fibonacci,
            anchor(1, 1.0),
            anchor(2, 2.0),
            DEFAULT_COLOR,
        );
        let json = serde_json::to_string(&drawing).expect("serialize");

        for field in [
            "\"startTime\"",
            "\"endPrice\"",
            "\"fibLevels\"",
            "\"type\":\"fibonacci\"",
        ] {
            assert!(json.contains(field), "{field} missing in {json}");
        }
    }

    #[test]
    fn corrupt_payload_loads_empty() {
        let mut store = MemoryStore::new();
        store
            .set(&storage::drawings_key("EURUSD"), "[{\"id\": 4}")
            .expect("set");

        assert!(DrawingManager::load(&store, "EURUSD").drawings().is_empty());
    }

    #[test]
    fn fib_levels_follow_trend_direction() {
        let up = Drawing::new(
            DrawingKind::Fibonacci,
            anchor(1, 100.0),
            anchor(2, 200.0),
            DEFAULT_COLOR,
        );
        let down = Drawing::new(
            DrawingKind::Fibonacci,
            anchor(1, 200.0),
            anchor(2, 100.0),
            DEFAULT_COLOR,
        );

        let up_prices = up.fib_prices();
        let down_prices = down.fib_prices();
        assert_eq!(up_prices.len(), FIB_LEVELS.len());
        assert_eq!(up_prices[0], (0.0, 100.0));
        assert_eq!(up_prices[6], (1.0, 200.0));
        assert!((up_prices[3].1 - 150.0).abs() < 1e-9);
        assert_eq!(down_prices[0], (0.0, 100.0));
        assert!((down_prices[2].1 - 138.2).abs() < 1e-9);
    }
}

use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;
/// ضریب بزرگنمایی با چرخش رو به پایین
pub const ZOOM_IN_FACTOR: f64 = 1.1;
/// ضریب کوچک‌نمایی با چرخش رو به بالا
pub const ZOOM_OUT_FACTOR: f64 = 0.9;
/// تعداد کندل‌های قابل مشاهده در بزرگنمایی ۱
pub const DEFAULT_BASE_WINDOW: usize = 100;

/// وضعیت قابل ذخیره نمای نمودار
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportState {
    pub zoom_level: f64,
    pub pan_offset: i64,
    pub view_start_index: usize,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            zoom_level: 1.0,
            pan_offset: 0,
            view_start_index: 0,
        }
    }
}

/// کنترل‌کننده بزرگنمایی و جابجایی نمودار
///
/// بازه قابل مشاهده همیشه داخل محدوده داده‌ها می‌ماند:
/// `view_start ∈ [0, total - visible_count]` و `visible_count ≤ total`.
#[derive(Debug, Clone)]
pub struct Viewport {
    zoom: f64,
    pan_offset: i64,
    view_start: usize,
    base_window: usize,
    total: usize,
    mounted: bool,
    drag: Option<f32>, // آخرین مختصات x نشانگر هنگام کشیدن
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_WINDOW)
    }
}

impl Viewport {
    pub fn new(base_window: usize) -> Self {
        Self {
            zoom: 1.0,
            pan_offset: 0,
            view_start: 0,
            base_window: base_window.max(1),
            total: 0,
            mounted: false,
            drag: None,
        }
    }

    pub fn state(&self) -> ViewportState {
        ViewportState {
            zoom_level: self.zoom,
            pan_offset: self.pan_offset,
            view_start_index: self.view_start,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn view_start(&self) -> usize {
        self.view_start
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_panning(&self) -> bool {
        self.drag.is_some()
    }

    /// تعداد کندل‌های قابل مشاهده: `floor(base_window / zoom)` محدود به تعداد داده‌ها
    pub fn visible_count(&self) -> usize {
        if self.total == 0 {
            return 0;
        }
        let wanted = (self.base_window as f64 / self.zoom).floor() as usize;
        wanted.clamp(1, self.total)
    }

    pub fn visible_range(&self) -> std::ops::Range<usize> {
        self.view_start..self.view_start + self.visible_count()
    }

    fn max_start(&self) -> usize {
        self.total - self.visible_count()
    }

    fn clamp(&mut self) {
        self.zoom = self.zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.view_start = self.view_start.min(self.max_start());
    }

    fn show_latest(&mut self) {
        self.view_start = self.max_start();
    }

    /// به‌روزرسانی تعداد کل کندل‌ها
    ///
    /// فقط در اولین بار که داده‌ای وجود دارد نما به آخرین کندل‌ها منتقل می‌شود؛
    /// پس از آن رسیدن داده جدید نما را جابجا نمی‌کند.
    pub fn on_data(&mut self, total: usize) {
        self.total = total;

        if !self.mounted && total > 0 {
            self.mounted = true;
            self.show_latest();
        }
        self.clamp();
    }

    /// شروع دوباره برای یک سری جدید (مثلاً تغییر نماد)
    pub fn remount(&mut self, total: usize) {
        self.mounted = false;
        self.zoom = 1.0;
        self.pan_offset = 0;
        self.drag = None;
        self.on_data(total);
    }

    /// چرخش رو به پایین (`delta_y > 0`) بزرگنمایی را افزایش می‌دهد
    ///
    /// لبه راست نما ثابت می‌ماند.
    pub fn wheel(&mut self, delta_y: f32) {
        let factor = if delta_y > 0.0 {
            ZOOM_IN_FACTOR
        } else if delta_y < 0.0 {
            ZOOM_OUT_FACTOR
        } else {
            return;
        };

        let end = self.view_start + self.visible_count();

        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.view_start = end.saturating_sub(self.visible_count());
        self.clamp();
    }

    pub fn begin_pan(&mut self, x: f32) {
        self.drag = Some(x);
    }

    /// جابجایی با کشیدن؛ فقط گام‌های کامل کندل اعمال می‌شوند
    ///
    /// باقیمانده کمتر از یک کندل در نقطه مرجع حفظ می‌شود تا در حرکت بعدی جمع شود.
    /// مقدار برگشتی تعداد کندل‌هایی است که نما جابجا شد.
    pub fn pan_to(&mut self, x: f32, plot_width: f32) -> i64 {
        let Some(last_x) = self.drag else {
            return 0;
        };
        let visible = self.visible_count();
        if visible == 0 || plot_width <= 0.0 {
            return 0;
        }

        let candle_step = plot_width / visible as f32;
        let steps = ((x - last_x) / candle_step).floor() as i64;
        if steps == 0 {
            return 0;
        }

        self.drag = Some(last_x + steps as f32 * candle_step);

        // کشیدن به راست کندل‌های قدیمی‌تر را نشان می‌دهد
        let before = self.view_start as i64;
        let target = (before - steps).clamp(0, self.max_start() as i64);
        self.view_start = target as usize;
        self.pan_offset += steps;

        before - target
    }

    pub fn end_pan(&mut self) {
        self.drag = None;
    }

    /// بازگشت به بزرگنمایی ۱ و آخرین کندل‌ها
    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.pan_offset = 0;
        self.clamp();
        self.show_latest();
    }

    /// نمایش همه کندل‌ها تا جایی که محدودیت بزرگنمایی اجازه دهد
    pub fn fit(&mut self) {
        if self.total == 0 {
            return;
        }
        self.zoom = self.base_window as f64 / self.total as f64;
        self.pan_offset = 0;
        self.clamp();
        self.show_latest();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_clamped(viewport: &Viewport) {
        let visible = viewport.visible_count();
        assert!(visible <= viewport.total());
        assert!(viewport.view_start() + visible <= viewport.total());
        assert!((MIN_ZOOM..=MAX_ZOOM).contains(&viewport.zoom()));
    }

    #[test]
    fn initial_mount_shows_latest_window() {
        let mut viewport = Viewport::default();
        viewport.on_data(250);

        assert_eq!(viewport.visible_count(), 100);
        assert_eq!(viewport.visible_range(), 150..250);

        // داده جدید نما را جابجا نمی‌کند
        viewport.on_data(260);
        assert_eq!(viewport.view_start(), 150);
    }

    #[test]
    fn zoom_is_pinned_at_extremes() {
        let mut viewport = Viewport::default();
        viewport.on_data(5_000);

        for _ in 0..200 {
            viewport.wheel(1.0);
        }
        assert_eq!(viewport.zoom(), MAX_ZOOM);
        assert_eq!(viewport.visible_count(), 10);

        for _ in 0..200 {
            viewport.wheel(-1.0);
        }
        assert_eq!(viewport.zoom(), MIN_ZOOM);
        assert_eq!(viewport.visible_count(), 1_000);
    }

    #[test]
    fn pan_applies_whole_candles_only() {
        let mut viewport = Viewport::default();
        viewport.on_data(300);
        let start = viewport.view_start();

        // ۱۰۰ کندل در ۵۰۰ پیکسل: هر کندل ۵ پیکسل
        viewport.begin_pan(100.0);
        assert_eq!(viewport.pan_to(103.0, 500.0), 0);
        assert_eq!(viewport.pan_to(107.0, 500.0), 1);
        assert_eq!(viewport.view_start(), start - 1);

        // باقیمانده ۲ پیکسل حفظ شده است
        assert_eq!(viewport.pan_to(110.0, 500.0), 1);
        assert_eq!(viewport.view_start(), start - 2);

        viewport.end_pan();
        assert_eq!(viewport.pan_to(200.0, 500.0), 0);
    }

    #[test]
    fn clamp_holds_after_any_sequence() {
        let mut viewport = Viewport::default();
        viewport.on_data(120);

        viewport.begin_pan(0.0);
        for (i, x) in [-900.0, 4_000.0, 30.0, -10_000.0, 55.0].into_iter().enumerate() {
            viewport.pan_to(x, 640.0);
            assert_clamped(&viewport);
            viewport.wheel(if i % 2 == 0 { -1.0 } else { 1.0 });
            assert_clamped(&viewport);
        }
        viewport.end_pan();

        viewport.on_data(7);
        assert_clamped(&viewport);
        viewport.on_data(0);
        assert_eq!(viewport.visible_count(), 0);
        assert_eq!(viewport.view_start(), 0);
    }

    #[test]
    fn fit_and_reset() {
        let mut viewport = Viewport::default();
        viewport.on_data(400);

        viewport.fit();
        assert_eq!(viewport.visible_count(), 400);
        assert_eq!(viewport.view_start(), 0);

        viewport.reset();
        assert_eq!(viewport.zoom(), 1.0);
        assert_eq!(viewport.visible_range(), 300..400);

        let mut huge = Viewport::default();
        huge.on_data(50_000);
        huge.fit();
        assert_eq!(huge.zoom(), MIN_ZOOM);
        assert_eq!(huge.visible_count(), 1_000);
    }
}

// غیرفعال کردن کنسول در ویندوز برای نسخه‌های ریلیز
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod chart; // بوم نمودار و رندرکننده
mod logger; // سیستم ثبت وقایع (Log)
mod style; // تعریف استایل‌ها
mod widget; // ویجت‌های کمکی رابط کاربری
mod window; // مدیریت پنجره‌های سیستم‌عامل

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use data::chart::candle::Candle;
use data::chart::drawing::{DrawingKind, ToolMode};
use data::chart::indicator::IndicatorId;
use data::chart::interaction::{Input, Key};
use data::chart::{ChartKind, ChartState};
use data::config::state::WindowSpec;
use data::util::{self, Debounce};
use data::{ChartTheme, FileStore, State, UserTimezone, feed};
use iced::widget::tooltip::Position as TooltipPosition;
use iced::widget::{button, canvas, column, container, pick_list, row, slider, text};
use iced::{Alignment, Element, Length, Size, Subscription, Task, padding};

use widget::{toggle_button, tooltip};

/// مهلت تثبیت اندازه بوم پس از تغییر اندازه پنجره
const RESIZE_DEBOUNCE: Duration = Duration::from_millis(150);
/// تعداد کندل‌های نمونه وقتی فایل داده‌ای در دسترس نیست
const SAMPLE_CANDLES: usize = 500;

const SYMBOLS: [&str; 5] = ["USDAFN", "EURAFN", "AEDAFN", "USDIRR", "PKRAFN"];

/// نقطه شروع برنامه
fn main() {
    // راه‌اندازی سیستم لاگ
    logger::setup(cfg!(debug_assertions)).expect("Failed to initialize logger");

    let _ = iced::daemon(Sarafchart::new, Sarafchart::update, Sarafchart::view)
        .settings(iced::Settings {
            antialiasing: true,
            default_text_size: iced::Pixels(12.0),
            ..Default::default()
        })
        .title(Sarafchart::title)
        .theme(Sarafchart::theme)
        .scale_factor(Sarafchart::scale_factor)
        .subscription(Sarafchart::subscription)
        .run();
}

/// وضعیت کل برنامه: یک نمودار، انبار ماندگار و تنظیمات سراسری
struct Sarafchart {
    main_window: window::Id,
    state: State,
    store: FileStore,
    chart: ChartState,
    caches: chart::Caches,
    symbols: Vec<String>,
    resize: Debounce<Size>,
    requested_bounds: Option<Size>,
    notice: Option<String>,
}

#[derive(Debug, Clone)]
enum Message {
    Chart(chart::Message),
    Tick(Instant),
    WindowEvent(window::Event),
    ExitRequested(HashMap<window::Id, WindowSpec>),
    SymbolSelected(String),
    KindSelected(ChartKind),
    ToolSelected(ToolMode),
    DeleteSelected,
    ClearDrawings,
    IndicatorToggled(IndicatorId),
    ThemeSelected(ChartTheme),
    TimezoneSelected(UserTimezone),
    Toggle(Toggle),
    OpacityChanged(f32),
    OpacityReleased,
    ResetView,
    FitView,
    ReloadData,
    DataFolderRequested,
}

#[derive(Debug, Clone, Copy)]
enum Toggle {
    Volume,
    Grid,
    Crosshair,
}

impl Sarafchart {
    fn new() -> (Self, Task<Message>) {
        let mut state = match data::read_from_file(data::SAVED_STATE_PATH) {
            Ok(state) => state,
            Err(err) => {
                log::warn!("Using default state: {err}");
                State::default()
            }
        };

        if let Some(path) = std::env::args().nth(1) {
            state.candle_file = Some(PathBuf::from(path));
        }

        let (main_window, open_main_window) =
            window::open(window::main_settings(state.main_window));

        let store = FileStore::in_data_dir();
        let mut notice = None;

        let (symbol, candles) = match state.candle_file.as_deref().map(load_file) {
            Some(Ok(loaded)) => loaded,
            Some(Err(err)) => {
                log::error!("{err}");
                notice = Some(err);
                (state.symbol.clone(), sample_candles(&state.symbol))
            }
            None => (state.symbol.clone(), sample_candles(&state.symbol)),
        };
        state.symbol = symbol.clone();

        let mut chart = ChartState::new(&symbol, &store);
        chart.set_candles(candles);

        let mut symbols: Vec<String> = SYMBOLS.iter().map(|s| s.to_string()).collect();
        if !symbols.contains(&symbol) {
            symbols.insert(0, symbol);
        }

        (
            Self {
                main_window,
                state,
                store,
                chart,
                caches: chart::Caches::default(),
                symbols,
                resize: Debounce::new(RESIZE_DEBOUNCE),
                requested_bounds: None,
                notice,
            },
            open_main_window.discard(),
        )
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Chart(chart::Message::Input(input)) => self.chart_input(input),
            Message::Chart(chart::Message::BoundsChanged(size, input)) => {
                // اولین اندازه بدون تاخیر اعمال می‌شود تا نمودار بلافاصله رسم شود
                if self.chart.bounds() == Size::ZERO {
                    if self.chart.resize(size) {
                        self.caches.clear_all();
                    }
                } else if self.requested_bounds != Some(size) {
                    self.requested_bounds = Some(size);
                    self.resize.push(size, Instant::now());
                }

                if let Some(input) = input {
                    self.chart_input(input);
                }
            }
            Message::Tick(now) => {
                if let Some(size) = self.resize.poll(now) {
                    self.requested_bounds = None;
                    if self.chart.resize(size) {
                        log::debug!("Chart resized to {}x{}", size.width, size.height);
                        self.caches.clear_all();
                    }
                }
            }
            Message::WindowEvent(window::Event::CloseRequested(window)) => {
                return window::collect_window_specs(vec![window], Message::ExitRequested);
            }
            Message::ExitRequested(windows) => {
                self.save_state_to_disk(&windows);
                return iced::exit();
            }
            Message::SymbolSelected(symbol) => {
                if symbol != self.chart.symbol() {
                    self.switch_symbol(&symbol, sample_candles(&symbol));
                }
            }
            Message::KindSelected(kind) => {
                self.chart.set_kind(kind);
                self.settings_changed();
            }
            Message::ToolSelected(tool) => {
                let tool = if self.chart.drawings.tool() == tool {
                    ToolMode::None
                } else {
                    tool
                };
                self.chart.set_tool(tool);
                self.caches.clear_all();
            }
            Message::DeleteSelected => self.chart_input(Input::Key(Key::Delete)),
            Message::ClearDrawings => {
                self.chart.clear_drawings(&mut self.store);
                self.caches.clear_all();
            }
            Message::IndicatorToggled(id) => {
                self.chart.settings.toggle_indicator(id);
                self.chart.refresh_indicators();
                self.settings_changed();
            }
            Message::ThemeSelected(theme) => {
                self.chart.settings.theme = theme;
                self.settings_changed();
            }
            Message::TimezoneSelected(timezone) => {
                self.state.timezone = timezone;
                self.caches.clear_all();
            }
            Message::Toggle(toggle) => {
                let settings = &mut self.chart.settings;
                match toggle {
                    Toggle::Volume => settings.show_volume = !settings.show_volume,
                    Toggle::Grid => settings.show_grid = !settings.show_grid,
                    Toggle::Crosshair => settings.show_crosshair = !settings.show_crosshair,
                }
                self.settings_changed();
            }
            Message::OpacityChanged(opacity) => {
                self.chart.settings.set_opacity(opacity);
                self.caches.clear_all();
            }
            Message::OpacityReleased => {
                self.settings_changed();
            }
            Message::ResetView => {
                self.chart.reset_view();
                self.caches.clear_all();
            }
            Message::FitView => {
                self.chart.fit_view();
                self.caches.clear_all();
            }
            Message::ReloadData => {
                let symbol = self.chart.symbol().to_string();
                let loaded = match self.state.candle_file.as_deref() {
                    Some(path) => load_file(path),
                    None => Ok((symbol.clone(), sample_candles(&symbol))),
                };

                match loaded {
                    Ok((loaded_symbol, candles)) if loaded_symbol == symbol => {
                        self.chart.set_candles(candles);
                        self.caches.clear_all();
                        self.notice = None;
                    }
                    Ok((loaded_symbol, candles)) => self.switch_symbol(&loaded_symbol, candles),
                    Err(err) => {
                        log::error!("{err}");
                        self.notice = Some(err);
                    }
                }
            }
            Message::DataFolderRequested => {
                if let Err(err) = data::open_data_folder() {
                    log::error!("{err}");
                    self.notice = Some(format!("Failed to open data folder: {err}"));
                }
            }
        }

        Task::none()
    }

    fn view(&self, id: window::Id) -> Element<'_, Message> {
        if id != self.main_window {
            return container(text("")).into();
        }

        let chart_view: Element<_> = canvas(chart::Chart::new(
            &self.chart,
            &self.caches,
            self.state.timezone,
        ))
        .width(Length::Fill)
        .height(Length::Fill)
        .into();

        column![
            self.view_toolbar(),
            chart_view.map(Message::Chart),
            self.view_ticker_strip(),
        ]
        .spacing(4)
        .padding(
            padding::top(style::TITLE_PADDING_TOP)
                .bottom(4)
                .left(4)
                .right(4),
        )
        .into()
    }

    fn view_toolbar(&self) -> Element<'_, Message> {
        let settings = &self.chart.settings;
        let tool = self.chart.drawings.tool();

        let symbol_picker = pick_list(
            self.symbols.as_slice(),
            Some(self.chart.symbol().to_string()),
            Message::SymbolSelected,
        );
        let kind_picker = pick_list(ChartKind::ALL, Some(settings.kind), Message::KindSelected);

        let tools = DrawingKind::ALL.iter().fold(row![].spacing(2), |tools, kind| {
            let mode = ToolMode::Draw(*kind);
            tools.push(toggle_button(
                kind.to_string(),
                tool == mode,
                Message::ToolSelected(mode),
            ))
        });
        let eraser = tooltip(
            toggle_button(
                "Erase",
                tool == ToolMode::Delete,
                Message::ToolSelected(ToolMode::Delete),
            ),
            Some("Click a drawing to remove it"),
            TooltipPosition::Bottom,
        );
        let delete_selected = tooltip(
            button(text("Delete").size(12))
                .style(|theme, status| style::button::transparent(theme, status, false))
                .on_press_maybe(
                    self.chart
                        .drawings
                        .selected()
                        .map(|_| Message::DeleteSelected),
                ),
            Some("Remove the selected drawing (Delete)"),
            TooltipPosition::Bottom,
        );
        let clear = button(text("Clear all").size(12))
            .style(style::button::cancel)
            .on_press_maybe(
                (!self.chart.drawings.drawings().is_empty()).then_some(Message::ClearDrawings),
            );

        let first_row = row![
            symbol_picker,
            kind_picker,
            tools,
            eraser,
            delete_selected,
            clear,
        ]
        .spacing(6)
        .align_y(Alignment::Center);

        let indicators = IndicatorId::ALL.iter().fold(row![].spacing(2), |row, id| {
            row.push(toggle_button(
                id.to_string(),
                settings.is_enabled(*id),
                Message::IndicatorToggled(*id),
            ))
        });

        let toggles = row![
            toggle_button(
                "Volume",
                settings.show_volume,
                Message::Toggle(Toggle::Volume),
            ),
            toggle_button(
                "Grid",
                settings.show_grid,
                Message::Toggle(Toggle::Grid),
            ),
            toggle_button(
                "Crosshair",
                settings.show_crosshair,
                Message::Toggle(Toggle::Crosshair),
            ),
        ]
        .spacing(2);

        let opacity = row![
            text("Opacity").size(12),
            slider(
                data::config::settings::MIN_OPACITY..=1.0,
                settings.opacity,
                Message::OpacityChanged,
            )
            .step(0.05)
            .on_release(Message::OpacityReleased)
            .width(90),
        ]
        .spacing(4)
        .align_y(Alignment::Center);

        let view_buttons = row![
            button(text("Reset").size(12))
                .style(|theme, status| style::button::transparent(theme, status, false))
                .on_press(Message::ResetView),
            button(text("Fit").size(12))
                .style(|theme, status| style::button::transparent(theme, status, false))
                .on_press(Message::FitView),
            tooltip(
                button(text("Reload").size(12))
                    .style(|theme, status| style::button::transparent(theme, status, false))
                    .on_press(Message::ReloadData),
                Some("Reload candles from the data file"),
                TooltipPosition::Bottom,
            ),
            tooltip(
                button(text("Data folder").size(12))
                    .style(|theme, status| style::button::transparent(theme, status, false))
                    .on_press(Message::DataFolderRequested),
                Some("Open the folder where the data & config is stored"),
                TooltipPosition::Bottom,
            ),
        ]
        .spacing(2);

        let second_row = row![
            indicators,
            toggles,
            opacity,
            pick_list(
                ChartTheme::ALL,
                Some(settings.theme),
                Message::ThemeSelected,
            ),
            pick_list(
                UserTimezone::ALL,
                Some(self.state.timezone),
                Message::TimezoneSelected,
            ),
            view_buttons,
        ]
        .spacing(8)
        .align_y(Alignment::Center);

        container(column![first_row, second_row].spacing(4))
            .padding(4)
            .width(Length::Fill)
            .style(style::toolbar)
            .into()
    }

    /// نوار قیمت که از نشانگر نمودار تغذیه می‌شود
    fn view_ticker_strip(&self) -> Element<'_, Message> {
        let last_close = self.chart.candles().last().map(|candle| candle.close);
        let hover = self.chart.hover().filter(|hover| hover.visible);

        let decimals = last_close
            .map(|close| util::decimals_for_step(close.abs() / 10_000.0))
            .unwrap_or(2);

        let (label, price) = match (hover, last_close) {
            (Some(hover), _) => (
                self.state
                    .timezone
                    .format_crosshair(hover.time, self.chart.interval_ms()),
                Some(hover.price),
            ),
            (None, Some(close)) => ("Last".to_string(), Some(close)),
            (None, None) => ("No data".to_string(), None),
        };

        let change = match (price, last_close) {
            (Some(price), Some(close)) if close != 0.0 => (price - close) / close * 100.0,
            _ => 0.0,
        };

        let mut content = row![
            text(self.chart.symbol().to_string()).size(13),
            text(label).size(12),
        ]
        .spacing(12)
        .align_y(Alignment::Center);

        if let Some(price) = price {
            content = content
                .push(text(util::format_price(price, decimals)).size(13))
                .push(text(util::pct_change(change)).size(12));
        }
        if let Some(notice) = &self.notice {
            content = content.push(text(notice.as_str()).size(12).style(text::danger));
        }

        container(content)
            .padding(padding::top(4).bottom(4).left(8).right(8))
            .width(Length::Fill)
            .style(move |theme| style::ticker_strip(theme, change))
            .into()
    }

    fn theme(&self, _window: window::Id) -> iced_core::Theme {
        self.chart.settings.theme.iced_theme()
    }

    fn title(&self, _window: window::Id) -> String {
        format!("SarafChart [{}]", self.chart.symbol())
    }

    fn scale_factor(&self, _window: window::Id) -> f32 {
        self.state.scale_factor.into()
    }

    fn subscription(&self) -> Subscription<Message> {
        let window_events = window::events().map(Message::WindowEvent);

        // تیک فقط تا زمانی که تغییر اندازه در انتظار است
        if self.resize.is_pending() {
            let tick = iced::time::every(Duration::from_millis(50)).map(Message::Tick);
            Subscription::batch(vec![window_events, tick])
        } else {
            window_events
        }
    }

    fn chart_input(&mut self, input: Input) {
        let outcome = self.chart.handle(input, &mut self.store);
        self.caches.invalidate(outcome.redraw);

        if outcome.drawings_changed {
            log::debug!(
                "{} drawing(s) on {}",
                self.chart.drawings.drawings().len(),
                self.chart.symbol()
            );
        }
    }

    /// ذخیره تنظیمات نماد فعلی و رسم دوباره همه لایه‌ها
    fn settings_changed(&mut self) {
        if !self.chart.save_settings(&mut self.store) {
            log::warn!("Chart settings for {} were not saved", self.chart.symbol());
        }
        self.caches.clear_all();
    }

    fn switch_symbol(&mut self, symbol: &str, candles: Vec<Candle>) {
        self.chart.switch_symbol(symbol, candles, &self.store);
        self.state.symbol = symbol.to_string();

        if !self.symbols.iter().any(|s| s == symbol) {
            self.symbols.insert(0, symbol.to_string());
        }
        self.notice = None;
        self.caches.clear_all();
    }

    fn save_state_to_disk(&mut self, windows: &HashMap<window::Id, WindowSpec>) {
        if let Some(spec) = windows.get(&self.main_window) {
            self.state.main_window = Some(*spec);
        }

        self.chart.save_settings(&mut self.store);
        self.chart.save_drawings(&mut self.store);

        match serde_json::to_string_pretty(&self.state) {
            Ok(json) => {
                if let Err(err) = data::write_json_to_file(&json, data::SAVED_STATE_PATH) {
                    log::error!("Failed to write state file: {err}");
                } else {
                    log::info!("Successfully wrote state file");
                }
            }
            Err(err) => log::error!("Failed to serialize state: {err}"),
        }
    }
}

/// بارگذاری کندل‌ها از فایل؛ نام نماد از نام فایل گرفته می‌شود
fn load_file(path: &Path) -> Result<(String, Vec<Candle>), String> {
    let candles = feed::load(path).map_err(|err| {
        data::InternalError::Feed(format!("{}: {err}", path.display())).to_string()
    })?;

    let symbol = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_uppercase())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| data::config::state::DEFAULT_SYMBOL.to_string());

    Ok((symbol, candles))
}

fn sample_candles(symbol: &str) -> Vec<Candle> {
    let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
    feed::sample(symbol, SAMPLE_CANDLES, now)
}

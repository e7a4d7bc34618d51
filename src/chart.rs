pub mod annotation;
pub mod overlay;
pub mod painter;
pub mod render;
pub mod series;

use data::UserTimezone;
use data::chart::ChartState;
use data::chart::drawing::ToolMode;
use data::chart::interaction::{Input, Key, Redraw};
use iced::keyboard::{self, key};
use iced::widget::canvas::{self, Cache, Event, Geometry};
use iced::{Point, Rectangle, Renderer, Size, Theme, mouse, touch};

use painter::FramePainter;
use render::Scene;

/// پیام‌هایی که بوم نمودار برای برنامه منتشر می‌کند
#[derive(Debug, Clone, Copy)]
pub enum Message {
    Input(Input),
    /// اندازه بوم با نمودار یکی نیست؛ ورودی همان رویداد هم همراهش می‌آید
    BoundsChanged(Size, Option<Input>),
}

/// دو حافظه رسم: لایه‌های اصلی و لایه‌های رویی (ترسیم نیمه‌کاره و نشانگر)
#[derive(Default)]
pub struct Caches {
    main: Cache,
    overlay: Cache,
}

impl Caches {
    pub fn invalidate(&self, redraw: Redraw) {
        match redraw {
            Redraw::None => {}
            Redraw::Overlay => self.overlay.clear(),
            Redraw::All => self.clear_all(),
        }
    }

    pub fn clear_all(&self) {
        self.main.clear();
        self.overlay.clear();
    }
}

/// وضعیت محلی بوم بین رویدادها
#[derive(Debug, Default, Clone, Copy)]
pub struct Interaction {
    inside: bool,
    finger: Option<touch::Finger>,
}

/// بوم نمودار که فقط وضعیت را می‌خواند؛ همه تغییرات با پیام به برنامه می‌رسد
pub struct Chart<'a> {
    pub state: &'a ChartState,
    pub caches: &'a Caches,
    pub timezone: UserTimezone,
}

impl<'a> Chart<'a> {
    pub fn new(state: &'a ChartState, caches: &'a Caches, timezone: UserTimezone) -> Self {
        Self {
            state,
            caches,
            timezone,
        }
    }
}

/// ورودی نمودار به همراه اینکه رویداد برای ویجت‌های دیگر مصرف شود یا نه
struct Translated {
    input: Input,
    capture: bool,
}

fn captured(input: Input) -> Option<Translated> {
    Some(Translated {
        input,
        capture: true,
    })
}

fn passed(input: Input) -> Option<Translated> {
    Some(Translated {
        input,
        capture: false,
    })
}

fn canvas_interaction(
    chart: &ChartState,
    interaction: &mut Interaction,
    event: &Event,
    bounds: Rectangle,
    cursor: mouse::Cursor,
) -> Option<canvas::Action<Message>> {
    let translated = translate(interaction, event, bounds, cursor);
    let capture = translated.as_ref().is_some_and(|t| t.capture);

    let action = if chart.bounds() != bounds.size() {
        canvas::Action::publish(Message::BoundsChanged(
            bounds.size(),
            translated.map(|t| t.input),
        ))
    } else {
        canvas::Action::publish(Message::Input(translated?.input))
    };

    Some(if capture {
        action.and_capture()
    } else {
        action
    })
}

/// تبدیل رویدادهای ماوس، لمس و صفحه‌کلید به ورودی یکسان نمودار
fn translate(
    interaction: &mut Interaction,
    event: &Event,
    bounds: Rectangle,
    cursor: mouse::Cursor,
) -> Option<Translated> {
    let origin = bounds.position();
    let relative = |position: Point| Point::new(position.x - origin.x, position.y - origin.y);

    match event {
        Event::Mouse(mouse_event) => match mouse_event {
            mouse::Event::ButtonPressed(mouse::Button::Left) => {
                captured(Input::PointerDown(cursor.position_in(bounds)?))
            }
            mouse::Event::ButtonReleased(mouse::Button::Left) => {
                captured(Input::PointerUp(cursor.position_from(origin)?))
            }
            mouse::Event::CursorMoved { .. } => match cursor.position_in(bounds) {
                Some(position) => {
                    interaction.inside = true;
                    passed(Input::PointerMove(position))
                }
                None if interaction.inside => {
                    interaction.inside = false;
                    passed(Input::PointerLeave)
                }
                None => None,
            },
            mouse::Event::CursorLeft => {
                interaction.inside = false;
                passed(Input::PointerLeave)
            }
            mouse::Event::WheelScrolled { delta } => {
                cursor.position_in(bounds)?;

                let y = match delta {
                    mouse::ScrollDelta::Lines { y, .. } => *y,
                    mouse::ScrollDelta::Pixels { y, .. } => *y,
                };
                if y == 0.0 {
                    return None;
                }
                // در iced مقدار مثبت یعنی چرخش رو به بالا
                captured(Input::Wheel { delta_y: -y })
            }
            _ => None,
        },
        Event::Touch(touch_event) => match *touch_event {
            touch::Event::FingerPressed { id, position } => {
                if interaction.finger.is_some() || !bounds.contains(position) {
                    return None;
                }
                interaction.finger = Some(id);
                captured(Input::PointerDown(relative(position)))
            }
            touch::Event::FingerMoved { id, position } if interaction.finger == Some(id) => {
                captured(Input::PointerMove(relative(position)))
            }
            touch::Event::FingerLifted { id, position } if interaction.finger == Some(id) => {
                interaction.finger = None;
                captured(Input::PointerUp(relative(position)))
            }
            touch::Event::FingerLost { id, .. } if interaction.finger == Some(id) => {
                interaction.finger = None;
                captured(Input::PointerLeave)
            }
            _ => None,
        },
        Event::Keyboard(keyboard::Event::KeyPressed { key, .. }) => match key {
            keyboard::Key::Named(key::Named::Escape) => captured(Input::Key(Key::Escape)),
            keyboard::Key::Named(key::Named::Delete | key::Named::Backspace) => {
                captured(Input::Key(Key::Delete))
            }
            _ => None,
        },
        _ => None,
    }
}

impl canvas::Program<Message> for Chart<'_> {
    type State = Interaction;

    fn update(
        &self,
        interaction: &mut Interaction,
        event: &Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        canvas_interaction(self.state, interaction, event, bounds, cursor)
    }

    fn draw(
        &self,
        _interaction: &Interaction,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let Some(scene) = Scene::new(self.state, self.timezone) else {
            return vec![];
        };
        let size = bounds.size();

        let main = self.caches.main.draw(renderer, size, |frame| {
            render::paint_main(&scene, &mut FramePainter::new(frame));
        });
        let overlay = self.caches.overlay.draw(renderer, size, |frame| {
            render::paint_overlay(&scene, &mut FramePainter::new(frame));
        });

        vec![main, overlay]
    }

    fn mouse_interaction(
        &self,
        _interaction: &Interaction,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if self.state.viewport.is_panning() {
            return mouse::Interaction::Grabbing;
        }

        match cursor.position_in(bounds) {
            Some(_) if self.state.drawings.tool() == ToolMode::Delete => {
                mouse::Interaction::Pointer
            }
            Some(_) => mouse::Interaction::Crosshair,
            None => mouse::Interaction::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data::MemoryStore;

    fn chart_at(size: Size) -> ChartState {
        let store = MemoryStore::new();
        let mut chart = ChartState::new("USDAFN", &store);
        chart.resize(size);
        chart
    }

    fn published(
        chart: &ChartState,
        interaction: &mut Interaction,
        event: Event,
        bounds: Rectangle,
        cursor: Point,
    ) -> Option<Message> {
        canvas_interaction(
            chart,
            interaction,
            &event,
            bounds,
            mouse::Cursor::Available(cursor),
        )
        .and_then(|action| action.into_inner().0)
    }

    #[test]
    fn release_while_resizing_still_reaches_chart() {
        let chart = chart_at(Size::new(800.0, 600.0));
        let bounds = Rectangle::new(Point::new(10.0, 40.0), Size::new(900.0, 600.0));
        let release = Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left));

        let message = published(
            &chart,
            &mut Interaction::default(),
            release,
            bounds,
            Point::new(130.0, 120.0),
        );

        assert!(matches!(
            message,
            Some(Message::BoundsChanged(size, Some(Input::PointerUp(point))))
                if size == bounds.size() && point == Point::new(120.0, 80.0)
        ));
    }

    #[test]
    fn resize_is_reported_without_input() {
        let chart = chart_at(Size::ZERO);
        let bounds = Rectangle::new(Point::ORIGIN, Size::new(900.0, 600.0));
        let other = Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Right));

        let message = published(
            &chart,
            &mut Interaction::default(),
            other,
            bounds,
            Point::new(50.0, 50.0),
        );

        assert!(matches!(
            message,
            Some(Message::BoundsChanged(size, None)) if size == bounds.size()
        ));
    }

    #[test]
    fn settled_bounds_publish_plain_input() {
        let bounds = Rectangle::new(Point::ORIGIN, Size::new(900.0, 600.0));
        let chart = chart_at(bounds.size());
        let mut interaction = Interaction::default();
        let moved = Event::Mouse(mouse::Event::CursorMoved {
            position: Point::new(300.0, 200.0),
        });

        let message = published(
            &chart,
            &mut interaction,
            moved,
            bounds,
            Point::new(300.0, 200.0),
        );

        assert!(matches!(
            message,
            Some(Message::Input(Input::PointerMove(point))) if point == Point::new(300.0, 200.0)
        ));
        assert!(interaction.inside);

        let escape = Event::Keyboard(keyboard::Event::KeyPressed {
            key: keyboard::Key::Named(key::Named::Escape),
            modified_key: keyboard::Key::Named(key::Named::Escape),
            physical_key: keyboard::key::Physical::Unidentified(
                keyboard::key::NativeCode::Unidentified,
            ),
            location: keyboard::Location::Standard,
            modifiers: keyboard::Modifiers::default(),
            text: None,
            repeat: false,
        });
        let message = published(&chart, &mut interaction, escape, bounds, Point::ORIGIN);

        assert!(matches!(
            message,
            Some(Message::Input(Input::Key(Key::Escape)))
        ));
    }
}

use iced::widget::tooltip::Position;
use iced::widget::{button, container, text};
use iced::{Element, padding};

use crate::style;

/// ایجاد تولتیپ برای یک عنصر؛ بدون متن همان عنصر برگردانده می‌شود
pub fn tooltip<'a, Message: 'a>(
    content: impl Into<Element<'a, Message>>, // عنصر اصلی
    tooltip: Option<&'a str>,                 // متن تولتیپ
    position: Position,                       // موقعیت نمایش
) -> Element<'a, Message> {
    match tooltip {
        Some(tooltip) => iced::widget::tooltip(
            content,
            container(text(tooltip)).style(style::tooltip).padding(8),
            position,
        )
        .into(),
        None => content.into(),
    }
}

/// دکمه روشن/خاموش نوار ابزار
pub fn toggle_button<'a, Message: Clone + 'a>(
    label: impl text::IntoFragment<'a>,
    is_active: bool,
    on_press: Message,
) -> button::Button<'a, Message> {
    button(text(label).size(12))
        .padding(padding::top(3).bottom(3).left(8).right(8))
        .style(move |theme, status| style::button::bordered_toggle(theme, status, is_active))
        .on_press(on_press)
}

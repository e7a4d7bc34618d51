use iced::widget::container::Style;
use iced::{Border, Font, Theme};

/// فونت تک‌فاصله برای برچسب‌های قیمت و زمان روی بوم
pub const MONO_FONT: Font = Font::MONOSPACE;

pub const TITLE_PADDING_TOP: f32 = if cfg!(target_os = "macos") { 20.0 } else { 0.0 };

/// استایل مربوط به تولتیپ‌ها (Tooltip)
pub fn tooltip(theme: &Theme) -> Style {
    let palette = theme.extended_palette();

    Style {
        background: Some(palette.background.weakest.color.into()),
        border: Border {
            width: 1.0,
            color: palette.background.weak.color,
            radius: 4.0.into(),
        },
        ..Default::default()
    }
}

pub mod button {
    use iced::{
        Border, Theme,
        widget::button::{Status, Style},
    };

    /// دکمه‌های خطرناک مثل پاک کردن همه ترسیم‌ها
    pub fn cancel(theme: &Theme, status: Status) -> Style {
        let palette = theme.extended_palette();

        Style {
            text_color: match status {
                Status::Active => palette.danger.base.color,
                Status::Pressed => palette.danger.weak.color,
                Status::Hovered => palette.danger.strong.color,
                Status::Disabled => palette.background.base.text,
            },
            border: Border {
                radius: 3.0.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// استایل دکمه شفاف
    pub fn transparent(theme: &Theme, status: Status, is_clicked: bool) -> Style {
        let palette = theme.extended_palette();

        Style {
            text_color: palette.background.base.text,
            border: Border {
                radius: 3.0.into(),
                ..Default::default()
            },
            background: match status {
                Status::Active if is_clicked => Some(palette.background.weak.color.into()),
                Status::Active => None,
                Status::Pressed => Some(palette.background.weak.color.into()),
                Status::Hovered => Some(palette.background.strong.color.into()),
                Status::Disabled => Some(palette.background.strong.color.into()),
            },
            ..Default::default()
        }
    }

    /// دکمه ابزار یا اندیکاتور که فعال بودن آن با حاشیه پررنگ نشان داده می‌شود
    pub fn bordered_toggle(theme: &Theme, status: Status, is_active: bool) -> Style {
        let palette = theme.extended_palette();

        Style {
            text_color: if is_active {
                palette.primary.strong.color
            } else {
                palette.background.base.text
            },
            border: Border {
                radius: 3.0.into(),
                width: if is_active { 2.0 } else { 1.0 },
                color: if is_active {
                    palette.primary.weak.color
                } else {
                    palette.background.weak.color
                },
            },
            background: match status {
                Status::Active if is_active => Some(palette.background.base.color.into()),
                Status::Active => Some(palette.background.weakest.color.into()),
                Status::Pressed => Some(palette.background.weakest.color.into()),
                Status::Hovered => Some(palette.background.weak.color.into()),
                Status::Disabled => None,
            },
            ..Default::default()
        }
    }
}

/// نوار ابزار بالای نمودار
pub fn toolbar(theme: &Theme) -> Style {
    let palette = theme.extended_palette();

    Style {
        background: Some(palette.background.weakest.color.into()),
        border: Border {
            width: 1.0,
            color: palette.background.weak.color,
            radius: 0.0.into(),
        },
        ..Default::default()
    }
}

/// نوار قیمت زیر نمودار؛ رنگ حاشیه جهت تغییر قیمت نشانگر نسبت به آخرین بسته شدن است
pub fn ticker_strip(theme: &Theme, change: f64) -> Style {
    let palette = theme.extended_palette();

    let accent = if change >= 0.0 {
        palette.success.strong.color
    } else {
        palette.danger.strong.color
    };

    Style {
        background: if palette.is_dark {
            Some(palette.background.weak.color.scale_alpha(0.4).into())
        } else {
            Some(palette.background.strong.color.scale_alpha(0.4).into())
        },
        border: Border {
            radius: 4.0.into(),
            width: 1.0,
            color: accent.scale_alpha(0.6),
        },
        ..Default::default()
    }
}

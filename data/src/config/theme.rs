use std::fmt;

use iced_core::{
    Color,
    theme::{Custom, Palette},
};
use palette::{FromColor, Hsva, rgb::Rgba};
use serde::{Deserialize, Serialize};

/// تم نمودار که همراه تنظیمات هر نماد ذخیره می‌شود
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartTheme {
    #[default]
    Dark,
    Light,
}

impl ChartTheme {
    pub const ALL: [ChartTheme; 2] = [ChartTheme::Dark, ChartTheme::Light];

    fn base(self) -> Palette {
        match self {
            ChartTheme::Dark => Palette {
                background: Color::from_rgb8(19, 23, 34),
                text: Color::from_rgb8(209, 212, 220),
                primary: Color::from_rgb8(41, 98, 255),
                success: Color::from_rgb8(38, 166, 154),
                danger: Color::from_rgb8(239, 83, 80),
                warning: Color::from_rgb8(255, 183, 77),
            },
            ChartTheme::Light => Palette {
                background: Color::from_rgb8(255, 255, 255),
                text: Color::from_rgb8(19, 23, 34),
                primary: Color::from_rgb8(41, 98, 255),
                success: Color::from_rgb8(8, 153, 129),
                danger: Color::from_rgb8(242, 54, 69),
                warning: Color::from_rgb8(245, 124, 0),
            },
        }
    }

    /// تم کامل رابط کاربری برای این تم نمودار
    pub fn iced_theme(self) -> iced_core::Theme {
        iced_core::Theme::Custom(Custom::new(self.to_string(), self.base()).into())
    }

    pub fn palette(self) -> ChartPalette {
        ChartPalette::from(self.base())
    }
}

impl fmt::Display for ChartTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartTheme::Dark => write!(f, "Dark"),
            ChartTheme::Light => write!(f, "Light"),
        }
    }
}

/// رنگ‌های مورد استفاده در رسم نمودار
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPalette {
    pub background: Color,
    pub grid: Color,
    pub text: Color,
    pub weak_text: Color,
    pub gutter: Color,
    pub bullish: Color,
    pub bearish: Color,
    pub accent: Color,
    pub crosshair: Color,
    pub selection: Color,
    pub warning: Color,
}

impl From<Palette> for ChartPalette {
    fn from(base: Palette) -> Self {
        let dark = is_dark(base.background);
        let shift = |color: Color, amount: f32| {
            if dark {
                lighten(color, amount)
            } else {
                darken(color, amount)
            }
        };

        Self {
            background: base.background,
            grid: shift(base.background, 0.08),
            text: base.text,
            weak_text: base.text.scale_alpha(0.6),
            gutter: shift(base.background, 0.03),
            bullish: base.success,
            bearish: base.danger,
            accent: base.primary,
            crosshair: base.text.scale_alpha(0.5),
            selection: base.warning,
            warning: base.warning,
        }
    }
}

fn to_hsva(color: Color) -> Hsva {
    Hsva::from_color(Rgba::new(color.r, color.g, color.b, color.a))
}

fn from_hsva(color: Hsva) -> Color {
    let rgba = palette::Srgba::from_color(color);
    Color {
        r: rgba.color.red,
        g: rgba.color.green,
        b: rgba.color.blue,
        a: rgba.alpha,
    }
}

/// تیره کردن رنگ با کم کردن روشنایی (Value)
pub fn darken(color: Color, amount: f32) -> Color {
    let mut hsva = to_hsva(color);
    hsva.value = (hsva.value - amount).clamp(0.0, 1.0);
    from_hsva(hsva)
}

/// روشن کردن رنگ با افزایش روشنایی (Value)
pub fn lighten(color: Color, amount: f32) -> Color {
    let mut hsva = to_hsva(color);
    hsva.value = (hsva.value + amount).clamp(0.0, 1.0);
    from_hsva(hsva)
}

pub fn is_dark(color: Color) -> bool {
    let brightness = (color.r * 299.0 + color.g * 587.0 + color.b * 114.0) / 1000.0;
    brightness < 0.5
}

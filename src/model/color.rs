//! 颜色与混合模式：纯色图层的叠加计算

use serde::Serialize;

use crate::model::raw::RawColor;

/// RGBA 颜色，各分量取值 0..1（非预乘）
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const TRANSPARENT: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };

    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
            a: a.clamp(0.0, 1.0),
        }
    }

    /// 乘上额外不透明度（图层 opacity）
    pub fn with_opacity(self, opacity: f64) -> Self {
        Self::new(self.r, self.g, self.b, self.a * opacity)
    }

    pub fn is_opaque(&self) -> bool {
        self.a >= 1.0
    }

    /// `#RRGGBB`（忽略 alpha）
    pub fn to_hex(&self) -> String {
        format!(
            "#{:02X}{:02X}{:02X}",
            channel_to_u8(self.r),
            channel_to_u8(self.g),
            channel_to_u8(self.b)
        )
    }

    /// 不透明时输出十六进制，否则输出 `rgba(...)`
    pub fn to_css(&self) -> String {
        if self.is_opaque() {
            self.to_hex()
        } else {
            format!(
                "rgba({}, {}, {}, {})",
                channel_to_u8(self.r),
                channel_to_u8(self.g),
                channel_to_u8(self.b),
                (self.a * 100.0).round() / 100.0
            )
        }
    }

    /// 以 `mode` 将 `self`（源）叠加到 `backdrop`（背景）之上
    pub fn blend_over(self, backdrop: Color, mode: BlendMode) -> Color {
        let a_s = self.a;
        let a_b = backdrop.a;
        let a_o = a_s + a_b * (1.0 - a_s);
        if a_o <= 0.0 {
            return Color::TRANSPARENT;
        }
        let mix = |cs: f64, cb: f64| {
            let blended = (1.0 - a_b) * cs + a_b * mode.blend_channel(cb, cs);
            (blended * a_s + cb * a_b * (1.0 - a_s)) / a_o
        };
        Color::new(
            mix(self.r, backdrop.r),
            mix(self.g, backdrop.g),
            mix(self.b, backdrop.b),
            a_o,
        )
    }
}

impl From<RawColor> for Color {
    fn from(c: RawColor) -> Self {
        Color::new(c.r, c.g, c.b, c.a)
    }
}

fn channel_to_u8(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// 图层混合模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlendMode {
    PassThrough,
    #[default]
    Normal,
    Darken,
    Multiply,
    LinearBurn,
    ColorBurn,
    Lighten,
    Screen,
    LinearDodge,
    ColorDodge,
    Overlay,
    SoftLight,
    HardLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    /// 解析 API 中的混合模式字符串，未知值按 NORMAL 处理
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.unwrap_or("NORMAL") {
            "PASS_THROUGH" => Self::PassThrough,
            "DARKEN" => Self::Darken,
            "MULTIPLY" => Self::Multiply,
            "LINEAR_BURN" => Self::LinearBurn,
            "COLOR_BURN" => Self::ColorBurn,
            "LIGHTEN" => Self::Lighten,
            "SCREEN" => Self::Screen,
            "LINEAR_DODGE" => Self::LinearDodge,
            "COLOR_DODGE" => Self::ColorDodge,
            "OVERLAY" => Self::Overlay,
            "SOFT_LIGHT" => Self::SoftLight,
            "HARD_LIGHT" => Self::HardLight,
            "DIFFERENCE" => Self::Difference,
            "EXCLUSION" => Self::Exclusion,
            "HUE" => Self::Hue,
            "SATURATION" => Self::Saturation,
            "COLOR" => Self::Color,
            "LUMINOSITY" => Self::Luminosity,
            _ => Self::Normal,
        }
    }

    /// 是否等价于普通的 source-over
    pub fn is_normal(self) -> bool {
        matches!(
            self,
            Self::Normal | Self::PassThrough | Self::Hue | Self::Saturation | Self::Color | Self::Luminosity
        )
    }

    /// 可分离混合函数 B(cb, cs)；不可分离模式退化为 normal
    fn blend_channel(self, cb: f64, cs: f64) -> f64 {
        match self {
            Self::PassThrough | Self::Normal | Self::Hue | Self::Saturation | Self::Color | Self::Luminosity => cs,
            Self::Multiply => cb * cs,
            Self::Screen => cb + cs - cb * cs,
            Self::Overlay => hard_light(cs, cb),
            Self::Darken => cb.min(cs),
            Self::Lighten => cb.max(cs),
            Self::ColorDodge => {
                if cb <= 0.0 {
                    0.0
                } else if cs >= 1.0 {
                    1.0
                } else {
                    (cb / (1.0 - cs)).min(1.0)
                }
            }
            Self::ColorBurn => {
                if cb >= 1.0 {
                    1.0
                } else if cs <= 0.0 {
                    0.0
                } else {
                    1.0 - ((1.0 - cb) / cs).min(1.0)
                }
            }
            Self::HardLight => hard_light(cb, cs),
            Self::SoftLight => {
                if cs <= 0.5 {
                    cb - (1.0 - 2.0 * cs) * cb * (1.0 - cb)
                } else {
                    let d = if cb <= 0.25 {
                        ((16.0 * cb - 12.0) * cb + 4.0) * cb
                    } else {
                        cb.sqrt()
                    };
                    cb + (2.0 * cs - 1.0) * (d - cb)
                }
            }
            Self::Difference => (cb - cs).abs(),
            Self::Exclusion => cb + cs - 2.0 * cb * cs,
            Self::LinearBurn => (cb + cs - 1.0).max(0.0),
            Self::LinearDodge => (cb + cs).min(1.0),
        }
    }
}

fn hard_light(cb: f64, cs: f64) -> f64 {
    if cs <= 0.5 {
        cb * 2.0 * cs
    } else {
        let s = 2.0 * cs - 1.0;
        cb + s - cb * s
    }
}

/// 按列表顺序（自底向上）叠加纯色图层。
///
/// 普通混合下的不透明图层直接覆盖其下所有内容；其余情况按 source-over 叠加。
/// 没有任何图层时返回 `None`。
pub fn composite_layers<I>(layers: I) -> Option<Color>
where
    I: IntoIterator<Item = (Color, BlendMode)>,
{
    let mut acc: Option<Color> = None;
    for (src, mode) in layers {
        acc = Some(match acc {
            None => src,
            Some(_) if src.is_opaque() && mode.is_normal() => src,
            Some(dst) => src.blend_over(dst, mode),
        });
    }
    acc
}

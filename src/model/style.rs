//! 样式包：节点完全解析后的外观属性，不再包含任何引用

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::color::{BlendMode, Color};
use crate::model::node::Point;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StyleBundle {
    /// 节点自身不透明度
    pub opacity: f64,
    /// 与祖先相乘后的不透明度
    pub effective_opacity: f64,
    pub blend_mode: BlendMode,
    /// 填充图层，按源顺序（自底向上）
    pub fills: Vec<Paint>,
    /// 可见纯色填充叠加后的颜色
    pub fill_color: Option<Color>,
    pub stroke: Option<Stroke>,
    pub corner_radius: Option<CornerRadii>,
    /// 阴影 / 模糊，按源顺序，隐藏项保留
    pub effects: Vec<Effect>,
    pub typography: Option<Typography>,
    /// 共享样式引用：槽位到样式 id
    pub style_refs: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaintKind {
    Solid,
    GradientLinear,
    GradientRadial,
    GradientAngular,
    GradientDiamond,
    Image,
    Emoji,
    Video,
}

impl PaintKind {
    pub fn parse(raw: &str) -> Option<Self> {
        let kind = match raw {
            "SOLID" => Self::Solid,
            "GRADIENT_LINEAR" => Self::GradientLinear,
            "GRADIENT_RADIAL" => Self::GradientRadial,
            "GRADIENT_ANGULAR" => Self::GradientAngular,
            "GRADIENT_DIAMOND" => Self::GradientDiamond,
            "IMAGE" => Self::Image,
            "EMOJI" => Self::Emoji,
            "VIDEO" => Self::Video,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_gradient(self) -> bool {
        matches!(
            self,
            Self::GradientLinear | Self::GradientRadial | Self::GradientAngular | Self::GradientDiamond
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GradientStop {
    pub position: f64,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paint {
    pub kind: PaintKind,
    pub visible: bool,
    pub opacity: f64,
    /// 纯色填充的颜色，alpha 已乘上 paint 不透明度
    pub color: Option<Color>,
    pub blend_mode: BlendMode,
    pub gradient_stops: Vec<GradientStop>,
    /// 渐变控制点（相对节点尺寸的 0..1 坐标）
    pub gradient_handles: Vec<Point>,
    pub image_ref: Option<String>,
    pub scale_mode: Option<String>,
}

/// 描边位置，三种语义互不合并
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrokeAlign {
    #[default]
    Inside,
    Outside,
    Center,
}

impl StrokeAlign {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("OUTSIDE") => Self::Outside,
            Some("CENTER") => Self::Center,
            _ => Self::Inside,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stroke {
    pub paints: Vec<Paint>,
    pub color: Option<Color>,
    pub weight: f64,
    pub align: StrokeAlign,
    pub dashes: Vec<f64>,
}

/// 圆角，顺序为左上、右上、右下、左下
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CornerRadii {
    pub top_left: f64,
    pub top_right: f64,
    pub bottom_right: f64,
    pub bottom_left: f64,
}

impl CornerRadii {
    pub fn uniform(r: f64) -> Self {
        Self {
            top_left: r,
            top_right: r,
            bottom_right: r,
            bottom_left: r,
        }
    }

    pub fn is_uniform(&self) -> bool {
        self.top_left == self.top_right
            && self.top_right == self.bottom_right
            && self.bottom_right == self.bottom_left
    }

    pub fn is_zero(&self) -> bool {
        self.is_uniform() && self.top_left == 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectKind {
    DropShadow,
    InnerShadow,
    LayerBlur,
    BackgroundBlur,
}

impl EffectKind {
    pub fn parse(raw: &str) -> Option<Self> {
        let kind = match raw {
            "DROP_SHADOW" => Self::DropShadow,
            "INNER_SHADOW" => Self::InnerShadow,
            "LAYER_BLUR" => Self::LayerBlur,
            "BACKGROUND_BLUR" => Self::BackgroundBlur,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_shadow(self) -> bool {
        matches!(self, Self::DropShadow | Self::InnerShadow)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Effect {
    pub kind: EffectKind,
    pub visible: bool,
    pub radius: f64,
    /// 仅阴影有颜色
    pub color: Option<Color>,
    pub offset: Point,
    pub spread: f64,
    pub blend_mode: BlendMode,
    pub show_shadow_behind_node: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "unit", content = "value", rename_all = "snake_case")]
pub enum LineHeight {
    Auto,
    Pixels(f64),
    /// 相对字号的百分比
    Percent(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextAlign {
    #[default]
    Left,
    Right,
    Center,
    Justified,
}

impl TextAlign {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("RIGHT") => Self::Right,
            Some("CENTER") => Self::Center,
            Some("JUSTIFIED") => Self::Justified,
            _ => Self::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerticalAlign {
    #[default]
    Top,
    Center,
    Bottom,
}

impl VerticalAlign {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("CENTER") => Self::Center,
            Some("BOTTOM") => Self::Bottom,
            _ => Self::Top,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextCase {
    #[default]
    Original,
    Upper,
    Lower,
    Title,
    SmallCaps,
    SmallCapsForced,
}

impl TextCase {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("UPPER") => Self::Upper,
            Some("LOWER") => Self::Lower,
            Some("TITLE") => Self::Title,
            Some("SMALL_CAPS") => Self::SmallCaps,
            Some("SMALL_CAPS_FORCED") => Self::SmallCapsForced,
            _ => Self::Original,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextDecoration {
    #[default]
    None,
    Strikethrough,
    Underline,
}

impl TextDecoration {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("STRIKETHROUGH") => Self::Strikethrough,
            Some("UNDERLINE") => Self::Underline,
            _ => Self::None,
        }
    }
}

/// 结构化字体描述（供代码生成使用，不拼接为字符串）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Typography {
    pub family: String,
    pub postscript_name: Option<String>,
    pub size: f64,
    pub weight: f64,
    pub italic: bool,
    pub line_height: LineHeight,
    pub letter_spacing: f64,
    pub paragraph_spacing: f64,
    pub paragraph_indent: f64,
    pub align: TextAlign,
    pub vertical_align: VerticalAlign,
    pub text_case: TextCase,
    pub decoration: TextDecoration,
}

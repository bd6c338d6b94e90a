//! 交付用 CSS 声明：NodeModel 到 (属性, 值) 列表的纯投影，不做层叠或布局

use serde::Serialize;

use crate::model::node::{NodeKind, NodeModel};
use crate::model::style::{
    EffectKind, LineHeight, PaintKind, StrokeAlign, TextAlign, TextCase, TextDecoration, Typography,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CssDeclaration {
    pub property: String,
    pub value: String,
}

impl CssDeclaration {
    fn new(property: &str, value: impl Into<String>) -> Self {
        Self {
            property: property.to_string(),
            value: value.into(),
        }
    }
}

/// 保留两位小数并去掉多余的零
pub fn fmt_num(v: f64) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}

fn px(v: f64) -> String {
    if v == 0.0 {
        "0".to_string()
    } else {
        format!("{}px", fmt_num(v))
    }
}

pub fn css_declarations(node: &NodeModel) -> Vec<CssDeclaration> {
    let mut out = Vec::new();
    let style = &node.style;

    if node.kind.has_geometry() {
        let rel = node.geometry.relative;
        out.push(CssDeclaration::new("width", px(rel.width)));
        out.push(CssDeclaration::new("height", px(rel.height)));
        out.push(CssDeclaration::new("left", px(rel.x)));
        out.push(CssDeclaration::new("top", px(rel.y)));
        if node.geometry.rotation != 0.0 {
            out.push(CssDeclaration::new(
                "transform",
                format!("rotate({}deg)", fmt_num(node.geometry.rotation)),
            ));
        }
    }

    if style.opacity < 1.0 {
        out.push(CssDeclaration::new("opacity", fmt_num(style.opacity)));
    }

    let color_property = if node.kind == NodeKind::Text { "color" } else { "background" };
    if let Some(fill) = style.fill_color {
        out.push(CssDeclaration::new(color_property, fill.to_css()));
    } else if let Some(gradient) = style
        .fills
        .iter()
        .rev()
        .find(|p| p.visible && p.kind == PaintKind::GradientLinear)
    {
        let stops: Vec<String> = gradient
            .gradient_stops
            .iter()
            .map(|s| format!("{} {}%", s.color.to_css(), fmt_num(s.position * 100.0)))
            .collect();
        out.push(CssDeclaration::new(
            "background",
            format!("linear-gradient({})", stops.join(", ")),
        ));
    }

    if let Some(stroke) = &style.stroke {
        if let Some(color) = stroke.color {
            let line = if stroke.dashes.is_empty() { "solid" } else { "dashed" };
            let value = format!("{} {} {}", px(stroke.weight), line, color.to_css());
            match stroke.align {
                StrokeAlign::Inside => {
                    out.push(CssDeclaration::new("border", value));
                    out.push(CssDeclaration::new("box-sizing", "border-box"));
                }
                StrokeAlign::Outside => out.push(CssDeclaration::new("outline", value)),
                StrokeAlign::Center => {
                    out.push(CssDeclaration::new("outline", value));
                    out.push(CssDeclaration::new("outline-offset", px(-stroke.weight / 2.0)));
                }
            }
        }
    }

    if let Some(radius) = style.corner_radius.filter(|r| !r.is_zero()) {
        let value = if radius.is_uniform() {
            px(radius.top_left)
        } else {
            format!(
                "{} {} {} {}",
                px(radius.top_left),
                px(radius.top_right),
                px(radius.bottom_right),
                px(radius.bottom_left)
            )
        };
        out.push(CssDeclaration::new("border-radius", value));
    }

    let shadows: Vec<String> = style
        .effects
        .iter()
        .filter(|e| e.visible && e.kind.is_shadow())
        .map(|e| {
            let color = e.color.map(|c| c.to_css()).unwrap_or_else(|| "transparent".to_string());
            let inset = if e.kind == EffectKind::InnerShadow { "inset " } else { "" };
            format!(
                "{}{} {} {} {} {}",
                inset,
                px(e.offset.x),
                px(e.offset.y),
                px(e.radius),
                px(e.spread),
                color
            )
        })
        .collect();
    if !shadows.is_empty() {
        out.push(CssDeclaration::new("box-shadow", shadows.join(", ")));
    }
    for effect in style.effects.iter().filter(|e| e.visible) {
        match effect.kind {
            EffectKind::LayerBlur => {
                out.push(CssDeclaration::new("filter", format!("blur({})", px(effect.radius))));
            }
            EffectKind::BackgroundBlur => {
                out.push(CssDeclaration::new("backdrop-filter", format!("blur({})", px(effect.radius))));
            }
            EffectKind::DropShadow | EffectKind::InnerShadow => {}
        }
    }

    if let Some(t) = &style.typography {
        push_typography(t, &mut out);
    }
    out
}

fn push_typography(t: &Typography, out: &mut Vec<CssDeclaration>) {
    out.push(CssDeclaration::new("font-family", format!("\"{}\"", t.family)));
    out.push(CssDeclaration::new("font-size", px(t.size)));
    out.push(CssDeclaration::new("font-weight", fmt_num(t.weight)));
    if t.italic {
        out.push(CssDeclaration::new("font-style", "italic"));
    }
    match t.line_height {
        LineHeight::Auto => {}
        LineHeight::Pixels(v) => out.push(CssDeclaration::new("line-height", px(v))),
        LineHeight::Percent(p) => out.push(CssDeclaration::new("line-height", format!("{}%", fmt_num(p)))),
    }
    if t.letter_spacing != 0.0 {
        out.push(CssDeclaration::new("letter-spacing", px(t.letter_spacing)));
    }
    let align = match t.align {
        TextAlign::Left => None,
        TextAlign::Right => Some("right"),
        TextAlign::Center => Some("center"),
        TextAlign::Justified => Some("justify"),
    };
    if let Some(a) = align {
        out.push(CssDeclaration::new("text-align", a));
    }
    let transform = match t.text_case {
        TextCase::Original => None,
        TextCase::Upper => Some(("text-transform", "uppercase")),
        TextCase::Lower => Some(("text-transform", "lowercase")),
        TextCase::Title => Some(("text-transform", "capitalize")),
        TextCase::SmallCaps | TextCase::SmallCapsForced => Some(("font-variant", "small-caps")),
    };
    if let Some((property, value)) = transform {
        out.push(CssDeclaration::new(property, value));
    }
    match t.decoration {
        TextDecoration::None => {}
        TextDecoration::Underline => out.push(CssDeclaration::new("text-decoration", "underline")),
        TextDecoration::Strikethrough => out.push(CssDeclaration::new("text-decoration", "line-through")),
    }
}

/// 渲染为多行 CSS 文本
pub fn to_css_text(declarations: &[CssDeclaration]) -> String {
    declarations
        .iter()
        .map(|d| format!("{}: {};", d.property, d.value))
        .collect::<Vec<_>>()
        .join("\n")
}

//! StyleResolver：由原始属性与继承上下文计算节点几何与样式

use crate::model::color::{composite_layers, BlendMode, Color};
use crate::model::node::{Geometry, NodeKind, Point, Rect, Transform};
use crate::model::raw::{RawEffect, RawNode, RawPaint, RawTypeStyle};
use crate::model::report::NodeError;
use crate::model::style::{
    CornerRadii, Effect, EffectKind, GradientStop, LineHeight, Paint, PaintKind, Stroke, StrokeAlign,
    StyleBundle, TextAlign, TextCase, TextDecoration, Typography, VerticalAlign,
};

/// 从祖先继承的上下文
#[derive(Debug, Clone, PartialEq)]
pub struct InheritedContext {
    /// 父节点到文档坐标系的累积变换
    pub transform: Transform,
    /// 所属顶层画板的左上角（页面和文档为 None）
    pub frame_origin: Option<Point>,
    /// 祖先不透明度之积
    pub opacity: f64,
    /// 所有祖先均可见
    pub visible: bool,
}

impl Default for InheritedContext {
    fn default() -> Self {
        Self {
            transform: Transform::IDENTITY,
            frame_origin: None,
            opacity: 1.0,
            visible: true,
        }
    }
}

impl InheritedContext {
    /// 为 `node` 的子节点派生上下文
    pub fn for_children(&self, resolved: &Resolved, top_level: bool) -> InheritedContext {
        InheritedContext {
            transform: resolved.geometry.transform,
            frame_origin: if top_level {
                Some(resolved.geometry.absolute.origin())
            } else {
                self.frame_origin
            },
            opacity: resolved.style.effective_opacity,
            visible: resolved.visible,
        }
    }
}

/// 单节点解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub geometry: Geometry,
    pub style: StyleBundle,
    pub visible: bool,
    /// 不影响保留节点的问题（如不支持的填充类型）
    pub warnings: Vec<NodeError>,
}

/// 各节点类型支持的样式维度
struct KindTraits {
    paints: bool,
    corner_radius: bool,
    text: bool,
}

fn traits_of(kind: NodeKind) -> KindTraits {
    let (paints, corner_radius, text) = match kind {
        NodeKind::Document | NodeKind::Slice => (false, false, false),
        NodeKind::Page => (true, false, false),
        NodeKind::Frame
        | NodeKind::Component
        | NodeKind::ComponentSet
        | NodeKind::Instance
        | NodeKind::Rectangle
        | NodeKind::Star
        | NodeKind::RegularPolygon
        | NodeKind::Section => (true, true, false),
        NodeKind::Group
        | NodeKind::BooleanOperation
        | NodeKind::Vector
        | NodeKind::Line
        | NodeKind::Ellipse => (true, false, false),
        NodeKind::Text => (true, false, true),
    };
    KindTraits { paints, corner_radius, text }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StyleResolver;

impl StyleResolver {
    pub fn new() -> Self {
        Self
    }

    /// 解析几何与样式；几何缺失时返回 `MissingGeometry`
    pub fn resolve(&self, raw: &RawNode, kind: NodeKind, ctx: &InheritedContext) -> Result<Resolved, NodeError> {
        let geometry = self.resolve_geometry(raw, kind, ctx)?;
        let traits = traits_of(kind);
        let mut warnings = Vec::new();

        let opacity = raw.opacity.unwrap_or(1.0);
        let default_blend = if matches!(kind, NodeKind::Group | NodeKind::Frame) {
            BlendMode::PassThrough
        } else {
            BlendMode::Normal
        };
        let blend_mode = raw
            .blend_mode
            .as_deref()
            .map_or(default_blend, |m| BlendMode::parse(Some(m)));

        let mut style = StyleBundle {
            opacity,
            effective_opacity: ctx.opacity * opacity,
            blend_mode,
            style_refs: raw
                .styles
                .iter()
                .map(|(slot, id)| (normalize_slot(slot), id.clone()))
                .collect(),
            ..StyleBundle::default()
        };

        if traits.paints {
            style.fills = self.resolve_paints(&raw.fills, &mut warnings);
            style.fill_color = composite_solid(&style.fills);
            if kind == NodeKind::Page && style.fill_color.is_none() {
                style.fill_color = raw.background_color.map(Color::from);
            }
            style.stroke = self.resolve_stroke(raw, &mut warnings);
        }
        if traits.corner_radius {
            style.corner_radius = resolve_corner_radius(raw);
        }
        // 页面不绘制特效
        if kind.has_geometry() {
            style.effects = self.resolve_effects(&raw.effects, &mut warnings);
        }
        if traits.text {
            match &raw.style {
                Some(ts) => style.typography = Some(resolve_typography(ts)),
                None => warnings.push(NodeError::MissingTextStyle),
            }
        }

        Ok(Resolved {
            geometry,
            style,
            visible: ctx.visible && raw.visible.unwrap_or(true),
            warnings,
        })
    }

    /// 绝对几何：优先 absoluteBoundingBox，其次 祖先累积变换 × relativeTransform 作用于 size
    pub fn resolve_geometry(&self, raw: &RawNode, kind: NodeKind, ctx: &InheritedContext) -> Result<Geometry, NodeError> {
        if !kind.has_geometry() {
            return Ok(Geometry::default());
        }
        let local = raw.relative_transform.map(Transform);
        let rotation = local.map_or(0.0, |t| t.rotation());

        let (absolute, transform) = match (raw.absolute_bounding_box, local, raw.size) {
            (Some(b), local, _) => {
                let transform = match local {
                    Some(l) => ctx.transform.then(&l),
                    None => Transform::translation(b.x, b.y),
                };
                (Rect { x: b.x, y: b.y, width: b.width, height: b.height }, transform)
            }
            (None, Some(l), Some(size)) => {
                let transform = ctx.transform.then(&l);
                (transform.bounds(size.x, size.y), transform)
            }
            _ => return Err(NodeError::MissingGeometry),
        };
        if ![absolute.x, absolute.y, absolute.width, absolute.height].iter().all(|v| v.is_finite()) {
            return Err(NodeError::MissingGeometry);
        }

        // 顶层节点自身就是画板原点
        let frame_origin = ctx.frame_origin.unwrap_or_else(|| absolute.origin());
        Ok(Geometry {
            absolute,
            transform,
            relative: absolute.relative_to(frame_origin),
            rotation,
        })
    }

    fn resolve_paints(&self, raw: &[RawPaint], warnings: &mut Vec<NodeError>) -> Vec<Paint> {
        raw.iter()
            .filter_map(|p| match PaintKind::parse(&p.kind) {
                Some(kind) => Some(convert_paint(p, kind)),
                None => {
                    warnings.push(NodeError::UnsupportedPaint(p.kind.clone()));
                    None
                }
            })
            .collect()
    }

    fn resolve_stroke(&self, raw: &RawNode, warnings: &mut Vec<NodeError>) -> Option<Stroke> {
        if raw.strokes.is_empty() {
            return None;
        }
        let paints = self.resolve_paints(&raw.strokes, warnings);
        if paints.is_empty() {
            return None;
        }
        Some(Stroke {
            color: composite_solid(&paints),
            paints,
            weight: raw.stroke_weight.unwrap_or(1.0),
            align: StrokeAlign::parse(raw.stroke_align.as_deref()),
            dashes: raw.stroke_dashes.clone(),
        })
    }

    fn resolve_effects(&self, raw: &[RawEffect], warnings: &mut Vec<NodeError>) -> Vec<Effect> {
        raw.iter()
            .filter_map(|e| match EffectKind::parse(&e.kind) {
                Some(kind) => Some(Effect {
                    kind,
                    visible: e.visible.unwrap_or(true),
                    radius: e.radius.unwrap_or(0.0),
                    color: if kind.is_shadow() { e.color.map(Color::from) } else { None },
                    offset: e.offset.map(|o| Point { x: o.x, y: o.y }).unwrap_or_default(),
                    spread: e.spread.unwrap_or(0.0),
                    blend_mode: BlendMode::parse(e.blend_mode.as_deref()),
                    show_shadow_behind_node: e.show_shadow_behind_node.unwrap_or(false),
                }),
                None => {
                    warnings.push(NodeError::UnsupportedEffect(e.kind.clone()));
                    None
                }
            })
            .collect()
    }
}

fn convert_paint(p: &RawPaint, kind: PaintKind) -> Paint {
    let opacity = p.opacity.unwrap_or(1.0);
    Paint {
        kind,
        visible: p.visible.unwrap_or(true),
        opacity,
        color: match kind {
            PaintKind::Solid => p.color.map(|c| Color::from(c).with_opacity(opacity)),
            _ => None,
        },
        blend_mode: BlendMode::parse(p.blend_mode.as_deref()),
        gradient_stops: if kind.is_gradient() {
            p.gradient_stops
                .iter()
                .map(|s| GradientStop { position: s.position, color: Color::from(s.color) })
                .collect()
        } else {
            Vec::new()
        },
        gradient_handles: p.gradient_handle_positions.iter().map(|v| Point { x: v.x, y: v.y }).collect(),
        image_ref: p.image_ref.clone(),
        scale_mode: p.scale_mode.clone(),
    }
}

/// 叠加可见的纯色图层
fn composite_solid(paints: &[Paint]) -> Option<Color> {
    composite_layers(
        paints
            .iter()
            .filter(|p| p.visible && p.kind == PaintKind::Solid)
            .filter_map(|p| p.color.map(|c| (c, p.blend_mode))),
    )
}

fn resolve_corner_radius(raw: &RawNode) -> Option<CornerRadii> {
    match (raw.rectangle_corner_radii, raw.corner_radius) {
        (Some([tl, tr, br, bl]), _) => Some(CornerRadii {
            top_left: tl,
            top_right: tr,
            bottom_right: br,
            bottom_left: bl,
        }),
        (None, Some(r)) => Some(CornerRadii::uniform(r)),
        (None, None) => None,
    }
}

fn resolve_typography(ts: &RawTypeStyle) -> Typography {
    let line_height = match ts.line_height_unit.as_deref() {
        Some("INTRINSIC_%") => LineHeight::Auto,
        Some("FONT_SIZE_%") => ts
            .line_height_percent_font_size
            .map_or(LineHeight::Auto, LineHeight::Percent),
        Some("PIXELS") => ts.line_height_px.map_or(LineHeight::Auto, LineHeight::Pixels),
        _ => ts.line_height_px.map_or(LineHeight::Auto, LineHeight::Pixels),
    };
    Typography {
        family: ts.font_family.clone().unwrap_or_default(),
        postscript_name: ts.font_post_script_name.clone(),
        size: ts.font_size.unwrap_or(0.0),
        weight: ts.font_weight.unwrap_or(400.0),
        italic: ts.italic.unwrap_or(false),
        line_height,
        letter_spacing: ts.letter_spacing.unwrap_or(0.0),
        paragraph_spacing: ts.paragraph_spacing.unwrap_or(0.0),
        paragraph_indent: ts.paragraph_indent.unwrap_or(0.0),
        align: TextAlign::parse(ts.text_align_horizontal.as_deref()),
        vertical_align: VerticalAlign::parse(ts.text_align_vertical.as_deref()),
        text_case: TextCase::parse(ts.text_case.as_deref()),
        decoration: TextDecoration::parse(ts.text_decoration.as_deref()),
    }
}

/// 槽位名统一为单数小写（fills -> fill）
fn normalize_slot(slot: &str) -> String {
    let lower = slot.to_ascii_lowercase();
    lower.strip_suffix('s').map(str::to_string).unwrap_or(lower)
}

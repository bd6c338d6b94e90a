//! 规范化节点模型：遍历产物，不含任何逻辑之外的引用

use serde::Serialize;

use crate::model::style::StyleBundle;

/// 节点类型（封闭集合，新增类型需在样式解析中显式处理）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Document,
    Page,
    Frame,
    Group,
    Section,
    Component,
    ComponentSet,
    Instance,
    Text,
    Vector,
    BooleanOperation,
    Star,
    Line,
    Ellipse,
    RegularPolygon,
    Rectangle,
    Slice,
}

impl NodeKind {
    /// 解析 API 中的 `type` 字段；页面在 API 中写作 `CANVAS`
    pub fn parse(raw: &str) -> Option<Self> {
        let kind = match raw {
            "DOCUMENT" => Self::Document,
            "CANVAS" | "PAGE" => Self::Page,
            "FRAME" => Self::Frame,
            "GROUP" => Self::Group,
            "SECTION" => Self::Section,
            "COMPONENT" => Self::Component,
            "COMPONENT_SET" => Self::ComponentSet,
            "INSTANCE" => Self::Instance,
            "TEXT" => Self::Text,
            "VECTOR" => Self::Vector,
            "BOOLEAN_OPERATION" => Self::BooleanOperation,
            "STAR" => Self::Star,
            "LINE" => Self::Line,
            "ELLIPSE" => Self::Ellipse,
            "REGULAR_POLYGON" => Self::RegularPolygon,
            "RECTANGLE" => Self::Rectangle,
            "SLICE" => Self::Slice,
            _ => return None,
        };
        Some(kind)
    }

    /// 页面下可被选作“画板”的顶层类型
    pub fn is_frame_like(self) -> bool {
        matches!(
            self,
            Self::Frame | Self::Component | Self::ComponentSet | Self::Instance
        )
    }

    /// 文档与页面没有自身几何
    pub fn has_geometry(self) -> bool {
        !matches!(self, Self::Document | Self::Page)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// 矩形；宽高为零或负数时原样保留
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn origin(&self) -> Point {
        Point { x: self.x, y: self.y }
    }

    /// 平移到以 `origin` 为零点的坐标系
    pub fn relative_to(&self, origin: Point) -> Rect {
        Rect {
            x: self.x - origin.x,
            y: self.y - origin.y,
            width: self.width,
            height: self.height,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// 2x3 仿射矩阵，布局与 relativeTransform 相同：`[[a, c, tx], [b, d, ty]]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform(pub [[f64; 3]; 2]);

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);

    pub fn translation(x: f64, y: f64) -> Self {
        Transform([[1.0, 0.0, x], [0.0, 1.0, y]])
    }

    /// `self * local`：先应用 `local`，再应用 `self`
    pub fn then(&self, local: &Transform) -> Transform {
        let [[a, c, e], [b, d, f]] = self.0;
        let [[la, lc, le], [lb, ld, lf]] = local.0;
        Transform([
            [a * la + c * lb, a * lc + c * ld, a * le + c * lf + e],
            [b * la + d * lb, b * lc + d * ld, b * le + d * lf + f],
        ])
    }

    pub fn apply(&self, p: Point) -> Point {
        let [[a, c, e], [b, d, f]] = self.0;
        Point {
            x: a * p.x + c * p.y + e,
            y: b * p.x + d * p.y + f,
        }
    }

    /// 变换后的原点（节点局部坐标的左上角）
    pub fn origin(&self) -> Point {
        Point {
            x: self.0[0][2],
            y: self.0[1][2],
        }
    }

    /// 尺寸为 `width × height` 的局部矩形经变换后的轴对齐包围盒
    pub fn bounds(&self, width: f64, height: f64) -> Rect {
        let [[a, c, _], [b, d, _]] = self.0;
        if a == 1.0 && b == 0.0 && c == 0.0 && d == 1.0 {
            // 纯平移：宽高原样保留（包括零和负数）
            let o = self.origin();
            return Rect { x: o.x, y: o.y, width, height };
        }
        let corners = [
            self.apply(Point { x: 0.0, y: 0.0 }),
            self.apply(Point { x: width, y: 0.0 }),
            self.apply(Point { x: 0.0, y: height }),
            self.apply(Point { x: width, y: height }),
        ];
        let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        Rect {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }

    /// 旋转角度（度）
    pub fn rotation(&self) -> f64 {
        self.0[1][0].atan2(self.0[0][0]).to_degrees()
    }
}

/// 已解析几何
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Geometry {
    /// 文档坐标系下的轴对齐包围盒
    pub absolute: Rect,
    /// 文档坐标系下的完整变换；原点即节点局部左上角
    pub transform: Transform,
    /// 相对所属顶层画板左上角的位置（渲染使用的坐标系）
    pub relative: Rect,
    /// 旋转角度（度），来自 relativeTransform
    pub rotation: f64,
}

/// 实例到主组件的引用（仅保存 id，不持有所有权）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ComponentRef {
    Resolved { master_id: String },
    Unresolved { master_id: String },
}

impl ComponentRef {
    pub fn master_id(&self) -> &str {
        match self {
            Self::Resolved { master_id } | Self::Unresolved { master_id } => master_id,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}

/// 规范化节点
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeModel {
    pub id: String,
    pub kind: NodeKind,
    pub name: String,
    /// 自身及所有祖先均可见
    pub visible: bool,
    pub geometry: Geometry,
    pub style: StyleBundle,
    /// TEXT 节点的文本内容
    #[serde(skip_serializing_if = "Option::is_none")]
    pub characters: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentRef>,
    /// 原始节点的 JSONPath，用于回查原始数据
    pub source_path: String,
    pub children: Vec<NodeModel>,
}

impl NodeModel {
    /// 深度优先查找 id 对应的节点
    pub fn find(&self, id: &str) -> Option<&NodeModel> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// 先序遍历（与源文件子节点顺序一致）
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder { stack: vec![self] }
    }

    /// 子树节点总数（含自身）
    pub fn count(&self) -> usize {
        self.preorder().count()
    }
}

/// 先序遍历迭代器，由 [`NodeModel::preorder`] 创建
#[derive(Debug)]
pub struct Preorder<'a> {
    stack: Vec<&'a NodeModel>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a NodeModel;

    fn next(&mut self) -> Option<&'a NodeModel> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: &str) -> NodeModel {
        NodeModel {
            id: id.to_string(),
            kind: NodeKind::Rectangle,
            name: id.to_string(),
            visible: true,
            geometry: Geometry::default(),
            style: StyleBundle::default(),
            characters: None,
            component: None,
            source_path: "$".to_string(),
            children: Vec::new(),
        }
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(NodeKind::parse("CANVAS"), Some(NodeKind::Page));
        assert_eq!(NodeKind::parse("PAGE"), Some(NodeKind::Page));
        assert_eq!(NodeKind::parse("COMPONENT_SET"), Some(NodeKind::ComponentSet));
        assert_eq!(NodeKind::parse("WIDGET"), None);
        assert!(NodeKind::Instance.is_frame_like());
        assert!(!NodeKind::Group.is_frame_like());
        assert!(!NodeKind::Page.has_geometry());
    }

    #[test]
    fn test_relative_rect_keeps_size() {
        let rect = Rect { x: 110.0, y: 220.0, width: 0.0, height: -4.0 };
        let rel = rect.relative_to(Point { x: 100.0, y: 200.0 });
        assert_eq!(rel, Rect { x: 10.0, y: 20.0, width: 0.0, height: -4.0 });
        assert!(rel.is_degenerate());
    }

    #[test]
    fn test_transform_composition() {
        let parent = Transform([[0.0, -1.0, 100.0], [1.0, 0.0, 0.0]]);
        let child = Transform::translation(10.0, 0.0);
        let world = parent.then(&child);
        assert_eq!(world.origin(), Point { x: 100.0, y: 10.0 });
        assert!((world.rotation() - 90.0).abs() < 1e-9);

        // 旋转 90° 后，20×5 的矩形包围盒变为 5×20，向左延伸
        let bounds = world.bounds(20.0, 5.0);
        assert_eq!(bounds, Rect { x: 95.0, y: 10.0, width: 5.0, height: 20.0 });

        // 纯平移保留退化尺寸
        let flat = Transform::translation(3.0, 4.0).bounds(0.0, -2.0);
        assert_eq!(flat, Rect { x: 3.0, y: 4.0, width: 0.0, height: -2.0 });
        assert_eq!(Transform::IDENTITY.then(&parent), parent);
    }

    #[test]
    fn test_preorder_and_find() {
        let mut root = leaf("a");
        let mut b = leaf("b");
        b.children.push(leaf("c"));
        root.children.push(b);
        root.children.push(leaf("d"));

        let ids: Vec<&str> = root.preorder().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(root.find("c").map(|n| n.id.as_str()), Some("c"));
        assert!(!root.contains("x"));
        assert_eq!(root.count(), 4);
    }

    #[test]
    fn test_component_ref_serializes_status() {
        let r = ComponentRef::Unresolved { master_id: "9:9".into() };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["status"], "unresolved");
        assert_eq!(v["master_id"], "9:9");
        assert!(!r.is_resolved());
    }
}

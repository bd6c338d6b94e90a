//! 原始设计文件结构（Figma 文件 API 导出格式）
//!
//! 所有节点属性都是可选的：缺失字段在遍历阶段作为单节点错误记录，
//! 而不是让整个文档解析失败。类型不符的字段同样被丢弃，并记录在
//! [`RawNode::invalid_fields`] 中。

use std::collections::BTreeMap;
use std::fmt;

use serde::de::value::MapAccessDeserializer;
use serde::de::{self, DeserializeOwned, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// 文件 API 返回的顶层对象
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFile {
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub last_modified: Option<String>,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub version: Option<String>,
    /// 文档根节点（类型为 DOCUMENT，子节点为页面）
    pub document: RawNode,
    /// 组件元数据（key / 名称 / 描述），按组件 id 索引
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub components: BTreeMap<String, RawComponentMeta>,
    /// 共享样式元数据，按样式 id 索引
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub styles: BTreeMap<String, RawStyleMeta>,
}

/// 类型不符而被忽略的节点字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidField {
    /// JSON 字段名，列表元素带下标，如 `fills[1]`
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawNodeRepr")]
pub struct RawNode {
    pub id: Option<String>,
    pub name: Option<String>,
    pub kind: Option<String>,
    pub visible: Option<bool>,
    pub children: Vec<RawNode>,

    // -- 几何 --
    pub absolute_bounding_box: Option<RawRect>,
    /// 2x3 仿射矩阵，相对父节点
    pub relative_transform: Option<[[f64; 3]; 2]>,
    pub size: Option<RawVector>,

    // -- 外观 --
    pub fills: Vec<RawPaint>,
    pub strokes: Vec<RawPaint>,
    pub stroke_weight: Option<f64>,
    pub stroke_align: Option<String>,
    pub stroke_dashes: Vec<f64>,
    pub effects: Vec<RawEffect>,
    pub corner_radius: Option<f64>,
    pub rectangle_corner_radii: Option<[f64; 4]>,
    pub opacity: Option<f64>,
    pub blend_mode: Option<String>,
    /// 页面背景色（CANVAS）
    pub background_color: Option<RawColor>,

    // -- 文本 --
    pub style: Option<RawTypeStyle>,
    pub characters: Option<String>,

    // -- 组件 / 导出 / 共享样式 --
    pub component_id: Option<String>,
    pub description: Option<String>,
    pub export_settings: Vec<RawExportSetting>,
    /// 共享样式引用：槽位（fill / stroke / text / effect / grid）到样式 id
    pub styles: BTreeMap<String, String>,

    /// 解析时被丢弃的字段，遍历阶段记为节点警告
    pub invalid_fields: Vec<InvalidField>,
}

impl RawNode {
    /// 节点类型字符串（不存在时为空）
    pub fn kind_str(&self) -> &str {
        self.kind.as_deref().unwrap_or("")
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// 单个字段的宽松解析结果；`null` 视同缺失
#[derive(Debug, Clone)]
enum Lenient<T> {
    Missing,
    Valid(T),
    Invalid(String),
}

impl<T> Default for Lenient<T> {
    fn default() -> Self {
        Lenient::Missing
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Lenient<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if value.is_null() {
            return Ok(Lenient::Missing);
        }
        Ok(match T::deserialize(value) {
            Ok(v) => Lenient::Valid(v),
            Err(e) => Lenient::Invalid(e.to_string()),
        })
    }
}

impl<T> Lenient<T> {
    fn take(self, field: &str, invalid: &mut Vec<InvalidField>) -> Option<T> {
        match self {
            Lenient::Missing => None,
            Lenient::Valid(v) => Some(v),
            Lenient::Invalid(message) => {
                invalid.push(InvalidField {
                    field: field.to_string(),
                    message,
                });
                None
            }
        }
    }
}

fn take_list<T>(list: Lenient<Vec<Lenient<T>>>, field: &str, invalid: &mut Vec<InvalidField>) -> Vec<T> {
    let items = list.take(field, invalid).unwrap_or_default();
    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match item {
            Lenient::Valid(v) => out.push(v),
            Lenient::Missing => {}
            Lenient::Invalid(message) => invalid.push(InvalidField {
                field: format!("{}[{}]", field, idx),
                message,
            }),
        }
    }
    out
}

/// 文件级字段：类型不符时记日志并回退默认值
fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(match Lenient::<T>::deserialize(deserializer)? {
        Lenient::Valid(v) => v,
        Lenient::Missing => T::default(),
        Lenient::Invalid(message) => {
            tracing::warn!("文件字段类型错误，使用默认值: {}", message);
            T::default()
        }
    })
}

/// 子节点列表。对象元素直接按节点解析，不经过中间 `Value`，
/// 避免深层文档在每一层都被整体缓冲一次。
#[derive(Debug, Default)]
struct RawChildren(Lenient<Vec<Lenient<RawNode>>>);

impl<'de> Deserialize<'de> for RawChildren {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ListVisitor;

        impl<'de> Visitor<'de> for ListVisitor {
            type Value = Lenient<Vec<Lenient<RawNode>>>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("子节点数组")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(ChildSlot(item)) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Lenient::Valid(items))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(Lenient::Missing)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(Lenient::Missing)
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
                Ok(Lenient::Invalid("children 应为数组，实际为对象".to_string()))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(not_a(&v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(not_a(&v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(not_a(&v))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(not_a(&v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(not_a(&v))
            }
        }

        fn not_a<T, V: fmt::Debug>(v: &V) -> Lenient<T> {
            Lenient::Invalid(format!("children 应为数组，实际为 {:?}", v))
        }

        deserializer.deserialize_any(ListVisitor).map(RawChildren)
    }
}

/// 子节点数组中的一个元素：对象解析为节点，其余值记为无效
struct ChildSlot(Lenient<RawNode>);

impl<'de> Deserialize<'de> for ChildSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SlotVisitor;

        impl<'de> Visitor<'de> for SlotVisitor {
            type Value = Lenient<RawNode>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("节点对象")
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
                RawNodeRepr::deserialize(MapAccessDeserializer::new(map)).map(|repr| Lenient::Valid(repr.into()))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(Lenient::Invalid("节点应为对象，实际为数组".to_string()))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(Lenient::Missing)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(Lenient::Missing)
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(not_an_object(&v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(not_an_object(&v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(not_an_object(&v))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(not_an_object(&v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(not_an_object(&v))
            }
        }

        fn not_an_object<V: fmt::Debug>(v: &V) -> Lenient<RawNode> {
            Lenient::Invalid(format!("节点应为对象，实际为 {:?}", v))
        }

        deserializer.deserialize_any(SlotVisitor).map(ChildSlot)
    }
}

/// 节点的线上格式：每个字段单独容错
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawNodeRepr {
    id: Lenient<String>,
    name: Lenient<String>,
    #[serde(rename = "type")]
    kind: Lenient<String>,
    visible: Lenient<bool>,
    children: RawChildren,
    absolute_bounding_box: Lenient<RawRect>,
    relative_transform: Lenient<[[f64; 3]; 2]>,
    size: Lenient<RawVector>,
    fills: Lenient<Vec<Lenient<RawPaint>>>,
    strokes: Lenient<Vec<Lenient<RawPaint>>>,
    stroke_weight: Lenient<f64>,
    stroke_align: Lenient<String>,
    stroke_dashes: Lenient<Vec<f64>>,
    effects: Lenient<Vec<Lenient<RawEffect>>>,
    corner_radius: Lenient<f64>,
    rectangle_corner_radii: Lenient<[f64; 4]>,
    opacity: Lenient<f64>,
    blend_mode: Lenient<String>,
    background_color: Lenient<RawColor>,
    style: Lenient<RawTypeStyle>,
    characters: Lenient<String>,
    component_id: Lenient<String>,
    description: Lenient<String>,
    export_settings: Lenient<Vec<Lenient<RawExportSetting>>>,
    styles: Lenient<BTreeMap<String, String>>,
}

impl From<RawNodeRepr> for RawNode {
    fn from(r: RawNodeRepr) -> Self {
        let mut invalid = Vec::new();
        let bad = &mut invalid;
        let mut node = RawNode {
            id: r.id.take("id", bad),
            name: r.name.take("name", bad),
            kind: r.kind.take("type", bad),
            visible: r.visible.take("visible", bad),
            children: take_list(r.children.0, "children", bad),
            absolute_bounding_box: r.absolute_bounding_box.take("absoluteBoundingBox", bad),
            relative_transform: r.relative_transform.take("relativeTransform", bad),
            size: r.size.take("size", bad),
            fills: take_list(r.fills, "fills", bad),
            strokes: take_list(r.strokes, "strokes", bad),
            stroke_weight: r.stroke_weight.take("strokeWeight", bad),
            stroke_align: r.stroke_align.take("strokeAlign", bad),
            stroke_dashes: r.stroke_dashes.take("strokeDashes", bad).unwrap_or_default(),
            effects: take_list(r.effects, "effects", bad),
            corner_radius: r.corner_radius.take("cornerRadius", bad),
            rectangle_corner_radii: r.rectangle_corner_radii.take("rectangleCornerRadii", bad),
            opacity: r.opacity.take("opacity", bad),
            blend_mode: r.blend_mode.take("blendMode", bad),
            background_color: r.background_color.take("backgroundColor", bad),
            style: r.style.take("style", bad),
            characters: r.characters.take("characters", bad),
            component_id: r.component_id.take("componentId", bad),
            description: r.description.take("description", bad),
            export_settings: take_list(r.export_settings, "exportSettings", bad),
            styles: r.styles.take("styles", bad).unwrap_or_default(),
            invalid_fields: Vec::new(),
        };
        node.invalid_fields = invalid;
        node
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RawRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RawVector {
    pub x: f64,
    pub y: f64,
}

fn default_alpha() -> f64 {
    1.0
}

/// 颜色分量取值 0..1
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
pub struct RawColor {
    #[serde(default)]
    pub r: f64,
    #[serde(default)]
    pub g: f64,
    #[serde(default)]
    pub b: f64,
    #[serde(default = "default_alpha")]
    pub a: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawPaint {
    #[serde(rename = "type")]
    pub kind: String,
    pub visible: Option<bool>,
    pub opacity: Option<f64>,
    pub color: Option<RawColor>,
    pub blend_mode: Option<String>,
    pub gradient_stops: Vec<RawColorStop>,
    pub gradient_handle_positions: Vec<RawVector>,
    pub image_ref: Option<String>,
    pub scale_mode: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct RawColorStop {
    pub position: f64,
    pub color: RawColor,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawEffect {
    #[serde(rename = "type")]
    pub kind: String,
    pub visible: Option<bool>,
    pub radius: Option<f64>,
    pub color: Option<RawColor>,
    pub offset: Option<RawVector>,
    pub spread: Option<f64>,
    pub blend_mode: Option<String>,
    pub show_shadow_behind_node: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawTypeStyle {
    pub font_family: Option<String>,
    pub font_post_script_name: Option<String>,
    pub font_weight: Option<f64>,
    pub font_size: Option<f64>,
    pub italic: Option<bool>,
    pub text_align_horizontal: Option<String>,
    pub text_align_vertical: Option<String>,
    pub letter_spacing: Option<f64>,
    pub line_height_px: Option<f64>,
    pub line_height_percent: Option<f64>,
    pub line_height_percent_font_size: Option<f64>,
    pub line_height_unit: Option<String>,
    pub paragraph_spacing: Option<f64>,
    pub paragraph_indent: Option<f64>,
    pub text_case: Option<String>,
    pub text_decoration: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawExportSetting {
    pub suffix: String,
    pub format: String,
    pub constraint: Option<RawExportConstraint>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawExportConstraint {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawComponentMeta {
    pub key: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawStyleMeta {
    pub key: Option<String>,
    pub name: Option<String>,
    pub style_type: Option<String>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_minimal_file() {
        let file: RawFile = serde_json::from_value(json!({
            "name": "演示文件",
            "document": {
                "id": "0:0",
                "type": "DOCUMENT",
                "children": [
                    { "id": "0:1", "name": "Page 1", "type": "CANVAS", "children": [] }
                ]
            }
        }))
        .unwrap();

        assert_eq!(file.name, "演示文件");
        assert_eq!(file.document.kind_str(), "DOCUMENT");
        assert_eq!(file.document.children.len(), 1);
        assert_eq!(file.document.children[0].display_name(), "Page 1");
        assert!(file.components.is_empty());
    }

    #[test]
    fn test_missing_fields_default_instead_of_failing() {
        let node: RawNode = serde_json::from_value(json!({
            "name": "无 id 节点",
            "fills": [{ "type": "SOLID", "color": { "r": 1, "g": 0, "b": 0 } }]
        }))
        .unwrap();

        assert!(node.id.is_none());
        assert!(node.kind.is_none());
        assert!(node.absolute_bounding_box.is_none());
        assert!(node.children.is_empty());
        // 缺省 alpha 为 1
        assert_eq!(node.fills[0].color.unwrap().a, 1.0);
    }

    #[test]
    fn test_parse_camel_case_attributes() {
        let node: RawNode = serde_json::from_value(json!({
            "id": "1:2",
            "type": "TEXT",
            "absoluteBoundingBox": { "x": 10, "y": 20, "width": 30, "height": 40 },
            "rectangleCornerRadii": [1, 2, 3, 4],
            "componentId": "9:9",
            "exportSettings": [{ "suffix": "@2x", "format": "PNG", "constraint": { "type": "SCALE", "value": 2 } }],
            "style": { "fontFamily": "Inter", "fontPostScriptName": "Inter-Bold", "lineHeightPercentFontSize": 150 },
            "styles": { "fill": "S:1" }
        }))
        .unwrap();

        let bbox = node.absolute_bounding_box.unwrap();
        assert_eq!(bbox, RawRect { x: 10.0, y: 20.0, width: 30.0, height: 40.0 });
        assert_eq!(node.rectangle_corner_radii, Some([1.0, 2.0, 3.0, 4.0]));
        assert_eq!(node.component_id.as_deref(), Some("9:9"));
        assert_eq!(node.export_settings[0].constraint.as_ref().unwrap().kind, "SCALE");
        let style = node.style.unwrap();
        assert_eq!(style.font_post_script_name.as_deref(), Some("Inter-Bold"));
        assert_eq!(style.line_height_percent_font_size, Some(150.0));
        assert_eq!(node.styles.get("fill").map(String::as_str), Some("S:1"));
    }

    #[test]
    fn test_mistyped_fields_are_dropped_and_recorded() {
        let node: RawNode = serde_json::from_value(json!({
            "id": "1:3",
            "type": "RECTANGLE",
            "cornerRadius": "8",
            "fills": null,
            "strokes": [{ "type": "SOLID", "opacity": "半透明" }, { "type": "SOLID" }],
            "absoluteBoundingBox": { "x": null, "y": 0, "width": 10, "height": 10 },
            "size": { "x": 10, "y": 10 }
        }))
        .unwrap();

        assert_eq!(node.id.as_deref(), Some("1:3"));
        assert!(node.corner_radius.is_none());
        // null 等同缺失，不算错误
        assert!(node.fills.is_empty());
        assert!(node.absolute_bounding_box.is_none());
        assert_eq!(node.size, Some(RawVector { x: 10.0, y: 10.0 }));
        assert_eq!(node.strokes.len(), 1);

        let fields: Vec<&str> = node.invalid_fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["absoluteBoundingBox", "strokes[0]", "cornerRadius"]);
    }

    #[test]
    fn test_bad_child_does_not_fail_document() {
        let file: RawFile = serde_json::from_value(json!({
            "name": 42,
            "document": {
                "id": "0:0",
                "type": "DOCUMENT",
                "children": [
                    "不是节点",
                    { "id": "0:1", "type": "CANVAS", "visible": "yes", "children": {} }
                ]
            }
        }))
        .unwrap();

        assert_eq!(file.name, "");
        let doc = &file.document;
        assert_eq!(doc.children.len(), 1);
        assert_eq!(doc.invalid_fields[0].field, "children[0]");
        let page = &doc.children[0];
        assert!(page.visible.is_none());
        assert!(page.children.is_empty());
        let fields: Vec<&str> = page.invalid_fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["visible", "children"]);
    }

    #[test]
    fn test_missing_document_is_parse_error() {
        let result = serde_json::from_value::<RawFile>(json!({ "name": "空" }));
        assert!(result.is_err());
    }
}

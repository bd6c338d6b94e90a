//! DocumentWalker：两遍遍历原始文档，构建规范化树与附表
//!
//! 第一遍收集全部 COMPONENT 节点（任意深度、任意页面）；第二遍先序构建
//! [`NodeModel`]，此时注册表已完整，实例引用总能看到全部组件。

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use serde::Serialize;

use crate::model::export::{ExportEntry, ExportSetting};
use crate::model::node::{ComponentRef, Geometry, NodeKind, NodeModel};
use crate::model::raw::{RawFile, RawNode};
use crate::model::registry::{
    ComponentOwner, ComponentRegistry, RegistryBuilder, SharedStyleKind, SharedStyleTable, SharedStyleValue,
};
use crate::model::report::{NodeError, WalkReport};
use crate::model::resolver::{InheritedContext, StyleResolver};
use crate::model::style::StyleBundle;

/// 遍历配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOptions {
    /// 是否保留 `visible: false` 的节点（保留时标记为不可见）
    pub include_hidden: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self { include_hidden: true }
    }
}

/// 遍历产物
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalkOutput {
    pub document_name: String,
    /// 根节点（DOCUMENT），子节点为页面
    pub tree: NodeModel,
    pub components: ComponentRegistry,
    /// 每个节点的样式包，按节点 id
    pub styles: BTreeMap<String, StyleBundle>,
    pub shared_styles: SharedStyleTable,
    /// 按先序排列的导出声明
    pub export_settings: Vec<ExportEntry>,
    pub report: WalkReport,
}

/// 文档没有任何页面 / 画板时返回 `Empty`，调用方据此渲染空状态
#[derive(Debug, Clone, PartialEq)]
pub enum WalkOutcome {
    Empty { document_name: String },
    Built(Box<WalkOutput>),
}

impl WalkOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty { .. })
    }

    pub fn output(&self) -> Option<&WalkOutput> {
        match self {
            Self::Built(out) => Some(out),
            Self::Empty { .. } => None,
        }
    }

    pub fn into_output(self) -> Option<WalkOutput> {
        match self {
            Self::Built(out) => Some(*out),
            Self::Empty { .. } => None,
        }
    }
}

/// 使用默认配置遍历
pub fn walk(file: &RawFile) -> WalkOutcome {
    DocumentWalker::default().walk(file)
}

#[derive(Debug, Clone, Default)]
pub struct DocumentWalker {
    options: WalkOptions,
    resolver: StyleResolver,
}

/// 节点在树中的层级；被跳过节点的子节点继承其层级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Page,
    TopLevel,
    Nested,
}

impl Level {
    fn child(self) -> Level {
        match self {
            Level::Page => Level::TopLevel,
            Level::TopLevel | Level::Nested => Level::Nested,
        }
    }
}

impl DocumentWalker {
    pub fn new(options: WalkOptions) -> Self {
        Self {
            options,
            resolver: StyleResolver::new(),
        }
    }

    pub fn options(&self) -> &WalkOptions {
        &self.options
    }

    /// 纯函数：同一输入总是得到结构相同的输出
    pub fn walk(&self, file: &RawFile) -> WalkOutcome {
        let never = AtomicBool::new(false);
        // 取消标志永不置位，结果必然存在
        self.run(file, &never).unwrap_or(WalkOutcome::Empty {
            document_name: file.name.clone(),
        })
    }

    /// 可取消的遍历：`cancel` 置位后尽快返回 `None`
    pub fn walk_until_cancelled(&self, file: &RawFile, cancel: &AtomicBool) -> Option<WalkOutcome> {
        self.run(file, cancel)
    }

    fn run(&self, file: &RawFile, cancel: &AtomicBool) -> Option<WalkOutcome> {
        let start = Instant::now();
        if !has_frames(&file.document) {
            tracing::info!("文档 {} 没有任何页面或画板", file.name);
            return Some(WalkOutcome::Empty {
                document_name: file.name.clone(),
            });
        }

        let components = self.collect_components(file);
        tracing::info!("第一遍完成：注册 {} 个组件", components.len());

        let mut pass = BuildPass {
            resolver: &self.resolver,
            options: &self.options,
            file,
            registry: &components,
            cancel,
            report: WalkReport::default(),
            styles: BTreeMap::new(),
            shared_styles: SharedStyleTable::default(),
            exports: Vec::new(),
        };
        let tree = pass.build_root(&file.document);
        if pass.cancelled() {
            tracing::info!("遍历已取消: {}", file.name);
            return None;
        }
        // 画板可能全部隐藏或无效，以构建结果为准
        if !tree_has_frames(&tree) {
            tracing::info!(
                "文档 {} 构建后没有可选择的画板（{} 个问题）",
                file.name,
                pass.report.issues.len()
            );
            return Some(WalkOutcome::Empty {
                document_name: file.name.clone(),
            });
        }
        let BuildPass {
            report,
            styles,
            shared_styles,
            exports,
            ..
        } = pass;

        tracing::info!(
            "遍历完成：{} 个节点，{} 个问题，{} 项导出，耗时: {}ms",
            styles.len(),
            report.issues.len(),
            exports.len(),
            start.elapsed().as_millis()
        );
        Some(WalkOutcome::Built(Box::new(WalkOutput {
            document_name: file.name.clone(),
            tree,
            components,
            styles,
            shared_styles,
            export_settings: exports,
            report,
        })))
    }

    /// 第一遍：收集所有 COMPONENT 节点
    fn collect_components(&self, file: &RawFile) -> ComponentRegistry {
        fn visit(node: &RawNode, page_id: &str, frame_id: Option<&str>, builder: &mut RegistryBuilder<'_>) {
            if node.kind_str() == "COMPONENT" {
                builder.register(
                    node,
                    ComponentOwner {
                        page_id: page_id.to_string(),
                        frame_id: frame_id.map(str::to_string),
                    },
                );
            }
            let child_frame = frame_id.or(node.id.as_deref());
            for child in &node.children {
                visit(child, page_id, child_frame, builder);
            }
        }

        let mut builder = RegistryBuilder::with_metadata(&file.components);
        for page in &file.document.children {
            let page_id = page.id.as_deref().unwrap_or("");
            for top in &page.children {
                visit(top, page_id, None, &mut builder);
            }
        }
        builder.finish()
    }
}

/// 原始文档中是否至少有一个页面含有画板（遍历前的快速判断）
fn has_frames(document: &RawNode) -> bool {
    document
        .children
        .iter()
        .filter(|page| NodeKind::parse(page.kind_str()) == Some(NodeKind::Page))
        .flat_map(|page| page.children.iter())
        .any(|top| NodeKind::parse(top.kind_str()).is_some_and(NodeKind::is_frame_like))
}

/// 构建后的树中是否至少有一个页面含有画板
fn tree_has_frames(tree: &NodeModel) -> bool {
    tree.children
        .iter()
        .filter(|page| page.kind == NodeKind::Page)
        .flat_map(|page| page.children.iter())
        .any(|top| top.kind.is_frame_like())
}

/// 第二遍的可变状态
struct BuildPass<'w> {
    resolver: &'w StyleResolver,
    options: &'w WalkOptions,
    file: &'w RawFile,
    registry: &'w ComponentRegistry,
    cancel: &'w AtomicBool,
    report: WalkReport,
    styles: BTreeMap<String, StyleBundle>,
    shared_styles: SharedStyleTable,
    exports: Vec<ExportEntry>,
}

impl BuildPass<'_> {
    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    fn build_root(&mut self, document: &RawNode) -> NodeModel {
        let path = "$.document".to_string();
        let id = document.id.clone().unwrap_or_else(|| "0:0".to_string());
        let ctx = InheritedContext::default();
        self.record_invalid_fields(document, &path);
        let mut children = Vec::with_capacity(document.children.len());
        for (idx, page) in document.children.iter().enumerate() {
            self.build(page, format!("{}.children[{}]", path, idx), &ctx, Level::Page, &mut children);
        }
        NodeModel {
            id,
            kind: NodeKind::Document,
            name: document.display_name().to_string(),
            visible: true,
            geometry: Geometry::default(),
            style: StyleBundle {
                opacity: 1.0,
                effective_opacity: 1.0,
                ..StyleBundle::default()
            },
            characters: None,
            component: None,
            source_path: path,
            children,
        }
    }

    /// 构建 `raw` 并追加到 `out`；节点无效时跳过自身，子节点接替其位置
    fn build(&mut self, raw: &RawNode, path: String, ctx: &InheritedContext, level: Level, out: &mut Vec<NodeModel>) {
        if self.cancelled() {
            return;
        }
        if !self.options.include_hidden && raw.visible == Some(false) {
            tracing::debug!("跳过隐藏节点: {}", path);
            return;
        }
        self.record_invalid_fields(raw, &path);

        let validated = validate(raw).and_then(|(id, kind)| {
            self.resolver
                .resolve(raw, kind, ctx)
                .map(|resolved| (id, kind, resolved))
        });
        let (id, kind, resolved) = match validated {
            Ok(v) => v,
            Err(err) => {
                self.report.record(raw.id.as_deref(), &path, err);
                for (idx, child) in raw.children.iter().enumerate() {
                    self.build(child, format!("{}.children[{}]", path, idx), ctx, level, out);
                }
                return;
            }
        };

        for warning in resolved.warnings.iter().cloned() {
            self.report.record(Some(id), &path, warning);
        }

        let component = raw
            .component_id
            .as_deref()
            .filter(|_| kind == NodeKind::Instance)
            .map(|master_id| match self.registry.resolve(master_id) {
                Ok(entry) => ComponentRef::Resolved {
                    master_id: entry.id.clone(),
                },
                Err(_) => {
                    self.report.record(
                        Some(id),
                        &path,
                        NodeError::UnresolvedComponent {
                            master_id: master_id.to_string(),
                        },
                    );
                    ComponentRef::Unresolved {
                        master_id: master_id.to_string(),
                    }
                }
            });

        self.collect_exports(raw, id, &path);
        self.collect_shared_styles(id, &resolved.style);
        self.styles.insert(id.to_string(), resolved.style.clone());

        let child_ctx = ctx.for_children(&resolved, level == Level::TopLevel);
        let mut children = Vec::with_capacity(raw.children.len());
        for (idx, child) in raw.children.iter().enumerate() {
            self.build(child, format!("{}.children[{}]", path, idx), &child_ctx, level.child(), &mut children);
        }

        out.push(NodeModel {
            id: id.to_string(),
            kind,
            name: raw.display_name().to_string(),
            visible: resolved.visible,
            geometry: resolved.geometry,
            style: resolved.style,
            characters: if kind == NodeKind::Text { raw.characters.clone() } else { None },
            component,
            source_path: path,
            children,
        });
    }

    fn record_invalid_fields(&mut self, raw: &RawNode, path: &str) {
        for invalid in &raw.invalid_fields {
            self.report.record(
                raw.id.as_deref(),
                path,
                NodeError::InvalidField {
                    field: invalid.field.clone(),
                    message: invalid.message.clone(),
                },
            );
        }
    }

    fn collect_exports(&mut self, raw: &RawNode, id: &str, path: &str) {
        if raw.export_settings.is_empty() {
            return;
        }
        let mut settings = Vec::with_capacity(raw.export_settings.len());
        for setting in &raw.export_settings {
            match ExportSetting::parse(setting) {
                Ok(s) => settings.push(s),
                Err(err) => self.report.record(Some(id), path, err),
            }
        }
        if !settings.is_empty() {
            self.exports.push(ExportEntry {
                node_id: id.to_string(),
                node_name: raw.display_name().to_string(),
                settings,
            });
        }
    }

    fn collect_shared_styles(&mut self, node_id: &str, style: &StyleBundle) {
        for (slot, style_id) in &style.style_refs {
            let Some(kind) = SharedStyleKind::from_slot(slot) else {
                tracing::debug!("忽略未知样式槽位: {}", slot);
                continue;
            };
            let value = match kind {
                SharedStyleKind::Fill => SharedStyleValue::Paints(style.fills.clone()),
                SharedStyleKind::Stroke => {
                    SharedStyleValue::Paints(style.stroke.as_ref().map(|s| s.paints.clone()).unwrap_or_default())
                }
                SharedStyleKind::Text => match &style.typography {
                    Some(t) => SharedStyleValue::Text(t.clone()),
                    None => continue,
                },
                SharedStyleKind::Effect => SharedStyleValue::Effects(style.effects.clone()),
                SharedStyleKind::Grid => SharedStyleValue::Grid,
            };
            self.shared_styles
                .record(style_id, kind, node_id, value, self.file.styles.get(style_id));
        }
    }
}

/// 必填字段校验：id、类型、实例的 componentId
fn validate(raw: &RawNode) -> Result<(&str, NodeKind), NodeError> {
    let id = raw.id.as_deref().ok_or(NodeError::MissingId)?;
    let kind_str = raw.kind.as_deref().ok_or(NodeError::MissingKind)?;
    let kind = NodeKind::parse(kind_str).ok_or_else(|| NodeError::UnknownKind(kind_str.to_string()))?;
    if kind == NodeKind::Instance && raw.component_id.is_none() {
        return Err(NodeError::MissingComponentId);
    }
    Ok((id, kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::report::IssueCategory;
    use serde_json::{json, Value};

    fn bbox(x: f64, y: f64, w: f64, h: f64) -> Value {
        json!({ "x": x, "y": y, "width": w, "height": h })
    }

    fn file(v: Value) -> RawFile {
        serde_json::from_value(v).unwrap()
    }

    /// 两个页面：A 含 F1、F2，B 含 F3；B 中三层嵌套一个组件，A 中实例引用它
    fn two_page_file() -> RawFile {
        file(json!({
            "name": "handoff",
            "document": {
                "id": "0:0", "name": "Document", "type": "DOCUMENT",
                "children": [
                    {
                        "id": "A", "name": "Page A", "type": "CANVAS",
                        "children": [
                            {
                                "id": "F1", "name": "Frame 1", "type": "FRAME",
                                "absoluteBoundingBox": bbox(100.0, 200.0, 375.0, 812.0),
                                "children": [
                                    {
                                        "id": "I1", "name": "Button", "type": "INSTANCE", "componentId": "C1",
                                        "absoluteBoundingBox": bbox(120.0, 240.0, 80.0, 32.0),
                                        "exportSettings": [{ "suffix": "", "format": "SVG" }]
                                    },
                                    {
                                        "id": "T1", "name": "Title", "type": "TEXT", "characters": "Hello",
                                        "absoluteBoundingBox": bbox(110.0, 210.0, 100.0, 20.0),
                                        "style": { "fontFamily": "Inter", "fontSize": 14 },
                                        "styles": { "text": "S:t" }
                                    }
                                ]
                            },
                            {
                                "id": "F2", "name": "Frame 2", "type": "FRAME",
                                "absoluteBoundingBox": bbox(600.0, 200.0, 375.0, 812.0),
                                "children": [
                                    { "id": "Z", "name": "Zero", "type": "RECTANGLE",
                                      "absoluteBoundingBox": bbox(600.0, 200.0, 0.0, 0.0) }
                                ]
                            }
                        ]
                    },
                    {
                        "id": "B", "name": "Page B", "type": "CANVAS",
                        "children": [
                            {
                                "id": "F3", "name": "Library", "type": "FRAME",
                                "absoluteBoundingBox": bbox(0.0, 0.0, 500.0, 500.0),
                                "children": [
                                    {
                                        "id": "G1", "name": "Group", "type": "GROUP",
                                        "absoluteBoundingBox": bbox(10.0, 10.0, 200.0, 200.0),
                                        "children": [
                                            {
                                                "id": "C1", "name": "Button", "type": "COMPONENT",
                                                "absoluteBoundingBox": bbox(20.0, 20.0, 80.0, 32.0),
                                                "exportSettings": [{ "suffix": "@2x", "format": "PNG",
                                                    "constraint": { "type": "SCALE", "value": 2 } }]
                                            }
                                        ]
                                    }
                                ]
                            }
                        ]
                    }
                ]
            },
            "components": { "C1": { "key": "k1", "name": "Button", "description": "主按钮" } },
            "styles": { "S:t": { "name": "Body/Regular", "styleType": "TEXT" } }
        }))
    }

    fn raw_preorder(node: &RawNode, out: &mut Vec<String>) {
        if let Some(id) = &node.id {
            out.push(id.clone());
        }
        for c in &node.children {
            raw_preorder(c, out);
        }
    }

    #[test]
    fn test_walk_builds_tree_in_source_order() {
        let raw = two_page_file();
        let out = walk(&raw).into_output().unwrap();

        let built: Vec<String> = out.tree.preorder().map(|n| n.id.clone()).collect();
        let mut expected = Vec::new();
        raw_preorder(&raw.document, &mut expected);
        assert_eq!(built, expected);
        assert!(out.report.is_clean(), "{:?}", out.report);
        assert_eq!(out.styles.len(), expected.len() - 1);
    }

    #[test]
    fn test_walk_is_deterministic() {
        let raw = two_page_file();
        assert_eq!(walk(&raw), walk(&raw));
    }

    #[test]
    fn test_nested_component_resolves_across_pages() {
        let out = walk(&two_page_file()).into_output().unwrap();
        let entry = out.components.resolve("C1").unwrap();
        assert_eq!(entry.page_id, "B");
        assert_eq!(entry.frame_id.as_deref(), Some("F3"));
        assert_eq!(entry.description, "主按钮");

        let instance = out.tree.find("I1").unwrap();
        let reference = instance.component.as_ref().unwrap();
        assert!(reference.is_resolved());
        assert_eq!(out.components.resolve(reference.master_id()).unwrap().id, "C1");
    }

    #[test]
    fn test_unresolved_instance_is_kept_with_marker() {
        let raw = file(json!({
            "document": { "id": "0:0", "type": "DOCUMENT", "children": [
                { "id": "P", "type": "CANVAS", "children": [
                    { "id": "F", "type": "FRAME", "absoluteBoundingBox": bbox(0.0, 0.0, 10.0, 10.0), "children": [
                        { "id": "I", "type": "INSTANCE", "componentId": "missing",
                          "absoluteBoundingBox": bbox(1.0, 1.0, 2.0, 2.0) }
                    ] }
                ] }
            ] }
        }));
        let out = walk(&raw).into_output().unwrap();
        let instance = out.tree.find("I").unwrap();
        assert_eq!(
            instance.component,
            Some(ComponentRef::Unresolved { master_id: "missing".into() })
        );
        assert_eq!(out.report.unresolved_count(), 1);
    }

    #[test]
    fn test_frame_relative_geometry_and_zero_size() {
        let out = walk(&two_page_file()).into_output().unwrap();
        let f1 = out.tree.find("F1").unwrap();
        assert_eq!(f1.geometry.relative.x, 0.0);
        assert_eq!(f1.geometry.relative.y, 0.0);

        let instance = out.tree.find("I1").unwrap();
        assert_eq!(instance.geometry.absolute.x, 120.0);
        assert_eq!(instance.geometry.relative.x, 20.0);
        assert_eq!(instance.geometry.relative.y, 40.0);

        let zero = out.tree.find("Z").unwrap();
        assert_eq!(zero.geometry.absolute.width, 0.0);
        assert_eq!(zero.geometry.absolute.height, 0.0);
    }

    #[test]
    fn test_malformed_node_skipped_children_kept() {
        let raw = file(json!({
            "document": { "id": "0:0", "type": "DOCUMENT", "children": [
                { "id": "P", "type": "CANVAS", "children": [
                    { "id": "F", "type": "FRAME", "absoluteBoundingBox": bbox(0.0, 0.0, 100.0, 100.0), "children": [
                        { "id": "before", "type": "RECTANGLE", "absoluteBoundingBox": bbox(0.0, 0.0, 1.0, 1.0) },
                        { "id": "broken", "type": "GROUP", "children": [
                            { "id": "inner", "type": "RECTANGLE", "absoluteBoundingBox": bbox(5.0, 5.0, 1.0, 1.0) }
                        ] },
                        { "id": "weird", "type": "HOLOGRAM", "absoluteBoundingBox": bbox(0.0, 0.0, 1.0, 1.0) },
                        { "id": "after", "type": "RECTANGLE", "absoluteBoundingBox": bbox(0.0, 0.0, 1.0, 1.0) }
                    ] }
                ] }
            ] }
        }));
        let out = walk(&raw).into_output().unwrap();
        let frame = out.tree.find("F").unwrap();
        let ids: Vec<&str> = frame.children.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["before", "inner", "after"]);

        assert_eq!(out.report.malformed_count(), 2);
        let broken = out.report.for_node("broken").next().unwrap();
        assert_eq!(broken.error, NodeError::MissingGeometry);
        assert_eq!(broken.path, "$.document.children[0].children[0].children[1]");
        assert_eq!(
            out.report.for_node("weird").next().unwrap().category,
            IssueCategory::MalformedNode
        );
    }

    #[test]
    fn test_export_table_in_preorder() {
        let out = walk(&two_page_file()).into_output().unwrap();
        let ids: Vec<&str> = out.export_settings.iter().map(|e| e.node_id.as_str()).collect();
        assert_eq!(ids, vec!["I1", "C1"]);
        assert_eq!(out.export_settings[1].file_names(), vec!["Button@2x.png"]);
    }

    #[test]
    fn test_shared_styles_collected() {
        let out = walk(&two_page_file()).into_output().unwrap();
        let entry = out.shared_styles.get("S:t").unwrap();
        assert_eq!(entry.name, "Body/Regular");
        assert_eq!(entry.kind, SharedStyleKind::Text);
        assert_eq!(entry.first_node_id, "T1");
        assert!(matches!(entry.value, SharedStyleValue::Text(ref t) if t.family == "Inter"));
    }

    #[test]
    fn test_empty_document_is_distinct_outcome() {
        let no_pages = file(json!({ "name": "空文档", "document": { "id": "0:0", "type": "DOCUMENT" } }));
        assert_eq!(
            walk(&no_pages),
            WalkOutcome::Empty { document_name: "空文档".into() }
        );

        let page_without_frames = file(json!({
            "document": { "id": "0:0", "type": "DOCUMENT", "children": [
                { "id": "P", "type": "CANVAS", "children": [] }
            ] }
        }));
        assert!(walk(&page_without_frames).is_empty());
    }

    #[test]
    fn test_only_frame_hidden_is_empty_when_skipping_hidden() {
        let raw = file(json!({
            "name": "隐藏画板",
            "document": { "id": "0:0", "type": "DOCUMENT", "children": [
                { "id": "P", "type": "CANVAS", "children": [
                    { "id": "F", "type": "FRAME", "visible": false,
                      "absoluteBoundingBox": bbox(0.0, 0.0, 10.0, 10.0) }
                ] }
            ] }
        }));
        let walker = DocumentWalker::new(WalkOptions { include_hidden: false });
        assert_eq!(
            walker.walk(&raw),
            WalkOutcome::Empty { document_name: "隐藏画板".into() }
        );
        // 保留隐藏节点时画板仍可选择
        assert!(!walk(&raw).is_empty());
    }

    #[test]
    fn test_only_frame_malformed_is_empty() {
        let raw = file(json!({
            "name": "无效画板",
            "document": { "id": "0:0", "type": "DOCUMENT", "children": [
                { "id": "P", "type": "CANVAS", "children": [
                    // 缺少几何：画板被跳过，子节点升到顶层但不是画板
                    { "id": "F", "type": "FRAME", "children": [
                        { "id": "r", "type": "RECTANGLE", "absoluteBoundingBox": bbox(0.0, 0.0, 1.0, 1.0) }
                    ] }
                ] }
            ] }
        }));
        assert_eq!(
            walk(&raw),
            WalkOutcome::Empty { document_name: "无效画板".into() }
        );
    }

    #[test]
    fn test_mistyped_field_keeps_sibling() {
        let raw = file(json!({
            "document": { "id": "0:0", "type": "DOCUMENT", "children": [
                { "id": "P", "type": "CANVAS", "children": [
                    { "id": "F", "type": "FRAME", "absoluteBoundingBox": bbox(0.0, 0.0, 100.0, 100.0), "children": [
                        { "id": "a", "type": "RECTANGLE", "cornerRadius": "8", "fills": null,
                          "absoluteBoundingBox": bbox(0.0, 0.0, 10.0, 10.0) },
                        { "id": "b", "type": "RECTANGLE",
                          "absoluteBoundingBox": { "x": null, "y": 0, "width": 10, "height": 10 } },
                        { "id": "c", "type": "RECTANGLE", "cornerRadius": 4,
                          "absoluteBoundingBox": bbox(20.0, 0.0, 10.0, 10.0) }
                    ] }
                ] }
            ] }
        }));
        let out = walk(&raw).into_output().unwrap();
        let frame = out.tree.find("F").unwrap();
        let ids: Vec<&str> = frame.children.iter().map(|n| n.id.as_str()).collect();
        // a 只丢掉圆角；b 的包围盒无效且没有 relativeTransform，按缺少几何跳过
        assert_eq!(ids, vec!["a", "c"]);

        let a: Vec<&NodeError> = out.report.for_node("a").map(|i| &i.error).collect();
        assert!(matches!(a.as_slice(), [NodeError::InvalidField { field, .. }] if field == "cornerRadius"));
        assert_eq!(out.report.for_node("a").next().unwrap().category, IssueCategory::Warning);

        let b: Vec<&NodeError> = out.report.for_node("b").map(|i| &i.error).collect();
        assert!(matches!(b[0], NodeError::InvalidField { field, .. } if field == "absoluteBoundingBox"));
        assert_eq!(b[1], &NodeError::MissingGeometry);
    }

    #[test]
    fn test_children_follow_rotated_parent() {
        let raw = file(json!({
            "document": { "id": "0:0", "type": "DOCUMENT", "children": [
                { "id": "P", "type": "CANVAS", "children": [
                    { "id": "F", "type": "FRAME", "absoluteBoundingBox": bbox(0.0, 0.0, 200.0, 200.0), "children": [
                        { "id": "g", "type": "GROUP",
                          "relativeTransform": [[0, -1, 100], [1, 0, 0]], "size": { "x": 50, "y": 50 },
                          "children": [
                            { "id": "c", "type": "RECTANGLE",
                              "relativeTransform": [[1, 0, 10], [0, 1, 0]], "size": { "x": 20, "y": 5 } }
                          ] }
                    ] }
                ] }
            ] }
        }));
        let out = walk(&raw).into_output().unwrap();
        let child = out.tree.find("c").unwrap();
        assert_eq!(child.geometry.transform.origin().x, 100.0);
        assert_eq!(child.geometry.transform.origin().y, 10.0);
        assert_eq!(child.geometry.absolute.x, 95.0);
        assert_eq!(child.geometry.absolute.height, 20.0);
    }

    #[test]
    fn test_hidden_nodes_option() {
        let raw = file(json!({
            "document": { "id": "0:0", "type": "DOCUMENT", "children": [
                { "id": "P", "type": "CANVAS", "children": [
                    { "id": "F", "type": "FRAME", "visible": false,
                      "absoluteBoundingBox": bbox(0.0, 0.0, 10.0, 10.0), "children": [
                        { "id": "child", "type": "RECTANGLE", "absoluteBoundingBox": bbox(0.0, 0.0, 1.0, 1.0) }
                    ] },
                    { "id": "G", "type": "FRAME", "absoluteBoundingBox": bbox(0.0, 0.0, 10.0, 10.0) }
                ] }
            ] }
        }));
        let kept = walk(&raw).into_output().unwrap();
        // 隐藏属性向下继承
        assert!(!kept.tree.find("child").unwrap().visible);

        let walker = DocumentWalker::new(WalkOptions { include_hidden: false });
        let dropped = walker.walk(&raw).into_output().unwrap();
        assert!(dropped.tree.find("F").is_none());
        assert!(dropped.tree.find("child").is_none());
        assert!(dropped.tree.find("G").is_some());
    }

    #[test]
    fn test_cancelled_walk_returns_none() {
        let cancel = AtomicBool::new(true);
        let walker = DocumentWalker::default();
        assert!(walker.walk_until_cancelled(&two_page_file(), &cancel).is_none());
    }

    #[test]
    fn test_instance_without_component_id_is_malformed() {
        let raw = file(json!({
            "document": { "id": "0:0", "type": "DOCUMENT", "children": [
                { "id": "P", "type": "CANVAS", "children": [
                    { "id": "F", "type": "FRAME", "absoluteBoundingBox": bbox(0.0, 0.0, 10.0, 10.0), "children": [
                        { "id": "I", "type": "INSTANCE", "absoluteBoundingBox": bbox(0.0, 0.0, 1.0, 1.0) }
                    ] }
                ] }
            ] }
        }));
        let out = walk(&raw).into_output().unwrap();
        assert!(out.tree.find("I").is_none());
        assert_eq!(out.report.for_node("I").next().unwrap().error, NodeError::MissingComponentId);
    }
}

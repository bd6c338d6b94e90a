//! 组件注册表与共享样式表
//!
//! 注册表分两个阶段：[`RegistryBuilder`] 只允许追加，[`ComponentRegistry`] 只允许查询。
//! `finish` 消耗构建器，因此在同一次遍历中两个阶段不可能交错。

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::model::raw::{RawComponentMeta, RawNode, RawStyleMeta};
use crate::model::style::{Effect, Paint, Typography};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("组件不存在: {0}")]
    NotFound(String),
}

/// 注册表条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentEntry {
    pub id: String,
    pub name: String,
    /// 组件库中的唯一 key
    pub key: Option<String>,
    pub description: String,
    /// 所在页面
    pub page_id: String,
    /// 所在顶层画板（组件本身是顶层节点时为 None）
    pub frame_id: Option<String>,
}

/// 组件所在位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentOwner {
    pub page_id: String,
    pub frame_id: Option<String>,
}

#[derive(Debug, Default)]
pub struct RegistryBuilder<'a> {
    entries: BTreeMap<String, ComponentEntry>,
    /// 注册顺序（即文档先序）
    order: Vec<String>,
    meta: Option<&'a BTreeMap<String, RawComponentMeta>>,
}

impl<'a> RegistryBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用文件级组件元数据补全 key / 描述
    pub fn with_metadata(meta: &'a BTreeMap<String, RawComponentMeta>) -> Self {
        Self {
            meta: Some(meta),
            ..Self::default()
        }
    }

    /// 注册一个 COMPONENT 节点；缺少 id 的节点被忽略，重复 id 保留首个
    pub fn register(&mut self, raw: &RawNode, owner: ComponentOwner) -> bool {
        let Some(id) = raw.id.as_deref() else {
            return false;
        };
        if self.entries.contains_key(id) {
            tracing::warn!("重复的组件 id: {}，保留首次出现", id);
            return false;
        }
        let meta = self.meta.and_then(|m| m.get(id));
        let description = raw
            .description
            .clone()
            .filter(|d| !d.is_empty())
            .or_else(|| meta.and_then(|m| m.description.clone()))
            .unwrap_or_default();
        let entry = ComponentEntry {
            id: id.to_string(),
            name: raw.display_name().to_string(),
            key: meta.and_then(|m| m.key.clone()),
            description,
            page_id: owner.page_id,
            frame_id: owner.frame_id,
        };
        tracing::debug!("注册组件: {} ({})", entry.name, entry.id);
        self.order.push(entry.id.clone());
        self.entries.insert(entry.id.clone(), entry);
        true
    }

    pub fn finish(self) -> ComponentRegistry {
        ComponentRegistry {
            entries: self.entries,
            order: self.order,
        }
    }
}

/// 只读组件注册表（文档全局，不按页面划分）
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComponentRegistry {
    entries: BTreeMap<String, ComponentEntry>,
    order: Vec<String>,
}

impl ComponentRegistry {
    pub fn resolve(&self, master_id: &str) -> Result<&ComponentEntry, RegistryError> {
        self.entries
            .get(master_id)
            .ok_or_else(|| RegistryError::NotFound(master_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按文档顺序列出组件
    pub fn iter(&self) -> impl Iterator<Item = &ComponentEntry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SharedStyleKind {
    Fill,
    Stroke,
    Text,
    Effect,
    Grid,
}

impl SharedStyleKind {
    /// 由节点上的槽位名（已规范化为单数）得到样式类型
    pub fn from_slot(slot: &str) -> Option<Self> {
        let kind = match slot {
            "fill" => Self::Fill,
            "stroke" => Self::Stroke,
            "text" => Self::Text,
            "effect" => Self::Effect,
            "grid" => Self::Grid,
            _ => return None,
        };
        Some(kind)
    }
}

/// 共享样式的具体取值（取自第一个使用它的节点）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SharedStyleValue {
    Paints(Vec<Paint>),
    Text(Typography),
    Effects(Vec<Effect>),
    /// 栅格样式只记录引用
    Grid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedStyleEntry {
    pub id: String,
    pub name: String,
    pub kind: SharedStyleKind,
    pub description: String,
    /// 第一个引用该样式的节点
    pub first_node_id: String,
    pub value: SharedStyleValue,
}

/// 共享样式表，按样式 id 排序
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SharedStyleTable {
    entries: BTreeMap<String, SharedStyleEntry>,
}

impl SharedStyleTable {
    /// 记录一次样式引用；同一样式只保留首次出现的取值
    pub fn record(
        &mut self,
        style_id: &str,
        kind: SharedStyleKind,
        node_id: &str,
        value: SharedStyleValue,
        meta: Option<&RawStyleMeta>,
    ) {
        if self.entries.contains_key(style_id) {
            return;
        }
        let entry = SharedStyleEntry {
            id: style_id.to_string(),
            name: meta.and_then(|m| m.name.clone()).unwrap_or_default(),
            kind,
            description: meta.and_then(|m| m.description.clone()).unwrap_or_default(),
            first_node_id: node_id.to_string(),
            value,
        };
        self.entries.insert(style_id.to_string(), entry);
    }

    pub fn get(&self, style_id: &str) -> Option<&SharedStyleEntry> {
        self.entries.get(style_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SharedStyleEntry> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn component(id: &str, name: &str) -> RawNode {
        serde_json::from_value(json!({ "id": id, "name": name, "type": "COMPONENT" })).unwrap()
    }

    fn owner(page: &str) -> ComponentOwner {
        ComponentOwner { page_id: page.into(), frame_id: None }
    }

    #[test]
    fn test_register_then_resolve() {
        let mut builder = RegistryBuilder::new();
        assert!(builder.register(&component("1:1", "Button"), owner("0:1")));
        assert!(builder.register(&component("1:2", "Card"), owner("0:2")));
        let registry = builder.finish();

        let entry = registry.resolve("1:2").unwrap();
        assert_eq!(entry.name, "Card");
        assert_eq!(entry.page_id, "0:2");
        assert_eq!(registry.resolve("9:9"), Err(RegistryError::NotFound("9:9".into())));

        let names: Vec<&str> = registry.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Button", "Card"]);
    }

    #[test]
    fn test_duplicate_and_missing_id() {
        let mut builder = RegistryBuilder::new();
        assert!(builder.register(&component("1:1", "First"), owner("0:1")));
        assert!(!builder.register(&component("1:1", "Second"), owner("0:1")));
        assert!(!builder.register(&RawNode::default(), owner("0:1")));
        let registry = builder.finish();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve("1:1").unwrap().name, "First");
    }

    #[test]
    fn test_metadata_fills_key_and_description() {
        let meta: BTreeMap<String, RawComponentMeta> = serde_json::from_value(json!({
            "1:1": { "key": "abc", "name": "Button", "description": "主按钮" }
        }))
        .unwrap();
        let mut builder = RegistryBuilder::with_metadata(&meta);
        builder.register(&component("1:1", "Button"), owner("0:1"));
        let registry = builder.finish();
        let entry = registry.resolve("1:1").unwrap();
        assert_eq!(entry.key.as_deref(), Some("abc"));
        assert_eq!(entry.description, "主按钮");
    }

    #[test]
    fn test_shared_style_first_use_wins() {
        let meta = RawStyleMeta {
            name: Some("Brand/Primary".into()),
            style_type: Some("FILL".into()),
            ..RawStyleMeta::default()
        };
        let mut table = SharedStyleTable::default();
        table.record("S:1", SharedStyleKind::Fill, "1:1", SharedStyleValue::Paints(vec![]), Some(&meta));
        table.record("S:1", SharedStyleKind::Fill, "1:2", SharedStyleValue::Grid, None);

        let entry = table.get("S:1").unwrap();
        assert_eq!(entry.name, "Brand/Primary");
        assert_eq!(entry.first_node_id, "1:1");
        assert_eq!(entry.value, SharedStyleValue::Paints(vec![]));
        assert_eq!(table.len(), 1);
        assert_eq!(SharedStyleKind::from_slot("effect"), Some(SharedStyleKind::Effect));
    }
}

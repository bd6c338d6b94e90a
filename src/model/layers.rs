//! 图层列表：规范化树的扁平先序投影，供图层面板导航与搜索

use serde::Serialize;

use crate::model::css::fmt_num;
use crate::model::node::{NodeKind, NodeModel};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerRow {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    /// 原始节点 JSONPath
    pub path: String,
    /// 直接子节点数量
    pub children: u32,
    /// 轻量预览（文本截断或尺寸）
    pub preview: String,
    /// 相对列表根的深度，用于缩进
    pub depth: u32,
    pub expanded: bool,
    /// 是否在当前搜索 / 折叠状态下显示
    pub visible: bool,
}

fn preview_of(node: &NodeModel) -> String {
    if let Some(text) = &node.characters {
        let text = text.trim();
        return if text.chars().count() > 32 {
            let truncated: String = text.chars().take(32).collect();
            format!("\"{}...\"", truncated)
        } else {
            format!("\"{}\"", text)
        };
    }
    if node.kind.has_geometry() {
        let r = node.geometry.absolute;
        format!("{}×{}", fmt_num(r.width), fmt_num(r.height))
    } else {
        format!("{} 个子节点", node.children.len())
    }
}

/// 先序展开 `root`（包含自身）
pub fn flatten_layers(root: &NodeModel) -> Vec<LayerRow> {
    fn walk(out: &mut Vec<LayerRow>, node: &NodeModel, depth: u32) {
        out.push(LayerRow {
            id: node.id.clone(),
            name: node.name.clone(),
            kind: node.kind,
            path: node.source_path.clone(),
            children: node.children.len() as u32,
            preview: preview_of(node),
            depth,
            expanded: true,
            visible: true,
        });
        for child in &node.children {
            walk(out, child, depth + 1);
        }
    }

    let mut out = Vec::with_capacity(64);
    walk(&mut out, root, 0);
    out
}

#[derive(Debug, Clone, Default)]
pub struct LayerList {
    rows: Vec<LayerRow>,
}

impl LayerList {
    pub fn new(root: &NodeModel) -> Self {
        Self {
            rows: flatten_layers(root),
        }
    }

    pub fn rows(&self) -> &[LayerRow] {
        &self.rows
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &LayerRow> {
        self.rows.iter().filter(|r| r.visible)
    }

    /// 按名称或 id 子串过滤；空条件恢复折叠状态下的可见性
    pub fn apply_search_filter(&mut self, filter: &str) {
        let filter = filter.trim();
        if filter.is_empty() {
            self.update_visibility_by_expansion();
            return;
        }
        let lower = filter.to_lowercase();
        for row in &mut self.rows {
            row.visible = row.name.to_lowercase().contains(&lower) || row.id.contains(filter);
        }
    }

    /// 切换展开状态，返回切换后的值
    pub fn toggle_expanded(&mut self, id: &str) -> Option<bool> {
        let row = self.rows.iter_mut().find(|r| r.id == id)?;
        row.expanded = !row.expanded;
        let expanded = row.expanded;
        self.update_visibility_by_expansion();
        Some(expanded)
    }

    /// 折叠节点的所有后代不可见
    fn update_visibility_by_expansion(&mut self) {
        let mut collapsed_depth: Option<u32> = None;
        for row in &mut self.rows {
            if let Some(depth) = collapsed_depth {
                if row.depth > depth {
                    row.visible = false;
                    continue;
                }
                collapsed_depth = None;
            }
            row.visible = true;
            if !row.expanded {
                collapsed_depth = Some(row.depth);
            }
        }
    }
}

//! FrameIndex：按页面分组的画板列表，供页面 / 画板选择器使用

use std::collections::HashSet;

use serde::Serialize;

use crate::model::node::{NodeKind, NodeModel};

/// 选择器中的一项，只暴露 id 与显示名
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageFrames {
    pub id: String,
    pub name: String,
    /// 源文档顺序
    pub frames: Vec<FrameEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrameIndex {
    pages: Vec<PageFrames>,
}

impl FrameIndex {
    /// 由规范化树建立完整索引；页面顺序与画板顺序均与源文档一致
    pub fn index(tree: &NodeModel) -> Self {
        let page_nodes: Vec<&NodeModel> = match tree.kind {
            NodeKind::Page => vec![tree],
            _ => tree.children.iter().filter(|c| c.kind == NodeKind::Page).collect(),
        };
        let pages = page_nodes
            .into_iter()
            .map(|page| PageFrames {
                id: page.id.clone(),
                name: page.name.clone(),
                frames: page
                    .children
                    .iter()
                    .filter(|c| c.kind.is_frame_like())
                    .map(|c| FrameEntry {
                        id: c.id.clone(),
                        name: c.name.clone(),
                    })
                    .collect(),
            })
            .collect();
        Self { pages }
    }

    /// 过滤出请求的画板：保持分组与顺序，丢弃没有剩余画板的页面
    pub fn select_subset<S: AsRef<str>>(&self, requested: &[S]) -> FrameIndex {
        let wanted: HashSet<&str> = requested.iter().map(|s| s.as_ref()).collect();
        let pages = self
            .pages
            .iter()
            .filter_map(|page| {
                let frames: Vec<FrameEntry> = page
                    .frames
                    .iter()
                    .filter(|f| wanted.contains(f.id.as_str()))
                    .cloned()
                    .collect();
                (!frames.is_empty()).then(|| PageFrames {
                    id: page.id.clone(),
                    name: page.name.clone(),
                    frames,
                })
            })
            .collect();
        FrameIndex { pages }
    }

    pub fn pages(&self) -> &[PageFrames] {
        &self.pages
    }

    pub fn page(&self, page_id: &str) -> Option<&PageFrames> {
        self.pages.iter().find(|p| p.id == page_id)
    }

    /// 画板所属页面
    pub fn page_of(&self, frame_id: &str) -> Option<&PageFrames> {
        self.pages
            .iter()
            .find(|p| p.frames.iter().any(|f| f.id == frame_id))
    }

    pub fn frame(&self, frame_id: &str) -> Option<(&PageFrames, &FrameEntry)> {
        self.pages
            .iter()
            .find_map(|p| p.frames.iter().find(|f| f.id == frame_id).map(|f| (p, f)))
    }

    pub fn contains_frame(&self, frame_id: &str) -> bool {
        self.frame(frame_id).is_some()
    }

    /// 按页面、页内顺序展开的画板 id
    pub fn frame_ids(&self) -> impl Iterator<Item = &str> {
        self.pages
            .iter()
            .flat_map(|p| p.frames.iter().map(|f| f.id.as_str()))
    }

    pub fn first_frame(&self) -> Option<(&PageFrames, &FrameEntry)> {
        self.pages
            .iter()
            .find_map(|p| p.frames.first().map(|f| (p, f)))
    }

    pub fn frame_count(&self) -> usize {
        self.pages.iter().map(|p| p.frames.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }
}

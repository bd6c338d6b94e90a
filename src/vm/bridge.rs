//! VM桥接层：把会话状态投影成 UI 可直接绑定的扁平数据

use serde::Serialize;

use crate::model::css::{fmt_num, to_css_text};
use crate::model::frame_index::{FrameIndex, PageFrames};
use crate::model::layers::LayerRow;
use crate::model::node::ComponentRef;
use crate::model::selection::Phase;
use crate::vm::session::Inspection;

// === 常量定义（消除魔法值） ===
pub const STATUS_READY: &str = "就绪";
pub const STATUS_LOADING: &str = "正在加载设计文件...";
pub const STATUS_LOADED: &str = "设计文件加载完成";
pub const STATUS_EMPTY: &str = "文档中没有可选择的画板";
pub const STATUS_STALE: &str = "已丢弃过期的加载结果";
pub const STATUS_ERROR_PREFIX: &str = "错误: ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickerFrameData {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickerPageData {
    pub id: String,
    pub name: String,
    pub frames: Vec<PickerFrameData>,
}

impl PickerPageData {
    fn from_page(page: &PageFrames, current_frame: Option<&str>) -> Self {
        Self {
            id: page.id.clone(),
            name: page.name.clone(),
            frames: page
                .frames
                .iter()
                .map(|f| PickerFrameData {
                    id: f.id.clone(),
                    name: f.name.clone(),
                    selected: current_frame == Some(f.id.as_str()),
                })
                .collect(),
        }
    }
}

/// 选择器数据，按页面分组
pub fn picker_pages(index: &FrameIndex, current_frame: Option<&str>) -> Vec<PickerPageData> {
    index
        .pages()
        .iter()
        .map(|p| PickerPageData::from_page(p, current_frame))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectorData {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub phase: String,
    /// 相对画板
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub size_text: String,
    /// 主组件名称；未解析时为主组件 id
    pub component: String,
    /// "resolved" / "unresolved" / ""
    pub component_status: String,
    pub css_text: String,
    pub issues: Vec<String>,
    /// 淡出结束后展示层需回调 dissolve_complete
    pub awaiting_dissolve: bool,
}

impl From<&Inspection<'_>> for InspectorData {
    fn from(ins: &Inspection<'_>) -> Self {
        let rel = ins.node.geometry.relative;
        let (component, component_status) = match (&ins.node.component, ins.component) {
            (Some(ComponentRef::Resolved { .. }), Some(entry)) => (entry.name.clone(), "resolved"),
            (Some(r), _) => (r.master_id().to_string(), "unresolved"),
            (None, _) => (String::new(), ""),
        };
        Self {
            id: ins.node.id.clone(),
            name: ins.node.name.clone(),
            kind: format!("{:?}", ins.node.kind),
            phase: format!("{:?}", ins.phase),
            x: rel.x,
            y: rel.y,
            width: rel.width,
            height: rel.height,
            size_text: format!("{} × {}", fmt_num(rel.width), fmt_num(rel.height)),
            component,
            component_status: component_status.to_string(),
            css_text: to_css_text(&ins.css),
            issues: ins.issues.iter().map(|i| i.message.clone()).collect(),
            awaiting_dissolve: ins.phase == Phase::Dissolving,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerRowData {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub path: String,
    pub children: i32,
    pub preview: String,
    pub depth: i32,
    pub expanded: bool,
    pub visible: bool,
}

impl From<&LayerRow> for LayerRowData {
    /// 将图层行转换为 UI 数据结构
    fn from(row: &LayerRow) -> Self {
        Self {
            id: row.id.clone(),
            name: row.name.clone(),
            kind: format!("{:?}", row.kind),
            path: row.path.clone(),
            children: row.children as i32,
            preview: row.preview.clone(),
            depth: row.depth as i32,
            expanded: row.expanded,
            visible: row.visible,
        }
    }
}

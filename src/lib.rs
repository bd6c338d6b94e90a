//! 设计文件交付工具库
//!
//! 将设计工具导出的文档遍历为规范化节点树，解析样式、组件引用与导出声明，
//! 并提供页面 / 画板选择与节点检查所需的视图模型

pub mod model;
pub mod utils;
pub mod vm;

// 重新导出主要类型
pub use model::data_core::{DocumentStore, HandoffError};
pub use model::frame_index::FrameIndex;
pub use model::node::{NodeKind, NodeModel};
pub use model::registry::ComponentRegistry;
pub use model::selection::{Phase, SelectionController, Transition};
pub use model::walker::{walk, DocumentWalker, WalkOptions, WalkOutcome, WalkOutput};
pub use vm::session::HandoffSession;

//! 数据层：原始设计文件模型、遍历、样式解析与派生索引

pub mod color;
pub mod css;
pub mod data_core;
pub mod export;
pub mod frame_index;
pub mod layers;
pub mod node;
pub mod performance;
pub mod raw;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod selection;
pub mod style;
pub mod walker;

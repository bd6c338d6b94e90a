//! DocumentStore：已加载的设计文件、原始 JSON 回查与导出清单

use std::path::{Path, PathBuf};

use jsonpath_rust::JsonPath;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::export::{ExportEntry, ExportSetting};
use crate::model::node::NodeModel;
use crate::model::raw::RawFile;
use crate::model::walker::{DocumentWalker, WalkOptions, WalkOutcome};
use crate::utils::fs::{read_json_file, write_json_file};

#[derive(Error, Debug)]
pub enum HandoffError {
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON解析失败: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("JSONPath错误: {0}")]
    JsonPath(String),
    #[error("状态错误: {0}")]
    State(String),
    #[error("未找到: {0}")]
    NotFound(String),
}

#[derive(Debug, Default)]
pub struct DocumentStore {
    pub source_path: Option<PathBuf>,
    /// 原始 JSON，用于按路径回查节点
    pub dom: Option<Value>,
    pub file: Option<RawFile>,
}

/// 导出清单中的一项
#[derive(Debug, Serialize)]
struct ManifestItem<'a> {
    node_id: &'a str,
    node_name: &'a str,
    settings: &'a [ExportSetting],
    files: Vec<String>,
}

impl DocumentStore {
    /// 加载设计文件 JSON
    pub fn load_file(&mut self, p: &Path) -> Result<(), HandoffError> {
        let dom = read_json_file(p)?;
        self.load_value(dom)?;
        self.source_path = Some(p.to_path_buf());
        tracing::info!("设计文件加载完成: {}", p.display());
        Ok(())
    }

    /// 从内存中的 JSON 加载（演示数据 / 已获取的 API 响应）
    pub fn load_value(&mut self, dom: Value) -> Result<(), HandoffError> {
        let file = RawFile::deserialize(&dom)?;
        tracing::info!("文档: {}，页面数: {}", file.name, file.document.children.len());
        self.file = Some(file);
        self.dom = Some(dom);
        self.source_path = None;
        Ok(())
    }

    pub fn raw_file(&self) -> Result<&RawFile, HandoffError> {
        self.file
            .as_ref()
            .ok_or_else(|| HandoffError::State("文档尚未加载".into()))
    }

    /// 遍历当前文档
    pub fn walk(&self, options: &WalkOptions) -> Result<WalkOutcome, HandoffError> {
        let file = self.raw_file()?;
        Ok(DocumentWalker::new(options.clone()).walk(file))
    }

    /// 按 JSONPath 提取第一个匹配节点的 pretty 字符串
    pub fn extract_subtree_pretty(&self, json_path: &str) -> Result<String, HandoffError> {
        let dom = self
            .dom
            .as_ref()
            .ok_or_else(|| HandoffError::State("文档尚未加载".into()))?;
        let hits: Vec<&Value> = dom
            .query(json_path)
            .map_err(|e| HandoffError::JsonPath(e.to_string()))?;
        let first = hits
            .into_iter()
            .next()
            .ok_or_else(|| HandoffError::JsonPath("未匹配到任何节点".into()))?;
        Ok(serde_json::to_string_pretty(first)?)
    }

    /// 节点对应的原始 JSON
    pub fn raw_node_pretty(&self, node: &NodeModel) -> Result<String, HandoffError> {
        self.extract_subtree_pretty(&node.source_path)
    }

    /// 将导出声明写成清单文件，交给外部导出工具
    pub fn save_export_manifest(&self, path: &Path, exports: &[ExportEntry]) -> Result<(), HandoffError> {
        let items: Vec<ManifestItem<'_>> = exports
            .iter()
            .map(|e| ManifestItem {
                node_id: &e.node_id,
                node_name: &e.node_name,
                settings: &e.settings,
                files: e.file_names(),
            })
            .collect();
        write_json_file(path, &items)?;
        tracing::info!("导出清单已保存: {}，共 {} 项", path.display(), items.len());
        Ok(())
    }
}

//! 单节点错误与遍历报告（部分成功模型）

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    #[error("节点缺少 id")]
    MissingId,
    #[error("节点缺少类型字段")]
    MissingKind,
    #[error("未知的节点类型: {0}")]
    UnknownKind(String),
    #[error("节点缺少几何信息")]
    MissingGeometry,
    #[error("实例缺少 componentId")]
    MissingComponentId,
    #[error("无法解析组件引用: {master_id}")]
    UnresolvedComponent { master_id: String },
    #[error("文本节点缺少样式")]
    MissingTextStyle,
    #[error("不支持的填充类型: {0}")]
    UnsupportedPaint(String),
    #[error("不支持的特效类型: {0}")]
    UnsupportedEffect(String),
    #[error("无效的导出设置: {0}")]
    InvalidExportSetting(String),
    #[error("字段 {field} 类型错误，已忽略: {message}")]
    InvalidField { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    /// 节点被跳过（子树仍继续遍历）
    MalformedNode,
    /// 实例保留，但带未解析标记
    UnresolvedComponentReference,
    /// 节点保留，部分属性被丢弃
    Warning,
}

impl NodeError {
    pub fn category(&self) -> IssueCategory {
        match self {
            Self::MissingId | Self::MissingKind | Self::UnknownKind(_) | Self::MissingGeometry | Self::MissingComponentId => {
                IssueCategory::MalformedNode
            }
            Self::UnresolvedComponent { .. } => IssueCategory::UnresolvedComponentReference,
            Self::MissingTextStyle
            | Self::UnsupportedPaint(_)
            | Self::UnsupportedEffect(_)
            | Self::InvalidExportSetting(_)
            | Self::InvalidField { .. } => IssueCategory::Warning,
        }
    }
}

/// 报告中的一条记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalkIssue {
    /// 节点 id（缺失 id 时为 None）
    pub node_id: Option<String>,
    /// 原始节点 JSONPath
    pub path: String,
    pub category: IssueCategory,
    pub message: String,
    #[serde(skip)]
    pub error: NodeError,
}

/// 与树一起返回的单节点问题列表
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WalkReport {
    pub issues: Vec<WalkIssue>,
}

impl WalkReport {
    pub fn record(&mut self, node_id: Option<&str>, path: &str, error: NodeError) {
        tracing::warn!("节点问题 {} ({}): {}", node_id.unwrap_or("<无 id>"), path, error);
        self.issues.push(WalkIssue {
            node_id: node_id.map(str::to_string),
            path: path.to_string(),
            category: error.category(),
            message: error.to_string(),
            error,
        });
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn by_category(&self, category: IssueCategory) -> impl Iterator<Item = &WalkIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    pub fn malformed_count(&self) -> usize {
        self.by_category(IssueCategory::MalformedNode).count()
    }

    pub fn unresolved_count(&self) -> usize {
        self.by_category(IssueCategory::UnresolvedComponentReference).count()
    }

    /// 某节点上的全部问题
    pub fn for_node<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a WalkIssue> + 'a {
        self.issues
            .iter()
            .filter(move |i| i.node_id.as_deref() == Some(node_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(NodeError::MissingGeometry.category(), IssueCategory::MalformedNode);
        assert_eq!(
            NodeError::UnresolvedComponent { master_id: "1".into() }.category(),
            IssueCategory::UnresolvedComponentReference
        );
        assert_eq!(NodeError::UnsupportedPaint("X".into()).category(), IssueCategory::Warning);
        // 类型错误的字段只丢弃字段本身
        let err = NodeError::InvalidField {
            field: "cornerRadius".into(),
            message: "invalid type".into(),
        };
        assert_eq!(err.category(), IssueCategory::Warning);
        assert_eq!(err.to_string(), "字段 cornerRadius 类型错误，已忽略: invalid type");
    }

    #[test]
    fn test_report_counts_and_lookup() {
        let mut report = WalkReport::default();
        assert!(report.is_clean());
        report.record(Some("1:1"), "$.document", NodeError::MissingGeometry);
        report.record(None, "$.document.children[0]", NodeError::MissingId);
        report.record(Some("1:2"), "$.x", NodeError::UnresolvedComponent { master_id: "9".into() });

        assert_eq!(report.malformed_count(), 2);
        assert_eq!(report.unresolved_count(), 1);
        assert_eq!(report.for_node("1:1").count(), 1);
        assert_eq!(report.issues[1].message, "节点缺少 id");
    }
}

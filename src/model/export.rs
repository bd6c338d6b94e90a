//! 导出设置：只收集声明，不执行导出

use serde::Serialize;

use crate::model::raw::RawExportSetting;
use crate::model::report::NodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportFormat {
    Png,
    Jpg,
    Svg,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Svg => "svg",
            Self::Pdf => "pdf",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportConstraint {
    Scale(f64),
    Width(f64),
    Height(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSetting {
    pub suffix: String,
    pub format: ExportFormat,
    pub constraint: ExportConstraint,
}

impl ExportSetting {
    pub fn parse(raw: &RawExportSetting) -> Result<Self, NodeError> {
        let format = match raw.format.as_str() {
            "PNG" => ExportFormat::Png,
            "JPG" | "JPEG" => ExportFormat::Jpg,
            "SVG" => ExportFormat::Svg,
            "PDF" => ExportFormat::Pdf,
            other => return Err(NodeError::InvalidExportSetting(format!("格式 {}", other))),
        };
        let constraint = match raw.constraint.as_ref() {
            None => ExportConstraint::Scale(1.0),
            Some(c) if c.value <= 0.0 => {
                return Err(NodeError::InvalidExportSetting(format!("约束值 {}", c.value)));
            }
            Some(c) => match c.kind.as_str() {
                "SCALE" => ExportConstraint::Scale(c.value),
                "WIDTH" => ExportConstraint::Width(c.value),
                "HEIGHT" => ExportConstraint::Height(c.value),
                other => return Err(NodeError::InvalidExportSetting(format!("约束 {}", other))),
            },
        };
        Ok(Self {
            suffix: raw.suffix.clone(),
            format,
            constraint,
        })
    }

    /// 导出文件名：`名称 + 后缀 + 扩展名`，非法路径字符替换为 `_`
    pub fn file_name(&self, node_name: &str) -> String {
        let base: String = node_name
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') { '_' } else { c })
            .collect();
        format!("{}{}.{}", base.trim(), self.suffix, self.format.extension())
    }
}

/// 导出表中的一项
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportEntry {
    pub node_id: String,
    pub node_name: String,
    pub settings: Vec<ExportSetting>,
}

impl ExportEntry {
    pub fn file_names(&self) -> Vec<String> {
        self.settings.iter().map(|s| s.file_name(&self.node_name)).collect()
    }
}

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 产品创意描述，整条流水线的唯一原始输入
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdeaInput {
    /// 产品名称
    pub name: String,
    /// 目标用户
    #[serde(default)]
    pub target_user: String,
    /// 核心痛点
    #[serde(default)]
    pub pain_point: String,
    /// 创意描述
    pub description: String,
}

impl IdeaInput {
    /// 从TOML文件加载创意描述
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read idea file: {:?}", path))?;
        let idea: IdeaInput = toml::from_str(&content).context("Failed to parse idea file")?;
        Ok(idea)
    }

    /// 名称与描述不能为空
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("创意名称不能为空");
        }
        if self.description.trim().is_empty() {
            bail!("创意描述不能为空");
        }
        Ok(())
    }

    /// 以markdown形式渲染创意，嵌入每个阶段的prompt
    pub fn summary(&self) -> String {
        let or_unknown = |s: &str| {
            if s.trim().is_empty() {
                "（未提供）".to_string()
            } else {
                s.trim().to_string()
            }
        };

        format!(
            "### 产品创意\n- 名称: {}\n- 目标用户: {}\n- 核心痛点: {}\n- 描述: {}\n\n",
            self.name.trim(),
            or_unknown(&self.target_user),
            or_unknown(&self.pain_point),
            self.description.trim()
        )
    }
}

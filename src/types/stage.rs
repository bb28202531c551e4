use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;

/// 流水线阶段，顺序固定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// 创意验证
    Radar,
    /// 产品设计（PRD）
    Product,
    /// 技术架构
    Tech,
    /// 代码脚手架
    Dev,
    /// 指标决策
    Qa,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Radar,
        Stage::Product,
        Stage::Tech,
        Stage::Dev,
        Stage::Qa,
    ];

    pub fn index(&self) -> usize {
        match self {
            Stage::Radar => 0,
            Stage::Product => 1,
            Stage::Tech => 2,
            Stage::Dev => 3,
            Stage::Qa => 4,
        }
    }

    /// 下一个阶段，最后一个阶段返回None
    pub fn next(&self) -> Option<Stage> {
        Stage::ALL.get(self.index() + 1).copied()
    }

    pub fn key(&self) -> &'static str {
        match self {
            Stage::Radar => "radar",
            Stage::Product => "product",
            Stage::Tech => "tech",
            Stage::Dev => "dev",
            Stage::Qa => "qa",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "radar" | "idea" => Ok(Stage::Radar),
            "product" | "prd" => Ok(Stage::Product),
            "tech" | "architecture" => Ok(Stage::Tech),
            "dev" | "code" => Ok(Stage::Dev),
            "qa" | "metrics" => Ok(Stage::Qa),
            _ => Err(format!("Unknown stage: {}", s)),
        }
    }
}

/// 阶段状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    #[default]
    Idle,
    Thinking,
    Completed,
    Failed,
    Skipped,
}

impl StageStatus {
    /// 已完成或已跳过的阶段不会再被执行
    pub fn is_settled(&self) -> bool {
        matches!(self, StageStatus::Completed | StageStatus::Skipped)
    }
}

impl Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            StageStatus::Idle => "idle",
            StageStatus::Thinking => "thinking",
            StageStatus::Completed => "completed",
            StageStatus::Failed => "failed",
            StageStatus::Skipped => "skipped",
        };
        write!(f, "{}", str)
    }
}

/// 单个阶段的状态与结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub status: StageStatus,
    /// 纯文本（Value::String）或结构松散的JSON
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl StageRecord {
    /// 将结果反序列化为具体类型
    pub fn typed_result<T>(&self) -> Option<T>
    where
        T: for<'a> Deserialize<'a>,
    {
        self.result
            .as_ref()
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// 文本结果；JSON结果会被格式化输出
    pub fn text_result(&self) -> Option<String> {
        match self.result.as_ref()? {
            Value::String(text) => Some(text.clone()),
            other => serde_json::to_string_pretty(other).ok(),
        }
    }
}

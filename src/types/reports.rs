use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 创意验证结论
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// 值得继续
    Go,
    /// 需要调整方向
    Pivot,
    /// 建议放弃
    Kill,
}

impl Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            Verdict::Go => "go",
            Verdict::Pivot => "pivot",
            Verdict::Kill => "kill",
        };
        write!(f, "{}", str)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct Competitor {
    pub name: String,
    /// 竞品的主要弱点，即本创意的切入点
    pub weakness: String,
}

/// 创意雷达报告
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct RadarReport {
    /// 0-100的综合评分
    #[serde(deserialize_with = "deserialize_score")]
    #[schemars(with = "u8")]
    pub score: u8,
    pub verdict: Verdict,
    pub market_summary: String,
    #[serde(default)]
    pub target_segments: Vec<String>,
    #[serde(default)]
    pub competitors: Vec<Competitor>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub opportunities: Vec<String>,
    pub recommendation: String,
}

/// 模型偶尔给出85.0、-5或120这样的评分，统一取整并限制在0-100
fn deserialize_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let score = f64::deserialize(deserializer)?;
    Ok(score.round().clamp(0.0, 100.0) as u8)
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct StackChoice {
    /// 例如 frontend / backend / database / infra
    pub layer: String,
    pub choice: String,
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct Component {
    pub name: String,
    pub responsibility: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct DataEntity {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct ApiEndpoint {
    pub method: String,
    pub path: String,
    pub purpose: String,
}

/// 技术架构蓝图
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct TechBlueprint {
    pub summary: String,
    #[serde(default)]
    pub stack: Vec<StackChoice>,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub data_entities: Vec<DataEntity>,
    #[serde(default)]
    pub api_endpoints: Vec<ApiEndpoint>,
    /// Mermaid源码（flowchart或C4），不含```包裹
    #[serde(default)]
    pub mermaid_diagram: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct ScaffoldFile {
    /// 相对路径，例如 src/main.ts
    pub path: String,
    #[serde(default)]
    pub language: String,
    pub content: String,
}

/// 代码脚手架
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct CodeScaffold {
    pub project_name: String,
    pub language: String,
    #[serde(default)]
    pub setup_steps: Vec<String>,
    pub files: Vec<ScaffoldFile>,
}

/// 上线决策
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LaunchDecision {
    Launch,
    Iterate,
    Abandon,
}

impl Display for LaunchDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            LaunchDecision::Launch => "launch",
            LaunchDecision::Iterate => "iterate",
            LaunchDecision::Abandon => "abandon",
        };
        write!(f, "{}", str)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct Kpi {
    pub name: String,
    pub target: String,
    pub rationale: String,
}

/// 指标与上线决策
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct MetricsDecision {
    pub north_star_metric: String,
    #[serde(default)]
    pub kpis: Vec<Kpi>,
    #[serde(default)]
    pub experiments: Vec<String>,
    pub launch_decision: LaunchDecision,
    pub rationale: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn radar_with_score(score: &str) -> RadarReport {
        serde_json::from_str(&format!(
            r#"{{"score": {}, "verdict": "pivot", "market_summary": "m", "recommendation": "r"}}"#,
            score
        ))
        .unwrap()
    }

    #[test]
    fn test_radar_score_is_rounded_and_clamped() {
        assert_eq!(radar_with_score("74").score, 74);
        assert_eq!(radar_with_score("85.0").score, 85);
        assert_eq!(radar_with_score("62.6").score, 63);
        assert_eq!(radar_with_score("-5").score, 0);
        assert_eq!(radar_with_score("250").score, 100);
    }

    #[test]
    fn test_radar_score_must_be_numeric() {
        let result = serde_json::from_str::<RadarReport>(
            r#"{"score": "high", "verdict": "go", "market_summary": "m", "recommendation": "r"}"#,
        );
        assert!(result.is_err());
    }
}

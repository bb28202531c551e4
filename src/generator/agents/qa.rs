use anyhow::{Result, bail};

use crate::generator::step_forward_agent::{
    AgentDataConfig, DataSource, FormatterConfig, LLMCallMode, PromptTemplate, StepForwardAgent,
};
use crate::types::reports::MetricsDecision;
use crate::types::stage::Stage;

/// 增长分析师 - 定义北极星指标与KPI，并给出上线决策
#[derive(Default)]
pub struct QaAgent;

impl StepForwardAgent for QaAgent {
    type Output = MetricsDecision;

    fn stage(&self) -> Stage {
        Stage::Qa
    }

    fn data_config(&self) -> AgentDataConfig {
        AgentDataConfig {
            required_sources: vec![DataSource::Idea],
            optional_sources: vec![
                DataSource::StageResult(Stage::Radar),
                DataSource::StageResult(Stage::Product),
                DataSource::StageResult(Stage::Tech),
                DataSource::StageResult(Stage::Dev),
            ],
        }
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"你是一名数据驱动的增长分析师，负责在MVP上线前定义衡量成功的指标，并给出是否上线的决策建议。

你需要输出：
1. 北极星指标（north_star_metric）：一个最能代表用户获得核心价值的指标
2. 3-6个KPI，每个包含名称、上线后30天的目标值、选择理由
3. 2-4个上线后首先要做的实验（A/B测试或用户访谈）
4. 上线决策（launch_decision）：launch / iterate / abandon
5. 决策理由（rationale）

决策原则：如果前序阶段暴露出致命风险或脚手架明显无法支撑P0功能，应给出iterate或abandon。"#
                .to_string(),

            opening_instruction: "请基于整条流水线的产出，制定指标体系并给出上线决策：".to_string(),

            closing_instruction: r#"
## 决策要求：
- KPI目标值需要是可量化的数字或比例
- 理由需要引用前序阶段中的具体发现"#
                .to_string(),

            llm_call_mode: LLMCallMode::Json,
            formatter_config: FormatterConfig::default(),
        }
    }

    fn post_process(&self, result: MetricsDecision) -> Result<MetricsDecision> {
        if result.north_star_metric.trim().is_empty() {
            bail!("metrics decision has no north star metric");
        }
        Ok(result)
    }
}

use anyhow::{Result, bail};

use crate::generator::step_forward_agent::{
    AgentDataConfig, DataSource, FormatterConfig, LLMCallMode, PromptTemplate, StepForwardAgent,
};
use crate::types::reports::RadarReport;
use crate::types::stage::Stage;

/// 创意雷达 - 评估创意的市场可行性，给出评分与继续/转向/放弃结论
#[derive(Default)]
pub struct RadarAgent;

impl StepForwardAgent for RadarAgent {
    type Output = RadarReport;

    fn stage(&self) -> Stage {
        Stage::Radar
    }

    fn data_config(&self) -> AgentDataConfig {
        AgentDataConfig {
            required_sources: vec![DataSource::Idea],
            optional_sources: vec![],
        }
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"你是一名资深的创业投资分析师和产品策略顾问，擅长在早期阶段快速判断一个产品创意是否值得投入。

你的任务是基于用户提供的产品创意，评估：
1. 市场需求强度与市场规模
2. 目标用户细分与他们的真实痛点
3. 主要竞品及其弱点
4. 关键风险（技术、市场、合规、获客）
5. 可以放大的机会点

评分标准（score，0-100）：
- 80以上：痛点明确、付费意愿强、差异化清晰，结论为go
- 40-79：有价值但需要调整定位或范围，结论通常为pivot
- 40以下：需求薄弱或竞争壁垒过高，结论为kill

请保持客观，不要因为创意来自用户就给出过高的评价。"#
                .to_string(),

            opening_instruction: "请对以下产品创意进行快速的可行性雷达扫描：".to_string(),

            closing_instruction: r#"
## 分析要求：
- 竞品要尽量具体到真实存在的产品或替代方案
- 风险与机会各给出3-5条，每条一句话
- recommendation给出下一步最值得做的一件事"#
                .to_string(),

            llm_call_mode: LLMCallMode::Json,
            formatter_config: FormatterConfig::default(),
        }
    }

    fn post_process(&self, mut result: RadarReport) -> Result<RadarReport> {
        if result.market_summary.trim().is_empty() {
            bail!("radar report has an empty market summary");
        }
        result.score = result.score.min(100);
        Ok(result)
    }
}

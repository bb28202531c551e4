use anyhow::{Result, bail};

use crate::generator::step_forward_agent::{
    AgentDataConfig, DataSource, FormatterConfig, LLMCallMode, PromptTemplate, StepForwardAgent,
};
use crate::types::stage::Stage;

/// 产品经理 - 根据创意与雷达结论撰写PRD
#[derive(Default)]
pub struct ProductAgent;

impl StepForwardAgent for ProductAgent {
    type Output = String;

    fn stage(&self) -> Stage {
        Stage::Product
    }

    fn data_config(&self) -> AgentDataConfig {
        AgentDataConfig {
            required_sources: vec![DataSource::Idea],
            optional_sources: vec![DataSource::StageResult(Stage::Radar)],
        }
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"你是一名经验丰富的产品经理，负责把一个已通过初步验证的产品创意整理成可以交给研发团队的产品需求文档（PRD）。

PRD必须使用markdown，并包含以下章节：
1. 产品概述（一句话定位 + 背景）
2. 目标用户与用户画像
3. 核心问题与价值主张
4. MVP功能列表（按优先级P0/P1/P2排列，P0不超过5项）
5. 关键用户故事（"作为…我希望…以便…"格式）
6. 非功能性需求（性能、安全、隐私）
7. 明确不做的事情（Out of Scope）
8. 成功标准

直接输出PRD正文，不要输出额外的寒暄或解释。"#
                .to_string(),

            opening_instruction: "请基于以下材料撰写MVP阶段的产品需求文档：".to_string(),

            closing_instruction: r#"
## 写作要求：
- 如果有创意雷达的结论，PRD需要回应其中提到的主要风险
- 功能描述要具体到可以被验收
- 控制篇幅，聚焦MVP"#
                .to_string(),

            llm_call_mode: LLMCallMode::Prompt,
            formatter_config: FormatterConfig::default(),
        }
    }

    fn post_process(&self, result: String) -> Result<String> {
        if result.trim().len() < 20 {
            bail!("PRD is unexpectedly short");
        }
        Ok(result)
    }
}

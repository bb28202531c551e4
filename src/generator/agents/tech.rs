use anyhow::{Result, bail};

use crate::generator::step_forward_agent::{
    AgentDataConfig, DataSource, FormatterConfig, LLMCallMode, PromptTemplate, StepForwardAgent,
};
use crate::llm::sanitize::strip_markdown_fences;
use crate::types::reports::TechBlueprint;
use crate::types::stage::Stage;

/// 架构师 - 输出技术选型、组件划分、数据模型与架构图
#[derive(Default)]
pub struct TechAgent;

impl StepForwardAgent for TechAgent {
    type Output = TechBlueprint;

    fn stage(&self) -> Stage {
        Stage::Tech
    }

    fn data_config(&self) -> AgentDataConfig {
        AgentDataConfig {
            required_sources: vec![DataSource::Idea],
            optional_sources: vec![
                DataSource::StageResult(Stage::Radar),
                DataSource::StageResult(Stage::Product),
            ],
        }
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"你是一名务实的软件架构师，擅长为初创团队设计能在数周内上线、之后又能平滑演进的MVP架构。

你的任务是基于产品需求给出：
1. 分层的技术栈选型（frontend / backend / database / infra等），并说明理由
2. 核心组件及其职责
3. 核心数据实体及主要字段
4. 关键API接口
5. 一张Mermaid架构图（flowchart），展示用户、组件、数据存储与外部服务之间的关系

原则：优先选择成熟、托管、团队容易招人的技术，避免过度设计。"#
                .to_string(),

            opening_instruction: "请为以下产品设计MVP技术架构：".to_string(),

            closing_instruction: r#"
## 设计要求：
- mermaid_diagram只包含Mermaid源码本身，不要用```包裹
- 组件数量控制在3-8个
- API接口覆盖PRD中的P0功能"#
                .to_string(),

            llm_call_mode: LLMCallMode::Json,
            formatter_config: FormatterConfig::default(),
        }
    }

    fn post_process(&self, mut result: TechBlueprint) -> Result<TechBlueprint> {
        if result.stack.is_empty() && result.components.is_empty() {
            bail!("tech blueprint contains neither a stack nor components");
        }
        result.mermaid_diagram = strip_markdown_fences(&result.mermaid_diagram);
        Ok(result)
    }
}

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::generator::agent_executor::{AgentExecuteParams, extract_json, prompt};
use crate::generator::context::GeneratorContext;
use crate::types::reports::{CodeScaffold, RadarReport, TechBlueprint};
use crate::types::stage::{Stage, StageRecord};

/// 数据源配置
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DataSource {
    /// 用户输入的产品创意
    Idea,
    /// 上游阶段的结果
    StageResult(Stage),
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Idea => write!(f, "idea"),
            DataSource::StageResult(stage) => write!(f, "stage:{}", stage),
        }
    }
}

/// Agent数据配置 - 声明所需的数据源
#[derive(Debug, Clone)]
pub struct AgentDataConfig {
    /// 必需的数据源 - 缺少时执行失败
    pub required_sources: Vec<DataSource>,
    /// 可选的数据源 - 缺少时不影响执行
    pub optional_sources: Vec<DataSource>,
}

/// LLM调用方式配置
#[derive(Debug, Clone, PartialEq)]
pub enum LLMCallMode {
    /// 返回markdown文本
    Prompt,
    /// 返回JSON，按Output的schema解析
    Json,
}

/// 数据格式化配置
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// 上游文本结果截断长度（字符数）
    pub stage_result_truncate_length: Option<usize>,
    /// 是否包含脚手架文件的源码
    pub include_scaffold_sources: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            stage_result_truncate_length: Some(12000),
            include_scaffold_sources: false,
        }
    }
}

/// Prompt模板配置
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// 系统提示词
    pub system_prompt: String,
    /// 开头的说明性指令
    pub opening_instruction: String,
    /// 结尾的强调性指令
    pub closing_instruction: String,
    /// LLM调用方式
    pub llm_call_mode: LLMCallMode,
    /// 数据格式化配置
    pub formatter_config: FormatterConfig,
}

/// 按字符截断，避免切断多字节字符
fn truncate_chars(text: &str, limit: Option<usize>) -> String {
    match limit {
        Some(limit) if text.chars().count() > limit => {
            let truncated: String = text.chars().take(limit).collect();
            format!("{}...(已截断)", truncated)
        }
        _ => text.to_string(),
    }
}

/// 通用数据格式化器
pub struct DataFormatter {
    config: FormatterConfig,
}

impl DataFormatter {
    pub fn new(config: FormatterConfig) -> Self {
        Self { config }
    }

    /// 格式化雷达报告
    pub fn format_radar(&self, report: &RadarReport) -> String {
        let mut content = format!(
            "评分: {}/100，结论: {}\n市场概况: {}\n",
            report.score, report.verdict, report.market_summary
        );
        if !report.target_segments.is_empty() {
            content.push_str(&format!("目标细分人群: {}\n", report.target_segments.join("；")));
        }
        for competitor in &report.competitors {
            content.push_str(&format!(
                "- 竞品 {}：弱点 {}\n",
                competitor.name, competitor.weakness
            ));
        }
        for risk in &report.risks {
            content.push_str(&format!("- 风险: {}\n", risk));
        }
        for opportunity in &report.opportunities {
            content.push_str(&format!("- 机会: {}\n", opportunity));
        }
        content.push_str(&format!("建议: {}\n", report.recommendation));
        content
    }

    /// 格式化技术蓝图（不含图表源码）
    pub fn format_tech(&self, blueprint: &TechBlueprint) -> String {
        let mut content = format!("架构概述: {}\n", blueprint.summary);
        for choice in &blueprint.stack {
            content.push_str(&format!(
                "- 技术栈 [{}] {}：{}\n",
                choice.layer, choice.choice, choice.reason
            ));
        }
        for component in &blueprint.components {
            content.push_str(&format!(
                "- 组件 {}：{}\n",
                component.name, component.responsibility
            ));
        }
        for entity in &blueprint.data_entities {
            content.push_str(&format!(
                "- 数据实体 {}({})\n",
                entity.name,
                entity.fields.join(", ")
            ));
        }
        for endpoint in &blueprint.api_endpoints {
            content.push_str(&format!(
                "- 接口 {} {}：{}\n",
                endpoint.method, endpoint.path, endpoint.purpose
            ));
        }
        content
    }

    /// 格式化代码脚手架，默认只列出文件清单
    pub fn format_scaffold(&self, scaffold: &CodeScaffold) -> String {
        let mut content = format!(
            "项目: {}（{}），共{}个文件\n",
            scaffold.project_name,
            scaffold.language,
            scaffold.files.len()
        );
        for file in &scaffold.files {
            content.push_str(&format!("- `{}`\n", file.path));
            if self.config.include_scaffold_sources {
                content.push_str(&format!(
                    "```{}\n{}\n```\n",
                    file.language,
                    truncate_chars(&file.content, self.config.stage_result_truncate_length)
                ));
            }
        }
        content
    }

    /// 格式化任意阶段的结果
    pub fn format_stage_result(&self, stage: Stage, record: &StageRecord) -> Option<String> {
        record.result.as_ref()?;

        let typed = match stage {
            Stage::Radar => record
                .typed_result::<RadarReport>()
                .map(|r| self.format_radar(&r)),
            Stage::Tech => record
                .typed_result::<TechBlueprint>()
                .map(|r| self.format_tech(&r)),
            Stage::Dev => record
                .typed_result::<CodeScaffold>()
                .map(|r| self.format_scaffold(&r)),
            Stage::Product | Stage::Qa => None,
        };

        let body = match typed {
            Some(body) => body,
            None => truncate_chars(
                &record.text_result()?,
                self.config.stage_result_truncate_length,
            ),
        };
        Some(body)
    }
}

/// 标准的阶段Agent Prompt构建器
pub struct GeneratorPromptBuilder {
    template: PromptTemplate,
    formatter: DataFormatter,
}

impl GeneratorPromptBuilder {
    pub fn new(template: PromptTemplate) -> Self {
        let formatter = DataFormatter::new(template.formatter_config.clone());
        Self {
            template,
            formatter,
        }
    }

    /// 构建系统提示词和用户提示词；schema仅在JSON模式下提供
    pub async fn build_prompts(
        &self,
        context: &GeneratorContext,
        data_sources: &[DataSource],
        output_schema: Option<String>,
    ) -> Result<(String, String)> {
        let system_prompt = self.template.system_prompt.clone();
        let user_prompt = self
            .build_standard_user_prompt(context, data_sources, output_schema)
            .await?;
        Ok((system_prompt, user_prompt))
    }

    async fn build_standard_user_prompt(
        &self,
        context: &GeneratorContext,
        data_sources: &[DataSource],
        output_schema: Option<String>,
    ) -> Result<String> {
        let mut prompt = String::new();

        // 开头说明性指令
        prompt.push_str(&self.template.opening_instruction);
        prompt.push_str("\n\n");

        prompt.push_str("## 参考材料\n");

        let state = context.snapshot().await;
        for source in data_sources {
            match source {
                DataSource::Idea => prompt.push_str(&state.idea.summary()),
                DataSource::StageResult(stage) => {
                    if let Some(formatted) = self
                        .formatter
                        .format_stage_result(*stage, state.record(*stage))
                    {
                        prompt.push_str(&format!(
                            "### {}阶段结果\n{}\n\n",
                            context.config.target_language.stage_title(*stage),
                            formatted
                        ));
                    }
                }
            }
        }

        if let Some(schema) = output_schema {
            prompt.push_str(&format!(
                "## 输出格式\n只输出一个符合以下JSON Schema的JSON对象，不要输出任何其他文字：\n```json\n{}\n```\n\n",
                schema
            ));
        }

        // 结尾强调性指令
        prompt.push_str(&self.template.closing_instruction);
        Ok(prompt)
    }
}

/// 阶段Agent trait：声明数据源与prompt模板，执行流程完全标准化
#[async_trait]
pub trait StepForwardAgent: Send + Sync {
    /// Agent的输出类型 - 必须支持JSON序列化
    type Output: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static;

    /// 所属阶段
    fn stage(&self) -> Stage;

    /// 数据源配置
    fn data_config(&self) -> AgentDataConfig;

    /// Prompt模板配置
    fn prompt_template(&self) -> PromptTemplate;

    /// 可选的后处理钩子，可校验或修正模型输出
    fn post_process(&self, result: Self::Output) -> Result<Self::Output> {
        Ok(result)
    }

    /// 检查required数据源是否可用
    async fn validate_sources(&self, context: &GeneratorContext) -> Result<()> {
        for source in &self.data_config().required_sources {
            match source {
                DataSource::Idea => {
                    context.snapshot().await.idea.validate()?;
                }
                DataSource::StageResult(stage) => {
                    if !context.has_stage_result(*stage).await {
                        return Err(anyhow!("必需的数据源 {} 不可用", source));
                    }
                    tracing::trace!(%stage, "required source available");
                }
            }
        }
        Ok(())
    }

    /// 构建本阶段的调用参数（prompt、缓存作用域）
    async fn execute_params(&self, context: &GeneratorContext) -> Result<AgentExecuteParams> {
        let config = self.data_config();
        let all_sources = [config.required_sources, config.optional_sources].concat();

        // 根据配置的目标语言添加语言指令
        let mut template = self.prompt_template();
        let language_instruction = context.config.target_language.prompt_instruction();
        template.system_prompt = format!("{}\n\n{}", template.system_prompt, language_instruction);

        let output_schema = match template.llm_call_mode {
            LLMCallMode::Json => Some(serde_json::to_string_pretty(&schemars::schema_for!(
                Self::Output
            ))?),
            LLMCallMode::Prompt => None,
        };

        let prompt_builder = GeneratorPromptBuilder::new(template);
        let (system_prompt, user_prompt) = prompt_builder
            .build_prompts(context, &all_sources, output_schema)
            .await?;

        Ok(AgentExecuteParams {
            prompt_sys: system_prompt,
            prompt_user: user_prompt,
            cache_scope: format!("stage/{}", self.stage().key()),
            log_tag: self.stage().to_string(),
        })
    }

    /// 默认实现的execute方法
    async fn execute(&self, context: &GeneratorContext) -> Result<Self::Output> {
        self.validate_sources(context).await?;

        let params = self.execute_params(context).await?;

        // post_process通过后响应才会进入缓存
        let result = match self.prompt_template().llm_call_mode {
            LLMCallMode::Json => {
                extract_json(context, params, |parsed: Self::Output| {
                    self.post_process(parsed)
                })
                .await?
            }
            LLMCallMode::Prompt => {
                prompt(context, params, |text| {
                    let parsed: Self::Output =
                        serde_json::from_value(serde_json::Value::String(text))?;
                    self.post_process(parsed)
                })
                .await?
            }
        };

        println!("✅ Stage-Agent [{}]执行完成", self.stage());
        Ok(result)
    }
}

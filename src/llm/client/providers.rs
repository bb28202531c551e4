//! LLM Provider支持模块

use anyhow::Result;
use rig::{
    agent::Agent,
    client::CompletionClient,
    completion::Prompt,
    providers::gemini::completion::gemini_api_types::{AdditionalParameters, GenerationConfig},
};

use crate::config::{LLMConfig, LLMProvider};

/// 阶段调用只需要系统提示词与采样参数，各provider的builder写法一致
macro_rules! stage_agent {
    ($builder:expr, $system_prompt:expr, $config:expr $(, $extra:ident($arg:expr))*) => {
        $builder
            .preamble($system_prompt)
            .max_tokens($config.max_tokens.into())
            .temperature($config.temperature)
            $(.$extra($arg))*
            .build()
    };
}

/// 在所有Agent变体上执行同一个表达式
macro_rules! each_agent {
    ($self:expr, $agent:ident => $body:expr) => {
        match $self {
            ProviderAgent::OpenAI($agent) => $body,
            ProviderAgent::DeepSeek($agent) => $body,
            ProviderAgent::Anthropic($agent) => $body,
            ProviderAgent::Gemini($agent) => $body,
            ProviderAgent::Ollama($agent) => $body,
        }
    };
}

/// 统一的Provider客户端枚举
#[derive(Clone)]
pub enum ProviderClient {
    OpenAI(rig::providers::openai::Client),
    DeepSeek(rig::providers::deepseek::Client),
    Anthropic(rig::providers::anthropic::Client),
    Gemini(rig::providers::gemini::Client),
    Ollama(rig::providers::ollama::Client),
}

impl ProviderClient {
    /// 根据配置创建相应的provider客户端
    pub fn new(config: &LLMConfig) -> Result<Self> {
        let client = match config.provider {
            LLMProvider::OpenAI => ProviderClient::OpenAI(
                rig::providers::openai::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build(),
            ),
            LLMProvider::DeepSeek => ProviderClient::DeepSeek(
                rig::providers::deepseek::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build(),
            ),
            LLMProvider::Anthropic => ProviderClient::Anthropic(
                rig::providers::anthropic::ClientBuilder::new(&config.api_key).build()?,
            ),
            LLMProvider::Gemini => ProviderClient::Gemini(
                rig::providers::gemini::Client::builder(&config.api_key).build()?,
            ),
            // 本地Ollama不需要API Key
            LLMProvider::Ollama => {
                ProviderClient::Ollama(rig::providers::ollama::Client::builder().build())
            }
        };
        Ok(client)
    }

    pub fn provider(&self) -> LLMProvider {
        match self {
            ProviderClient::OpenAI(_) => LLMProvider::OpenAI,
            ProviderClient::DeepSeek(_) => LLMProvider::DeepSeek,
            ProviderClient::Anthropic(_) => LLMProvider::Anthropic,
            ProviderClient::Gemini(_) => LLMProvider::Gemini,
            ProviderClient::Ollama(_) => LLMProvider::Ollama,
        }
    }

    /// 创建单轮对话Agent，阶段调用不挂载工具
    pub fn create_agent(
        &self,
        model: &str,
        system_prompt: &str,
        config: &LLMConfig,
    ) -> Result<ProviderAgent> {
        tracing::debug!(provider = %self.provider(), model, "creating stage agent");

        let agent = match self {
            ProviderClient::OpenAI(client) => ProviderAgent::OpenAI(stage_agent!(
                client
                    .completion_model(model)
                    .completions_api()
                    .into_agent_builder(),
                system_prompt,
                config
            )),
            ProviderClient::DeepSeek(client) => {
                ProviderAgent::DeepSeek(stage_agent!(client.agent(model), system_prompt, config))
            }
            ProviderClient::Anthropic(client) => {
                ProviderAgent::Anthropic(stage_agent!(client.agent(model), system_prompt, config))
            }
            ProviderClient::Gemini(client) => {
                let params =
                    AdditionalParameters::default().with_config(GenerationConfig::default());
                ProviderAgent::Gemini(stage_agent!(
                    client.agent(model),
                    system_prompt,
                    config,
                    additional_params(serde_json::to_value(params)?)
                ))
            }
            ProviderClient::Ollama(client) => {
                ProviderAgent::Ollama(stage_agent!(client.agent(model), system_prompt, config))
            }
        };
        Ok(agent)
    }
}

/// 统一的Agent枚举
pub enum ProviderAgent {
    OpenAI(Agent<rig::providers::openai::CompletionModel>),
    DeepSeek(Agent<rig::providers::deepseek::CompletionModel>),
    Anthropic(Agent<rig::providers::anthropic::completion::CompletionModel>),
    Gemini(Agent<rig::providers::gemini::completion::CompletionModel>),
    Ollama(Agent<rig::providers::ollama::CompletionModel<reqwest::Client>>),
}

impl ProviderAgent {
    /// 执行单轮prompt
    pub async fn prompt(&self, prompt: &str) -> Result<String> {
        each_agent!(self, agent => agent.prompt(prompt).await.map_err(anyhow::Error::from))
    }
}

//! LLM客户端 - 提供统一的LLM服务接口

use anyhow::{Result, anyhow};
use std::future::Future;
use std::time::Duration;

use crate::config::LLMConfig;
use crate::llm::client::utils::evaluate_befitting_model;
use crate::llm::error::LlmError;

mod providers;
pub mod utils;

use providers::ProviderClient;

/// LLM客户端 - 提供统一的LLM服务接口
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = ProviderClient::new(&config)?;
        Ok(Self { client, config })
    }

    /// 检查模型连接和功能是否正常
    pub async fn check_connection(&self) -> Result<()> {
        println!("🔄 正在检查模型连接...");
        match self
            .prompt_with_model(
                "System: You are a helpful assistant.",
                "Hello",
                &self.config.model_efficient,
            )
            .await
        {
            Ok(_) => {
                println!("✅ 模型连接正常");
                Ok(())
            }
            Err(e) => {
                let classified = LlmError::from_anyhow(&e);
                eprintln!("❌ 模型连接失败: {}", classified);
                eprintln!("💡 {}", classified.kind.user_hint());
                Err(e)
            }
        }
    }

    /// 单轮对话：按prompt长度选择模型，失败时切换到兜底模型再试一次
    pub async fn prompt(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let (befitting_model, fallover_model) =
            evaluate_befitting_model(&self.config, system_prompt, user_prompt);

        match self
            .prompt_with_model(system_prompt, user_prompt, &befitting_model)
            .await
        {
            Ok(text) => Ok(text),
            Err(e) => match fallover_model {
                Some(model) if LlmError::from_anyhow(&e).kind.is_retryable() => {
                    eprintln!(
                        "❌ 模型{}调用失败，尝试使用备选模型{}...",
                        befitting_model, model
                    );
                    tracing::debug!("fallover reason: {:#}", e);
                    self.prompt_with_model(system_prompt, user_prompt, &model)
                        .await
                }
                _ => Err(e),
            },
        }
    }

    /// 指定模型的单轮对话
    pub async fn prompt_with_model(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
    ) -> Result<String> {
        let agent = self.client.create_agent(model, system_prompt, &self.config)?;
        let timeout = Duration::from_secs(self.config.timeout_seconds);

        retry_with_backoff(
            self.config.retry_attempts,
            self.config.retry_delay_ms,
            || async {
                match tokio::time::timeout(timeout, agent.prompt(user_prompt)).await {
                    Ok(result) => result,
                    Err(_) => Err(anyhow!(
                        "request timed out after {}s",
                        timeout.as_secs()
                    )),
                }
            },
        )
        .await
    }
}

/// 通用重试逻辑，只重试可恢复的错误，最多调用max_attempts次，间隔线性增长
pub async fn retry_with_backoff<T, F, Fut>(
    max_attempts: u32,
    retry_delay_ms: u64,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, anyhow::Error>>,
{
    let max_retries = max_attempts.max(1);
    let mut retries = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                retries += 1;
                let kind = LlmError::from_anyhow(&err).kind;
                if !kind.is_retryable() || retries >= max_retries {
                    return Err(err);
                }
                tracing::warn!(
                    attempt = retries,
                    max = max_retries,
                    %kind,
                    "调用模型服务出错，重试中: {:#}",
                    err
                );
                tokio::time::sleep(Duration::from_millis(retry_delay_ms * retries as u64)).await;
            }
        }
    }
}

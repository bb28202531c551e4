use anyhow::Result;
use serde::Deserialize;

use crate::generator::context::GeneratorContext;
use crate::llm::error::LlmError;
use crate::llm::sanitize::{extract_json_block, strip_markdown_fences};

/// 单次阶段调用的参数
#[derive(Debug, Clone)]
pub struct AgentExecuteParams {
    pub prompt_sys: String,
    pub prompt_user: String,
    pub cache_scope: String,
    pub log_tag: String,
}

impl AgentExecuteParams {
    /// 缓存键，由系统提示词与用户提示词共同决定
    pub fn cache_key(&self) -> String {
        format!("{}\n\n{}", self.prompt_sys, self.prompt_user)
    }
}

/// 先查缓存，未命中再调用模型；返回原始响应文本及是否来自缓存
async fn prompt_raw(
    context: &GeneratorContext,
    params: &AgentExecuteParams,
) -> Result<(String, bool)> {
    let cache_key = params.cache_key();
    if let Some(cached) = context
        .cache_manager
        .read()
        .await
        .get::<String>(&params.cache_scope, &cache_key)
        .await?
    {
        return Ok((cached, true));
    }

    println!("   🤖 [{}] 正在调用模型...", params.log_tag);
    let text = context
        .llm_client
        .prompt(&params.prompt_sys, &params.prompt_user)
        .await?;
    Ok((text, false))
}

async fn write_cache(context: &GeneratorContext, params: &AgentExecuteParams, text: &str) {
    let result = context
        .cache_manager
        .write()
        .await
        .set(&params.cache_scope, &params.cache_key(), text, None)
        .await;
    if let Err(e) = result {
        tracing::warn!(tag = %params.log_tag, "缓存写入失败: {:#}", e);
    }
}

async fn evict_cache(context: &GeneratorContext, params: &AgentExecuteParams) {
    let result = context
        .cache_manager
        .write()
        .await
        .remove(&params.cache_scope, &params.cache_key())
        .await;
    if let Err(e) = result {
        tracing::warn!(tag = %params.log_tag, "缓存删除失败: {:#}", e);
    }
}

/// 只缓存被接受的响应；被拒绝的缓存条目会被删除，保证下次重试真正调用模型
async fn settle<R>(
    context: &GeneratorContext,
    params: &AgentExecuteParams,
    raw: &str,
    cached: bool,
    outcome: Result<R>,
) -> Result<R> {
    match (outcome.is_ok(), cached) {
        (true, false) => write_cache(context, params, raw).await,
        (false, true) => {
            eprintln!("⚠️ [{}] 缓存的响应未通过校验，已删除该缓存", params.log_tag);
            evict_cache(context, params).await;
        }
        _ => {}
    }
    outcome
}

/// 文本模式：去掉代码块包裹后交给accept校验，通过后才写入缓存
pub async fn prompt<R, F>(
    context: &GeneratorContext,
    params: AgentExecuteParams,
    accept: F,
) -> Result<R>
where
    F: FnOnce(String) -> Result<R> + Send,
    R: Send,
{
    let (raw, cached) = prompt_raw(context, &params).await?;
    let text = strip_markdown_fences(&raw);
    let outcome = if text.is_empty() {
        Err(LlmError::malformed("model returned an empty response").into())
    } else {
        accept(text)
    };
    settle(context, &params, &raw, cached, outcome).await
}

/// 从响应中挽救JSON并解析为目标类型
pub fn parse_json_response<T>(raw: &str) -> Result<T, LlmError>
where
    T: for<'a> Deserialize<'a>,
{
    let block = extract_json_block(raw)
        .ok_or_else(|| LlmError::malformed("no JSON object found in response"))?;
    serde_json::from_str::<T>(&block)
        .map_err(|e| LlmError::malformed(format!("invalid JSON: {}", e)))
}

/// 解析失败后重新请求时使用的用户提示词
pub fn malformed_retry_prompt(prompt_user: &str, err: &LlmError) -> String {
    format!(
        "{}\n\n**注意事项** 此前的输出无法解析，错误信息为“{}”，这一次请只输出一个合法的JSON对象",
        prompt_user, err.message
    )
}

/// JSON模式：解析失败时附带错误信息重新请求一次；accept通过后才写入缓存
pub async fn extract_json<T, R, F>(
    context: &GeneratorContext,
    params: AgentExecuteParams,
    accept: F,
) -> Result<R>
where
    T: for<'a> Deserialize<'a> + Send,
    F: FnOnce(T) -> Result<R> + Send,
    R: Send,
{
    let (raw, cached) = prompt_raw(context, &params).await?;
    let err = match parse_json_response::<T>(&raw) {
        Ok(parsed) => {
            let outcome = accept(parsed);
            return settle(context, &params, &raw, cached, outcome).await;
        }
        Err(err) => err,
    };

    eprintln!(
        "⚠️ [{}] 模型输出无法解析，附带错误信息重试: {}",
        params.log_tag, err
    );
    tracing::debug!(tag = %params.log_tag, raw = %raw, "malformed response");
    if cached {
        evict_cache(context, &params).await;
    }

    let retry_user = malformed_retry_prompt(&params.prompt_user, &err);
    let text = context
        .llm_client
        .prompt(&params.prompt_sys, &retry_user)
        .await?;
    let outcome = parse_json_response::<T>(&text)
        .map_err(anyhow::Error::from)
        .and_then(accept);

    // 以原始prompt为键缓存修复后的响应
    settle(context, &params, &text, false, outcome).await
}

//! 模型调用错误分类 - 基于HTTP风格错误信息的字符串匹配

use std::fmt::Display;
use thiserror::Error;

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    RateLimited,
    Unauthorized,
    ModelNotFound,
    Overloaded,
    Timeout,
    Network,
    MalformedResponse,
    Unknown,
}

impl LlmErrorKind {
    /// 是否值得重试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmErrorKind::RateLimited
                | LlmErrorKind::Overloaded
                | LlmErrorKind::Timeout
                | LlmErrorKind::Network
                | LlmErrorKind::MalformedResponse
                | LlmErrorKind::Unknown
        )
    }

    /// 面向用户的处理建议
    pub fn user_hint(&self) -> &'static str {
        match self {
            LlmErrorKind::RateLimited => "模型服务配额或频率受限，请稍后重试或更换API Key",
            LlmErrorKind::Unauthorized => {
                "API Key无效或无权限，请检查 --llm-api-key 或 FACTORY_LLM_API_KEY"
            }
            LlmErrorKind::ModelNotFound => "模型不存在，请检查 --model-efficient / --model-powerful",
            LlmErrorKind::Overloaded => "模型服务暂时不可用，请稍后重试",
            LlmErrorKind::Timeout => "模型响应超时，可尝试更快的模型或稍后重试",
            LlmErrorKind::Network => "网络连接失败，请检查网络或 --llm-api-base-url",
            LlmErrorKind::MalformedResponse => "模型返回内容无法解析，可重试该阶段",
            LlmErrorKind::Unknown => "未知错误，请使用 --verbose 查看详情",
        }
    }
}

impl Display for LlmErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            LlmErrorKind::RateLimited => "rate_limited",
            LlmErrorKind::Unauthorized => "unauthorized",
            LlmErrorKind::ModelNotFound => "model_not_found",
            LlmErrorKind::Overloaded => "overloaded",
            LlmErrorKind::Timeout => "timeout",
            LlmErrorKind::Network => "network",
            LlmErrorKind::MalformedResponse => "malformed_response",
            LlmErrorKind::Unknown => "unknown",
        };
        write!(f, "{}", str)
    }
}

/// 已分类的模型调用错误
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
}

impl LlmError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: LlmErrorKind::MalformedResponse,
            message: message.into(),
        }
    }

    /// 对任意错误做一次分类；已分类的错误保持原类别
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        if let Some(classified) = err.downcast_ref::<LlmError>() {
            return Self {
                kind: classified.kind,
                message: classified.message.clone(),
            };
        }
        let message = format!("{:#}", err);
        Self {
            kind: classify(&message),
            message,
        }
    }
}

/// 按错误文本判断类别，顺序即优先级
pub fn classify(message: &str) -> LlmErrorKind {
    let lower = message.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if has(&["429", "rate limit", "quota", "resource_exhausted", "too many requests"]) {
        LlmErrorKind::RateLimited
    } else if has(&["401", "403", "api key", "api_key", "unauthorized", "permission"]) {
        LlmErrorKind::Unauthorized
    } else if has(&["404", "not found", "does not exist", "unknown model"]) {
        LlmErrorKind::ModelNotFound
    } else if has(&["500", "502", "503", "504", "overloaded", "unavailable"]) {
        LlmErrorKind::Overloaded
    } else if has(&["timeout", "timed out", "deadline"]) {
        LlmErrorKind::Timeout
    } else if has(&["connection", "dns", "network", "reset by peer"]) {
        LlmErrorKind::Network
    } else {
        LlmErrorKind::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rate_limit() {
        assert_eq!(
            classify("HTTP 429: RESOURCE_EXHAUSTED"),
            LlmErrorKind::RateLimited
        );
        assert_eq!(
            classify("You exceeded your current quota"),
            LlmErrorKind::RateLimited
        );
    }

    #[test]
    fn test_classify_auth_and_model() {
        assert_eq!(
            classify("ProviderError: API key not valid"),
            LlmErrorKind::Unauthorized
        );
        assert_eq!(classify("status 403 Forbidden"), LlmErrorKind::Unauthorized);
        assert_eq!(
            classify("404 models/gemini-9 is not found"),
            LlmErrorKind::ModelNotFound
        );
        assert_eq!(
            classify("models/gemini-9 is not found"),
            LlmErrorKind::ModelNotFound
        );
        assert_eq!(
            classify("The model `gpt-9` does not exist"),
            LlmErrorKind::ModelNotFound
        );
        assert!(!classify("models/gemini-9 is not found").is_retryable());
    }

    #[test]
    fn test_classify_transient() {
        assert_eq!(
            classify("503 Service Unavailable: model is overloaded"),
            LlmErrorKind::Overloaded
        );
        assert_eq!(classify("operation timed out"), LlmErrorKind::Timeout);
        assert_eq!(
            classify("error sending request: connection refused"),
            LlmErrorKind::Network
        );
        assert_eq!(classify("something odd"), LlmErrorKind::Unknown);
    }

    #[test]
    fn test_retryable() {
        assert!(LlmErrorKind::RateLimited.is_retryable());
        assert!(LlmErrorKind::MalformedResponse.is_retryable());
        assert!(!LlmErrorKind::Unauthorized.is_retryable());
        assert!(!LlmErrorKind::ModelNotFound.is_retryable());
    }

    #[test]
    fn test_from_anyhow_keeps_existing_kind() {
        let err = anyhow::Error::new(LlmError::malformed("no json object"));
        let classified = LlmError::from_anyhow(&err);
        assert_eq!(classified.kind, LlmErrorKind::MalformedResponse);
        assert_eq!(classified.message, "no json object");

        let err = anyhow::anyhow!("HTTP 401 Unauthorized");
        assert_eq!(LlmError::from_anyhow(&err).kind, LlmErrorKind::Unauthorized);
    }
}

use crate::config::LLMConfig;

/// 超过该长度的prompt直接交给高质量模型
const EFFICIENT_PROMPT_LIMIT: usize = 32 * 1024;

/// 选择模型：返回（首选模型，失败后的兜底模型）
pub fn evaluate_befitting_model(
    llm_config: &LLMConfig,
    system_prompt: &str,
    user_prompt: &str,
) -> (String, Option<String>) {
    if system_prompt.len() + user_prompt.len() <= EFFICIENT_PROMPT_LIMIT {
        let fallover = if llm_config.model_powerful != llm_config.model_efficient {
            Some(llm_config.model_powerful.clone())
        } else {
            None
        };
        return (llm_config.model_efficient.clone(), fallover);
    }
    (llm_config.model_powerful.clone(), None)
}

//! 模型输出清洗

use regex::Regex;
use std::sync::LazyLock;

static FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[A-Za-z0-9_+\-]*[ \t]*\r?\n?").unwrap());
static FENCE_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r?\n?```[ \t]*$").unwrap());

/// 去掉包裹整段回复的markdown代码块标记
pub fn strip_markdown_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let without_open = FENCE_OPEN.replace(trimmed, "");
    let without_close = FENCE_CLOSE.replace(&without_open, "");
    without_close.trim().to_string()
}

/// 截取第一个`{`到最后一个`}`之间的内容，用于挽救格式不规范的JSON
pub fn extract_json_block(text: &str) -> Option<String> {
    let cleaned = strip_markdown_fences(text);
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end < start {
        return None;
    }
    Some(cleaned[start..=end].to_string())
}

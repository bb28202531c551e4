use serde::{Deserialize, Serialize};

use crate::types::stage::Stage;

/// 目标语言类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum TargetLanguage {
    #[serde(rename = "zh")]
    #[default]
    Chinese,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ja")]
    Japanese,
}

impl std::fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetLanguage::Chinese => write!(f, "zh"),
            TargetLanguage::English => write!(f, "en"),
            TargetLanguage::Japanese => write!(f, "ja"),
        }
    }
}

impl std::str::FromStr for TargetLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zh" | "chinese" | "中文" => Ok(TargetLanguage::Chinese),
            "en" | "english" | "英文" => Ok(TargetLanguage::English),
            "ja" | "japanese" | "日本語" | "日文" => Ok(TargetLanguage::Japanese),
            _ => Err(format!("Unknown target language: {}", s)),
        }
    }
}

impl TargetLanguage {
    /// 获取语言的描述性名称
    pub fn display_name(&self) -> &'static str {
        match self {
            TargetLanguage::Chinese => "中文",
            TargetLanguage::English => "English",
            TargetLanguage::Japanese => "日本語",
        }
    }

    /// 获取语言的提示词指令
    pub fn prompt_instruction(&self) -> &'static str {
        match self {
            TargetLanguage::Chinese => {
                "请使用中文输出所有自然语言内容（JSON的键名保持英文不变），表达准确、专业、易于理解。"
            }
            TargetLanguage::English => {
                "Please write all natural-language content in English (keep JSON keys unchanged), ensuring accurate, professional, and easy-to-understand language."
            }
            TargetLanguage::Japanese => {
                "すべての自然言語の内容を日本語で出力してください（JSONのキー名は英語のまま）。正確で専門的で理解しやすい表現を心がけてください。"
            }
        }
    }

    /// 获取阶段文档文件名
    pub fn get_doc_filename(&self, stage: Stage) -> String {
        match self {
            TargetLanguage::Chinese => match stage {
                Stage::Radar => "1、创意雷达.md".to_string(),
                Stage::Product => "2、产品需求文档.md".to_string(),
                Stage::Tech => "3、技术架构.md".to_string(),
                Stage::Dev => "4、代码脚手架.md".to_string(),
                Stage::Qa => "5、指标决策.md".to_string(),
            },
            TargetLanguage::English => match stage {
                Stage::Radar => "1.Idea-Radar.md".to_string(),
                Stage::Product => "2.Product-Requirements.md".to_string(),
                Stage::Tech => "3.Tech-Architecture.md".to_string(),
                Stage::Dev => "4.Code-Scaffold.md".to_string(),
                Stage::Qa => "5.Metrics-Decision.md".to_string(),
            },
            TargetLanguage::Japanese => match stage {
                Stage::Radar => "1-アイデアレーダー.md".to_string(),
                Stage::Product => "2-プロダクト要件.md".to_string(),
                Stage::Tech => "3-技術アーキテクチャ.md".to_string(),
                Stage::Dev => "4-コードスキャフォールド.md".to_string(),
                Stage::Qa => "5-指標と意思決定.md".to_string(),
            },
        }
    }

    /// 获取阶段标题
    pub fn stage_title(&self, stage: Stage) -> &'static str {
        match self {
            TargetLanguage::Chinese => match stage {
                Stage::Radar => "创意雷达",
                Stage::Product => "产品需求文档",
                Stage::Tech => "技术架构",
                Stage::Dev => "代码脚手架",
                Stage::Qa => "指标决策",
            },
            TargetLanguage::English => match stage {
                Stage::Radar => "Idea Radar",
                Stage::Product => "Product Requirements",
                Stage::Tech => "Tech Architecture",
                Stage::Dev => "Code Scaffold",
                Stage::Qa => "Metrics Decision",
            },
            TargetLanguage::Japanese => match stage {
                Stage::Radar => "アイデアレーダー",
                Stage::Product => "プロダクト要件",
                Stage::Tech => "技術アーキテクチャ",
                Stage::Dev => "コードスキャフォールド",
                Stage::Qa => "指標と意思決定",
            },
        }
    }

    /// 脚手架文件输出目录名
    pub fn get_directory_name(&self, dir_type: &str) -> String {
        match self {
            TargetLanguage::Chinese => match dir_type {
                "scaffold" => "4、脚手架源码".to_string(),
                _ => dir_type.to_string(),
            },
            TargetLanguage::English => match dir_type {
                "scaffold" => "4.Scaffold".to_string(),
                _ => dir_type.to_string(),
            },
            TargetLanguage::Japanese => match dir_type {
                "scaffold" => "4-スキャフォールド".to_string(),
                _ => dir_type.to_string(),
            },
        }
    }
}

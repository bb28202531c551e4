use crate::config::{Config, LLMProvider};
use crate::i18n::TargetLanguage;
use crate::types::idea::IdeaInput;
use crate::types::stage::Stage;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

/// Idea Factory - 由Rust与AI驱动的产品创意流水线：创意雷达 → PRD → 架构 → 脚手架 → 指标决策
#[derive(Parser, Debug)]
#[command(name = "idea-factory")]
#[command(
    about = "AI-driven product pipeline that turns a raw idea into a market radar, a PRD, an architecture blueprint, a runnable code scaffold and a launch metrics decision."
)]
#[command(version)]
pub struct Args {
    /// 创意名称
    #[arg(short, long)]
    pub name: Option<String>,

    /// 目标用户
    #[arg(long)]
    pub target_user: Option<String>,

    /// 要解决的痛点
    #[arg(long)]
    pub pain_point: Option<String>,

    /// 创意描述
    #[arg(short, long)]
    pub description: Option<String>,

    /// 从TOML文件读取创意（name / target_user / pain_point / description）
    #[arg(long)]
    pub idea_file: Option<PathBuf>,

    /// 输出路径
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 从输出目录中的状态快照继续
    #[arg(long)]
    pub resume: bool,

    /// 从指定阶段重新开始 (radar, product, tech, dev, qa)
    #[arg(long)]
    pub restart_from: Option<Stage>,

    /// 跳过的阶段，可重复指定
    #[arg(long = "skip")]
    pub skip_stages: Vec<Stage>,

    /// 执行完该阶段后停止
    #[arg(long)]
    pub stop_after: Option<Stage>,

    /// 雷达评分阈值，低于该值时停止
    #[arg(long)]
    pub min_radar_score: Option<u8>,

    /// 忽略雷达结论，强制继续
    #[arg(long)]
    pub force: bool,

    /// 每个阶段开始前询问是否继续
    #[arg(short, long)]
    pub interactive: bool,

    /// 跳过启动时的模型连接检查
    #[arg(long)]
    pub skip_connection_check: bool,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,

    /// 高能效模型，优先用于常规推理任务
    #[arg(long)]
    pub model_efficient: Option<String>,

    /// 高质量模型，作为efficient失效情况下的兜底
    #[arg(long)]
    pub model_powerful: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// LLM Provider (openai, deepseek, anthropic, gemini, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// 目标语言 (zh, en, ja)
    #[arg(long)]
    pub target_language: Option<String>,

    /// 是否禁用缓存
    #[arg(long)]
    pub no_cache: bool,

    /// 强制重新生成（清除缓存）
    #[arg(long)]
    pub force_regenerate: bool,
}

impl Args {
    /// 将CLI参数转换为配置
    pub fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            // 显式指定的配置文件必须能读取
            Some(config_path) => Config::from_file(config_path)?,
            None => {
                let default_config_path = std::env::current_dir()
                    .unwrap_or_else(|_| PathBuf::from("."))
                    .join("factory.toml");
                if default_config_path.exists() {
                    Config::from_file(&default_config_path)?
                } else {
                    Config::default()
                }
            }
        };

        // 创意：文件优先于配置，单项参数优先于文件
        if let Some(idea_file) = &self.idea_file {
            config.idea = IdeaInput::from_file(idea_file)
                .context(format!("Failed to load idea file: {:?}", idea_file))?;
        }
        if let Some(name) = self.name {
            config.idea.name = name;
        }
        if let Some(target_user) = self.target_user {
            config.idea.target_user = target_user;
        }
        if let Some(pain_point) = self.pain_point {
            config.idea.pain_point = pain_point;
        }
        if let Some(description) = self.description {
            config.idea.description = description;
        }

        if let Some(output_path) = self.output_path {
            config.output_path = output_path;
        }

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            if let Ok(provider) = provider_str.parse::<LLMProvider>() {
                config.llm.provider = provider;
            } else {
                eprintln!(
                    "⚠️ 警告: 未知的provider: {}，使用默认provider",
                    provider_str
                );
            }
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(model_efficient) = self.model_efficient {
            config.llm.model_efficient = model_efficient;
        }
        if let Some(model_powerful) = self.model_powerful {
            config.llm.model_powerful = model_powerful;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }

        // 目标语言配置
        if let Some(target_language_str) = self.target_language {
            if let Ok(target_language) = target_language_str.parse::<TargetLanguage>() {
                config.target_language = target_language;
            } else {
                eprintln!(
                    "⚠️ 警告: 未知的目标语言: {}，使用默认语言 ({})",
                    target_language_str,
                    config.target_language.display_name()
                );
            }
        }

        // 流水线控制
        if self.resume {
            config.resume = true;
        }
        if self.restart_from.is_some() {
            config.restart_from = self.restart_from;
        }
        for stage in self.skip_stages {
            if !config.skip_stages.contains(&stage) {
                config.skip_stages.push(stage);
            }
        }
        if self.stop_after.is_some() {
            config.stop_after = self.stop_after;
        }
        if let Some(min_radar_score) = self.min_radar_score {
            config.min_radar_score = min_radar_score;
        }
        config.force |= self.force;
        config.interactive |= self.interactive;
        config.skip_connection_check |= self.skip_connection_check;

        // 缓存配置
        if self.no_cache {
            config.cache.enabled = false;
        }

        config.force_regenerate |= self.force_regenerate;
        config.verbose |= self.verbose;

        Ok(config)
    }
}

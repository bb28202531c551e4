use anyhow::{Result, bail};
use std::collections::HashSet;

use crate::generator::outlet::scaffold::safe_relative_path;
use crate::generator::step_forward_agent::{
    AgentDataConfig, DataSource, FormatterConfig, LLMCallMode, PromptTemplate, StepForwardAgent,
};
use crate::types::reports::CodeScaffold;
use crate::types::stage::Stage;

/// 开发工程师 - 根据架构生成可运行的项目脚手架
#[derive(Default)]
pub struct DevAgent;

impl StepForwardAgent for DevAgent {
    type Output = CodeScaffold;

    fn stage(&self) -> Stage {
        Stage::Dev
    }

    fn data_config(&self) -> AgentDataConfig {
        AgentDataConfig {
            required_sources: vec![DataSource::Idea, DataSource::StageResult(Stage::Tech)],
            optional_sources: vec![DataSource::StageResult(Stage::Product)],
        }
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"你是一名全栈工程师，负责把架构设计落地为一个最小但可以运行的项目脚手架。

你需要输出：
1. 项目名称与主要编程语言
2. 本地启动步骤（setup_steps）
3. 文件清单（files），每个文件给出相对路径、语言与完整内容

要求：
- 必须遵循架构中选定的技术栈
- 包含依赖清单文件（如package.json、Cargo.toml、requirements.txt）、入口文件、至少一个核心业务模块和README
- 文件路径必须是相对路径，不能以/开头，不能包含..
- 代码要能直接运行，不要留下"此处省略"之类的占位"#
                .to_string(),

            opening_instruction: "请根据以下架构设计生成项目脚手架：".to_string(),

            closing_instruction: r#"
## 生成要求：
- 文件数量控制在5-15个
- 优先实现PRD中P0功能对应的接口骨架"#
                .to_string(),

            llm_call_mode: LLMCallMode::Json,
            formatter_config: FormatterConfig::default(),
        }
    }

    fn post_process(&self, mut result: CodeScaffold) -> Result<CodeScaffold> {
        let mut seen = HashSet::new();
        result.files.retain(|file| match safe_relative_path(&file.path) {
            Ok(path) => {
                if seen.insert(path) {
                    true
                } else {
                    eprintln!("⚠️ 忽略重复的脚手架文件: {}", file.path);
                    false
                }
            }
            Err(e) => {
                eprintln!("⚠️ 忽略不安全的脚手架文件路径: {}", e);
                false
            }
        });

        if result.files.is_empty() {
            bail!("code scaffold contains no usable files");
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::reports::ScaffoldFile;

    fn file(path: &str) -> ScaffoldFile {
        ScaffoldFile {
            path: path.to_string(),
            language: "text".to_string(),
            content: "x".to_string(),
        }
    }

    #[test]
    fn test_post_process_filters_unsafe_and_duplicate_paths() {
        let scaffold = CodeScaffold {
            project_name: "pawplan".to_string(),
            language: "typescript".to_string(),
            setup_steps: vec![],
            files: vec![
                file("src/index.ts"),
                file("/etc/passwd"),
                file("../escape.txt"),
                file("./src/index.ts"),
                file("README.md"),
            ],
        };

        let result = DevAgent.post_process(scaffold).unwrap();
        let paths: Vec<_> = result.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/index.ts", "README.md"]);
    }

    #[test]
    fn test_post_process_rejects_empty_scaffold() {
        let scaffold = CodeScaffold {
            project_name: "pawplan".to_string(),
            language: "rust".to_string(),
            setup_steps: vec![],
            files: vec![file("../../oops")],
        };
        assert!(DevAgent.post_process(scaffold).is_err());
    }

    #[test]
    fn test_dev_requires_tech() {
        let config = DevAgent.data_config();
        assert!(
            config
                .required_sources
                .contains(&DataSource::StageResult(Stage::Tech))
        );
    }
}

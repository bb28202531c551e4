use std::fs;
use tempfile::TempDir;

use idea_factory::config::{CacheConfig, Config};
use idea_factory::generator::context::GeneratorContext;
use idea_factory::generator::workflow::{execute_params_for, launch, prepare_state, run_stage};
use idea_factory::i18n::TargetLanguage;
use idea_factory::types::idea::IdeaInput;
use idea_factory::types::stage::{Stage, StageStatus};
use idea_factory::types::state::FactoryState;

const RADAR: &str = r#"Sure! Here is the radar report:
```json
{
  "score": 74,
  "verdict": "go",
  "market_summary": "Pet care spending keeps growing and owners juggle several apps.",
  "target_segments": ["urban dog owners", "multi-pet households"],
  "competitors": [{"name": "11pets", "weakness": "dated UI"}],
  "risks": ["retention after the first month"],
  "opportunities": ["partnerships with vet clinics"],
  "recommendation": "Ship a reminder-only MVP to a waitlist"
}
```"#;

const RADAR_KILL: &str = r#"{"score": 12, "verdict": "kill", "market_summary": "Crowded and free alternatives everywhere.", "recommendation": "Stop here"}"#;

const PRD: &str = r#"# PawPlan 产品需求文档

## 产品概述
PawPlan帮助忙碌的狗主人按时完成疫苗、驱虫和体检。

## MVP功能列表
- P0: 护理日程与提醒
- P0: 宠物档案
"#;

const TECH: &str = r#"{
  "summary": "A single Node.js service with a PostgreSQL database.",
  "stack": [{"layer": "backend", "choice": "Node.js + Fastify", "reason": "fast to build"}],
  "components": [{"name": "reminder-service", "responsibility": "schedule and send reminders"}],
  "data_entities": [{"name": "Pet", "fields": ["id", "name", "birthday"]}],
  "api_endpoints": [{"method": "POST", "path": "/pets", "purpose": "create a pet"}],
  "mermaid_diagram": "```mermaid\nflowchart LR\n  User-->API\n  API-->DB\n```"
}"#;

const DEV: &str = r#"{
  "project_name": "pawplan",
  "language": "typescript",
  "setup_steps": ["npm install", "npm run dev"],
  "files": [
    {"path": "package.json", "language": "json", "content": "{\"name\": \"pawplan\"}"},
    {"path": "./src/index.ts", "language": "typescript", "content": "console.log('pawplan');"},
    {"path": "../../evil.sh", "language": "bash", "content": "rm -rf /"}
  ]
}"#;

const QA: &str = r#"{
  "north_star_metric": "Weekly completed care tasks per active pet",
  "kpis": [{"name": "D30 retention", "target": "30%", "rationale": "habit forming product"}],
  "experiments": ["Reminder timing A/B test"],
  "launch_decision": "launch",
  "rationale": "Risks identified by the radar are addressed by the reminder-only scope."
}"#;

fn response_for(stage: Stage) -> &'static str {
    match stage {
        Stage::Radar => RADAR,
        Stage::Product => PRD,
        Stage::Tech => TECH,
        Stage::Dev => DEV,
        Stage::Qa => QA,
    }
}

fn create_test_config(temp_dir: &TempDir, output: &str) -> Config {
    Config {
        idea: IdeaInput {
            name: "PawPlan".to_string(),
            target_user: "busy dog owners".to_string(),
            pain_point: "forgetting vet appointments".to_string(),
            description: "A planner that keeps pet care on schedule".to_string(),
        },
        output_path: temp_dir.path().join(output),
        cache: CacheConfig {
            enabled: true,
            cache_dir: temp_dir.path().join("cache"),
            expire_hours: 1,
        },
        skip_connection_check: true,
        ..Default::default()
    }
}

async fn prime(context: &GeneratorContext, stage: Stage, response: &str) {
    let params = execute_params_for(stage, context).await.unwrap();
    context
        .cache_manager
        .read()
        .await
        .set(
            &params.cache_scope,
            &params.cache_key(),
            response.to_string(),
            None,
        )
        .await
        .unwrap();
}

/// 在独立的输出目录中逐阶段预置缓存，之后的launch全部命中缓存
async fn warm_up_cache(config: &Config, stages: &[Stage]) {
    let warmup = Config {
        output_path: config.output_path.with_extension("warmup"),
        ..config.clone()
    };
    let state = prepare_state(&warmup).unwrap();
    let context = GeneratorContext::new(warmup, state).unwrap();

    for stage in stages {
        prime(&context, *stage, response_for(*stage)).await;
        run_stage(&context, *stage).await.unwrap();
    }
}

fn load_state(config: &Config) -> FactoryState {
    FactoryState::load(&config.state_path()).unwrap()
}

#[tokio::test]
async fn test_full_pipeline_from_cache() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir, "out");
    warm_up_cache(&config, &Stage::ALL).await;

    launch(&config).await.unwrap();

    let state = load_state(&config);
    for stage in Stage::ALL {
        assert_eq!(state.record(stage).status, StageStatus::Completed);
    }
    assert!(state.is_finished());

    let out = &config.output_path;
    let radar_doc = fs::read_to_string(out.join("1、创意雷达.md")).unwrap();
    assert!(radar_doc.contains("74/100"));
    assert!(radar_doc.contains("| 11pets | dated UI |"));

    let prd_doc = fs::read_to_string(out.join("2、产品需求文档.md")).unwrap();
    assert!(prd_doc.starts_with("# PawPlan 产品需求文档"));

    let tech_doc = fs::read_to_string(out.join("3、技术架构.md")).unwrap();
    assert!(tech_doc.contains("```mermaid\nflowchart LR\n  User-->API\n  API-->DB\n```"));

    let dev_doc = fs::read_to_string(out.join("4、代码脚手架.md")).unwrap();
    assert!(dev_doc.contains("1. npm install"));
    assert!(!dev_doc.contains("evil.sh"));

    let scaffold_dir = out.join("4、脚手架源码");
    assert_eq!(
        fs::read_to_string(scaffold_dir.join("src/index.ts")).unwrap(),
        "console.log('pawplan');"
    );
    assert!(scaffold_dir.join("package.json").exists());
    assert!(!temp_dir.path().join("evil.sh").exists());

    let qa_doc = fs::read_to_string(out.join("5、指标决策.md")).unwrap();
    assert!(qa_doc.contains("`launch`"));
    assert!(qa_doc.contains("| D30 retention | 30% | habit forming product |"));
}

#[tokio::test]
async fn test_radar_gate_stops_pipeline() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir, "out");

    let state = prepare_state(&config).unwrap();
    let context = GeneratorContext::new(config.clone(), state).unwrap();
    prime(&context, Stage::Radar, RADAR_KILL).await;

    launch(&config).await.unwrap();

    let state = load_state(&config);
    assert_eq!(state.radar.status, StageStatus::Completed);
    assert_eq!(state.product.status, StageStatus::Idle);
    assert!(config.output_path.join("1、创意雷达.md").exists());
    assert!(!config.output_path.join("2、产品需求文档.md").exists());
}

#[tokio::test]
async fn test_stop_after_then_resume() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir, "out");
    warm_up_cache(&config, &Stage::ALL).await;

    launch(&Config {
        stop_after: Some(Stage::Product),
        ..config.clone()
    })
    .await
    .unwrap();

    let first = load_state(&config);
    assert_eq!(first.product.status, StageStatus::Completed);
    assert_eq!(first.tech.status, StageStatus::Idle);
    assert!(!config.output_path.join("3、技术架构.md").exists());

    launch(&Config {
        resume: true,
        ..config.clone()
    })
    .await
    .unwrap();

    let resumed = load_state(&config);
    assert_eq!(resumed.session_id, first.session_id);
    assert_eq!(resumed.radar.started_at, first.radar.started_at);
    assert!(resumed.is_finished());
    assert!(config.output_path.join("5、指标决策.md").exists());
}

#[tokio::test]
async fn test_skipped_stages_and_english_output() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        target_language: TargetLanguage::English,
        skip_stages: vec![Stage::Dev, Stage::Qa],
        ..create_test_config(&temp_dir, "out")
    };
    warm_up_cache(&config, &[Stage::Radar, Stage::Product, Stage::Tech]).await;

    launch(&config).await.unwrap();

    let state = load_state(&config);
    assert_eq!(state.tech.status, StageStatus::Completed);
    assert_eq!(state.dev.status, StageStatus::Skipped);
    assert_eq!(state.qa.status, StageStatus::Skipped);

    let out = &config.output_path;
    assert!(out.join("1.Idea-Radar.md").exists());
    assert!(out.join("3.Tech-Architecture.md").exists());
    assert!(!out.join("4.Code-Scaffold.md").exists());
    assert!(!out.join("4.Scaffold").exists());
}

#[tokio::test]
async fn test_blank_idea_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        idea: IdeaInput::default(),
        ..create_test_config(&temp_dir, "out")
    };

    assert!(launch(&config).await.is_err());
    assert!(!config.state_path().exists());
}

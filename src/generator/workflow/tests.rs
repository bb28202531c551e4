use super::*;
use crate::config::CacheConfig;
use crate::types::idea::IdeaInput;
use tempfile::TempDir;

const RADAR_GO: &str = r#"```json
{
  "score": 78,
  "verdict": "go",
  "market_summary": "Dog owners juggle vet visits, meds and grooming across apps.",
  "target_segments": ["multi-pet households"],
  "competitors": [{"name": "11pets", "weakness": "dated UI"}],
  "risks": ["low retention after onboarding"],
  "opportunities": ["vet clinic partnerships"],
  "recommendation": "Launch a waitlist with reminder-only MVP"
}
```"#;

const RADAR_KILL: &str = r#"{"score": 22, "verdict": "kill", "market_summary": "Saturated market.", "recommendation": "Drop it"}"#;

const PRD: &str = "# PawPlan PRD\n\n## 产品概述\n帮助忙碌的狗主人管理宠物护理日程。\n\n## MVP功能\n- P0: 疫苗与驱虫提醒";

fn test_config(temp_dir: &TempDir) -> Config {
    Config {
        idea: IdeaInput {
            name: "PawPlan".to_string(),
            target_user: "busy dog owners".to_string(),
            pain_point: "forgetting vet appointments".to_string(),
            description: "A planner for pet care routines".to_string(),
        },
        output_path: temp_dir.path().join("out"),
        cache: CacheConfig {
            enabled: true,
            cache_dir: temp_dir.path().join("cache"),
            expire_hours: 1,
        },
        skip_connection_check: true,
        ..Default::default()
    }
}

fn create_test_context(config: Config) -> GeneratorContext {
    let state = prepare_state(&config).unwrap();
    GeneratorContext::new(config, state).unwrap()
}

/// 以当前状态下的真实prompt为键写入预置响应
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

#[test]
fn test_parse_decision() {
    assert_eq!(parse_decision("\n"), Decision::Run);
    assert_eq!(parse_decision("Y\n"), Decision::Run);
    assert_eq!(parse_decision("s"), Decision::Skip);
    assert_eq!(parse_decision("n"), Decision::Stop);
    assert_eq!(parse_decision("whatever"), Decision::Stop);
}

#[test]
fn test_radar_gate() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = test_config(&temp_dir);
    let mut report: RadarReport = serde_json::from_str(RADAR_KILL).unwrap();

    assert!(matches!(
        radar_gate(&config, &report),
        Some(Halt::RadarGate { score: 22, verdict: Verdict::Kill })
    ));

    // 评分低于阈值同样停止
    report.verdict = Verdict::Pivot;
    report.score = 39;
    assert!(radar_gate(&config, &report).is_some());

    report.score = 40;
    assert!(radar_gate(&config, &report).is_none());

    report.verdict = Verdict::Kill;
    config.force = true;
    assert!(radar_gate(&config, &report).is_none());
}

#[test]
fn test_prepare_state_rejects_blank_idea() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        idea: IdeaInput::default(),
        ..test_config(&temp_dir)
    };
    assert!(prepare_state(&config).is_err());
}

#[test]
fn test_prepare_state_resume_and_restart() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir);

    let mut saved = FactoryState::new(config.idea.clone());
    saved.begin(Stage::Radar).unwrap();
    saved
        .complete(Stage::Radar, serde_json::json!({"score": 1}))
        .unwrap();
    saved.begin(Stage::Product).unwrap();
    saved.save(&config.state_path()).unwrap();

    let resumed = prepare_state(&Config {
        resume: true,
        ..config.clone()
    })
    .unwrap();
    assert_eq!(resumed.session_id, saved.session_id);
    assert_eq!(resumed.radar.status, StageStatus::Completed);
    // 中断时的Thinking被恢复为Failed
    assert_eq!(resumed.product.status, StageStatus::Failed);

    let restarted = prepare_state(&Config {
        resume: true,
        restart_from: Some(Stage::Radar),
        ..config
    })
    .unwrap();
    assert_eq!(restarted.current_stage(), Some(Stage::Radar));
    assert!(restarted.radar.result.is_none());
}

#[tokio::test]
async fn test_run_stage_completes_from_cache() {
    let temp_dir = TempDir::new().unwrap();
    let context = create_test_context(test_config(&temp_dir));

    prime(&context, Stage::Radar, RADAR_GO).await;
    run_stage(&context, Stage::Radar).await.unwrap();

    let record = context.stage_record(Stage::Radar).await;
    assert_eq!(record.status, StageStatus::Completed);
    let report = context
        .stage_result::<RadarReport>(Stage::Radar)
        .await
        .unwrap();
    assert_eq!(report.score, 78);
    assert_eq!(report.verdict, Verdict::Go);

    // 每次迁移后都会落盘
    let persisted = FactoryState::load(&context.config.state_path()).unwrap();
    assert_eq!(persisted.radar.status, StageStatus::Completed);

    prime(&context, Stage::Product, PRD).await;
    run_stage(&context, Stage::Product).await.unwrap();
    let prd = context.stage_record(Stage::Product).await.text_result();
    assert_eq!(prd.as_deref(), Some(PRD));
}

#[tokio::test]
async fn test_rejected_response_is_not_replayed_on_retry() {
    let temp_dir = TempDir::new().unwrap();
    let context = create_test_context(test_config(&temp_dir));

    let rejected = r#"{"score": 12, "verdict": "go", "market_summary": "   ", "recommendation": "r"}"#;
    prime(&context, Stage::Radar, rejected).await;

    let err = run_stage(&context, Stage::Radar).await.unwrap_err();
    assert!(format!("{:#}", err).contains("empty market summary"));
    assert_eq!(
        context.stage_record(Stage::Radar).await.status,
        StageStatus::Failed
    );

    // 被拒绝的响应已从缓存删除
    let params = execute_params_for(Stage::Radar, &context).await.unwrap();
    let cached: Option<String> = context
        .cache_manager
        .read()
        .await
        .get(&params.cache_scope, &params.cache_key())
        .await
        .unwrap();
    assert!(cached.is_none());

    // 重试拿到新的响应后正常完成
    prime(&context, Stage::Radar, RADAR_GO).await;
    run_stage(&context, Stage::Radar).await.unwrap();
    let record = context.stage_record(Stage::Radar).await;
    assert_eq!(record.status, StageStatus::Completed);
    assert!(record.error.is_none());
}

#[tokio::test]
async fn test_run_stage_out_of_order_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let context = create_test_context(test_config(&temp_dir));

    let err = run_stage(&context, Stage::Tech).await.unwrap_err();
    assert!(err.to_string().contains("out of order"));
    assert_eq!(
        context.stage_record(Stage::Tech).await.status,
        StageStatus::Idle
    );
}

#[tokio::test]
async fn test_run_stage_missing_required_source_fails() {
    let temp_dir = TempDir::new().unwrap();
    let context = create_test_context(test_config(&temp_dir));

    for stage in [Stage::Radar, Stage::Product, Stage::Tech] {
        skip_stage(&context, stage).await.unwrap();
    }

    // Dev依赖Tech的结果，Tech被跳过后无法执行
    assert!(run_stage(&context, Stage::Dev).await.is_err());

    let record = context.stage_record(Stage::Dev).await;
    assert_eq!(record.status, StageStatus::Failed);
    assert!(record.error.unwrap().contains("stage:tech"));
}

#[tokio::test]
async fn test_drive_stops_at_radar_gate() {
    let temp_dir = TempDir::new().unwrap();
    let context = create_test_context(test_config(&temp_dir));
    let mut timing = TimingScope::new();

    prime(&context, Stage::Radar, RADAR_KILL).await;
    let halt = drive(&context, &mut timing).await.unwrap();

    assert_eq!(
        halt,
        Some(Halt::RadarGate {
            score: 22,
            verdict: Verdict::Kill
        })
    );
    assert_eq!(
        context.stage_record(Stage::Product).await.status,
        StageStatus::Idle
    );
    assert_eq!(timing.get_phase_durations().len(), 1);
}

#[tokio::test]
async fn test_drive_skips_and_stops_after() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        skip_stages: vec![Stage::Radar],
        stop_after: Some(Stage::Product),
        ..test_config(&temp_dir)
    };
    let context = create_test_context(config);

    // 先跳过雷达，使Product的prompt与drive中一致
    skip_stage(&context, Stage::Radar).await.unwrap();
    prime(&context, Stage::Product, PRD).await;

    let mut timing = TimingScope::new();
    let halt = drive(&context, &mut timing).await.unwrap();

    assert_eq!(halt, Some(Halt::StopAfter(Stage::Product)));
    let state = context.snapshot().await;
    assert_eq!(state.radar.status, StageStatus::Skipped);
    assert_eq!(state.product.status, StageStatus::Completed);
    assert_eq!(state.tech.status, StageStatus::Idle);
}

#[test]
fn test_timing_scope_records_phases_in_order() {
    let mut timing = TimingScope::new();
    timing.start_phase("radar");
    timing.start_phase("product");
    assert!(timing.end_phase("radar").is_some());
    assert!(timing.end_phase("product").is_some());
    assert!(timing.end_phase("missing").is_none());

    let phases: Vec<_> = timing
        .get_phase_durations()
        .iter()
        .map(|(name, _)| name.as_str())
        .collect();
    assert_eq!(phases, vec!["radar", "product"]);
    assert!(timing.generate_timing_report().contains("- radar:"));
}

use crate::config::Config;
use crate::generator::agent_executor::AgentExecuteParams;
use crate::generator::agents::{DevAgent, ProductAgent, QaAgent, RadarAgent, TechAgent};
use crate::generator::context::GeneratorContext;
use crate::generator::step_forward_agent::StepForwardAgent;
use crate::llm::error::LlmError;
use crate::types::reports::{RadarReport, Verdict};
use crate::types::stage::{Stage, StageStatus};
use crate::types::state::FactoryState;

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

/// 时间跟踪作用域
pub struct TimingScope {
    start_time: Option<std::time::Instant>,
    phase_start_times: HashMap<String, std::time::Instant>,
    phase_durations: Vec<(String, Duration)>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub fn new() -> Self {
        Self {
            start_time: Some(std::time::Instant::now()),
            phase_start_times: HashMap::new(),
            phase_durations: Vec::new(),
        }
    }

    /// 开始一个新的阶段计时
    pub fn start_phase(&mut self, phase_name: &str) {
        self.phase_start_times
            .insert(phase_name.to_string(), std::time::Instant::now());
    }

    /// 结束一个阶段的计时
    pub fn end_phase(&mut self, phase_name: &str) -> Option<Duration> {
        let start_time = self.phase_start_times.remove(phase_name)?;
        let duration = start_time.elapsed();
        self.phase_durations
            .push((phase_name.to_string(), duration));
        Some(duration)
    }

    /// 获取总执行时间
    pub fn get_total_duration(&self) -> Option<Duration> {
        self.start_time.map(|start| start.elapsed())
    }

    /// 获取所有阶段的执行时间（按结束顺序）
    pub fn get_phase_durations(&self) -> &[(String, Duration)] {
        &self.phase_durations
    }

    /// 获取格式化的执行时间报告
    pub fn generate_timing_report(&self) -> String {
        let mut report = String::new();

        if let Some(total_duration) = self.get_total_duration() {
            report.push_str(&format!(
                "总执行时间: {:.2}秒\n",
                total_duration.as_secs_f64()
            ));
        }

        if !self.phase_durations.is_empty() {
            report.push_str("\n各阶段执行时间:\n");
            for (phase, duration) in &self.phase_durations {
                report.push_str(&format!("- {}: {:.3}秒\n", phase, duration.as_secs_f64()));
            }
        }

        report
    }
}

/// 时间跟踪常量
pub struct TimingKeys;

impl TimingKeys {
    pub const CONNECTION_CHECK: &'static str = "connection_check";
    pub const OUTPUT: &'static str = "output";
}

/// 流水线在某个阶段之后停下的原因
#[derive(Debug, Clone, PartialEq)]
pub enum Halt {
    /// 雷达结论为kill或评分低于阈值
    RadarGate { score: u8, verdict: Verdict },
    /// 到达配置的stop_after阶段
    StopAfter(Stage),
    /// 交互模式下用户选择停止
    UserAbort(Stage),
}

impl std::fmt::Display for Halt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Halt::RadarGate { score, verdict } => write!(
                f,
                "创意雷达评分{}，结论为{}，流水线停止（使用--force可强制继续）",
                score, verdict
            ),
            Halt::StopAfter(stage) => write!(f, "已按配置在{}阶段之后停止", stage),
            Halt::UserAbort(stage) => write!(f, "用户在{}阶段前选择停止", stage),
        }
    }
}

/// 构建与阶段对应的Agent调用参数（prompt与缓存作用域）
pub async fn execute_params_for(
    stage: Stage,
    context: &GeneratorContext,
) -> Result<AgentExecuteParams> {
    match stage {
        Stage::Radar => RadarAgent.execute_params(context).await,
        Stage::Product => ProductAgent.execute_params(context).await,
        Stage::Tech => TechAgent.execute_params(context).await,
        Stage::Dev => DevAgent.execute_params(context).await,
        Stage::Qa => QaAgent.execute_params(context).await,
    }
}

async fn dispatch(stage: Stage, context: &GeneratorContext) -> Result<Value> {
    let value = match stage {
        Stage::Radar => serde_json::to_value(RadarAgent.execute(context).await?)?,
        Stage::Product => serde_json::to_value(ProductAgent.execute(context).await?)?,
        Stage::Tech => serde_json::to_value(TechAgent.execute(context).await?)?,
        Stage::Dev => serde_json::to_value(DevAgent.execute(context).await?)?,
        Stage::Qa => serde_json::to_value(QaAgent.execute(context).await?)?,
    };
    Ok(value)
}

/// 执行单个阶段：Thinking -> Completed/Failed，每次迁移后落盘
pub async fn run_stage(context: &GeneratorContext, stage: Stage) -> Result<()> {
    context.state.write().await.begin(stage)?;
    context.persist_state().await?;

    let outcome = dispatch(stage, context).await;

    match outcome {
        Ok(value) => {
            context.state.write().await.complete(stage, value)?;
            context.persist_state().await?;
            Ok(())
        }
        Err(err) => {
            context
                .state
                .write()
                .await
                .fail(stage, format!("{:#}", err))?;
            context.persist_state().await?;
            Err(err)
        }
    }
}

/// 将阶段标记为跳过
pub async fn skip_stage(context: &GeneratorContext, stage: Stage) -> Result<()> {
    context.state.write().await.skip(stage)?;
    context.persist_state().await?;
    println!("⏭️ 跳过阶段: {}", stage);
    Ok(())
}

/// 雷达闸门：kill结论或评分低于阈值时停止，除非配置了force
pub fn radar_gate(config: &Config, report: &RadarReport) -> Option<Halt> {
    if config.force {
        return None;
    }
    if report.verdict == Verdict::Kill || report.score < config.min_radar_score {
        return Some(Halt::RadarGate {
            score: report.score,
            verdict: report.verdict,
        });
    }
    None
}

/// 准备初始状态：按需从快照恢复，并应用restart_from
pub fn prepare_state(config: &Config) -> Result<FactoryState> {
    let state_path = config.state_path();
    let mut state = if config.resume && state_path.exists() {
        let state = FactoryState::load(&state_path)?;
        println!(
            "📂 从快照恢复会话 {}，已完成{}/{}个阶段",
            state.session_id,
            state.progress(),
            Stage::ALL.len()
        );
        state
    } else {
        if config.resume {
            eprintln!("⚠️ 未找到状态快照 {:?}，将开始新的会话", state_path);
        }
        config.idea.validate()?;
        FactoryState::new(config.idea.clone())
    };

    if let Some(stage) = config.restart_from {
        println!("🔁 从{}阶段重新开始", stage);
        state.reset_from(stage);
    }
    Ok(state)
}

#[derive(Debug, PartialEq)]
enum Decision {
    Run,
    Skip,
    Stop,
}

/// 交互模式下询问用户是否执行该阶段
async fn ask_user(stage: Stage, title: &str) -> Result<Decision> {
    let question = format!("❓ 即将执行阶段 [{}] {}，继续？[Y/n/s(跳过)] ", stage, title);
    let answer = tokio::task::spawn_blocking(move || -> Result<String> {
        print!("{}", question);
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok(line)
    })
    .await
    .context("Failed to read user input")??;

    Ok(parse_decision(&answer))
}

fn parse_decision(answer: &str) -> Decision {
    match answer.trim().to_lowercase().as_str() {
        "" | "y" | "yes" => Decision::Run,
        "s" | "skip" => Decision::Skip,
        _ => Decision::Stop,
    }
}

/// 按顺序驱动各阶段，返回停止原因（全部完成时为None）
pub async fn drive(context: &GeneratorContext, timing: &mut TimingScope) -> Result<Option<Halt>> {
    let config = &context.config;

    for stage in Stage::ALL {
        let status = context.stage_record(stage).await.status;

        if status.is_settled() {
            println!("✔️ 阶段 {} 状态为{}，跳过", stage, status);
        } else if config.should_skip(stage) {
            skip_stage(context, stage).await?;
        } else {
            let title = config.target_language.stage_title(stage);
            if config.interactive {
                match ask_user(stage, title).await? {
                    Decision::Run => {}
                    Decision::Skip => {
                        skip_stage(context, stage).await?;
                        continue;
                    }
                    Decision::Stop => return Ok(Some(Halt::UserAbort(stage))),
                }
            }

            println!(
                "\n🚀 [{}/{}] {} ({})",
                stage.index() + 1,
                Stage::ALL.len(),
                title,
                stage
            );
            timing.start_phase(stage.key());
            let outcome = run_stage(context, stage).await;
            if let Some(duration) = timing.end_phase(stage.key()) {
                tracing::info!(%stage, elapsed_ms = duration.as_millis() as u64, "stage finished");
            }

            if let Err(err) = outcome {
                let classified = LlmError::from_anyhow(&err);
                eprintln!("❌ 阶段 {} 执行失败: {:#}", stage, err);
                eprintln!("💡 {}", classified.kind.user_hint());
                return Err(err.context(format!("stage {} failed", stage)));
            }
        }

        if stage == Stage::Radar
            && let Some(report) = context.stage_result::<RadarReport>(Stage::Radar).await
        {
            println!(
                "📡 创意雷达评分: {}/100，结论: {}",
                report.score, report.verdict
            );
            if let Some(halt) = radar_gate(config, &report) {
                return Ok(Some(halt));
            }
        }

        if config.stop_after == Some(stage) {
            return Ok(Some(Halt::StopAfter(stage)));
        }
    }
    Ok(None)
}

/// 启动创意工厂工作流
pub async fn launch(config: &Config) -> Result<()> {
    let mut timing = TimingScope::new();

    let state = prepare_state(config)?;
    let context = GeneratorContext::new(config.clone(), state)?;
    context.persist_state().await?;

    if config.force_regenerate {
        let cache = context.cache_manager.read().await;
        for stage in Stage::ALL {
            cache.clear_category(&format!("stage/{}", stage.key())).await?;
        }
        println!("🧹 已清除阶段缓存");
    }

    // 启动时检查模型连接
    if !config.skip_connection_check {
        timing.start_phase(TimingKeys::CONNECTION_CHECK);
        context.llm_client.check_connection().await?;
        timing.end_phase(TimingKeys::CONNECTION_CHECK);
    }

    let outcome = drive(&context, &mut timing).await;

    // 失败时也保存已完成阶段的文档
    timing.start_phase(TimingKeys::OUTPUT);
    crate::generator::outlet::save(&context).await?;
    timing.end_phase(TimingKeys::OUTPUT);

    let halt = outcome?;
    match &halt {
        Some(halt) => println!("\n⏹️ {}", halt),
        None => println!("\n🎉 全部阶段执行完成"),
    }

    let state = context.snapshot().await;
    for stage in Stage::ALL {
        let record = state.record(stage);
        let marker = match record.status {
            StageStatus::Completed => "✅",
            StageStatus::Skipped => "⏭️",
            StageStatus::Failed => "❌",
            StageStatus::Thinking => "⏳",
            StageStatus::Idle => "⬜",
        };
        println!("{} {}: {}", marker, stage, record.status);
    }

    println!("\n⏱️ {}", timing.generate_timing_report());
    let cache_report = context
        .cache_manager
        .read()
        .await
        .generate_performance_report();
    println!("💰 {}", cache_report.summary());

    Ok(())
}

// Include tests
#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

use crate::types::idea::IdeaInput;
use crate::types::stage::{Stage, StageRecord, StageStatus};

/// 非法的状态迁移
#[derive(Debug, Error, PartialEq)]
pub enum StateError {
    #[error("stage {active} is still thinking, cannot start {requested}")]
    AnotherStageActive { active: Stage, requested: Stage },

    #[error("stage {requested} is out of order, current stage is {current}")]
    OutOfOrder { requested: Stage, current: Stage },

    #[error("pipeline is already finished, cannot start {0}")]
    Finished(Stage),

    #[error("stage {stage} is {status}, expected {expected}")]
    InvalidStatus {
        stage: Stage,
        status: StageStatus,
        expected: &'static str,
    },
}

/// 工厂状态：创意本身加上五个阶段各自的状态与结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactoryState {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub idea: IdeaInput,
    pub radar: StageRecord,
    pub product: StageRecord,
    pub tech: StageRecord,
    pub dev: StageRecord,
    pub qa: StageRecord,
}

impl FactoryState {
    pub fn new(idea: IdeaInput) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            created_at: Utc::now(),
            idea,
            radar: StageRecord::default(),
            product: StageRecord::default(),
            tech: StageRecord::default(),
            dev: StageRecord::default(),
            qa: StageRecord::default(),
        }
    }

    pub fn record(&self, stage: Stage) -> &StageRecord {
        match stage {
            Stage::Radar => &self.radar,
            Stage::Product => &self.product,
            Stage::Tech => &self.tech,
            Stage::Dev => &self.dev,
            Stage::Qa => &self.qa,
        }
    }

    pub fn record_mut(&mut self, stage: Stage) -> &mut StageRecord {
        match stage {
            Stage::Radar => &mut self.radar,
            Stage::Product => &mut self.product,
            Stage::Tech => &mut self.tech,
            Stage::Dev => &mut self.dev,
            Stage::Qa => &mut self.qa,
        }
    }

    /// 第一个尚未完成（且未跳过）的阶段
    pub fn current_stage(&self) -> Option<Stage> {
        Stage::ALL
            .into_iter()
            .find(|stage| !self.record(*stage).status.is_settled())
    }

    /// 正在思考中的阶段
    pub fn active_stage(&self) -> Option<Stage> {
        Stage::ALL
            .into_iter()
            .find(|stage| self.record(*stage).status == StageStatus::Thinking)
    }

    pub fn is_finished(&self) -> bool {
        self.current_stage().is_none()
    }

    /// 已完成或已跳过的阶段数量
    pub fn progress(&self) -> usize {
        Stage::ALL
            .iter()
            .filter(|stage| self.record(**stage).status.is_settled())
            .count()
    }

    /// 检查stage是否为当前可执行阶段
    fn ensure_current(&self, stage: Stage) -> Result<(), StateError> {
        if let Some(active) = self.active_stage() {
            return Err(StateError::AnotherStageActive {
                active,
                requested: stage,
            });
        }
        match self.current_stage() {
            None => Err(StateError::Finished(stage)),
            Some(current) if current != stage => Err(StateError::OutOfOrder {
                requested: stage,
                current,
            }),
            Some(_) => Ok(()),
        }
    }

    /// 开始执行阶段：Idle/Failed -> Thinking
    pub fn begin(&mut self, stage: Stage) -> Result<(), StateError> {
        self.ensure_current(stage)?;

        let record = self.record_mut(stage);
        if !matches!(record.status, StageStatus::Idle | StageStatus::Failed) {
            return Err(StateError::InvalidStatus {
                stage,
                status: record.status,
                expected: "idle or failed",
            });
        }
        record.status = StageStatus::Thinking;
        record.error = None;
        record.started_at = Some(Utc::now());
        record.finished_at = None;
        Ok(())
    }

    /// 阶段完成：Thinking -> Completed
    pub fn complete(&mut self, stage: Stage, result: Value) -> Result<(), StateError> {
        let record = self.thinking_record(stage)?;
        record.status = StageStatus::Completed;
        record.result = Some(result);
        record.finished_at = Some(Utc::now());
        Ok(())
    }

    /// 阶段失败：Thinking -> Failed
    pub fn fail(&mut self, stage: Stage, message: impl Into<String>) -> Result<(), StateError> {
        let record = self.thinking_record(stage)?;
        record.status = StageStatus::Failed;
        record.error = Some(message.into());
        record.finished_at = Some(Utc::now());
        Ok(())
    }

    /// 跳过当前阶段：Idle/Failed -> Skipped
    pub fn skip(&mut self, stage: Stage) -> Result<(), StateError> {
        self.ensure_current(stage)?;

        let record = self.record_mut(stage);
        if !matches!(record.status, StageStatus::Idle | StageStatus::Failed) {
            return Err(StateError::InvalidStatus {
                stage,
                status: record.status,
                expected: "idle or failed",
            });
        }
        record.status = StageStatus::Skipped;
        record.result = None;
        record.finished_at = Some(Utc::now());
        Ok(())
    }

    /// 将stage及其之后的所有阶段重置为Idle
    pub fn reset_from(&mut self, stage: Stage) {
        for later in Stage::ALL.into_iter().filter(|s| *s >= stage) {
            *self.record_mut(later) = StageRecord::default();
        }
    }

    fn thinking_record(&mut self, stage: Stage) -> Result<&mut StageRecord, StateError> {
        let record = self.record_mut(stage);
        if record.status != StageStatus::Thinking {
            return Err(StateError::InvalidStatus {
                stage,
                status: record.status,
                expected: "thinking",
            });
        }
        Ok(record)
    }

    /// 从JSON快照恢复
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read state snapshot: {:?}", path))?;
        let mut state: FactoryState =
            serde_json::from_str(&content).context("Failed to parse state snapshot")?;

        // 上次运行中断时残留的Thinking视为失败，允许重试
        if let Some(stage) = state.active_stage() {
            let record = state.record_mut(stage);
            record.status = StageStatus::Failed;
            record.error = Some("interrupted".to_string());
        }
        Ok(state)
    }

    /// 保存JSON快照
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .context(format!("Failed to write state snapshot: {:?}", path))?;
        Ok(())
    }
}

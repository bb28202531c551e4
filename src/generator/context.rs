use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::types::stage::{Stage, StageRecord};
use crate::types::state::FactoryState;
use crate::{cache::CacheManager, config::Config, llm::client::LLMClient};

#[derive(Clone)]
pub struct GeneratorContext {
    /// LLM调用器，用于与AI通信。
    pub llm_client: LLMClient,
    /// 配置
    pub config: Config,
    /// 缓存管理器
    pub cache_manager: Arc<RwLock<CacheManager>>,
    /// 工厂状态
    pub state: Arc<RwLock<FactoryState>>,
}

impl GeneratorContext {
    /// 创建新的生成器上下文
    pub fn new(config: Config, state: FactoryState) -> Result<Self> {
        let llm_client = LLMClient::new(config.llm.clone())?;
        let cache_manager = Arc::new(RwLock::new(CacheManager::new(config.cache.clone())));
        let state = Arc::new(RwLock::new(state));

        Ok(Self {
            llm_client,
            config,
            cache_manager,
            state,
        })
    }

    /// 获取阶段记录的拷贝
    pub async fn stage_record(&self, stage: Stage) -> StageRecord {
        let state = self.state.read().await;
        state.record(stage).clone()
    }

    /// 获取已完成阶段的结构化结果
    pub async fn stage_result<T>(&self, stage: Stage) -> Option<T>
    where
        T: for<'a> Deserialize<'a>,
    {
        let state = self.state.read().await;
        state.record(stage).typed_result()
    }

    /// 检查阶段结果是否存在
    pub async fn has_stage_result(&self, stage: Stage) -> bool {
        let state = self.state.read().await;
        state.record(stage).result.is_some()
    }

    /// 当前状态的完整拷贝
    pub async fn snapshot(&self) -> FactoryState {
        self.state.read().await.clone()
    }

    /// 将状态快照写入输出目录
    pub async fn persist_state(&self) -> Result<()> {
        let state = self.state.read().await;
        state.save(&self.config.state_path())
    }
}

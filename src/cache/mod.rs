use anyhow::Result;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;

use crate::config::CacheConfig;

pub mod performance_monitor;
pub use performance_monitor::{CachePerformanceMonitor, CachePerformanceReport};

/// 缓存管理器：以prompt的MD5为键，把模型响应落盘
pub struct CacheManager {
    config: CacheConfig,
    performance_monitor: CachePerformanceMonitor,
}

/// 缓存条目
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: u64,
    /// prompt的MD5哈希值，用于缓存键的生成和验证
    pub prompt_hash: String,
    /// 使用的模型名称（可选）
    #[serde(default)]
    pub model_name: Option<String>,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl CacheManager {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            performance_monitor: CachePerformanceMonitor::new(),
        }
    }

    /// 生成prompt的MD5哈希
    pub fn hash_prompt(&self, prompt: &str) -> String {
        let mut hasher = Md5::new();
        hasher.update(prompt.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// 获取缓存文件路径
    fn get_cache_path(&self, category: &str, hash: &str) -> PathBuf {
        self.config
            .cache_dir
            .join(category)
            .join(format!("{}.json", hash))
    }

    /// 检查缓存是否过期
    fn is_expired(&self, timestamp: u64) -> bool {
        let expire_seconds = self.config.expire_hours * 3600;
        now_secs().saturating_sub(timestamp) > expire_seconds
    }

    /// 获取缓存
    pub async fn get<T>(&self, category: &str, prompt: &str) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        if !self.config.enabled {
            return Ok(None);
        }

        let hash = self.hash_prompt(prompt);
        let cache_path = self.get_cache_path(category, &hash);

        if !cache_path.exists() {
            self.performance_monitor.record_cache_miss(category);
            return Ok(None);
        }

        match fs::read_to_string(&cache_path).await {
            Ok(content) => match serde_json::from_str::<CacheEntry<T>>(&content) {
                Ok(entry) => {
                    if self.is_expired(entry.timestamp) {
                        // 删除过期缓存
                        let _ = fs::remove_file(&cache_path).await;
                        self.performance_monitor.record_cache_miss(category);
                        return Ok(None);
                    }
                    self.performance_monitor.record_cache_hit(category);
                    Ok(Some(entry.data))
                }
                Err(e) => {
                    self.performance_monitor
                        .record_cache_error(category, &format!("反序列化失败: {}", e));
                    Ok(None)
                }
            },
            Err(e) => {
                self.performance_monitor
                    .record_cache_error(category, &format!("读取文件失败: {}", e));
                Ok(None)
            }
        }
    }

    /// 设置缓存
    pub async fn set<T>(
        &self,
        category: &str,
        prompt: &str,
        data: T,
        model_name: Option<String>,
    ) -> Result<()>
    where
        T: Serialize,
    {
        if !self.config.enabled {
            return Ok(());
        }

        let hash = self.hash_prompt(prompt);
        let cache_path = self.get_cache_path(category, &hash);

        // 确保目录存在
        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let entry = CacheEntry {
            data,
            timestamp: now_secs(),
            prompt_hash: hash,
            model_name,
        };

        match serde_json::to_string_pretty(&entry) {
            Ok(content) => match fs::write(&cache_path, content).await {
                Ok(_) => {
                    self.performance_monitor.record_cache_write(category);
                    Ok(())
                }
                Err(e) => {
                    self.performance_monitor
                        .record_cache_error(category, &format!("写入文件失败: {}", e));
                    Err(e.into())
                }
            },
            Err(e) => {
                self.performance_monitor
                    .record_cache_error(category, &format!("序列化失败: {}", e));
                Err(e.into())
            }
        }
    }

    /// 删除单条缓存，条目不存在时视为成功
    pub async fn remove(&self, category: &str, prompt: &str) -> Result<()> {
        let hash = self.hash_prompt(prompt);
        let cache_path = self.get_cache_path(category, &hash);
        if cache_path.exists() {
            fs::remove_file(&cache_path).await?;
        }
        Ok(())
    }

    /// 清空某个类别下的缓存
    pub async fn clear_category(&self, category: &str) -> Result<()> {
        let dir = self.config.cache_dir.join(category);
        if dir.exists() {
            fs::remove_dir_all(&dir).await?;
        }
        Ok(())
    }

    /// 生成性能报告
    pub fn generate_performance_report(&self) -> CachePerformanceReport {
        self.performance_monitor.generate_report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager(temp_dir: &TempDir, enabled: bool) -> CacheManager {
        CacheManager::new(CacheConfig {
            enabled,
            cache_dir: temp_dir.path().join("cache"),
            expire_hours: 1,
        })
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let temp_dir = TempDir::new().unwrap();
        let cache = manager(&temp_dir, true);

        cache
            .set("stage/radar", "prompt-a", "answer".to_string(), None)
            .await
            .unwrap();

        let hit: Option<String> = cache.get("stage/radar", "prompt-a").await.unwrap();
        assert_eq!(hit.as_deref(), Some("answer"));

        let miss: Option<String> = cache.get("stage/radar", "prompt-b").await.unwrap();
        assert!(miss.is_none());

        let report = cache.generate_performance_report();
        assert_eq!(report.cache_hits, 1);
        assert_eq!(report.cache_misses, 1);
        assert_eq!(report.cache_writes, 1);
    }

    #[tokio::test]
    async fn test_disabled_cache_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let cache = manager(&temp_dir, false);

        cache
            .set("stage/radar", "prompt", "answer".to_string(), None)
            .await
            .unwrap();
        let hit: Option<String> = cache.get("stage/radar", "prompt").await.unwrap();

        assert!(hit.is_none());
        assert!(!temp_dir.path().join("cache").exists());
    }

    #[tokio::test]
    async fn test_expired_entry_is_removed() {
        let temp_dir = TempDir::new().unwrap();
        let cache = manager(&temp_dir, true);

        let hash = cache.hash_prompt("old");
        let path = temp_dir
            .path()
            .join("cache")
            .join("stage")
            .join(format!("{}.json", hash));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let entry = CacheEntry {
            data: "stale".to_string(),
            timestamp: 0,
            prompt_hash: hash,
            model_name: None,
        };
        std::fs::write(&path, serde_json::to_string(&entry).unwrap()).unwrap();

        let hit: Option<String> = cache.get("stage", "old").await.unwrap();
        assert!(hit.is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_clear_category() {
        let temp_dir = TempDir::new().unwrap();
        let cache = manager(&temp_dir, true);

        cache
            .set("stage/tech", "p", "x".to_string(), None)
            .await
            .unwrap();
        cache.clear_category("stage/tech").await.unwrap();

        let hit: Option<String> = cache.get("stage/tech", "p").await.unwrap();
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn test_remove_single_entry() {
        let temp_dir = TempDir::new().unwrap();
        let cache = manager(&temp_dir, true);

        cache
            .set("stage/qa", "keep", "a".to_string(), None)
            .await
            .unwrap();
        cache
            .set("stage/qa", "drop", "b".to_string(), None)
            .await
            .unwrap();
        cache.remove("stage/qa", "drop").await.unwrap();
        // 重复删除不报错
        cache.remove("stage/qa", "drop").await.unwrap();

        let kept: Option<String> = cache.get("stage/qa", "keep").await.unwrap();
        let dropped: Option<String> = cache.get("stage/qa", "drop").await.unwrap();
        assert_eq!(kept.as_deref(), Some("a"));
        assert!(dropped.is_none());
    }

    #[test]
    fn test_hash_prompt_is_stable() {
        let temp_dir = TempDir::new().unwrap();
        let cache = manager(&temp_dir, true);

        assert_eq!(cache.hash_prompt("abc"), "900150983cd24fb0d6963f7d28e17f72");
    }
}

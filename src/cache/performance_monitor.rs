use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// 缓存性能监控器，按类别（即阶段作用域`stage/<key>`）累计命中情况
#[derive(Clone, Default)]
pub struct CachePerformanceMonitor {
    counters: Arc<Counters>,
}

#[derive(Default)]
struct Counters {
    errors: AtomicUsize,
    categories: Mutex<BTreeMap<String, CategoryPerformanceStats>>,
}

/// 单个类别的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CategoryPerformanceStats {
    pub hits: usize,
    pub misses: usize,
    pub writes: usize,
}

impl CategoryPerformanceStats {
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

/// 缓存性能报告
#[derive(Debug, Clone, Serialize)]
pub struct CachePerformanceReport {
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub cache_writes: usize,
    pub cache_errors: usize,
    /// 按类别名排序
    pub category_stats: BTreeMap<String, CategoryPerformanceStats>,
}

impl CachePerformanceReport {
    pub fn total_lookups(&self) -> usize {
        self.cache_hits + self.cache_misses
    }

    pub fn hit_rate(&self) -> f64 {
        if self.total_lookups() == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total_lookups() as f64
        }
    }

    /// 运行结束时打印的摘要
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "缓存命中率: {:.1}% ({}/{})，写入{}次",
            self.hit_rate() * 100.0,
            self.cache_hits,
            self.total_lookups(),
            self.cache_writes
        );
        if self.cache_errors > 0 {
            summary.push_str(&format!("，错误{}次", self.cache_errors));
        }
        for (category, stats) in &self.category_stats {
            summary.push_str(&format!(
                "\n- {}: 命中{} / 未命中{}",
                category, stats.hits, stats.misses
            ));
        }
        summary
    }
}

impl CachePerformanceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn update(&self, category: &str, apply: impl FnOnce(&mut CategoryPerformanceStats)) {
        if let Ok(mut categories) = self.counters.categories.lock() {
            apply(categories.entry(category.to_string()).or_default());
        }
    }

    /// 记录缓存命中
    pub fn record_cache_hit(&self, category: &str) {
        self.update(category, |stats| stats.hits += 1);
        println!("   💰 缓存命中 [{}] - 跳过模型调用", category);
    }

    /// 记录缓存未命中
    pub fn record_cache_miss(&self, category: &str) {
        self.update(category, |stats| stats.misses += 1);
        tracing::debug!(category, "cache miss");
    }

    /// 记录缓存写入
    pub fn record_cache_write(&self, category: &str) {
        self.update(category, |stats| stats.writes += 1);
        tracing::debug!(category, "cache write");
    }

    /// 记录缓存错误
    pub fn record_cache_error(&self, category: &str, error: &str) {
        self.counters.errors.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(category, "缓存错误: {}", error);
    }

    /// 生成性能报告
    pub fn generate_report(&self) -> CachePerformanceReport {
        let category_stats = self
            .counters
            .categories
            .lock()
            .map(|categories| categories.clone())
            .unwrap_or_default();

        let (cache_hits, cache_misses, cache_writes) = category_stats
            .values()
            .fold((0, 0, 0), |(h, m, w), stats| {
                (h + stats.hits, m + stats.misses, w + stats.writes)
            });

        CachePerformanceReport {
            cache_hits,
            cache_misses,
            cache_writes,
            cache_errors: self.counters.errors.load(Ordering::Relaxed),
            category_stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_aggregates_categories() {
        let monitor = CachePerformanceMonitor::new();
        monitor.record_cache_hit("stage/radar");
        monitor.record_cache_miss("stage/product");
        monitor.record_cache_write("stage/product");
        monitor.record_cache_hit("stage/product");
        monitor.record_cache_error("stage/tech", "broken entry");

        let report = monitor.generate_report();
        assert_eq!(report.cache_hits, 2);
        assert_eq!(report.cache_misses, 1);
        assert_eq!(report.cache_writes, 1);
        assert_eq!(report.cache_errors, 1);
        assert_eq!(report.total_lookups(), 3);
        assert_eq!(report.category_stats["stage/product"].hit_rate(), 0.5);

        let summary = report.summary();
        assert!(summary.starts_with("缓存命中率: 66.7% (2/3)，写入1次，错误1次"));
        assert!(summary.contains("- stage/radar: 命中1 / 未命中0"));
    }

    #[test]
    fn test_empty_report() {
        let report = CachePerformanceMonitor::new().generate_report();
        assert_eq!(report.hit_rate(), 0.0);
        assert!(report.category_stats.is_empty());
    }
}

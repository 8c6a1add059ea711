//! 캐시 통계.
//!
//! 프로세스 수명 동안 누적되는 카운터입니다. 동시 갱신에서 정확한 일관성은
//! 보장하지 않으며 (관측용), 명시적으로 `reset`할 때만 초기화됩니다.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cache 통계 스냅샷.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub errors: u64,
    /// hits / (hits + misses), 읽기가 없으면 0
    pub hit_rate: f64,
}

impl CacheStats {
    /// 총 읽기 횟수.
    pub fn reads(&self) -> u64 {
        self.hits + self.misses
    }
}

/// 통계 카운터.
#[derive(Debug, Default)]
pub struct StatsTracker {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    errors: AtomicU64,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_set(&self) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deletes(&self, count: u64) {
        self.deletes.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// 현재 통계를 가져옵니다.
    pub fn snapshot(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        CacheStats {
            hits,
            misses,
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            hit_rate,
        }
    }

    /// 통계를 초기화합니다.
    pub fn reset(&self) {
        for counter in [
            &self.hits,
            &self.misses,
            &self.sets,
            &self.deletes,
            &self.errors,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

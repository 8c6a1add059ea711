//! 캐시 저장소.
//!
//! 백엔드 위에 JSON 직렬화, 태그 인덱스, 통계를 얹은 TTL 키-값 레이어입니다.
//! 공개 작업은 실패하지 않습니다. 백엔드가 없거나 오류를 내면 로그와 통계에
//! 기록한 뒤 miss / `false` / 0 같은 안전한 기본값을 반환하므로, 호출자는
//! "실제 miss"와 "백엔드 장애"를 구분하지 않습니다.

use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use trader_core::CacheConfig;

use crate::backend::{CacheBackend, MemoryBackend, RedisBackend};
use crate::error::CacheError;
use crate::stats::{CacheStats, StatsTracker};
use crate::tags::TagIndex;

/// 태그 및 통계를 지원하는 캐시 저장소.
///
/// 복제 비용이 낮으며 복제본은 같은 백엔드와 통계를 공유합니다.
#[derive(Clone)]
pub struct CacheStore {
    backend: Option<Arc<dyn CacheBackend>>,
    tags: TagIndex,
    stats: Arc<StatsTracker>,
    key_prefix: Option<String>,
    default_ttl_secs: u64,
}

impl CacheStore {
    /// 설정에 따라 백엔드에 연결합니다.
    ///
    /// 연결에 실패해도 오류를 반환하지 않고, 모든 읽기가 miss인
    /// degraded 저장소를 반환합니다.
    pub async fn connect(config: &CacheConfig) -> Self {
        if !config.enabled {
            info!("Cache disabled by configuration");
            return Self::degraded(config);
        }

        if config.is_memory() {
            info!("Using in-process memory cache backend");
            return Self::with_backend(Arc::new(MemoryBackend::new()), config);
        }

        match RedisBackend::connect(
            &config.url,
            config.connect_timeout(),
            config.command_timeout(),
        )
        .await
        {
            Ok(backend) => Self::with_backend(Arc::new(backend), config),
            Err(e) => {
                warn!(error = %e, "Redis unavailable, cache running in degraded mode");
                Self::degraded(config)
            }
        }
    }

    /// 주어진 백엔드로 저장소를 생성합니다.
    pub fn with_backend(backend: Arc<dyn CacheBackend>, config: &CacheConfig) -> Self {
        Self {
            backend: Some(backend),
            ..Self::degraded(config)
        }
    }

    /// 백엔드 없는 저장소 (항상 miss).
    pub fn degraded(config: &CacheConfig) -> Self {
        let key_prefix = config.key_prefix.clone().filter(|p| !p.is_empty());
        // 접두사가 다른 배포끼리 태그 집합을 공유하지 않도록 태그 키에도 적용
        let tag_prefix = match &key_prefix {
            Some(prefix) => format!("{}:{}", prefix, config.tag_prefix),
            None => config.tag_prefix.clone(),
        };
        Self {
            backend: None,
            tags: TagIndex::new(tag_prefix),
            stats: Arc::new(StatsTracker::new()),
            key_prefix,
            default_ttl_secs: config.default_ttl_secs,
        }
    }

    /// 백엔드 없이 동작 중인지 여부.
    pub fn is_degraded(&self) -> bool {
        self.backend.is_none()
    }

    /// 백엔드 상태를 확인합니다.
    pub async fn health_check(&self) -> bool {
        match &self.backend {
            Some(backend) => match backend.ping().await {
                Ok(()) => true,
                Err(e) => {
                    warn!(backend = backend.name(), error = %e, "Cache health check failed");
                    false
                }
            },
            None => false,
        }
    }

    fn full_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }

    fn backend_error(&self, op: &str, key: &str, error: &CacheError) {
        self.stats.record_error();
        warn!(op, key, error = %error, "Cache backend error");
    }

    // =========================================================================
    // 기본 작업
    // =========================================================================

    /// cache에서 값을 가져옵니다.
    ///
    /// miss, 백엔드 오류, 디코딩 실패 모두 `None`입니다.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let Some(backend) = &self.backend else {
            self.stats.record_miss();
            return None;
        };

        let full_key = self.full_key(key);
        match backend.get(&full_key).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(value) => {
                    self.stats.record_hit();
                    debug!(key, "Cache hit");
                    Some(value)
                }
                Err(e) => {
                    self.stats.record_error();
                    self.stats.record_miss();
                    warn!(key, error = %e, "Cached value could not be decoded");
                    None
                }
            },
            Ok(None) => {
                self.stats.record_miss();
                debug!(key, "Cache miss");
                None
            }
            Err(e) => {
                self.backend_error("get", key, &e);
                self.stats.record_miss();
                None
            }
        }
    }

    /// TTL과 태그를 지정해 값을 저장합니다.
    ///
    /// `ttl_secs`가 0이면 기본 TTL을 사용합니다. 태그를 먼저 등록하고 값을
    /// 씁니다. 태그 등록이 실패하면 값을 쓰지 않으므로, 태그로 찾을 수 없는
    /// 값은 남지 않습니다. 어느 단계든 실패하면 `false`입니다.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u64,
        tags: &[&str],
    ) -> bool {
        let Some(backend) = &self.backend else {
            self.stats.record_error();
            return false;
        };

        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                self.stats.record_error();
                warn!(key, error = %e, "Value could not be serialized for cache");
                return false;
            }
        };

        let ttl_secs = if ttl_secs == 0 {
            self.default_ttl_secs
        } else {
            ttl_secs
        };
        let full_key = self.full_key(key);

        for tag in tags {
            if let Err(e) = self
                .tags
                .add(&**backend, tag, &full_key, ttl_secs)
                .await
            {
                self.backend_error("tag", key, &e);
                return false;
            }
        }

        if let Err(e) = backend.set_ex(&full_key, &json, ttl_secs).await {
            self.backend_error("set", key, &e);
            return false;
        }
        self.stats.record_set();

        debug!(key, ttl_secs, tags = ?tags, "Cache set");
        true
    }

    /// cache에서 키를 삭제합니다.
    pub async fn delete(&self, key: &str) -> bool {
        let Some(backend) = &self.backend else {
            self.stats.record_error();
            return false;
        };

        match backend.del(&[self.full_key(key)]).await {
            Ok(deleted) => {
                self.stats.record_deletes(deleted);
                deleted > 0
            }
            Err(e) => {
                self.backend_error("delete", key, &e);
                false
            }
        }
    }

    /// 태그들에 속한 모든 키와 태그 집합을 삭제합니다.
    ///
    /// 삭제된 데이터 키 수를 반환합니다. 무효화와 동시에 같은 태그로 쓰인
    /// 키는 순서에 따라 남을 수 있습니다.
    pub async fn invalidate_by_tags(&self, tags: &[&str]) -> u64 {
        let Some(backend) = &self.backend else {
            self.stats.record_error();
            return 0;
        };
        if tags.is_empty() {
            return 0;
        }

        let keys = match self.tags.members(&**backend, tags).await {
            Ok(keys) => keys,
            Err(e) => {
                self.backend_error("invalidate", &tags.join(","), &e);
                return 0;
            }
        };

        let deleted = match backend.del(&keys).await {
            Ok(deleted) => deleted,
            Err(e) => {
                self.backend_error("invalidate", &tags.join(","), &e);
                return 0;
            }
        };
        self.stats.record_deletes(deleted);

        if let Err(e) = self.tags.remove(&**backend, tags).await {
            self.backend_error("invalidate", &tags.join(","), &e);
        }

        info!(tags = ?tags, deleted, "Cache invalidated by tags");
        deleted
    }

    /// 키가 존재하는지 확인합니다.
    pub async fn exists(&self, key: &str) -> bool {
        let Some(backend) = &self.backend else {
            return false;
        };

        match backend.exists(&self.full_key(key)).await {
            Ok(exists) => exists,
            Err(e) => {
                self.backend_error("exists", key, &e);
                false
            }
        }
    }

    /// 남은 TTL. 키가 없거나, 만료가 없거나, 백엔드를 쓸 수 없으면 `None`.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let backend = self.backend.as_ref()?;

        match backend.ttl(&self.full_key(key)).await {
            Ok(secs) if secs >= 0 => Some(Duration::from_secs(secs as u64)),
            Ok(_) => None,
            Err(e) => {
                self.backend_error("ttl", key, &e);
                None
            }
        }
    }

    // =========================================================================
    // 통계
    // =========================================================================

    /// Cache 통계를 가져옵니다.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// 통계를 초기화합니다.
    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// 종료 전 최종 통계를 기록합니다.
    pub fn shutdown(self) {
        let stats = self.stats();
        info!(
            hits = stats.hits,
            misses = stats.misses,
            sets = stats.sets,
            deletes = stats.deletes,
            errors = stats.errors,
            hit_rate = format!("{:.1}%", stats.hit_rate * 100.0),
            "Cache shut down"
        );
    }
}

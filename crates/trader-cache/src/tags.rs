//! 태그 인덱스.
//!
//! 태그마다 별도 키스페이스(`{prefix}{tag}`)에 그 태그를 가진 캐시 키 집합을
//! 유지합니다. 태그 집합의 TTL은 추가된 키 중 가장 긴 TTL 이상으로 늘어나며,
//! 이미 만료된 키가 집합에 남아 있을 수 있습니다 (다음 무효화 때 정리).

use crate::backend::CacheBackend;
use crate::error::Result;

/// 태그 → 캐시 키 역인덱스.
#[derive(Debug, Clone)]
pub struct TagIndex {
    prefix: String,
}

impl Default for TagIndex {
    fn default() -> Self {
        Self::new("tag:")
    }
}

impl TagIndex {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// 태그 집합의 저장 키.
    pub fn tag_key(&self, tag: &str) -> String {
        format!("{}{}", self.prefix, tag)
    }

    fn tag_keys(&self, tags: &[&str]) -> Vec<String> {
        tags.iter().map(|tag| self.tag_key(tag)).collect()
    }

    /// 태그 집합에 키를 추가하고 집합 TTL을 최소 `ttl_secs`로 연장합니다.
    pub async fn add(
        &self,
        backend: &dyn CacheBackend,
        tag: &str,
        key: &str,
        ttl_secs: u64,
    ) -> Result<()> {
        backend.sadd_extend(&self.tag_key(tag), key, ttl_secs).await
    }

    /// 주어진 태그들에 속한 모든 키 (합집합).
    pub async fn members(&self, backend: &dyn CacheBackend, tags: &[&str]) -> Result<Vec<String>> {
        backend.sunion(&self.tag_keys(tags)).await
    }

    /// 태그 집합 자체를 삭제합니다.
    pub async fn remove(&self, backend: &dyn CacheBackend, tags: &[&str]) -> Result<u64> {
        backend.del(&self.tag_keys(tags)).await
    }
}

//! Cache-aside (get-or-compute).
//!
//! 읽어서 있으면 반환하고, 없으면 계산 후 저장합니다. 같은 키에 대한 동시
//! miss는 각자 계산하고 각자 저장합니다 (마지막 쓰기 우선).

use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use tracing::debug;

use crate::store::CacheStore;

impl CacheStore {
    /// 캐시된 값을 반환하거나, 없으면 `compute`로 계산해 저장 후 반환합니다.
    ///
    /// hit이면 `compute`를 호출하지 않습니다. 저장 실패는 무시되며
    /// 계산된 값은 그대로 반환됩니다.
    pub async fn get_or_set<T, F, Fut>(
        &self,
        key: &str,
        compute: F,
        ttl_secs: u64,
        tags: &[&str],
    ) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(cached) = self.get::<T>(key).await {
            return cached;
        }

        let value = compute().await;
        if !self.set(key, &value, ttl_secs, tags).await {
            debug!(key, "Computed value was not cached");
        }
        value
    }

    /// 실패할 수 있는 계산을 위한 `get_or_set`.
    ///
    /// 계산이 실패하면 오류를 그대로 반환하고 아무것도 저장하지 않습니다.
    pub async fn try_get_or_set<T, E, F, Fut>(
        &self,
        key: &str,
        compute: F,
        ttl_secs: u64,
        tags: &[&str],
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get::<T>(key).await {
            return Ok(cached);
        }

        let value = compute().await?;
        if !self.set(key, &value, ttl_secs, tags).await {
            debug!(key, "Computed value was not cached");
        }
        Ok(value)
    }
}

//! 캐시 백엔드.
//!
//! `CacheStore`가 사용하는 최소한의 키-값/집합 명령을 정의합니다.
//! 명령 의미는 Redis 규약을 따릅니다.

mod memory;
mod redis;

pub use self::memory::MemoryBackend;
pub use self::redis::RedisBackend;

use async_trait::async_trait;

use crate::error::Result;

/// 캐시 백엔드 trait.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// 백엔드 이름 (로그용).
    fn name(&self) -> &str;

    /// 연결 상태 확인.
    async fn ping(&self) -> Result<()>;

    /// 문자열 값 조회.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// TTL과 함께 문자열 값 저장.
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;

    /// 키 삭제. 실제로 삭제된 키 수를 반환합니다.
    async fn del(&self, keys: &[String]) -> Result<u64>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// 남은 TTL (초). 키가 없으면 -2, 만료가 없으면 -1.
    async fn ttl(&self, key: &str) -> Result<i64>;

    /// 집합에 멤버를 추가하고 집합 TTL을 최소 `ttl_secs`로 늘립니다.
    ///
    /// 추가와 연장은 원자적입니다. 동시에 호출돼도 TTL이 줄어들지 않습니다.
    async fn sadd_extend(&self, key: &str, member: &str, ttl_secs: u64) -> Result<()>;

    /// 여러 집합의 합집합.
    async fn sunion(&self, keys: &[String]) -> Result<Vec<String>>;
}

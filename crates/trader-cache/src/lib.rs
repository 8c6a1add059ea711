//! 태그 기반 무효화를 지원하는 TTL 캐시.
//!
//! 이 crate는 다음을 제공합니다:
//! - 캐시 키 생성 (스칼라 세그먼트 + 구조체 fingerprint)
//! - 태그 인덱스 (태그 → 키 집합)
//! - Redis/메모리 백엔드 위의 캐시 저장소 (백엔드 장애 시 항상 miss)
//! - 적중률 통계
//! - cache-aside (`get_or_set`)

pub mod aside;
pub mod backend;
pub mod error;
pub mod key;
pub mod stats;
pub mod store;
pub mod tags;

pub use backend::{CacheBackend, MemoryBackend, RedisBackend};
pub use error::{CacheError, Result};
pub use key::{fingerprint, generate_key, CacheKey, KeyPart};
pub use stats::{CacheStats, StatsTracker};
pub use store::CacheStore;
pub use tags::TagIndex;

//! 캐시 모듈 오류 타입.

use thiserror::Error;

/// 캐시 관련 오류.
///
/// 백엔드 호출 결과로만 쓰이며, `CacheStore`의 공개 작업은
/// 이 오류를 기록한 뒤 안전한 기본값으로 바꿔 반환합니다.
#[derive(Debug, Error)]
pub enum CacheError {
    /// 백엔드에 연결되어 있지 않음
    #[error("Cache backend unavailable")]
    BackendUnavailable,

    /// 백엔드 명령 실패
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// 직렬화/역직렬화 오류
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// 타임아웃 오류
    #[error("Cache operation timeout: {0}")]
    Timeout(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_dropped() || err.is_connection_refusal() || err.is_io_error() {
            CacheError::BackendUnavailable
        } else {
            CacheError::Backend(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;

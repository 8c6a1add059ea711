//! 데이터 소싱 오류 타입.

use thiserror::Error;

/// 외부 Provider 호출 오류.
///
/// 어떤 변형이든 fallback 체인에서는 동일하게 "다음 Provider로 진행"으로
/// 처리됩니다.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 네트워크 오류
    #[error("Network error: {0}")]
    Network(String),

    /// 호출 시간 초과
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// 2xx가 아닌 HTTP 응답
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// 필수 필드 누락 또는 예상과 다른 응답
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// 응답 파싱 오류
    #[error("Parse error: {0}")]
    Parse(String),

    /// API 키 등 설정 누락
    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(err.to_string())
        } else if err.is_decode() {
            ProviderError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            ProviderError::Http {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;

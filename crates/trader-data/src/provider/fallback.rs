//! Provider fallback 체인.
//!
//! 설정된 순서대로 Provider를 호출하고 첫 번째 성공을 반환합니다.
//! 각 호출은 개별 타임아웃을 가지며, 타임아웃을 포함한 모든 실패는 로그를
//! 남긴 뒤 다음 Provider로 넘어갑니다. 호출 간 상태(우선순위 조정, circuit
//! breaker 등)는 유지하지 않습니다.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::rate_limit::RateLimiter;
use super::NamedProvider;
use crate::error::{ProviderError, Result};

/// 체인 항목 하나.
pub struct ChainEntry<P: ?Sized> {
    pub provider: Arc<P>,
    pub limiter: Option<RateLimiter>,
    pub timeout: Duration,
}

impl<P: NamedProvider + ?Sized> ChainEntry<P> {
    pub fn new(provider: Arc<P>, timeout: Duration) -> Self {
        Self {
            provider,
            limiter: None,
            timeout,
        }
    }

    pub fn with_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn name(&self) -> &str {
        self.provider.name()
    }
}

/// 실패한 Provider 호출 기록.
#[derive(Debug)]
pub struct ProviderFailure {
    pub provider: String,
    pub error: ProviderError,
}

/// 체인 실행 결과.
#[derive(Debug)]
pub enum FallbackOutcome<T> {
    /// 한 Provider가 성공
    Resolved { provider: String, value: T },
    /// 모든 Provider 실패 (빈 체인 포함)
    Exhausted { failures: Vec<ProviderFailure> },
}

impl<T> FallbackOutcome<T> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, FallbackOutcome::Resolved { .. })
    }

    /// 성공한 Provider 이름.
    pub fn provider(&self) -> Option<&str> {
        match self {
            FallbackOutcome::Resolved { provider, .. } => Some(provider),
            FallbackOutcome::Exhausted { .. } => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            FallbackOutcome::Resolved { value, .. } => Some(value),
            FallbackOutcome::Exhausted { .. } => None,
        }
    }

    /// 성공 값을 반환하고, 모두 실패했으면 `synthetic`으로 대체합니다.
    pub fn into_value_or_else(self, synthetic: impl FnOnce() -> T) -> T {
        match self {
            FallbackOutcome::Resolved { value, .. } => value,
            FallbackOutcome::Exhausted { .. } => synthetic(),
        }
    }
}

/// 순서가 있는 Provider 목록.
pub struct FallbackChain<P: ?Sized> {
    entries: Vec<ChainEntry<P>>,
}

impl<P: ?Sized> Default for FallbackChain<P> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<P: NamedProvider + ?Sized> FallbackChain<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ChainEntry<P>) {
        self.entries.push(entry);
    }

    pub fn with_entry(mut self, entry: ChainEntry<P>) -> Self {
        self.push(entry);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Provider 이름 목록 (체인 순서).
    pub fn provider_names(&self) -> Vec<&str> {
        self.entries.iter().map(ChainEntry::name).collect()
    }

    /// 체인을 실행합니다.
    ///
    /// `call`은 Provider마다 최대 한 번 호출되며, 성공한 Provider 이후의
    /// 항목은 호출되지 않습니다.
    pub async fn execute<T, F, Fut>(&self, capability: &str, call: F) -> FallbackOutcome<T>
    where
        F: Fn(Arc<P>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut failures = Vec::new();

        for entry in &self.entries {
            let provider = entry.name().to_string();

            if let Some(limiter) = &entry.limiter {
                limiter.acquire().await;
            }

            let result = match tokio::time::timeout(entry.timeout, call(entry.provider.clone()))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(format!(
                    "{} did not respond within {:?}",
                    provider, entry.timeout
                ))),
            };

            match result {
                Ok(value) => {
                    debug!(capability, provider = %provider, "Provider succeeded");
                    return FallbackOutcome::Resolved { provider, value };
                }
                Err(error) => {
                    warn!(
                        capability,
                        provider = %provider,
                        error = %error,
                        "Provider failed, trying next"
                    );
                    failures.push(ProviderFailure { provider, error });
                }
            }
        }

        let attempted: Vec<&str> = failures.iter().map(|f| f.provider.as_str()).collect();
        warn!(capability, providers = ?attempted, "All providers failed");
        FallbackOutcome::Exhausted { failures }
    }
}

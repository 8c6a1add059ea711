//! 시장 데이터 및 에이전트 분석 소싱.
//!
//! 이 crate는 다음을 제공합니다:
//! - 시장 데이터 / AI 분석 Provider trait과 구현 (Alpha Vantage, FMP, Finnhub, OpenAI, Anthropic)
//! - 순서 기반 Provider fallback 체인과 Provider별 rate limiter
//! - 모든 Provider 실패 시 사용하는 합성 결과 생성기
//! - 캐시와 체인을 조합한 `InsightService`

pub mod error;
pub mod provider;
pub mod service;
pub mod synthetic;

pub use error::{ProviderError, Result};
pub use provider::{
    build_market_chain, build_perspective_chain, ChainEntry, FallbackChain, FallbackOutcome,
    MarketDataProvider, MarketProviderKind, NamedProvider, PerspectiveProvider,
    PerspectiveProviderKind, ProviderFailure, RateLimiter,
};
pub use service::{InsightService, InsightTtl};
pub use synthetic::SyntheticGenerator;

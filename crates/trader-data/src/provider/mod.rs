//! 외부 데이터 Provider.
//!
//! 시장 데이터와 AI 분석 두 가지 기능에 대해 같은 형태의 fallback 체인을
//! 구성합니다. 체인 순서는 설정의 목록 순서를 그대로 따릅니다.

pub mod fallback;
pub mod market;
pub mod perspective;
pub mod rate_limit;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use trader_core::{AgentKind, FundamentalMetrics, Perspective};

use crate::error::{ProviderError, Result};

pub use fallback::{ChainEntry, FallbackChain, FallbackOutcome, ProviderFailure};
pub use market::{build_market_chain, MarketProviderKind};
pub use perspective::{build_perspective_chain, PerspectiveProviderKind};
pub use rate_limit::RateLimiter;

/// 이름이 있는 Provider (로그와 체인 결과에 사용).
pub trait NamedProvider: Send + Sync {
    fn name(&self) -> &str;
}

/// 펀더멘털 지표 Provider trait.
#[async_trait]
pub trait MarketDataProvider: NamedProvider {
    /// 심볼의 펀더멘털 지표 조회.
    ///
    /// 가격이 없거나 비율 지표가 하나도 없으면 `MalformedResponse`입니다.
    async fn fetch_fundamentals(&self, symbol: &str) -> Result<FundamentalMetrics>;
}

/// 에이전트 분석 Provider trait.
#[async_trait]
pub trait PerspectiveProvider: NamedProvider {
    /// 에이전트 관점의 분석 생성.
    async fn generate(
        &self,
        agent: AgentKind,
        metrics: &FundamentalMetrics,
    ) -> Result<Perspective>;
}

/// Provider 공용 HTTP 클라이언트 생성.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("trader-insight/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ProviderError::from)
}

/// 요청을 보내고 2xx 응답 본문을 JSON으로 파싱합니다.
pub(crate) async fn send_json<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T> {
    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Http { status, body });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(ProviderError::from)
}

/// JSON 숫자 또는 숫자 문자열을 Decimal로 변환합니다.
///
/// "None", "-", 빈 문자열 등은 `None`입니다.
pub(crate) fn json_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    s.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

/// 객체 필드를 Decimal로 읽습니다.
pub(crate) fn decimal_field(object: &Value, field: &str) -> Option<Decimal> {
    object.get(field).and_then(json_decimal)
}

/// 가격과 비율 지표가 모두 갖춰졌는지 검증합니다.
pub(crate) fn ensure_usable(metrics: FundamentalMetrics, provider: &str) -> Result<FundamentalMetrics> {
    if !metrics.price.is_some_and(|p| p > Decimal::ZERO) {
        return Err(ProviderError::MalformedResponse(format!(
            "{} returned no usable price for {}",
            provider, metrics.symbol
        )));
    }
    if !metrics.has_any_ratio() {
        return Err(ProviderError::MalformedResponse(format!(
            "{} returned no ratios for {}",
            provider, metrics.symbol
        )));
    }
    Ok(metrics)
}

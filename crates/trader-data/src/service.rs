//! 인사이트 서비스.
//!
//! 캐시 저장소와 두 fallback 체인을 조합한 cache-aside 진입점입니다.
//! 요청 처리 계층은 이 서비스만 호출하며, 결과에는 캐시 적중 여부나
//! 합성 여부가 드러나지 않습니다.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};
use trader_cache::{cache_key, CacheStats, CacheStore};
use trader_core::{normalize_symbol, AgentKind, CacheConfig, FundamentalMetrics, Perspective};

use crate::provider::{FallbackChain, FallbackOutcome, MarketDataProvider, PerspectiveProvider};
use crate::synthetic::SyntheticGenerator;

/// 태그 이름.
pub mod tags {
    pub const FUNDAMENTALS: &str = "fundamentals";
    pub const PERSPECTIVES: &str = "perspectives";

    pub fn symbol(symbol: &str) -> String {
        format!("symbol:{}", symbol)
    }

    pub fn agent(agent: &str) -> String {
        format!("agent:{}", agent)
    }
}

/// 기능별 캐시 TTL (초).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsightTtl {
    pub fundamentals_secs: u64,
    pub perspective_secs: u64,
}

impl From<&CacheConfig> for InsightTtl {
    fn from(config: &CacheConfig) -> Self {
        Self {
            fundamentals_secs: config.fundamentals_ttl_secs,
            perspective_secs: config.perspective_ttl_secs,
        }
    }
}

/// 펀더멘털 / 에이전트 분석 서비스.
///
/// 프로세스 진입점에서 생성해 참조로 전달합니다.
#[derive(Clone)]
pub struct InsightService {
    cache: CacheStore,
    market: Arc<FallbackChain<dyn MarketDataProvider>>,
    perspectives: Arc<FallbackChain<dyn PerspectiveProvider>>,
    synthetic: SyntheticGenerator,
    ttl: InsightTtl,
}

impl InsightService {
    pub fn new(
        cache: CacheStore,
        market: FallbackChain<dyn MarketDataProvider>,
        perspectives: FallbackChain<dyn PerspectiveProvider>,
        ttl: InsightTtl,
    ) -> Self {
        Self {
            cache,
            market: Arc::new(market),
            perspectives: Arc::new(perspectives),
            synthetic: SyntheticGenerator::new(),
            ttl,
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// 심볼의 펀더멘털 지표.
    ///
    /// miss면 시장 데이터 체인을 실행하고, 모두 실패하면 합성 지표를 반환합니다.
    pub async fn get_fundamentals(&self, symbol: &str) -> FundamentalMetrics {
        let symbol = normalize_symbol(symbol);
        let key = cache_key!("fundamentals", symbol.as_str());
        let symbol_tag = tags::symbol(&symbol);

        self.cache
            .get_or_set(
                &key,
                || self.fetch_fundamentals(&symbol),
                self.ttl.fundamentals_secs,
                &[tags::FUNDAMENTALS, symbol_tag.as_str()],
            )
            .await
    }

    async fn fetch_fundamentals(&self, symbol: &str) -> FundamentalMetrics {
        let outcome = self
            .market
            .execute("fundamentals", |provider| {
                let symbol = symbol.to_string();
                async move { provider.fetch_fundamentals(&symbol).await }
            })
            .await;

        if let FallbackOutcome::Resolved { provider, .. } = &outcome {
            info!(symbol, provider = %provider, "Fundamentals fetched");
        }
        outcome.into_value_or_else(|| {
            warn!(symbol, "Serving synthetic fundamentals");
            self.synthetic.fundamentals(symbol)
        })
    }

    /// 에이전트 한 명의 분석.
    ///
    /// miss면 펀더멘털(캐시 경유)을 먼저 구한 뒤 AI 체인을 실행하고,
    /// 모두 실패하면 합성 분석을 반환합니다.
    pub async fn get_perspective(&self, agent: AgentKind, symbol: &str) -> Perspective {
        let symbol = normalize_symbol(symbol);
        let key = cache_key!("perspective", agent.as_str(), symbol.as_str());
        let symbol_tag = tags::symbol(&symbol);
        let agent_tag = tags::agent(agent.as_str());

        self.cache
            .get_or_set(
                &key,
                || self.generate_perspective(agent, &symbol),
                self.ttl.perspective_secs,
                &[tags::PERSPECTIVES, symbol_tag.as_str(), agent_tag.as_str()],
            )
            .await
    }

    async fn generate_perspective(&self, agent: AgentKind, symbol: &str) -> Perspective {
        let metrics = Arc::new(self.get_fundamentals(symbol).await);

        let outcome = self
            .perspectives
            .execute("perspective", |provider| {
                let metrics = metrics.clone();
                async move { provider.generate(agent, &metrics).await }
            })
            .await;

        if let FallbackOutcome::Resolved { provider, .. } = &outcome {
            info!(symbol, agent = %agent, provider = %provider, "Perspective generated");
        }
        outcome.into_value_or_else(|| {
            warn!(symbol, agent = %agent, "Serving synthetic perspective");
            self.synthetic.perspective(agent, &metrics)
        })
    }

    /// 모든 에이전트의 분석 (에이전트 순서 유지).
    pub async fn get_panel(&self, symbol: &str) -> Vec<Perspective> {
        // 에이전트별 계산이 같은 펀더멘털을 동시에 조회하지 않도록 먼저 채움
        self.get_fundamentals(symbol).await;

        join_all(
            AgentKind::all()
                .into_iter()
                .map(|agent| self.get_perspective(agent, symbol)),
        )
        .await
    }

    /// 심볼에 대한 모든 캐시 항목을 무효화합니다.
    pub async fn invalidate_symbol(&self, symbol: &str) -> u64 {
        let tag = tags::symbol(&normalize_symbol(symbol));
        self.cache.invalidate_by_tags(&[tag.as_str()]).await
    }

    /// 에이전트 한 명의 모든 분석을 무효화합니다.
    pub async fn invalidate_agent(&self, agent: AgentKind) -> u64 {
        let tag = tags::agent(agent.as_str());
        self.cache.invalidate_by_tags(&[tag.as_str()]).await
    }

    pub async fn invalidate_by_tags(&self, tags: &[&str]) -> u64 {
        self.cache.invalidate_by_tags(tags).await
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn reset_stats(&self) {
        self.cache.reset_stats();
    }

    /// 최종 통계를 기록하고 종료합니다.
    pub fn shutdown(self) {
        self.cache.shutdown();
    }
}

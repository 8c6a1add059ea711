//! InsightService 통합 테스트
//!
//! 가짜 Provider와 메모리 캐시로 cache-aside, fallback 순서, 합성 fallback,
//! 태그 무효화를 검증합니다.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use trader_cache::{CacheStore, MemoryBackend};
use trader_core::{AgentKind, CacheConfig, FundamentalMetrics, Perspective, Recommendation};
use trader_data::{
    ChainEntry, FallbackChain, InsightService, InsightTtl, MarketDataProvider, NamedProvider,
    PerspectiveProvider, ProviderError, SyntheticGenerator,
};

struct FakeMarket {
    name: &'static str,
    healthy: bool,
    calls: AtomicUsize,
}

impl FakeMarket {
    fn new(name: &'static str, healthy: bool) -> Arc<Self> {
        Arc::new(Self {
            name,
            healthy,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl NamedProvider for FakeMarket {
    fn name(&self) -> &str {
        self.name
    }
}

#[async_trait]
impl MarketDataProvider for FakeMarket {
    async fn fetch_fundamentals(&self, symbol: &str) -> trader_data::Result<FundamentalMetrics> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.healthy {
            return Err(ProviderError::Network(format!("{} unreachable", self.name)));
        }
        let mut metrics = FundamentalMetrics::empty(symbol);
        metrics.price = Some(dec!(100));
        metrics.pe_ratio = Some(dec!(12));
        metrics.revenue_growth = Some(dec!(0.2));
        metrics.market_cap = Some(dec!(1000000000));
        Ok(metrics)
    }
}

struct FakeAnalyst {
    healthy: bool,
    calls: AtomicUsize,
}

impl FakeAnalyst {
    fn new(healthy: bool) -> Arc<Self> {
        Arc::new(Self {
            healthy,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl NamedProvider for FakeAnalyst {
    fn name(&self) -> &str {
        "fake_analyst"
    }
}

#[async_trait]
impl PerspectiveProvider for FakeAnalyst {
    async fn generate(
        &self,
        agent: AgentKind,
        metrics: &FundamentalMetrics,
    ) -> trader_data::Result<Perspective> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.healthy {
            return Err(ProviderError::MalformedResponse("not JSON".to_string()));
        }
        Ok(Perspective {
            agent,
            symbol: metrics.symbol.clone(),
            recommendation: Recommendation::Hold,
            confidence: 0.42,
            target_price: metrics.price,
            summary: format!("AI view of {}", metrics.symbol),
            key_points: vec!["from the model".to_string()],
            generated_at: Utc::now(),
        })
    }
}

fn market_chain(providers: &[Arc<FakeMarket>]) -> FallbackChain<dyn MarketDataProvider> {
    let mut chain: FallbackChain<dyn MarketDataProvider> = FallbackChain::new();
    for provider in providers {
        let provider: Arc<dyn MarketDataProvider> = provider.clone();
        chain.push(ChainEntry::new(provider, Duration::from_secs(1)));
    }
    chain
}

fn perspective_chain(analysts: &[Arc<FakeAnalyst>]) -> FallbackChain<dyn PerspectiveProvider> {
    let mut chain: FallbackChain<dyn PerspectiveProvider> = FallbackChain::new();
    for analyst in analysts {
        let analyst: Arc<dyn PerspectiveProvider> = analyst.clone();
        chain.push(ChainEntry::new(analyst, Duration::from_secs(1)));
    }
    chain
}

fn memory_cache() -> CacheStore {
    CacheStore::with_backend(Arc::new(MemoryBackend::new()), &CacheConfig::default())
}

fn service(
    cache: CacheStore,
    market: &[Arc<FakeMarket>],
    analysts: &[Arc<FakeAnalyst>],
) -> InsightService {
    InsightService::new(
        cache,
        market_chain(market),
        perspective_chain(analysts),
        InsightTtl::from(&CacheConfig::default()),
    )
}

#[tokio::test]
async fn test_second_provider_wins_and_third_is_never_called() {
    let p1 = FakeMarket::new("p1", false);
    let p2 = FakeMarket::new("p2", true);
    let p3 = FakeMarket::new("p3", true);
    let service = service(memory_cache(), &[p1.clone(), p2.clone(), p3.clone()], &[]);

    let metrics = service.get_fundamentals("AAPL").await;
    assert_eq!(metrics.price, Some(dec!(100)));
    assert_eq!((p1.calls(), p2.calls(), p3.calls()), (1, 1, 0));
}

#[tokio::test]
async fn test_all_market_providers_failing_serves_synthetic() {
    let p1 = FakeMarket::new("p1", false);
    let p2 = FakeMarket::new("p2", false);
    let service = service(memory_cache(), &[p1.clone(), p2.clone()], &[]);

    let metrics = service.get_fundamentals("msft").await;
    let expected = SyntheticGenerator::new().fundamentals("MSFT");
    assert_eq!(metrics.symbol, "MSFT");
    assert_eq!(metrics.price, expected.price);
    assert_eq!(metrics.pe_ratio, expected.pe_ratio);
    assert_eq!((p1.calls(), p2.calls()), (1, 1));
}

#[tokio::test]
async fn test_fundamentals_are_cached_per_normalized_symbol() {
    let market = FakeMarket::new("market", true);
    let service = service(memory_cache(), &[market.clone()], &[]);

    let first = service.get_fundamentals("aapl").await;
    let second = service.get_fundamentals(" AAPL ").await;
    assert_eq!(first, second);
    assert_eq!(market.calls(), 1);

    let stats = service.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.sets, 1);
}

#[tokio::test]
async fn test_perspective_reuses_cached_fundamentals() {
    let market = FakeMarket::new("market", true);
    let analyst = FakeAnalyst::new(true);
    let service = service(memory_cache(), &[market.clone()], &[analyst.clone()]);

    service.get_fundamentals("NVDA").await;
    let perspective = service.get_perspective(AgentKind::Contrarian, "nvda").await;
    assert_eq!(perspective.summary, "AI view of NVDA");
    assert_eq!(perspective.agent, AgentKind::Contrarian);
    assert_eq!(market.calls(), 1);

    let again = service.get_perspective(AgentKind::Contrarian, "NVDA").await;
    assert_eq!(again, perspective);
    assert_eq!(analyst.calls(), 1);
}

#[tokio::test]
async fn test_all_analysts_failing_serves_synthetic_perspective() {
    let market = FakeMarket::new("market", true);
    let a1 = FakeAnalyst::new(false);
    let a2 = FakeAnalyst::new(false);
    let service = service(memory_cache(), &[market], &[a1.clone(), a2.clone()]);

    // 가격 100, P/E 12 (+2), 성장 20% (+2), 나머지 기본값 (+1 × 3) = 7, 성장 투자자 +2 = 9
    let perspective = service.get_perspective(AgentKind::GrowthInvestor, "AMD").await;
    assert_eq!(perspective.recommendation, Recommendation::Buy);
    assert!(perspective.key_points.len() >= 4);
    assert!(perspective.summary.starts_with("Growth investor view on AMD"));
    let target = perspective.target_price.unwrap();
    assert!(target >= dec!(110) && target <= dec!(130));
    assert_eq!((a1.calls(), a2.calls()), (1, 1));

    // 합성 결과도 캐시됨
    let cached = service.get_perspective(AgentKind::GrowthInvestor, "AMD").await;
    assert_eq!(cached, perspective);
    assert_eq!(a1.calls(), 1);
}

#[tokio::test]
async fn test_empty_chains_never_fail() {
    let service = service(memory_cache(), &[], &[]);
    let perspective = service.get_perspective(AgentKind::RiskManager, "ZZZZ").await;
    assert_eq!(perspective.symbol, "ZZZZ");
    assert!((0.0..=1.0).contains(&perspective.confidence));
    assert!(perspective.key_points.len() >= 4);
}

#[tokio::test]
async fn test_invalidate_symbol_forces_refetch() {
    let market = FakeMarket::new("market", true);
    let analyst = FakeAnalyst::new(true);
    let service = service(memory_cache(), &[market.clone()], &[analyst.clone()]);

    service.get_perspective(AgentKind::ValueInvestor, "IBM").await;
    service.get_fundamentals("ORCL").await;
    assert_eq!(market.calls(), 2);

    // fundamentals:IBM + perspective:value_investor:IBM
    assert_eq!(service.invalidate_symbol("ibm").await, 2);

    service.get_perspective(AgentKind::ValueInvestor, "IBM").await;
    service.get_fundamentals("ORCL").await;
    assert_eq!(market.calls(), 3);
    assert_eq!(analyst.calls(), 2);
}

#[tokio::test]
async fn test_invalidate_agent_keeps_fundamentals() {
    let market = FakeMarket::new("market", true);
    let analyst = FakeAnalyst::new(true);
    let service = service(memory_cache(), &[market.clone()], &[analyst.clone()]);

    service.get_perspective(AgentKind::MacroStrategist, "SPY").await;
    service.get_perspective(AgentKind::MacroStrategist, "QQQ").await;
    service.get_perspective(AgentKind::RiskManager, "SPY").await;

    assert_eq!(service.invalidate_agent(AgentKind::MacroStrategist).await, 2);
    service.get_perspective(AgentKind::MacroStrategist, "SPY").await;
    assert_eq!(market.calls(), 2);
    assert_eq!(analyst.calls(), 4);
}

#[tokio::test]
async fn test_panel_covers_all_agents_in_order() {
    let market = FakeMarket::new("market", true);
    let analyst = FakeAnalyst::new(true);
    let service = service(memory_cache(), &[market.clone()], &[analyst.clone()]);

    let panel = service.get_panel("AAPL").await;
    let agents: Vec<AgentKind> = panel.iter().map(|p| p.agent).collect();
    assert_eq!(agents, AgentKind::all().to_vec());
    assert_eq!(market.calls(), 1);
    assert_eq!(analyst.calls(), 5);
}

#[tokio::test]
async fn test_degraded_cache_recomputes_every_time() {
    let market = FakeMarket::new("market", true);
    let service = service(
        CacheStore::degraded(&CacheConfig::default()),
        &[market.clone()],
        &[],
    );

    service.get_fundamentals("AAPL").await;
    service.get_fundamentals("AAPL").await;
    assert_eq!(market.calls(), 2);
    assert_eq!(service.stats().hits, 0);
}

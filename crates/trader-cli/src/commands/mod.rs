//! CLI 명령 구현.

pub mod cache;
pub mod insight;

use serde::Serialize;
use trader_cache::CacheStore;
use trader_core::AppConfig;
use trader_data::{build_market_chain, build_perspective_chain, InsightService, InsightTtl};

/// 설정으로 캐시 저장소와 Provider 체인을 구성합니다.
///
/// Redis에 연결할 수 없어도 실패하지 않습니다 (캐시 없이 동작).
pub async fn build_service(config: &AppConfig) -> InsightService {
    let cache = CacheStore::connect(&config.cache).await;
    InsightService::new(
        cache,
        build_market_chain(&config.providers),
        build_perspective_chain(&config.providers),
        InsightTtl::from(&config.cache),
    )
}

/// 값을 JSON으로 stdout에 출력합니다.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

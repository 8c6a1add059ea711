//! 캐시 관리 명령.

use serde_json::json;
use tracing::info;
use trader_data::InsightService;

use super::print_json;

/// 태그 또는 심볼 단위로 캐시를 무효화합니다.
pub async fn invalidate(
    service: &InsightService,
    tags: &[String],
    symbol: Option<&str>,
) -> anyhow::Result<()> {
    if tags.is_empty() && symbol.is_none() {
        anyhow::bail!("무효화할 태그 또는 --symbol을 지정하세요");
    }

    let mut deleted = 0;
    if !tags.is_empty() {
        let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
        deleted += service.invalidate_by_tags(&tags).await;
    }
    if let Some(symbol) = symbol {
        deleted += service.invalidate_symbol(symbol).await;
    }

    info!(deleted, "Cache invalidation finished");
    print_json(&json!({ "deleted": deleted, "degraded": service.cache().is_degraded() }))
}

pub async fn stats(service: &InsightService, reset: bool) -> anyhow::Result<()> {
    let stats = service.stats();
    if reset {
        service.reset_stats();
    }
    print_json(&stats)
}

/// 캐시 백엔드 상태 점검.
pub async fn health(service: &InsightService) -> anyhow::Result<()> {
    let healthy = service.cache().health_check().await;
    print_json(&json!({
        "cache": if healthy { "ok" } else { "unavailable" },
        "degraded": service.cache().is_degraded(),
    }))?;

    if !healthy {
        anyhow::bail!("캐시 백엔드에 연결할 수 없습니다");
    }
    Ok(())
}

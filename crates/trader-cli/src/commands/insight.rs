//! 펀더멘털 / 에이전트 분석 조회 명령.

use tracing::Instrument;
use trader_core::{insight_span, AgentKind};
use trader_data::InsightService;

use super::print_json;

pub async fn fundamentals(service: &InsightService, symbol: &str) -> anyhow::Result<()> {
    let metrics = service
        .get_fundamentals(symbol)
        .instrument(insight_span!("fundamentals", symbol))
        .await;
    print_json(&metrics)
}

pub async fn perspective(service: &InsightService, agent: &str, symbol: &str) -> anyhow::Result<()> {
    let agent: AgentKind = agent.parse()?;
    let perspective = service
        .get_perspective(agent, symbol)
        .instrument(insight_span!("perspective", symbol, agent))
        .await;
    print_json(&perspective)
}

/// 모든 에이전트의 분석을 한 번에 조회합니다.
pub async fn panel(service: &InsightService, symbol: &str) -> anyhow::Result<()> {
    let panel = service
        .get_panel(symbol)
        .instrument(insight_span!("panel", symbol))
        .await;
    print_json(&panel)
}

//! Finnhub 펀더멘털 Provider.
//!
//! `stock/metric`은 비율을 퍼센트 단위로, 시가총액을 백만 단위로 반환하므로
//! 소수 비율과 통화 단위 금액으로 변환합니다.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;
use trader_core::{normalize_symbol, FundamentalMetrics};

use crate::error::Result;
use crate::provider::{decimal_field, ensure_usable, send_json, MarketDataProvider, NamedProvider};

const NAME: &str = "finnhub";

pub struct FinnhubProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl FinnhubProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        debug!(provider = NAME, path, "Finnhub request");
        let request = self
            .client
            .get(format!("{}/api/v1/{}", self.base_url, path))
            .query(params)
            .header("X-Finnhub-Token", self.api_key.expose_secret());
        send_json(request).await
    }
}

fn percent(value: Option<Decimal>) -> Option<Decimal> {
    value.map(|v| v / dec!(100))
}

impl NamedProvider for FinnhubProvider {
    fn name(&self) -> &str {
        NAME
    }
}

#[async_trait]
impl MarketDataProvider for FinnhubProvider {
    async fn fetch_fundamentals(&self, symbol: &str) -> Result<FundamentalMetrics> {
        let symbol = normalize_symbol(symbol);
        let quote = self.get("quote", &[("symbol", symbol.as_str())]).await?;
        let metric = self
            .get("stock/metric", &[("symbol", symbol.as_str()), ("metric", "all")])
            .await?;
        let metric = metric.get("metric").unwrap_or(&Value::Null);

        let metrics = FundamentalMetrics {
            // 알 수 없는 심볼은 c = 0으로 응답
            price: decimal_field(&quote, "c"),
            // 백만 달러 단위
            market_cap: decimal_field(metric, "marketCapitalization")
                .and_then(|m| m.checked_mul(dec!(1000000))),
            pe_ratio: decimal_field(metric, "peTTM"),
            revenue_growth: percent(decimal_field(metric, "revenueGrowthTTMYoy")),
            profit_margin: percent(decimal_field(metric, "netProfitMarginTTM")),
            roe: percent(decimal_field(metric, "roeTTM")),
            debt_to_equity: decimal_field(metric, "totalDebt/totalEquityQuarterly"),
            fetched_at: Utc::now(),
            symbol,
        };

        ensure_usable(metrics, NAME)
    }
}

//! Alpha Vantage 펀더멘털 Provider.
//!
//! `OVERVIEW`(비율 지표)와 `GLOBAL_QUOTE`(현재가) 두 번 호출합니다.
//! 한도 초과 시에도 HTTP 200과 `Note`/`Information` 필드로 응답하므로
//! 이를 별도로 검사합니다.

use async_trait::async_trait;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;
use trader_core::{normalize_symbol, FundamentalMetrics};

use crate::error::{ProviderError, Result};
use crate::provider::{decimal_field, ensure_usable, send_json, MarketDataProvider, NamedProvider};

const NAME: &str = "alpha_vantage";

pub struct AlphaVantageProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl AlphaVantageProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn query(&self, function: &str, symbol: &str) -> Result<Value> {
        let request = self.client.get(format!("{}/query", self.base_url)).query(&[
            ("function", function),
            ("symbol", symbol),
            ("apikey", self.api_key.expose_secret()),
        ]);

        debug!(provider = NAME, function, symbol, "Alpha Vantage request");
        let body: Value = send_json(request).await?;

        for field in ["Note", "Information", "Error Message"] {
            if let Some(message) = body.get(field).and_then(Value::as_str) {
                return Err(ProviderError::MalformedResponse(format!(
                    "{} {}: {}",
                    NAME, function, message
                )));
            }
        }
        Ok(body)
    }
}

impl NamedProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        NAME
    }
}

#[async_trait]
impl MarketDataProvider for AlphaVantageProvider {
    async fn fetch_fundamentals(&self, symbol: &str) -> Result<FundamentalMetrics> {
        let symbol = normalize_symbol(symbol);
        let overview = self.query("OVERVIEW", &symbol).await?;
        let quote = self.query("GLOBAL_QUOTE", &symbol).await?;
        let quote = quote.get("Global Quote").unwrap_or(&Value::Null);

        let metrics = FundamentalMetrics {
            price: decimal_field(quote, "05. price"),
            market_cap: decimal_field(&overview, "MarketCapitalization"),
            pe_ratio: decimal_field(&overview, "PERatio"),
            revenue_growth: decimal_field(&overview, "QuarterlyRevenueGrowthYOY"),
            profit_margin: decimal_field(&overview, "ProfitMargin"),
            roe: decimal_field(&overview, "ReturnOnEquityTTM"),
            // OVERVIEW에는 부채비율이 없음
            debt_to_equity: None,
            fetched_at: Utc::now(),
            symbol,
        };

        ensure_usable(metrics, NAME)
    }
}

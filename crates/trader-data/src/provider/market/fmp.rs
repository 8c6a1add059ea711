//! Financial Modeling Prep 펀더멘털 Provider.

use async_trait::async_trait;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;
use trader_core::{normalize_symbol, FundamentalMetrics};

use crate::error::{ProviderError, Result};
use crate::provider::{decimal_field, ensure_usable, send_json, MarketDataProvider, NamedProvider};

const NAME: &str = "financial_modeling_prep";

pub struct FmpProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl FmpProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// `/api/v3/{endpoint}/{symbol}` 응답 배열의 첫 항목.
    async fn first_row(&self, endpoint: &str, symbol: &str) -> Result<Value> {
        let url = format!("{}/api/v3/{}/{}", self.base_url, endpoint, symbol);
        debug!(provider = NAME, endpoint, symbol, "FMP request");

        let request = self
            .client
            .get(url)
            .query(&[("apikey", self.api_key.expose_secret())]);
        let body: Value = send_json(request).await?;

        match body {
            Value::Array(rows) => rows.into_iter().next().ok_or_else(|| {
                ProviderError::MalformedResponse(format!("{} {}: empty result", NAME, endpoint))
            }),
            Value::Object(ref map) if map.contains_key("Error Message") => {
                Err(ProviderError::MalformedResponse(format!(
                    "{} {}: {}",
                    NAME, endpoint, map["Error Message"]
                )))
            }
            other => Err(ProviderError::MalformedResponse(format!(
                "{} {}: expected array, got {}",
                NAME, endpoint, other
            ))),
        }
    }
}

impl NamedProvider for FmpProvider {
    fn name(&self) -> &str {
        NAME
    }
}

#[async_trait]
impl MarketDataProvider for FmpProvider {
    async fn fetch_fundamentals(&self, symbol: &str) -> Result<FundamentalMetrics> {
        let symbol = normalize_symbol(symbol);
        let quote = self.first_row("quote", &symbol).await?;
        let ratios = self.first_row("ratios-ttm", &symbol).await?;

        let metrics = FundamentalMetrics {
            price: decimal_field(&quote, "price"),
            market_cap: decimal_field(&quote, "marketCap"),
            pe_ratio: decimal_field(&ratios, "peRatioTTM").or_else(|| decimal_field(&quote, "pe")),
            // ratios-ttm에는 매출 성장률이 없음
            revenue_growth: None,
            profit_margin: decimal_field(&ratios, "netProfitMarginTTM"),
            roe: decimal_field(&ratios, "returnOnEquityTTM"),
            debt_to_equity: decimal_field(&ratios, "debtEquityRatioTTM"),
            fetched_at: Utc::now(),
            symbol,
        };

        ensure_usable(metrics, NAME)
    }
}

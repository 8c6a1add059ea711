//! 시장 데이터(펀더멘털) Provider.

mod alpha_vantage;
mod finnhub;
mod fmp;

pub use alpha_vantage::AlphaVantageProvider;
pub use finnhub::FinnhubProvider;
pub use fmp::FmpProvider;

use secrecy::SecretString;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};
use trader_core::{ProviderConfig, ProvidersConfig};

use super::fallback::{ChainEntry, FallbackChain};
use super::rate_limit::RateLimiter;
use super::{http_client, MarketDataProvider};
use crate::error::{ProviderError, Result};

/// 시장 데이터 Provider 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketProviderKind {
    AlphaVantage,
    FinancialModelingPrep,
    Finnhub,
}

impl MarketProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketProviderKind::AlphaVantage => "alpha_vantage",
            MarketProviderKind::FinancialModelingPrep => "financial_modeling_prep",
            MarketProviderKind::Finnhub => "finnhub",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            MarketProviderKind::AlphaVantage => "https://www.alphavantage.co",
            MarketProviderKind::FinancialModelingPrep => "https://financialmodelingprep.com",
            MarketProviderKind::Finnhub => "https://finnhub.io",
        }
    }

    /// 설정으로 Provider 인스턴스를 생성합니다.
    pub fn build(
        &self,
        config: &ProviderConfig,
        default_timeout: std::time::Duration,
    ) -> Result<Arc<dyn MarketDataProvider>> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            ProviderError::NotConfigured(format!("{}: API key missing", self.as_str()))
        })?;
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| self.default_base_url().to_string());
        let client = http_client(config.timeout(default_timeout))?;

        Ok(self.instantiate(client, base_url, api_key))
    }

    fn instantiate(
        &self,
        client: reqwest::Client,
        base_url: String,
        api_key: SecretString,
    ) -> Arc<dyn MarketDataProvider> {
        match self {
            MarketProviderKind::AlphaVantage => {
                Arc::new(AlphaVantageProvider::new(client, base_url, api_key))
            }
            MarketProviderKind::FinancialModelingPrep => {
                Arc::new(FmpProvider::new(client, base_url, api_key))
            }
            MarketProviderKind::Finnhub => Arc::new(FinnhubProvider::new(client, base_url, api_key)),
        }
    }
}

impl fmt::Display for MarketProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "alpha_vantage" | "alphavantage" => Ok(MarketProviderKind::AlphaVantage),
            "financial_modeling_prep" | "fmp" => Ok(MarketProviderKind::FinancialModelingPrep),
            "finnhub" => Ok(MarketProviderKind::Finnhub),
            other => Err(ProviderError::NotConfigured(format!(
                "Unknown market provider: {}",
                other
            ))),
        }
    }
}

/// 설정 순서대로 시장 데이터 체인을 구성합니다.
///
/// 비활성화되었거나, 종류를 알 수 없거나, API 키가 없는 Provider는
/// 경고를 남기고 건너뜁니다.
pub fn build_market_chain(config: &ProvidersConfig) -> FallbackChain<dyn MarketDataProvider> {
    let mut chain = FallbackChain::new();

    for provider_config in &config.market {
        if !provider_config.enabled {
            debug!(provider = %provider_config.kind, "Market provider disabled");
            continue;
        }

        let kind = match provider_config.kind.parse::<MarketProviderKind>() {
            Ok(kind) => kind,
            Err(e) => {
                warn!(provider = %provider_config.kind, error = %e, "Skipping market provider");
                continue;
            }
        };

        let provider = match kind.build(provider_config, config.request_timeout()) {
            Ok(provider) => provider,
            Err(e) => {
                warn!(provider = %kind, error = %e, "Skipping market provider");
                continue;
            }
        };

        let mut entry = ChainEntry::new(provider, provider_config.timeout(config.request_timeout()));
        if let Some(limit) = &provider_config.rate_limit {
            entry = entry.with_limiter(RateLimiter::from_config(limit));
        }
        chain.push(entry);
    }

    info!(providers = ?chain.provider_names(), "Market data chain ready");
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!(
            "FMP".parse::<MarketProviderKind>().unwrap(),
            MarketProviderKind::FinancialModelingPrep
        );
        assert_eq!(
            "alpha-vantage".parse::<MarketProviderKind>().unwrap(),
            MarketProviderKind::AlphaVantage
        );
        assert!("bloomberg".parse::<MarketProviderKind>().is_err());
    }

    #[test]
    fn test_chain_follows_config_order_and_skips_unusable() {
        let config = ProvidersConfig {
            request_timeout_secs: 5,
            market: vec![
                {
                    let mut c = ProviderConfig::new("finnhub");
                    c.api_key = Some("f".to_string());
                    c
                },
                ProviderConfig::new("alpha_vantage"),
                {
                    let mut c = ProviderConfig::new("fmp").with_rate_limit(10, 60);
                    c.api_key = Some("m".to_string());
                    c
                },
                {
                    let mut c = ProviderConfig::new("finnhub");
                    c.api_key = Some("f".to_string());
                    c.enabled = false;
                    c
                },
                ProviderConfig::new("unknown"),
            ],
            perspective: Vec::new(),
        };

        let chain = build_market_chain(&config);
        assert_eq!(chain.provider_names(), vec!["finnhub", "financial_modeling_prep"]);
    }
}

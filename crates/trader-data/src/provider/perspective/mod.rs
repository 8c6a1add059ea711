//! AI 분석(Perspective) Provider.
//!
//! 모든 Provider는 같은 페르소나 프롬프트를 보내고, 응답으로 다음 형태의
//! JSON 객체 하나를 요구합니다.
//!
//! ```json
//! {"recommendation": "buy|hold|sell", "confidence": 0.0-1.0,
//!  "target_price": 123.4, "summary": "...", "key_points": ["..."]}
//! ```

mod anthropic;
mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;

use chrono::Utc;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use trader_core::{AgentKind, FundamentalMetrics, Perspective, ProviderConfig, ProvidersConfig, Recommendation};

use super::fallback::{ChainEntry, FallbackChain};
use super::rate_limit::RateLimiter;
use super::{http_client, json_decimal, PerspectiveProvider};
use crate::error::{ProviderError, Result};

/// AI Provider 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PerspectiveProviderKind {
    /// OpenAI 및 호환 chat completions API
    OpenAi,
    /// Anthropic messages API
    Anthropic,
}

impl PerspectiveProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerspectiveProviderKind::OpenAi => "openai",
            PerspectiveProviderKind::Anthropic => "anthropic",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            PerspectiveProviderKind::OpenAi => "https://api.openai.com/v1",
            PerspectiveProviderKind::Anthropic => "https://api.anthropic.com/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            PerspectiveProviderKind::OpenAi => "gpt-4o-mini",
            PerspectiveProviderKind::Anthropic => "claude-3-5-haiku-latest",
        }
    }

    /// 설정으로 Provider 인스턴스를 생성합니다.
    pub fn build(
        &self,
        config: &ProviderConfig,
        default_timeout: Duration,
    ) -> Result<Arc<dyn PerspectiveProvider>> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            ProviderError::NotConfigured(format!("{}: API key missing", self.as_str()))
        })?;
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| self.default_base_url().to_string());
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| self.default_model().to_string());
        let client = http_client(config.timeout(default_timeout))?;

        Ok(self.instantiate(client, base_url, api_key, model))
    }

    fn instantiate(
        &self,
        client: reqwest::Client,
        base_url: String,
        api_key: SecretString,
        model: String,
    ) -> Arc<dyn PerspectiveProvider> {
        match self {
            PerspectiveProviderKind::OpenAi => {
                Arc::new(OpenAiProvider::new(client, base_url, api_key, model))
            }
            PerspectiveProviderKind::Anthropic => {
                Arc::new(AnthropicProvider::new(client, base_url, api_key, model))
            }
        }
    }
}

impl fmt::Display for PerspectiveProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerspectiveProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "openai" | "openai_compatible" => Ok(PerspectiveProviderKind::OpenAi),
            "anthropic" | "claude" => Ok(PerspectiveProviderKind::Anthropic),
            other => Err(ProviderError::NotConfigured(format!(
                "Unknown perspective provider: {}",
                other
            ))),
        }
    }
}

/// 설정 순서대로 AI 분석 체인을 구성합니다.
pub fn build_perspective_chain(config: &ProvidersConfig) -> FallbackChain<dyn PerspectiveProvider> {
    let mut chain = FallbackChain::new();

    for provider_config in &config.perspective {
        if !provider_config.enabled {
            debug!(provider = %provider_config.kind, "Perspective provider disabled");
            continue;
        }

        let provider = match provider_config
            .kind
            .parse::<PerspectiveProviderKind>()
            .and_then(|kind| kind.build(provider_config, config.request_timeout()))
        {
            Ok(provider) => provider,
            Err(e) => {
                warn!(provider = %provider_config.kind, error = %e, "Skipping perspective provider");
                continue;
            }
        };

        let mut entry = ChainEntry::new(provider, provider_config.timeout(config.request_timeout()));
        if let Some(limit) = &provider_config.rate_limit {
            entry = entry.with_limiter(RateLimiter::from_config(limit));
        }
        chain.push(entry);
    }

    info!(providers = ?chain.provider_names(), "Perspective chain ready");
    chain
}

// =============================================================================
// 프롬프트 / 응답
// =============================================================================

/// (system, user) 프롬프트.
pub(crate) fn build_prompt(agent: AgentKind, metrics: &FundamentalMetrics) -> (String, String) {
    let system = format!(
        "You are {}. Analyze the stock strictly from this point of view. \
         Respond with a single JSON object and no other text.",
        agent.persona()
    );

    let user = format!(
        "Symbol: {symbol}\n\
         Price: {price}\n\
         Market cap: {market_cap}\n\
         P/E ratio: {pe}\n\
         Revenue growth (YoY): {growth}\n\
         Profit margin: {margin}\n\
         Return on equity: {roe}\n\
         Debt to equity: {de}\n\n\
         Reply with JSON: {{\"recommendation\": \"buy\" | \"hold\" | \"sell\", \
         \"confidence\": number between 0 and 1, \"target_price\": number or null, \
         \"summary\": string, \"key_points\": [string, ...]}}",
        symbol = metrics.symbol,
        price = plain(metrics.price),
        market_cap = plain(metrics.market_cap),
        pe = plain(metrics.pe_ratio),
        growth = pct(metrics.revenue_growth),
        margin = pct(metrics.profit_margin),
        roe = pct(metrics.roe),
        de = plain(metrics.debt_to_equity),
    );

    (system, user)
}

fn plain(value: Option<Decimal>) -> String {
    value
        .map(|v| v.round_dp(2).normalize().to_string())
        .unwrap_or_else(|| "n/a".to_string())
}

fn pct(value: Option<Decimal>) -> String {
    value
        .and_then(|v| v.checked_mul(Decimal::ONE_HUNDRED))
        .map(|v| format!("{}%", v.round_dp(1).normalize()))
        .unwrap_or_else(|| "n/a".to_string())
}

#[derive(Debug, Deserialize)]
struct PerspectiveReply {
    recommendation: String,
    confidence: Value,
    #[serde(default)]
    target_price: Option<Value>,
    summary: String,
    #[serde(default)]
    key_points: Vec<String>,
}

/// 모델 응답 텍스트를 Perspective로 변환합니다.
///
/// 코드 펜스 등 JSON 앞뒤의 텍스트는 무시합니다.
pub(crate) fn parse_reply(
    provider: &str,
    agent: AgentKind,
    metrics: &FundamentalMetrics,
    text: &str,
) -> Result<Perspective> {
    let malformed = |reason: &str| {
        ProviderError::MalformedResponse(format!("{}: {}", provider, reason))
    };

    let json = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => return Err(malformed("reply contains no JSON object")),
    };
    let reply: PerspectiveReply = serde_json::from_str(json)?;

    let recommendation = Recommendation::parse_lenient(&reply.recommendation)
        .ok_or_else(|| malformed(&format!("unknown recommendation {:?}", reply.recommendation)))?;

    let confidence = parse_confidence(&reply.confidence)
        .ok_or_else(|| malformed(&format!("invalid confidence {}", reply.confidence)))?;

    let summary = reply.summary.trim().to_string();
    if summary.is_empty() {
        return Err(malformed("empty summary"));
    }

    let key_points: Vec<String> = reply
        .key_points
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if key_points.is_empty() {
        return Err(malformed("no key points"));
    }

    let target_price = reply
        .target_price
        .as_ref()
        .and_then(json_decimal)
        .filter(|p| *p > Decimal::ZERO);

    Ok(Perspective {
        agent,
        symbol: metrics.symbol.clone(),
        recommendation,
        confidence,
        target_price,
        summary,
        key_points,
        generated_at: Utc::now(),
    })
}

/// 0~1 비율, 또는 1~100 퍼센트 값을 허용합니다.
fn parse_confidence(value: &Value) -> Option<f64> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    let normalized = if raw > 1.0 && raw <= 100.0 {
        raw / 100.0
    } else {
        raw
    };
    (normalized.is_finite() && (0.0..=1.0).contains(&normalized)).then_some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn metrics() -> FundamentalMetrics {
        let mut metrics = FundamentalMetrics::empty("AAPL");
        metrics.price = Some(dec!(190.5));
        metrics.pe_ratio = Some(dec!(29.14));
        metrics.profit_margin = Some(dec!(0.2531));
        metrics
    }

    #[test]
    fn test_prompt_contains_persona_and_metrics() {
        let (system, user) = build_prompt(AgentKind::RiskManager, &metrics());
        assert!(system.contains("risk manager"));
        assert!(user.contains("Symbol: AAPL"));
        assert!(user.contains("P/E ratio: 29.14"));
        assert!(user.contains("Profit margin: 25.3%"));
        assert!(user.contains("Debt to equity: n/a"));
    }

    #[test]
    fn test_prompt_with_unrepresentable_percent() {
        let mut metrics = metrics();
        metrics.revenue_growth = Some(Decimal::MAX);
        let (_, user) = build_prompt(AgentKind::GrowthInvestor, &metrics);
        assert!(user.contains("Revenue growth (YoY): n/a"));
        assert!(user.contains("Profit margin: 25.3%"));
    }

    #[test]
    fn test_parse_reply_inside_code_fence() {
        let text = "```json\n{\"recommendation\": \"Strong Buy\", \"confidence\": 0.72, \
                    \"target_price\": \"215.00\", \"summary\": \"Solid margins.\", \
                    \"key_points\": [\"Margin 25%\", \" \"]}\n```";
        let perspective =
            parse_reply("test", AgentKind::GrowthInvestor, &metrics(), text).unwrap();
        assert_eq!(perspective.recommendation, Recommendation::Buy);
        assert_eq!(perspective.confidence, 0.72);
        assert_eq!(perspective.target_price, Some(dec!(215)));
        assert_eq!(perspective.key_points, vec!["Margin 25%".to_string()]);
        assert_eq!(perspective.symbol, "AAPL");
        assert_eq!(perspective.agent, AgentKind::GrowthInvestor);
    }

    #[test]
    fn test_parse_reply_percent_confidence() {
        let text = r#"{"recommendation":"hold","confidence":"65%","summary":"Fair.","key_points":["a"]}"#;
        let perspective = parse_reply("test", AgentKind::ValueInvestor, &metrics(), text).unwrap();
        assert!((perspective.confidence - 0.65).abs() < 1e-9);
        assert_eq!(perspective.target_price, None);
    }

    #[test]
    fn test_parse_reply_rejects_invalid_replies() {
        let cases = [
            "I think you should buy.",
            r#"{"recommendation":"moon","confidence":0.5,"summary":"x","key_points":["a"]}"#,
            r#"{"recommendation":"buy","confidence":150,"summary":"x","key_points":["a"]}"#,
            r#"{"recommendation":"buy","confidence":0.5,"summary":"  ","key_points":["a"]}"#,
            r#"{"recommendation":"buy","confidence":0.5,"summary":"x","key_points":[]}"#,
        ];
        for text in cases {
            let err = parse_reply("test", AgentKind::Contrarian, &metrics(), text).unwrap_err();
            assert!(
                matches!(err, ProviderError::MalformedResponse(_)),
                "unexpected error for {}: {:?}",
                text,
                err
            );
        }

        let err = parse_reply("test", AgentKind::Contrarian, &metrics(), r#"{"summary": 1}"#)
            .unwrap_err();
        assert!(matches!(err, ProviderError::Parse(_)));
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!(
            "Claude".parse::<PerspectiveProviderKind>().unwrap(),
            PerspectiveProviderKind::Anthropic
        );
        assert!("gemini".parse::<PerspectiveProviderKind>().is_err());
    }
}

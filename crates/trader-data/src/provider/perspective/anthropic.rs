//! Anthropic messages API Provider.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use trader_core::{AgentKind, FundamentalMetrics, Perspective};

use super::{build_prompt, parse_reply};
use crate::error::{ProviderError, Result};
use crate::provider::{send_json, NamedProvider, PerspectiveProvider};

const NAME: &str = "anthropic";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

pub struct AnthropicProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: SecretString,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        }
    }
}

impl NamedProvider for AnthropicProvider {
    fn name(&self) -> &str {
        NAME
    }
}

#[async_trait]
impl PerspectiveProvider for AnthropicProvider {
    async fn generate(
        &self,
        agent: AgentKind,
        metrics: &FundamentalMetrics,
    ) -> Result<Perspective> {
        let (system, user) = build_prompt(agent, metrics);
        let body = json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "system": system,
            "messages": [{ "role": "user", "content": user }],
        });

        debug!(provider = NAME, model = %self.model, agent = %agent, symbol = %metrics.symbol, "Requesting perspective");
        let request = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&body);
        let response: MessagesResponse = send_json(request).await?;

        let text = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .find_map(|block| block.text)
            .ok_or_else(|| ProviderError::MalformedResponse(format!("{}: no text block", NAME)))?;

        parse_reply(NAME, agent, metrics, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trader_core::Recommendation;

    fn provider(server: &mockito::Server) -> AnthropicProvider {
        AnthropicProvider::new(
            reqwest::Client::new(),
            server.url(),
            SecretString::new("ak-test".into()),
            "claude-3-5-haiku-latest",
        )
    }

    #[tokio::test]
    async fn test_generate_reads_first_text_block() {
        let mut server = mockito::Server::new_async().await;
        let text = "Here is my analysis:\n{\"recommendation\":\"bullish\",\"confidence\":0.8,\
                    \"summary\":\"Growth is accelerating.\",\"key_points\":[\"Revenue +30%\"]}";
        let _mock = server
            .mock("POST", "/messages")
            .match_header("x-api-key", "ak-test")
            .match_header("anthropic-version", API_VERSION)
            .with_body(
                json!({"content": [{"type": "text", "text": text}], "stop_reason": "end_turn"})
                    .to_string(),
            )
            .create_async()
            .await;

        let metrics = trader_core::FundamentalMetrics::empty("NVDA");
        let perspective = provider(&server)
            .generate(AgentKind::GrowthInvestor, &metrics)
            .await
            .unwrap();
        assert_eq!(perspective.recommendation, Recommendation::Buy);
        assert_eq!(perspective.summary, "Growth is accelerating.");
    }

    #[tokio::test]
    async fn test_server_error_is_http() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/messages")
            .with_status(529)
            .with_body(r#"{"type":"error","error":{"type":"overloaded_error"}}"#)
            .create_async()
            .await;

        let metrics = trader_core::FundamentalMetrics::empty("NVDA");
        let err = provider(&server)
            .generate(AgentKind::GrowthInvestor, &metrics)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Http { status: 529, .. }));
    }
}

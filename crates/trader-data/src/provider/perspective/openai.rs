//! OpenAI (및 호환) chat completions Provider.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use trader_core::{AgentKind, FundamentalMetrics, Perspective};

use super::{build_prompt, parse_reply};
use crate::error::{ProviderError, Result};
use crate::provider::{send_json, NamedProvider, PerspectiveProvider};

const NAME: &str = "openai";

pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiProvider {
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

impl NamedProvider for OpenAiProvider {
    fn name(&self) -> &str {
        NAME
    }
}

#[async_trait]
impl PerspectiveProvider for OpenAiProvider {
    async fn generate(
        &self,
        agent: AgentKind,
        metrics: &FundamentalMetrics,
    ) -> Result<Perspective> {
        let (system, user) = build_prompt(agent, metrics);
        let body = json!({
            "model": self.model,
            "temperature": 0.3,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });

        debug!(provider = NAME, model = %self.model, agent = %agent, symbol = %metrics.symbol, "Requesting perspective");
        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body);
        let response: ChatResponse = send_json(request).await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ProviderError::MalformedResponse(format!("{}: no message content", NAME))
            })?;

        parse_reply(NAME, agent, metrics, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trader_core::Recommendation;

    fn provider(server: &mockito::Server) -> OpenAiProvider {
        OpenAiProvider::new(
            reqwest::Client::new(),
            server.url(),
            SecretString::new("sk-test".into()),
            "gpt-4o-mini",
        )
    }

    #[tokio::test]
    async fn test_generate_parses_message_content() {
        let mut server = mockito::Server::new_async().await;
        let content = r#"{"recommendation":"sell","confidence":0.61,"target_price":150,"summary":"Leverage is high.","key_points":["D/E 2.1","Thin margins"]}"#;
        let _mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(mockito::Matcher::PartialJson(json!({"model": "gpt-4o-mini"})))
            .with_body(
                json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
                    .to_string(),
            )
            .create_async()
            .await;

        let metrics = trader_core::FundamentalMetrics::empty("TSLA");
        let perspective = provider(&server)
            .generate(AgentKind::RiskManager, &metrics)
            .await
            .unwrap();
        assert_eq!(perspective.recommendation, Recommendation::Sell);
        assert_eq!(perspective.key_points.len(), 2);
        assert_eq!(perspective.symbol, "TSLA");
    }

    #[tokio::test]
    async fn test_empty_choices_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let metrics = trader_core::FundamentalMetrics::empty("TSLA");
        let err = provider(&server)
            .generate(AgentKind::Contrarian, &metrics)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }
}

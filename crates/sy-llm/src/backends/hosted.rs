//! Hosted OpenAI-compatible chat-completions backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use sy_protocol::{BackendChoice, ChatMessage};

use super::ChatBackend;
use crate::config::HostedConfig;
use crate::error::{LlmError, LlmResult, truncate};

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

/// Client for a hosted REST API authenticated with a static bearer key.
pub struct HostedBackend {
    client: reqwest::Client,
    config: HostedConfig,
}

impl HostedBackend {
    pub fn new(config: HostedConfig) -> LlmResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Request {
                endpoint: config.api_url.clone().unwrap_or_default(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client, config })
    }

    fn credentials(&self) -> LlmResult<(&str, &str)> {
        match (self.config.api_url.as_deref(), self.config.api_key.as_deref()) {
            (Some(url), Some(key)) if !url.trim().is_empty() && !key.trim().is_empty() => {
                Ok((url, key))
            }
            _ => Err(LlmError::NotConfigured {
                backend: BackendChoice::SecondaryHosted,
                reason: "LLM_API_URL and LLM_API_KEY must be set".into(),
            }),
        }
    }
}

#[async_trait]
impl ChatBackend for HostedBackend {
    fn choice(&self) -> BackendChoice {
        BackendChoice::SecondaryHosted
    }

    async fn chat(&self, messages: &[ChatMessage]) -> LlmResult<String> {
        let (url, key) = self.credentials()?;
        let body = CompletionRequest {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        tracing::debug!(model = %self.config.model, messages = messages.len(), "hosted chat request");

        let response = self
            .client
            .post(url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(url, e, self.config.timeout_secs))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::from_reqwest(url, e, self.config.timeout_secs))?;

        if !status.is_success() {
            return Err(LlmError::Status {
                endpoint: url.to_string(),
                status: status.as_u16(),
                detail: error_detail(&text),
            });
        }

        let json: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| LlmError::InvalidResponse {
                endpoint: url.to_string(),
                message: e.to_string(),
            })?;

        json.pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| LlmError::InvalidResponse {
                endpoint: url.to_string(),
                message: "missing choices[0].message.content".into(),
            })
    }

    /// Configuration-only: a hosted API is assumed reachable when credentials exist.
    async fn is_available(&self) -> bool {
        self.config.is_configured()
    }
}

/// Prefer the API's own `error.message` over the raw body.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| truncate(body, 200))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer) -> HostedBackend {
        HostedBackend::new(HostedConfig {
            api_url: Some(format!("{}/v1/chat/completions", server.uri())),
            api_key: Some("sk-test".into()),
            timeout_secs: 2,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn chat_reads_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 2000
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Use a trait."}}]
            })))
            .mount(&server)
            .await;

        let reply = backend_for(&server)
            .chat(&[ChatMessage::user("how do I abstract this?")])
            .await
            .unwrap();
        assert_eq!(reply, "Use a trait.");
    }

    #[tokio::test]
    async fn api_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"message": "Rate limit reached", "type": "requests"}
            })))
            .mount(&server)
            .await;

        let err = backend_for(&server)
            .chat(&[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("429"));
        assert!(msg.contains("Rate limit reached"));
    }

    #[tokio::test]
    async fn unconfigured_backend_refuses() {
        let backend = HostedBackend::new(HostedConfig::default()).unwrap();
        assert!(!backend.is_available().await);
        let err = backend.chat(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(
            err,
            LlmError::NotConfigured {
                backend: BackendChoice::SecondaryHosted,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn empty_choices_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = backend_for(&server)
            .chat(&[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse { .. }));
    }

    #[test]
    fn error_detail_falls_back_to_body() {
        assert_eq!(error_detail("bad gateway"), "bad gateway");
        assert_eq!(error_detail(r#"{"error":{"message":"nope"}}"#), "nope");
    }
}

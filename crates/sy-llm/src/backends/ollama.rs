//! Local Ollama backend.
//!
//! Calls the Ollama HTTP API (`/api/chat`, non-streaming) for completions and
//! probes `/api/tags` with a short timeout to decide availability.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sy_protocol::{BackendChoice, ChatMessage};

use super::ChatBackend;
use crate::config::OllamaConfig;
use crate::error::{LlmError, LlmResult, truncate};

/// Ollama chat API request body.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// Ollama chat API response (only fields we need).
#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Client for the local Ollama server.
pub struct OllamaBackend {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaBackend {
    pub fn new(config: OllamaConfig) -> LlmResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Request {
                endpoint: config.host.clone(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client, config })
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.config.host.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    fn choice(&self) -> BackendChoice {
        BackendChoice::PrimaryLocal
    }

    async fn chat(&self, messages: &[ChatMessage]) -> LlmResult<String> {
        if !self.config.enabled {
            return Err(LlmError::NotConfigured {
                backend: BackendChoice::PrimaryLocal,
                reason: "disabled in configuration".into(),
            });
        }

        let url = self.url("/api/chat");
        let body = ChatRequest {
            model: &self.config.model,
            messages,
            stream: false,
        };

        tracing::debug!(model = %self.config.model, messages = messages.len(), "ollama chat request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(&url, e, self.config.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                endpoint: url,
                status: status.as_u16(),
                detail: truncate(&detail, 200),
            });
        }

        let chat_resp: ChatResponse = response.json().await.map_err(|e| LlmError::InvalidResponse {
            endpoint: url.clone(),
            message: e.to_string(),
        })?;

        chat_resp
            .message
            .map(|m| m.content)
            .ok_or_else(|| LlmError::InvalidResponse {
                endpoint: url,
                message: "response has no message".into(),
            })
    }

    async fn is_available(&self) -> bool {
        if !self.config.enabled {
            return false;
        }
        let url = self.url("/api/tags");
        let probe = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(self.config.probe_timeout_secs))
            .send()
            .await;
        match probe {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "ollama probe failed");
                false
            }
        }
    }
}

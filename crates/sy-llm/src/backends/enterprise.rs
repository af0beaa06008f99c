//! Enterprise chat backend behind OAuth2 client credentials.
//!
//! Every request carries a bearer token from the [`TokenManager`]. A 401 from
//! the chat endpoint invalidates the token, forces one re-acquisition and
//! retries once; a second 401 is a hard authentication failure.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use sy_protocol::{BackendChoice, ChatMessage};

use super::ChatBackend;
use crate::config::EnterpriseConfig;
use crate::error::{LlmError, LlmResult, truncate};
use crate::token::{ClientCredentials, TokenManager};

const CONNECTION_TEST_PROMPT: &str = "Hello, respond with just 'OK'";

#[derive(Serialize)]
struct EnterpriseRequest<'a> {
    messages: &'a [ChatMessage],
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
}

/// Fully configured connection details.
struct Connection {
    chat_url: String,
    tokens: Arc<TokenManager>,
}

/// Client for the enterprise endpoint.
pub struct EnterpriseBackend {
    client: reqwest::Client,
    config: EnterpriseConfig,
    connection: Option<Connection>,
}

impl EnterpriseBackend {
    /// Build from configuration. An incomplete configuration still yields a
    /// backend; it reports itself unavailable and refuses to chat.
    pub fn new(config: EnterpriseConfig) -> LlmResult<Self> {
        let connection = match (
            config.token_url.clone(),
            config.chat_url.clone(),
            config.app_id.clone(),
            config.app_key.clone(),
            config.app_resource.clone(),
        ) {
            (Some(token_url), Some(chat_url), Some(client_id), Some(client_secret), Some(resource))
                if config.is_configured() =>
            {
                let tokens = TokenManager::new(
                    ClientCredentials {
                        token_url,
                        client_id,
                        client_secret,
                        resource,
                    },
                    config.token_timeout_secs,
                )?;
                Some(Connection {
                    chat_url,
                    tokens: Arc::new(tokens),
                })
            }
            _ => None,
        };
        Self::build(config, connection)
    }

    /// Build with an externally owned token manager (shared clock, pre-seeded token).
    pub fn with_token_manager(config: EnterpriseConfig, tokens: Arc<TokenManager>) -> LlmResult<Self> {
        let connection = config.chat_url.clone().map(|chat_url| Connection { chat_url, tokens });
        Self::build(config, connection)
    }

    fn build(config: EnterpriseConfig, connection: Option<Connection>) -> LlmResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Request {
                endpoint: config.chat_url.clone().unwrap_or_default(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            config,
            connection,
        })
    }

    /// The token manager, when configured.
    pub fn token_manager(&self) -> Option<&Arc<TokenManager>> {
        self.connection.as_ref().map(|c| &c.tokens)
    }

    /// Round-trip a trivial prompt to verify credentials and endpoint.
    pub async fn test_connection(&self) -> LlmResult<String> {
        let reply = self.chat(&[ChatMessage::user(CONNECTION_TEST_PROMPT)]).await?;
        tracing::info!("enterprise connection test succeeded");
        Ok(reply)
    }

    fn connection(&self) -> LlmResult<&Connection> {
        self.connection.as_ref().ok_or_else(|| LlmError::NotConfigured {
            backend: BackendChoice::Enterprise,
            reason: format!("missing {}", self.config.missing_fields().join(", ")),
        })
    }

    async fn post(
        &self,
        conn: &Connection,
        token: &str,
        messages: &[ChatMessage],
    ) -> LlmResult<reqwest::Response> {
        let body = EnterpriseRequest {
            messages,
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };
        self.client
            .post(&conn.chat_url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(&conn.chat_url, e, self.config.timeout_secs))
    }
}

#[async_trait]
impl ChatBackend for EnterpriseBackend {
    fn choice(&self) -> BackendChoice {
        BackendChoice::Enterprise
    }

    async fn chat(&self, messages: &[ChatMessage]) -> LlmResult<String> {
        let conn = self.connection()?;

        let token = conn.tokens.ensure_valid().await?;
        let mut response = self.post(conn, &token, messages).await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            tracing::warn!("enterprise chat returned 401, refreshing token and retrying once");
            conn.tokens.invalidate().await;
            let token = conn.tokens.ensure_valid().await?;
            response = self.post(conn, &token, messages).await?;
            if response.status() == reqwest::StatusCode::UNAUTHORIZED {
                return Err(LlmError::Authentication(
                    "chat endpoint returned HTTP 401 twice".into(),
                ));
            }
        }

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::from_reqwest(&conn.chat_url, e, self.config.timeout_secs))?;
        if !status.is_success() {
            return Err(LlmError::Status {
                endpoint: conn.chat_url.clone(),
                status: status.as_u16(),
                detail: truncate(&text, 200),
            });
        }

        let json: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| LlmError::InvalidResponse {
                endpoint: conn.chat_url.clone(),
                message: e.to_string(),
            })?;
        extract_completion_text(&json).ok_or_else(|| LlmError::InvalidResponse {
            endpoint: conn.chat_url.clone(),
            message: "no completion text in response".into(),
        })
    }

    async fn is_available(&self) -> bool {
        self.connection.is_some()
    }
}

/// First present of `choices[0].message.content`, `message.content`,
/// `response`, `content`, `text`, `output`.
pub fn extract_completion_text(json: &serde_json::Value) -> Option<String> {
    const POINTERS: [&str; 6] = [
        "/choices/0/message/content",
        "/message/content",
        "/response",
        "/content",
        "/text",
        "/output",
    ];
    POINTERS
        .iter()
        .find_map(|p| json.pointer(p).and_then(|v| v.as_str()))
        .map(str::to_string)
}

//! Shared test harness for E2E integration tests.
//!
//! Stands up one wiremock server per backend (local, hosted, enterprise)
//! and builds real dispatchers and sessions against them.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sy_cli::config::DefaultsConfig;
use sy_cli::handlers::HandlerTable;
use sy_cli::session::Session;
use sy_intent::KeywordDetector;
use sy_llm::{ChatModel, Dispatcher, EnterpriseConfig, HostedConfig, LlmConfig, OllamaConfig};

pub const TOKEN_PATH: &str = "/oauth2/token";
pub const ENTERPRISE_CHAT_PATH: &str = "/v1/chat";
pub const HOSTED_CHAT_PATH: &str = "/v1/chat/completions";

/// Mock servers for every backend.
pub struct TestHarness {
    pub ollama: MockServer,
    pub hosted: MockServer,
    pub enterprise: MockServer,
}

impl TestHarness {
    pub async fn start() -> Self {
        Self {
            ollama: MockServer::start().await,
            hosted: MockServer::start().await,
            enterprise: MockServer::start().await,
        }
    }

    pub fn ollama_config(&self) -> OllamaConfig {
        OllamaConfig {
            host: self.ollama.uri(),
            timeout_secs: 5,
            ..Default::default()
        }
    }

    pub fn hosted_config(&self) -> HostedConfig {
        HostedConfig {
            api_url: Some(format!("{}{HOSTED_CHAT_PATH}", self.hosted.uri())),
            api_key: Some("sk-test".into()),
            timeout_secs: 5,
            ..Default::default()
        }
    }

    pub fn enterprise_config(&self) -> EnterpriseConfig {
        EnterpriseConfig {
            token_url: Some(format!("{}{TOKEN_PATH}", self.enterprise.uri())),
            chat_url: Some(format!("{}{ENTERPRISE_CHAT_PATH}", self.enterprise.uri())),
            app_id: Some("switchyard-client".into()),
            app_key: Some("client-secret".into()),
            app_resource: Some("api://enterprise-llm".into()),
            timeout_secs: 5,
            token_timeout_secs: 5,
            ..Default::default()
        }
    }

    /// Enterprise only; the local backend is switched off so no probe
    /// leaves the mock servers.
    pub fn enterprise_only_config(&self) -> LlmConfig {
        LlmConfig {
            ollama: OllamaConfig {
                enabled: false,
                ..Default::default()
            },
            enterprise: self.enterprise_config(),
            ..Default::default()
        }
    }

    /// Local + hosted + enterprise all configured.
    pub fn full_config(&self) -> LlmConfig {
        LlmConfig {
            ollama: self.ollama_config(),
            hosted: self.hosted_config(),
            enterprise: self.enterprise_config(),
            backend: None,
        }
    }

    /// Local + enterprise only; hosted left unconfigured.
    pub fn local_and_enterprise_config(&self) -> LlmConfig {
        LlmConfig {
            ollama: self.ollama_config(),
            enterprise: self.enterprise_config(),
            ..Default::default()
        }
    }

    /// Make the local backend pass its availability probe.
    pub async fn ollama_online(&self) {
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
            .mount(&self.ollama)
            .await;
    }

    pub async fn ollama_replies(&self, text: &str) {
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ollama_reply(text)))
            .mount(&self.ollama)
            .await;
    }

    pub async fn ollama_fails(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(status).set_body_string("model crashed"))
            .mount(&self.ollama)
            .await;
    }

    pub async fn token_endpoint(&self, token: &str, expires_in: u64, times: u64) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": token, "expires_in": expires_in})),
            )
            .expect(times)
            .mount(&self.enterprise)
            .await;
    }

    pub async fn enterprise_replies(&self, text: &str) {
        Mock::given(method("POST"))
            .and(path(ENTERPRISE_CHAT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(openai_reply(text)))
            .mount(&self.enterprise)
            .await;
    }

    pub async fn hosted_replies(&self, text: &str) {
        Mock::given(method("POST"))
            .and(path(HOSTED_CHAT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(openai_reply(text)))
            .mount(&self.hosted)
            .await;
    }

    pub async fn dispatcher(&self, config: &LlmConfig) -> Arc<Dispatcher> {
        Arc::new(Dispatcher::from_config(config).await.unwrap())
    }
}

/// Session wired exactly as the binary wires it.
pub fn session(dispatcher: Arc<Dispatcher>) -> Session {
    let model: Arc<dyn ChatModel> = dispatcher;
    Session::new(
        KeywordDetector::new(Arc::clone(&model)),
        HandlerTable::standard(model, &DefaultsConfig::default()),
    )
}

pub fn ollama_reply(text: &str) -> Value {
    json!({"model": "devstral", "message": {"role": "assistant", "content": text}, "done": true})
}

pub fn openai_reply(text: &str) -> Value {
    json!({"choices": [{"index": 0, "message": {"role": "assistant", "content": text}}]})
}

//! Backend configuration, loadable from TOML with environment overrides.
//!
//! Every section has serde defaults so a missing `[ollama]`, `[hosted]` or
//! `[enterprise]` table still yields a usable (possibly unconfigured) backend.

use serde::Deserialize;
use sy_protocol::BackendChoice;

/// Local Ollama endpoint settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaConfig {
    /// Ollama HTTP API base URL.
    #[serde(default = "default_ollama_host")]
    pub host: String,
    /// Model to use for chat completions.
    #[serde(default = "default_ollama_model")]
    pub model: String,
    /// Chat request timeout in seconds.
    #[serde(default = "default_chat_timeout_secs")]
    pub timeout_secs: u64,
    /// Availability probe timeout in seconds.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    /// Whether the local backend may be used at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".into()
}
fn default_ollama_model() -> String {
    "devstral".into()
}
fn default_chat_timeout_secs() -> u64 {
    120
}
fn default_probe_timeout_secs() -> u64 {
    2
}
fn default_token_timeout_secs() -> u64 {
    30
}
fn default_enabled() -> bool {
    true
}
fn default_hosted_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_enterprise_model() -> String {
    "enterprise-default".into()
}
fn default_max_tokens() -> u32 {
    2000
}
fn default_temperature() -> f32 {
    0.7
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model(),
            timeout_secs: default_chat_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            enabled: default_enabled(),
        }
    }
}

/// Hosted OpenAI-compatible REST API settings.
#[derive(Clone, Deserialize)]
pub struct HostedConfig {
    /// Full chat-completions URL.
    #[serde(default)]
    pub api_url: Option<String>,
    /// Bearer API key.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_hosted_model")]
    pub model: String,
    #[serde(default = "default_chat_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl HostedConfig {
    pub fn is_configured(&self) -> bool {
        non_empty(&self.api_url) && non_empty(&self.api_key)
    }
}

impl Default for HostedConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            model: default_hosted_model(),
            timeout_secs: default_chat_timeout_secs(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl std::fmt::Debug for HostedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Enterprise endpoint settings (OAuth2 client credentials).
#[derive(Clone, Deserialize)]
pub struct EnterpriseConfig {
    /// OAuth2 token endpoint.
    #[serde(default)]
    pub token_url: Option<String>,
    /// Chat completions endpoint.
    #[serde(default)]
    pub chat_url: Option<String>,
    /// Client ID.
    #[serde(default)]
    pub app_id: Option<String>,
    /// Client secret.
    #[serde(default)]
    pub app_key: Option<String>,
    /// Resource the token is requested for.
    #[serde(default)]
    pub app_resource: Option<String>,
    #[serde(default = "default_enterprise_model")]
    pub model: String,
    #[serde(default = "default_chat_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_token_timeout_secs")]
    pub token_timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl EnterpriseConfig {
    /// Names of required settings that are missing or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("token_url", &self.token_url),
            ("chat_url", &self.chat_url),
            ("app_id", &self.app_id),
            ("app_key", &self.app_key),
            ("app_resource", &self.app_resource),
        ]
        .into_iter()
        .filter(|(_, v)| !non_empty(v))
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_configured(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

impl Default for EnterpriseConfig {
    fn default() -> Self {
        Self {
            token_url: None,
            chat_url: None,
            app_id: None,
            app_key: None,
            app_resource: None,
            model: default_enterprise_model(),
            timeout_secs: default_chat_timeout_secs(),
            token_timeout_secs: default_token_timeout_secs(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl std::fmt::Debug for EnterpriseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnterpriseConfig")
            .field("token_url", &self.token_url)
            .field("chat_url", &self.chat_url)
            .field("app_id", &self.app_id)
            .field("app_key", &self.app_key.as_ref().map(|_| "<redacted>"))
            .field("app_resource", &self.app_resource)
            .field("model", &self.model)
            .finish()
    }
}

/// All backend settings plus the optional explicit backend override.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub hosted: HostedConfig,
    #[serde(default)]
    pub enterprise: EnterpriseConfig,
    /// Explicit backend ("ollama", "openai"/"rest", "enterprise"); "auto" or
    /// absent means task-based routing.
    #[serde(default)]
    pub backend: Option<String>,
}

impl LlmConfig {
    /// The explicit override, if one is set and names a real backend.
    pub fn backend_override(&self) -> Option<BackendChoice> {
        self.backend.as_deref().and_then(BackendChoice::parse)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup (testable without touching
    /// the real environment).
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OLLAMA_HOST") {
            self.ollama.host = v;
        }
        if let Some(v) = get("OLLAMA_MODEL") {
            self.ollama.model = v;
        }
        if let Some(v) = get("LLM_API_URL") {
            self.hosted.api_url = Some(v);
        }
        if let Some(v) = get("LLM_API_KEY") {
            self.hosted.api_key = Some(v);
        }
        if let Some(v) = get("LLM_MODEL") {
            self.hosted.model = v;
        }
        if let Some(v) = get("ENTERPRISE_TOKEN_URL") {
            self.enterprise.token_url = Some(v);
        }
        if let Some(v) = get("ENTERPRISE_CHAT_URL") {
            self.enterprise.chat_url = Some(v);
        }
        if let Some(v) = get("ENTERPRISE_APP_ID") {
            self.enterprise.app_id = Some(v);
        }
        if let Some(v) = get("ENTERPRISE_APP_KEY") {
            self.enterprise.app_key = Some(v);
        }
        if let Some(v) = get("ENTERPRISE_APP_RESOURCE") {
            self.enterprise.app_resource = Some(v);
        }
        if let Some(v) = get("SWITCHYARD_BACKEND") {
            self.backend = Some(v);
        }
    }
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

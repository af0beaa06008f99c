//! switchyard configuration, loadable from TOML with environment overrides.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use sy_intent::{ConsensusPolicy, DEFAULT_ORGANIZATION, PatternSettings, TRUST_THRESHOLD};
use sy_llm::LlmConfig;

/// Top-level configuration.
///
/// `[ollama]`, `[hosted]` and `[enterprise]` are the backend sections;
/// `[routing]` and `[defaults]` tune routing and extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(flatten)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    /// Backend override: ollama | openai | rest | enterprise | auto.
    #[serde(default)]
    pub backend: Option<String>,
    /// Model confidence at which the model extractor wins outright.
    #[serde(default = "default_trust_threshold")]
    pub trust_threshold: f64,
}

fn default_trust_threshold() -> f64 {
    TRUST_THRESHOLD
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            backend: None,
            trust_threshold: default_trust_threshold(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsConfig {
    /// Organization for CI folders named without one.
    #[serde(default = "default_organization")]
    pub organization: String,
    /// Item count assumed when a request names none.
    #[serde(default = "default_count")]
    pub default_count: i64,
    /// Characters of recent conversation sent along with chat and code requests.
    #[serde(default = "default_history_chars")]
    pub history_chars: usize,
}

fn default_organization() -> String {
    DEFAULT_ORGANIZATION.into()
}

fn default_count() -> i64 {
    5
}

fn default_history_chars() -> usize {
    4000
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            organization: default_organization(),
            default_count: default_count(),
            history_chars: default_history_chars(),
        }
    }
}

impl AppConfig {
    /// Load config from a TOML file path. A missing file yields defaults.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default().normalized());
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))?;
        Ok(config.normalized())
    }

    /// `from_file` followed by environment overrides.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        self.llm.apply_env_with(&lookup);
        if let Some(backend) = &self.llm.backend {
            self.routing.backend = Some(backend.clone());
        }
    }

    /// `[routing] backend` is the documented spelling; a top-level
    /// `backend` key is accepted too and loses to it.
    fn normalized(mut self) -> Self {
        if self.routing.backend.is_some() {
            self.llm.backend = self.routing.backend.clone();
        } else {
            self.routing.backend = self.llm.backend.clone();
        }
        self
    }

    pub fn pattern_settings(&self) -> PatternSettings {
        PatternSettings {
            organization: self.defaults.organization.clone(),
            default_commit_count: self.defaults.default_count,
        }
    }

    pub fn consensus_policy(&self) -> ConsensusPolicy {
        ConsensusPolicy::with_trust_threshold(self.routing.trust_threshold)
    }
}

/// Config path: first CLI argument, then `SWITCHYARD_CONFIG`, then
/// `~/.switchyard/config.toml`.
pub fn config_path(arg: Option<String>, lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(path) = arg.filter(|a| !a.trim().is_empty()) {
        return PathBuf::from(path);
    }
    if let Some(path) = lookup("SWITCHYARD_CONFIG").filter(|p| !p.trim().is_empty()) {
        return PathBuf::from(path);
    }
    let home = lookup("HOME")
        .or_else(|| lookup("USERPROFILE"))
        .unwrap_or_else(|| ".".into());
    PathBuf::from(home).join(".switchyard").join("config.toml")
}

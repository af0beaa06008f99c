use serde::{Deserialize, Serialize};

/// Kind of work a chat request asks for. Recomputed on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    CodeGeneration,
    CodeAnalysis,
    CodeReview,
    Refactoring,
    Debugging,
    Planning,
    Explanation,
}

impl TaskType {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::CodeGeneration => "code_generation",
            TaskType::CodeAnalysis => "code_analysis",
            TaskType::CodeReview => "code_review",
            TaskType::Refactoring => "refactoring",
            TaskType::Debugging => "debugging",
            TaskType::Planning => "planning",
            TaskType::Explanation => "explanation",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the interchangeable language-model backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendChoice {
    /// Local Ollama server; fast, generation-optimized.
    PrimaryLocal,
    /// Hosted OpenAI-compatible REST API.
    SecondaryHosted,
    /// Corporate endpoint behind OAuth2 client credentials.
    Enterprise,
}

impl BackendChoice {
    /// Fixed order used when demoting an unavailable preference and when
    /// falling back after a failed invocation.
    pub const FALLBACK_ORDER: [BackendChoice; 3] = [
        BackendChoice::PrimaryLocal,
        BackendChoice::Enterprise,
        BackendChoice::SecondaryHosted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BackendChoice::PrimaryLocal => "ollama",
            BackendChoice::SecondaryHosted => "openai",
            BackendChoice::Enterprise => "enterprise",
        }
    }

    /// Parse a user-facing backend name. `rest` and `hosted` are accepted as
    /// aliases for the hosted API; `auto` is not a backend and yields `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "ollama" | "local" | "primary_local" => Some(BackendChoice::PrimaryLocal),
            "openai" | "rest" | "hosted" | "secondary_hosted" => {
                Some(BackendChoice::SecondaryHosted)
            }
            "enterprise" => Some(BackendChoice::Enterprise),
            _ => None,
        }
    }
}

impl std::fmt::Display for BackendChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a chat exchange, in the wire shape every backend accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

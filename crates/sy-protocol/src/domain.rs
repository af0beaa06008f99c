use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed set of request domains a user message can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Repositories, commits, pull requests, clones.
    SourceControl,
    /// CI/CD builds and jobs.
    CiPipeline,
    /// Tickets, comments, issue searches.
    IssueTracker,
    /// Code dependency graph analysis.
    GraphDb,
    /// Application monitoring (health, resources, alerts).
    Monitoring,
    /// Generic edit / plan / review / fix instructions.
    CodeOps,
    /// Free-form conversation; the fallback domain.
    Chat,
}

impl Domain {
    /// Every domain, in classifier priority order (chat last).
    pub const ALL: [Domain; 7] = [
        Domain::IssueTracker,
        Domain::SourceControl,
        Domain::CiPipeline,
        Domain::GraphDb,
        Domain::Monitoring,
        Domain::CodeOps,
        Domain::Chat,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Domain::SourceControl => "source_control",
            Domain::CiPipeline => "ci_pipeline",
            Domain::IssueTracker => "issue_tracker",
            Domain::GraphDb => "graph_db",
            Domain::Monitoring => "monitoring",
            Domain::CodeOps => "code_ops",
            Domain::Chat => "chat",
        }
    }

    /// Human-readable label used in prompts and the REPL banner.
    pub fn label(self) -> &'static str {
        match self {
            Domain::SourceControl => "source control",
            Domain::CiPipeline => "CI/CD pipeline",
            Domain::IssueTracker => "issue tracker",
            Domain::GraphDb => "code graph database",
            Domain::Monitoring => "application monitoring",
            Domain::CodeOps => "code operations",
            Domain::Chat => "chat",
        }
    }

    /// Map an explicit slash prefix (without the slash) to a domain.
    pub fn from_prefix(prefix: &str) -> Option<Domain> {
        match prefix.to_ascii_lowercase().as_str() {
            "github" | "git" => Some(Domain::SourceControl),
            "jenkins" | "ci" => Some(Domain::CiPipeline),
            "jira" => Some(Domain::IssueTracker),
            "neo4j" | "graph" => Some(Domain::GraphDb),
            "appdynamics" | "monitor" => Some(Domain::Monitoring),
            "code" => Some(Domain::CodeOps),
            "chat" => Some(Domain::Chat),
            _ => None,
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified user message. Created once per message and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainIntent {
    /// Request ID (UUIDv7 for time-sortability), used to correlate log lines.
    pub id: Uuid,
    /// Domain chosen by the classifier.
    pub domain: Domain,
    /// The message exactly as the user typed it.
    pub raw_text: String,
    /// Classifier confidence (0.0 for the chat fallback).
    pub confidence: f64,
    /// When the message was classified.
    pub created_at: DateTime<Utc>,
}

impl DomainIntent {
    pub fn new(domain: Domain, raw_text: impl Into<String>, confidence: f64) -> Self {
        Self {
            id: Uuid::now_v7(),
            domain,
            raw_text: raw_text.into(),
            confidence: confidence.clamp(0.0, 1.0),
            created_at: Utc::now(),
        }
    }
}

//! Domain handlers: turn a detected intent into a downstream call.
//!
//! Each handler reads `action` and `fields` from a `ConsensusResult` and
//! produces the request an external client would issue, falling back to a
//! safe default when the action is "unknown" or "error". Code operations
//! and chat are answered by the model instead.

mod assistant;
mod ci_pipeline;
mod graph_db;
mod issue_tracker;
mod monitoring;
mod source_control;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use sy_llm::{ChatModel, LlmError};
use sy_protocol::{ConsensusResult, Domain};

use crate::config::DefaultsConfig;

pub use assistant::{ChatHandler, CodeOpsHandler, Conversation};
pub use ci_pipeline::CiPipelineHandler;
pub use graph_db::GraphDbHandler;
pub use issue_tracker::IssueTrackerHandler;
pub use monitoring::MonitoringHandler;
pub use source_control::SourceControlHandler;

/// A request for an external system, fully parameterized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum DownstreamCall {
    // ── Source control ──────────────────────────────────────────
    ListCommits {
        org: String,
        repo: String,
        branch: Option<String>,
        count: i64,
    },
    LatestCommit {
        org: String,
        repo: String,
        branch: Option<String>,
    },
    CommitDetail {
        org: String,
        repo: String,
        sha: String,
    },
    ListPullRequests {
        org: String,
        repo: String,
        branch: Option<String>,
    },
    CloneRepository {
        org: String,
        repo: String,
        branch: Option<String>,
    },

    // ── CI pipeline ─────────────────────────────────────────────
    RecentBuilds {
        folder_path: String,
        count: i64,
    },
    FailedJobs {
        folder_path: String,
        hours: i64,
    },
    RunningJobs {
        folder_path: String,
    },
    BuildParameters {
        folder_path: String,
        job_name: Option<String>,
        build_number: Option<i64>,
    },
    AnalyzeFailure {
        folder_path: String,
        job_name: Option<String>,
        build_number: Option<i64>,
    },

    // ── Issue tracker ───────────────────────────────────────────
    GetTicket {
        key: String,
    },
    TicketComments {
        key: String,
    },
    SearchTickets {
        jql: String,
    },
    CreateTicket {
        project: Option<String>,
        summary: String,
        assignee: Option<String>,
    },
    UpdateTicket {
        key: String,
        status: Option<String>,
        assignee: Option<String>,
    },

    // ── Code graph ──────────────────────────────────────────────
    Cypher {
        query: String,
        /// Whether the query came from the model rather than a template.
        generated: bool,
    },

    // ── Monitoring ──────────────────────────────────────────────
    HealthOverview {
        application: Option<String>,
    },
    ListApplications,
    ResourceMetrics {
        application: Option<String>,
        metric: Option<String>,
        time_range: String,
    },
    Performance {
        application: Option<String>,
        time_range: String,
    },
    Alerts {
        application: Option<String>,
        threshold: Option<i64>,
    },
}

/// What a handler decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// A downstream request to issue.
    Call(DownstreamCall),
    /// Text to show the user directly (model answer or diagnostic).
    Reply(String),
    /// A required parameter is missing; the text says which.
    NeedsInput(String),
}

/// Handles one domain.
#[async_trait]
pub trait DomainHandler: Send + Sync {
    fn domain(&self) -> Domain;

    async fn handle(&self, raw_text: &str, detected: &ConsensusResult) -> HandlerOutcome;
}

/// Handlers keyed by domain, built once at startup.
pub struct HandlerTable {
    handlers: BTreeMap<Domain, Box<dyn DomainHandler>>,
}

impl HandlerTable {
    pub fn new(handlers: Vec<Box<dyn DomainHandler>>) -> Self {
        let handlers = handlers.into_iter().map(|h| (h.domain(), h)).collect();
        Self { handlers }
    }

    /// One handler per domain, sharing `model` for answers and generated queries.
    pub fn standard(model: Arc<dyn ChatModel>, defaults: &DefaultsConfig) -> Self {
        let conversation = Arc::new(Conversation::new(defaults.history_chars));
        Self::new(vec![
            Box::new(SourceControlHandler::new(defaults.default_count)),
            Box::new(CiPipelineHandler::new(defaults)),
            Box::new(IssueTrackerHandler),
            Box::new(GraphDbHandler::new(Arc::clone(&model))),
            Box::new(MonitoringHandler),
            Box::new(CodeOpsHandler::new(Arc::clone(&model), Arc::clone(&conversation))),
            Box::new(ChatHandler::new(model, conversation)),
        ])
    }

    pub fn get(&self, domain: Domain) -> Option<&dyn DomainHandler> {
        self.handlers.get(&domain).map(|h| h.as_ref())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub async fn handle(&self, raw_text: &str, detected: &ConsensusResult) -> HandlerOutcome {
        match self.get(detected.domain) {
            Some(handler) => handler.handle(raw_text, detected).await,
            None => HandlerOutcome::Reply(format!(
                "No handler registered for {}.",
                detected.domain.label()
            )),
        }
    }
}

/// What the user sees when every backend failed.
pub(crate) fn failure_text(error: LlmError) -> String {
    match error {
        LlmError::Exhausted(diagnostic) => diagnostic,
        e => e.to_string(),
    }
}

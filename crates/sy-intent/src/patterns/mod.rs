//! Deterministic per-domain extraction templates.
//!
//! Each domain module exposes `extract(text, settings) -> Option<ExtractionResult>`;
//! `None` means no template matched and becomes the "unknown" result. Handles
//! the bulk of well-formed requests at zero cost, and its output is the
//! baseline the model extractor is reconciled against.

pub mod ci_pipeline;
pub mod code_ops;
pub mod graph_db;
pub mod issue_tracker;
pub mod monitoring;
pub mod source_control;

use regex::Regex;
use sy_protocol::{Domain, ExtractionResult, ExtractionSource, Fields};

/// Organization used when a CI folder is named without one.
pub const DEFAULT_ORGANIZATION: &str = "scimarketplace";

/// Knobs the templates need from configuration.
#[derive(Debug, Clone)]
pub struct PatternSettings {
    pub organization: String,
    /// Commit count assumed when an org/repo is named without one.
    pub default_commit_count: i64,
}

impl Default for PatternSettings {
    fn default() -> Self {
        Self {
            organization: DEFAULT_ORGANIZATION.into(),
            default_commit_count: 5,
        }
    }
}

/// Pattern-matching extractor for all domains.
#[derive(Debug, Clone, Default)]
pub struct PatternExtractor {
    settings: PatternSettings,
}

impl PatternExtractor {
    pub fn new(settings: PatternSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PatternSettings {
        &self.settings
    }

    /// Never fails: no match yields action "unknown" at confidence 0.3.
    pub fn extract(&self, domain: Domain, raw_text: &str) -> ExtractionResult {
        let text = raw_text.trim();
        let matched = match domain {
            Domain::SourceControl => source_control::extract(text, &self.settings),
            Domain::CiPipeline => ci_pipeline::extract(text, &self.settings),
            Domain::IssueTracker => issue_tracker::extract(text),
            Domain::GraphDb => graph_db::extract(text),
            Domain::Monitoring => monitoring::extract(text),
            Domain::CodeOps => code_ops::extract(text),
            Domain::Chat => extract_chat(text),
        };
        matched.unwrap_or_else(|| {
            ExtractionResult::unknown(
                ExtractionSource::Pattern,
                format!("no {} template matched", domain.label()),
            )
        })
    }
}

fn extract_chat(text: &str) -> Option<ExtractionResult> {
    if text.is_empty() {
        return None;
    }
    Some(matched(
        "chat",
        0.9,
        Fields::new().with("message", text),
        "free-form conversation",
    ))
}

// ── Shared helpers ──────────────────────────────────────────────

pub(crate) fn matched(
    action: &str,
    confidence: f64,
    fields: Fields,
    rationale: impl Into<String>,
) -> ExtractionResult {
    ExtractionResult::new(ExtractionSource::Pattern, action, confidence, fields, rationale)
}

/// Compile a case-insensitive pattern. Only used on literals in `LazyLock`s.
pub(crate) fn ci_regex(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){pattern}")).unwrap()
}

/// First capture group of `re` in `text`, as an owned string.
pub(crate) fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// First capture group of `re` parsed as an integer.
pub(crate) fn capture_int(re: &Regex, text: &str) -> Option<i64> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

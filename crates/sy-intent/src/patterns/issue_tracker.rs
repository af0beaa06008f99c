//! Issue-tracker templates: single tickets, comments, search, create, update.

use std::sync::LazyLock;

use regex::Regex;
use sy_protocol::{ExtractionResult, Fields};

use super::{capture, ci_regex, matched};

static RE_TICKET_KEY: LazyLock<Regex> = LazyLock::new(|| ci_regex(r"\b([a-z][a-z0-9]+-\d+)\b"));
static RE_CREATE: LazyLock<Regex> = LazyLock::new(|| {
    ci_regex(r"\b(create|open|file|raise|new)\b.*\b(tickets?|issues?|story|bug|task)\b")
});
static RE_COMMENTS: LazyLock<Regex> = LazyLock::new(|| ci_regex(r"\bcomments?\b"));
static RE_UPDATE: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(update|change|set|move|transition|assign|close|reopen)\b"));

static RE_PROJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:[Pp]roject|in|for)\s+([A-Z][A-Z0-9]+)\b").unwrap());
static RE_STATUS: LazyLock<Regex> = LazyLock::new(|| {
    ci_regex(r"\b(to\s+do|todo|open|in\s+progress|in\s+review|blocked|done|closed|resolved)\b")
});
static RE_ASSIGNEE: LazyLock<Regex> = LazyLock::new(|| {
    ci_regex(r"\b(?:assigned\s+to|assignee|assign\s+(?:it\s+)?to)\s+@?([\w.-]+)")
});
static RE_QUERY: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(?:search\s+for|find|about|matching|for)\s+(.+)$"));
static RE_TRAILING_PROJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+(?:in|for)\s+(?:project\s+)?[A-Z][A-Z0-9]+\b.*$").unwrap());

pub fn extract(text: &str) -> Option<ExtractionResult> {
    let ticket_key = capture(&RE_TICKET_KEY, text).map(|k| k.to_uppercase());
    let has_key = ticket_key.is_some();

    let action = if RE_CREATE.is_match(text) && !has_key {
        "create"
    } else if has_key && RE_COMMENTS.is_match(text) {
        "comments"
    } else if has_key && RE_UPDATE.is_match(text) {
        "update"
    } else if has_key {
        "ticket"
    } else {
        // Anything else that reached this domain is a search.
        "search"
    };

    let mut fields = Fields::new();
    let project = ticket_key
        .as_deref()
        .and_then(|k| k.split('-').next())
        .map(str::to_string)
        .or_else(|| capture(&RE_PROJECT, text));
    if let Some(key) = &ticket_key {
        fields.insert("ticket_key", key.as_str());
    }
    if let Some(p) = &project {
        fields.insert("project", p.as_str());
    }
    if let Some(status) = capture(&RE_STATUS, text) {
        fields.insert("status", normalize_status(&status));
    }
    if let Some(assignee) = capture(&RE_ASSIGNEE, text) {
        fields.insert("assignee", assignee);
    }
    let query = (action == "search").then(|| find_query(text)).flatten();
    if let Some(q) = &query {
        fields.insert("query", q.as_str());
    }

    let confidence = match action {
        "ticket" => 0.95,
        "comments" => 0.9,
        "update" => 0.85,
        "create" if project.is_some() => 0.8,
        "search" if query.is_some() || project.is_some() => 0.8,
        _ => 0.7,
    };

    let rationale = match &ticket_key {
        Some(key) => format!("{action} on {key}"),
        None => format!("{action} without a ticket key"),
    };
    Some(matched(action, confidence, fields, rationale))
}

fn normalize_status(status: &str) -> String {
    let collapsed = status.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    match collapsed.as_str() {
        "todo" => "to do".to_string(),
        _ => collapsed,
    }
}

/// Text after "search for"/"about"/"for", minus a trailing "in PROJ".
fn find_query(text: &str) -> Option<String> {
    let raw = capture(&RE_QUERY, text)?;
    let trimmed = RE_TRAILING_PROJECT.replace(&raw, "");
    let q = trimmed.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    (!q.is_empty()).then(|| q.to_string())
}

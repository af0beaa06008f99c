//! Extraction prompts for the model-backed extractor.
//!
//! One prompt per domain: the fixed action vocabulary, the field schema,
//! a few worked examples and the user's text verbatim. The model is asked
//! for a single JSON object so the reply can be parsed like the pattern
//! extractor's output.

use sy_protocol::Domain;

struct DomainPrompt {
    /// What the assistant is parsing requests for.
    subject: &'static str,
    actions: &'static [&'static str],
    /// `name: description` lines.
    fields: &'static [&'static str],
    /// (request, expected JSON reply)
    examples: &'static [(&'static str, &'static str)],
}

const SOURCE_CONTROL: DomainPrompt = DomainPrompt {
    subject: "GitHub source control",
    actions: &["commits", "pr", "clone"],
    fields: &[
        "org: GitHub organization (string)",
        "repo: repository name (string)",
        "branch: branch name such as main, develop, rc1 (string)",
        "count: number of items requested (integer)",
        "commit_sha: 7-40 character hex commit id (string)",
    ],
    examples: &[
        (
            "get last 5 commits from scimarketplace/quote",
            r#"{"action": "commits", "confidence": 0.95, "extracted_values": {"org": "scimarketplace", "repo": "quote", "count": 5}, "reasoning": "explicit commit request with org/repo and count"}"#,
        ),
        (
            "open pull requests on rc2 for repository externaldata in organization scimarketplace",
            r#"{"action": "pr", "confidence": 0.9, "extracted_values": {"org": "scimarketplace", "repo": "externaldata", "branch": "rc2"}, "reasoning": "pull request listing filtered by branch"}"#,
        ),
    ],
};

const CI_PIPELINE: DomainPrompt = DomainPrompt {
    subject: "Jenkins CI pipelines",
    actions: &["builds", "failed_jobs", "running_jobs", "build_parameters", "analyze_failure"],
    fields: &[
        "folder_path: Jenkins folder path; multibranch folders end in _multi, e.g. scimarketplace/quote_multi/RC1 (string)",
        "count: number of builds requested (integer)",
        "hours: look-back window in hours (integer)",
        "job_name: Jenkins job name (string)",
        "build_number: build number (integer)",
    ],
    examples: &[
        (
            "get last 5 builds for scimarketplace and folder quote and sub folder RC1",
            r#"{"action": "builds", "confidence": 0.95, "extracted_values": {"folder_path": "scimarketplace/quote_multi/RC1", "count": 5}, "reasoning": "build history for a multibranch folder"}"#,
        ),
        (
            "which deploy-all jobs failed in the last 6 hours",
            r#"{"action": "failed_jobs", "confidence": 0.9, "extracted_values": {"folder_path": "scimarketplace/deploy-all", "hours": 6}, "reasoning": "failed jobs in a time window"}"#,
        ),
        (
            "why did build 42 of quote-deploy fail",
            r#"{"action": "analyze_failure", "confidence": 0.85, "extracted_values": {"job_name": "quote-deploy", "build_number": 42}, "reasoning": "failure analysis of one build"}"#,
        ),
    ],
};

const ISSUE_TRACKER: DomainPrompt = DomainPrompt {
    subject: "Jira issue tracking",
    actions: &["ticket", "comments", "search", "create", "update"],
    fields: &[
        "ticket_key: issue key such as ABC-123, upper case (string)",
        "project: project key such as ABC (string)",
        "query: free-text search terms (string)",
        "status: workflow status such as in progress (string)",
        "assignee: user name (string)",
    ],
    examples: &[
        (
            "show me the comments on PROJ-42",
            r#"{"action": "comments", "confidence": 0.95, "extracted_values": {"ticket_key": "PROJ-42", "project": "PROJ"}, "reasoning": "comments on a specific ticket"}"#,
        ),
        (
            "find tickets about login timeouts in PAY",
            r#"{"action": "search", "confidence": 0.85, "extracted_values": {"query": "login timeouts", "project": "PAY"}, "reasoning": "free-text search scoped to a project"}"#,
        ),
    ],
};

const GRAPH_DB: DomainPrompt = DomainPrompt {
    subject: "a Neo4j code graph",
    actions: &["dependencies", "impact", "relationships", "list_repositories", "stats", "query"],
    fields: &[
        "class_name: class name (string)",
        "method_name: method or function name (string)",
        "depth: traversal depth (integer)",
    ],
    examples: &[
        (
            "what depends on class PaymentService",
            r#"{"action": "dependencies", "confidence": 0.9, "extracted_values": {"class_name": "PaymentService"}, "reasoning": "dependency lookup for a class"}"#,
        ),
        (
            "impact of changing validateUser up to 3 levels",
            r#"{"action": "impact", "confidence": 0.85, "extracted_values": {"method_name": "validateUser", "depth": 3}, "reasoning": "impact analysis with explicit depth"}"#,
        ),
    ],
};

const MONITORING: DomainPrompt = DomainPrompt {
    subject: "AppDynamics application monitoring",
    actions: &["resources", "applications", "health", "performance", "alerts"],
    fields: &[
        "application_name: monitored application (string)",
        "metric_type: one of cpu, memory, disk, network, response_time (string)",
        "time_range: window such as 1h, 24h, 7d (string)",
        "threshold: numeric threshold (integer)",
    ],
    examples: &[
        (
            "cpu usage of checkout over the last 24 hours",
            r#"{"action": "resources", "confidence": 0.9, "extracted_values": {"application_name": "checkout", "metric_type": "cpu", "time_range": "24h"}, "reasoning": "resource metric for one application"}"#,
        ),
        (
            "is payments healthy",
            r#"{"action": "health", "confidence": 0.85, "extracted_values": {"application_name": "payments"}, "reasoning": "health check"}"#,
        ),
    ],
};

const CODE_OPS: DomainPrompt = DomainPrompt {
    subject: "code operations in a local repository",
    actions: &["edit", "plan", "review", "fix", "generate", "test", "explain"],
    fields: &[
        "instruction: the full request restated (string)",
        "file_path: file the request targets (string)",
    ],
    examples: &[
        (
            "fix the off-by-one in src/pager.rs",
            r#"{"action": "fix", "confidence": 0.9, "extracted_values": {"instruction": "fix the off-by-one in src/pager.rs", "file_path": "src/pager.rs"}, "reasoning": "bug fix in a named file"}"#,
        ),
        (
            "write unit tests for the token cache",
            r#"{"action": "test", "confidence": 0.85, "extracted_values": {"instruction": "write unit tests for the token cache"}, "reasoning": "test generation without a file"}"#,
        ),
    ],
};

const CHAT: DomainPrompt = DomainPrompt {
    subject: "general conversation",
    actions: &["chat"],
    fields: &["message: the user's message (string)"],
    examples: &[(
        "what's a good name for a CLI tool",
        r#"{"action": "chat", "confidence": 0.9, "extracted_values": {"message": "what's a good name for a CLI tool"}, "reasoning": "open conversation"}"#,
    )],
};

fn prompt_for(domain: Domain) -> &'static DomainPrompt {
    match domain {
        Domain::SourceControl => &SOURCE_CONTROL,
        Domain::CiPipeline => &CI_PIPELINE,
        Domain::IssueTracker => &ISSUE_TRACKER,
        Domain::GraphDb => &GRAPH_DB,
        Domain::Monitoring => &MONITORING,
        Domain::CodeOps => &CODE_OPS,
        Domain::Chat => &CHAT,
    }
}

/// Actions the model may return for `domain`.
pub fn action_vocabulary(domain: Domain) -> &'static [&'static str] {
    prompt_for(domain).actions
}

/// Extraction instructions for `domain`, sent as the system message.
pub fn extraction_instructions(domain: Domain) -> String {
    let p = prompt_for(domain);
    let mut out = format!(
        "You extract structured parameters from requests about {}.\n\n",
        p.subject
    );

    out.push_str("Allowed actions (use exactly one; use \"unknown\" if none fits):\n");
    for action in p.actions {
        out.push_str(&format!("- {action}\n"));
    }

    out.push_str("\nFields (omit any that are not present in the request):\n");
    for field in p.fields {
        out.push_str(&format!("- {field}\n"));
    }

    out.push_str("\nExamples:\n");
    for (request, reply) in p.examples {
        out.push_str(&format!("Request: {request}\nResponse: {reply}\n\n"));
    }

    out.push_str(
        "Respond with ONLY a JSON object (no markdown, no explanation):\n\
         {\"action\": \"<action>\", \"confidence\": <0.0-1.0>, \"extracted_values\": {<fields>}, \"reasoning\": \"<one sentence>\"}",
    );
    out
}

/// The user turn: only the request itself, so backend selection sees the
/// user's words and not the template vocabulary.
pub fn extraction_request(raw_text: &str) -> String {
    format!("Request: {raw_text}\nResponse:")
}

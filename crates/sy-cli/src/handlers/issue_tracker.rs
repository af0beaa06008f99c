use async_trait::async_trait;
use sy_protocol::{ConsensusResult, Domain};

use super::{DomainHandler, DownstreamCall, HandlerOutcome};

pub struct IssueTrackerHandler;

#[async_trait]
impl DomainHandler for IssueTrackerHandler {
    fn domain(&self) -> Domain {
        Domain::IssueTracker
    }

    async fn handle(&self, raw_text: &str, detected: &ConsensusResult) -> HandlerOutcome {
        let fields = &detected.fields;
        let key = fields.get_str("ticket_key").map(str::to_uppercase);
        let assignee = fields.get_str("assignee").map(str::to_string);

        let call = match (detected.action.as_str(), key) {
            ("create", None) => DownstreamCall::CreateTicket {
                project: fields.get_str("project").map(str::to_string),
                summary: raw_text.trim().to_string(),
                assignee,
            },
            ("comments", Some(key)) => DownstreamCall::TicketComments { key },
            ("update", Some(key)) => DownstreamCall::UpdateTicket {
                key,
                status: fields.get_str("status").map(str::to_string),
                assignee,
            },
            // A key with a "comment" word is a comment request whatever the action.
            (_, Some(key)) if raw_text.to_lowercase().contains("comment") => {
                DownstreamCall::TicketComments { key }
            }
            (_, Some(key)) => DownstreamCall::GetTicket { key },
            (_, None) => DownstreamCall::SearchTickets {
                jql: build_jql(
                    fields.get_str("query").unwrap_or(raw_text),
                    fields.get_str("project"),
                    fields.get_str("status"),
                    fields.get_str("assignee"),
                ),
            },
        };
        HandlerOutcome::Call(call)
    }
}

/// Full-text JQL with optional project/status/assignee clauses.
pub fn build_jql(text: &str, project: Option<&str>, status: Option<&str>, assignee: Option<&str>) -> String {
    let mut clauses = Vec::new();
    let text = text.trim();
    if !text.is_empty() {
        clauses.push(format!("text ~ \"{}\"", escape(text)));
    }
    if let Some(project) = project {
        clauses.push(format!("project = \"{}\"", escape(project)));
    }
    if let Some(status) = status {
        clauses.push(format!("status = \"{}\"", escape(status)));
    }
    if let Some(assignee) = assignee {
        clauses.push(format!("assignee = \"{}\"", escape(assignee)));
    }
    let mut jql = clauses.join(" AND ");
    if !jql.is_empty() {
        jql.push(' ');
    }
    jql.push_str("ORDER BY updated DESC");
    jql
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

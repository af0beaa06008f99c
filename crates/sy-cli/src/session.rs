//! One interactive session: parse a line, route it, render the outcome.

use sy_intent::KeywordDetector;
use sy_protocol::{ConsensusResult, Domain, DomainIntent};

use crate::handlers::{HandlerOutcome, HandlerTable};

const EXIT_WORDS: &[&str] = &["exit", "quit", "bye", "/exit"];

pub const HELP_TEXT: &str = "\
Type a request in plain language, or force a domain with a prefix:
  /github /git       source control (commits, pull requests, clones)
  /jenkins /ci       CI pipelines (builds, failed or running jobs)
  /jira              issue tracker (tickets, comments, search)
  /neo4j /graph      code graph (dependencies, impact, queries)
  /appdynamics /monitor  monitoring (health, resources, alerts)
  /code              code operations (edit, plan, review, fix)
  /chat              plain conversation
  /help              this text
  exit | quit | bye  leave";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Empty,
    Exit,
    Help,
    /// Text to route; `domain` is set when an explicit prefix chose it.
    Request { domain: Option<Domain>, text: String },
    UnknownPrefix(String),
}

pub fn parse_line(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    if EXIT_WORDS.contains(&line.to_lowercase().as_str()) {
        return Command::Exit;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Request {
            domain: None,
            text: line.to_string(),
        };
    };

    let (prefix, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    if prefix.eq_ignore_ascii_case("help") {
        return Command::Help;
    }
    match Domain::from_prefix(prefix) {
        Some(domain) => Command::Request {
            domain: Some(domain),
            text: text.trim().to_string(),
        },
        None => Command::UnknownPrefix(prefix.to_string()),
    }
}

/// What the REPL should do after a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Exit,
    Silent,
    Text(String),
}

pub struct Session {
    detector: KeywordDetector,
    handlers: HandlerTable,
}

impl Session {
    pub fn new(detector: KeywordDetector, handlers: HandlerTable) -> Self {
        Self { detector, handlers }
    }

    pub async fn respond(&self, line: &str) -> Response {
        match parse_line(line) {
            Command::Empty => Response::Silent,
            Command::Exit => Response::Exit,
            Command::Help => Response::Text(HELP_TEXT.to_string()),
            Command::UnknownPrefix(prefix) => {
                Response::Text(format!("Unknown prefix /{prefix}. Type /help for the list."))
            }
            Command::Request { domain: Some(domain), text } if text.is_empty() => {
                Response::Text(format!("What should I do in {}?", domain.label()))
            }
            Command::Request { domain, text } => {
                let (intent, detected) = match domain {
                    Some(domain) => {
                        let intent = DomainIntent::new(domain, text.as_str(), 1.0);
                        let detected = self.detector.detect(domain, &text).await;
                        (intent, detected)
                    }
                    None => self.detector.route(&text).await,
                };
                tracing::info!(
                    request_id = %intent.id,
                    domain = %intent.domain,
                    classifier_confidence = intent.confidence,
                    "request routed"
                );
                let outcome = self.handlers.handle(&intent.raw_text, &detected).await;
                Response::Text(render(&detected, &outcome))
            }
        }
    }
}

/// Plain-text rendering of a handler outcome.
pub fn render(detected: &ConsensusResult, outcome: &HandlerOutcome) -> String {
    match outcome {
        HandlerOutcome::Reply(text) => text.clone(),
        HandlerOutcome::NeedsInput(question) => question.clone(),
        HandlerOutcome::Call(call) => {
            let body = serde_json::to_string_pretty(call).unwrap_or_else(|e| format!("{call:?} ({e})"));
            format!(
                "[{}] {} (confidence {:.2}{})\n{body}",
                detected.domain.label(),
                detected.action,
                detected.confidence,
                if detected.agreement { ", extractors agree" } else { "" },
            )
        }
    }
}

//! Model-backed extraction.
//!
//! Sends the domain prompt through a `ChatModel` and parses the JSON reply
//! into an `ExtractionResult`. Never fails: call errors become action
//! "error" and unparseable replies fall back to keyword sniffing.

use std::sync::Arc;

use serde_json::Value;
use sy_llm::ChatModel;
use sy_protocol::{ChatMessage, Domain, ExtractionResult, ExtractionSource, FieldValue, Fields};

use crate::prompts::{action_vocabulary, extraction_instructions, extraction_request};

/// Confidence reported when the action was sniffed from an unparseable reply.
pub const SNIFFED_CONFIDENCE: f64 = 0.5;

/// Extractor that asks a language model for the action and fields.
#[derive(Clone)]
pub struct ModelExtractor {
    model: Arc<dyn ChatModel>,
}

impl ModelExtractor {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub async fn extract(&self, domain: Domain, raw_text: &str) -> ExtractionResult {
        let messages = [
            ChatMessage::system(extraction_instructions(domain)),
            ChatMessage::user(extraction_request(raw_text.trim())),
        ];
        match self.model.complete(&messages).await {
            Ok(reply) => parse_reply(domain, &reply),
            Err(e) => {
                tracing::warn!(domain = domain.as_str(), error = %e, "model extraction failed");
                ExtractionResult::error(ExtractionSource::Model, e)
            }
        }
    }
}

/// Turn a model reply into a result for `domain`.
pub fn parse_reply(domain: Domain, reply: &str) -> ExtractionResult {
    let parsed = extract_json(reply)
        .and_then(|json| serde_json::from_str::<Value>(json).ok())
        .filter(Value::is_object);

    let Some(value) = parsed else {
        tracing::debug!(domain = domain.as_str(), "model reply was not JSON, sniffing keywords");
        return sniff_action(domain, reply);
    };
    let Some(action) = value.get("action").and_then(Value::as_str) else {
        return sniff_action(domain, reply);
    };

    let action = action.trim().to_lowercase();
    let rationale = value
        .get("reasoning")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if !action_vocabulary(domain).contains(&action.as_str()) {
        tracing::debug!(domain = domain.as_str(), action = %action, "model returned action outside vocabulary");
        let rationale = format!("model returned unsupported action \"{action}\"");
        return ExtractionResult::unknown(ExtractionSource::Model, rationale);
    }

    let confidence = value.get("confidence").map(parse_confidence).unwrap_or(0.0);
    let fields = value
        .get("extracted_values")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| FieldValue::from_json(v).map(|fv| (k.clone(), fv)))
                .collect::<Fields>()
        })
        .unwrap_or_default();

    ExtractionResult::new(ExtractionSource::Model, action, confidence, fields, rationale)
}

/// Number or numeric string; anything else is 0.0. Clamping happens in `ExtractionResult::new`.
fn parse_confidence(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// First vocabulary action mentioned anywhere in the reply.
fn sniff_action(domain: Domain, reply: &str) -> ExtractionResult {
    let lower = reply.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .collect();
    let hit = action_vocabulary(domain)
        .iter()
        .find(|action| words.contains(*action));

    match hit {
        Some(action) => ExtractionResult::new(
            ExtractionSource::Model,
            *action,
            SNIFFED_CONFIDENCE,
            Fields::new(),
            format!("reply was not JSON; found \"{action}\" in the text"),
        ),
        None => ExtractionResult::unknown(
            ExtractionSource::Model,
            "reply was not JSON and named no known action",
        ),
    }
}

/// Extract the JSON object from model output that may be wrapped in
/// markdown code blocks or surrounded by prose.
pub fn extract_json(text: &str) -> Option<&str> {
    let trimmed = text.trim();

    // Try ```json ... ``` first
    let fenced = if let Some(start) = trimmed.find("```json") {
        let after_fence = &trimmed[start + 7..];
        after_fence.find("```").map(|end| after_fence[..end].trim())
    } else if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        after_fence.find("```").map(|end| after_fence[..end].trim())
    } else {
        None
    };

    first_object(fenced.unwrap_or(trimmed))
}

/// First balanced `{...}` in `text`, skipping braces inside string literals.
fn first_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

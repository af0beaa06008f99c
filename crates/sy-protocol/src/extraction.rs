use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::Domain;

/// Action reported when no template or model answer could be matched.
pub const ACTION_UNKNOWN: &str = "unknown";
/// Action reported when extraction itself failed (timeout, transport error).
pub const ACTION_ERROR: &str = "error";

/// A single extracted field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Text(String),
}

impl FieldValue {
    /// Convert a loosely-typed JSON value (as returned by a model) into a field.
    ///
    /// Nulls, empty strings, arrays and objects yield `None`. Integral floats
    /// become integers; numeric strings stay text and are parsed on access.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(FieldValue::Int(i))
                } else {
                    let f = n.as_f64()?;
                    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                        Some(FieldValue::Int(f as i64))
                    } else {
                        Some(FieldValue::Text(n.to_string()))
                    }
                }
            }
            serde_json::Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
                    None
                } else {
                    Some(FieldValue::Text(trimmed.to_string()))
                }
            }
            serde_json::Value::Bool(b) => Some(FieldValue::Text(b.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            FieldValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Empty text counts as absent for merge purposes.
    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.trim().is_empty())
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Int(i) => write!(f, "{i}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

/// Extracted fields, keyed by field name. Ordered for deterministic output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(BTreeMap<String, FieldValue>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value; empty text is dropped so it never masks a real value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let value = value.into();
        if !value.is_empty() {
            self.0.insert(name.into(), value);
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name).filter(|v| !v.is_empty())
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(FieldValue::as_int)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }
}

impl FromIterator<(String, FieldValue)> for Fields {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

/// Which extractor produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    /// Deterministic regex/heuristic templates.
    Pattern,
    /// Language-model extraction.
    Model,
}

/// Output of one extractor for one request. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Domain-specific action (e.g. "commits", "builds", "ticket").
    pub action: String,
    /// Confidence in [0, 1].
    pub confidence: f64,
    /// Extracted parameters.
    #[serde(default)]
    pub fields: Fields,
    /// Free-text explanation of how the result was reached.
    #[serde(default)]
    pub rationale: String,
    pub source: ExtractionSource,
}

impl ExtractionResult {
    pub fn new(
        source: ExtractionSource,
        action: impl Into<String>,
        confidence: f64,
        fields: Fields,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            confidence: if confidence.is_finite() {
                confidence.clamp(0.0, 1.0)
            } else {
                0.0
            },
            fields,
            rationale: rationale.into(),
            source,
        }
    }

    /// Nothing matched: action "unknown", confidence 0.3, no fields.
    pub fn unknown(source: ExtractionSource, rationale: impl Into<String>) -> Self {
        Self::new(source, ACTION_UNKNOWN, 0.3, Fields::new(), rationale)
    }

    /// Extraction failed outright: action "error", confidence 0.0.
    pub fn error(source: ExtractionSource, reason: impl std::fmt::Display) -> Self {
        Self::new(
            source,
            ACTION_ERROR,
            0.0,
            Fields::new(),
            format!("Detection failed: {reason}"),
        )
    }

    pub fn is_unknown(&self) -> bool {
        self.action == ACTION_UNKNOWN
    }

    pub fn is_error(&self) -> bool {
        self.action == ACTION_ERROR
    }
}

/// Merge of a pattern result and a model result for the same domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub domain: Domain,
    /// Final action handlers should act on.
    pub action: String,
    /// Winner's fields, backfilled from the loser.
    pub fields: Fields,
    /// True iff both extractors chose the same action.
    pub agreement: bool,
    /// Final confidence in [0, 1].
    pub confidence: f64,
    /// Which extractor's action was selected.
    pub winner: ExtractionSource,
    /// Inputs, kept for audit and debug output.
    pub pattern: ExtractionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ExtractionResult>,
}

impl ConsensusResult {
    /// Consensus when only the pattern extractor ran (e.g. chat).
    pub fn from_pattern(domain: Domain, pattern: ExtractionResult) -> Self {
        Self {
            domain,
            action: pattern.action.clone(),
            fields: pattern.fields.clone(),
            agreement: false,
            confidence: pattern.confidence,
            winner: ExtractionSource::Pattern,
            pattern,
            model: None,
        }
    }

    /// Handlers treat these as "fall back to a safe default".
    pub fn is_actionable(&self) -> bool {
        self.action != ACTION_UNKNOWN && self.action != ACTION_ERROR
    }
}

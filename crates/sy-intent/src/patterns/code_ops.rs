//! Code-operation templates. The whole request is the instruction.

use std::sync::LazyLock;

use regex::Regex;
use sy_protocol::{ExtractionResult, Fields};

use super::{capture, ci_regex, matched};

static RE_PLAN: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(plan|design|architect|roadmap|strategy)\b"));
static RE_FIX: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(fix|debug|repair|resolve|troubleshoot)\b"));
static RE_TEST: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(tests?|unit\s+tests?|coverage)\b"));
static RE_REVIEW: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(review|audit|critique|check)\b"));
static RE_EXPLAIN: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(explain|describe|what\s+does|how\s+does|walk\s+me\s+through)\b"));
static RE_GENERATE: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(generate|create|write|scaffold|implement|add)\b"));
static RE_EDIT: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(edit|modify|change|update|refactor|rename|replace)\b"));

static RE_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"((?:[\w.-]+/)*[\w-]+\.(?:rs|py|ts|tsx|js|jsx|go|java|kt|rb|cs|cpp|cc|c|h|hpp|toml|ya?ml|json|md|sh|sql))\b",
    )
    .unwrap()
});

pub fn extract(text: &str) -> Option<ExtractionResult> {
    let action = if RE_PLAN.is_match(text) {
        "plan"
    } else if RE_FIX.is_match(text) {
        "fix"
    } else if RE_TEST.is_match(text) {
        "test"
    } else if RE_REVIEW.is_match(text) {
        "review"
    } else if RE_EXPLAIN.is_match(text) {
        "explain"
    } else if RE_GENERATE.is_match(text) {
        "generate"
    } else if RE_EDIT.is_match(text) {
        "edit"
    } else {
        return None;
    };

    let mut fields = Fields::new().with("instruction", text);
    let file_path = capture(&RE_FILE, text);
    if let Some(path) = &file_path {
        fields.insert("file_path", path.as_str());
    }

    let (confidence, rationale) = match &file_path {
        Some(path) => (0.85, format!("{action} on {path}")),
        None => (0.75, format!("{action} without a target file")),
    };
    Some(matched(action, confidence, fields, rationale))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fix_with_file() {
        let r = extract("fix the panic in src/session.rs").unwrap();
        assert_eq!(r.action, "fix");
        assert_eq!(r.fields.get_str("file_path"), Some("src/session.rs"));
        assert_eq!(r.fields.get_str("instruction"), Some("fix the panic in src/session.rs"));
        assert!((r.confidence - 0.85).abs() < f64::EPSILON);
    }

    #[test]
    fn plan_outranks_generate() {
        let r = extract("plan how to write a caching layer").unwrap();
        assert_eq!(r.action, "plan");
        assert!((r.confidence - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn explain_and_edit() {
        assert_eq!(extract("explain what main.py does").unwrap().action, "explain");
        assert_eq!(extract("rename the config struct in lib.rs").unwrap().action, "edit");
    }

    #[test]
    fn no_verb() {
        assert!(extract("good morning").is_none());
    }
}

//! Code-graph templates: dependencies, impact, relationships, repository listing, stats, queries.

use std::sync::LazyLock;

use regex::Regex;
use sy_protocol::{ExtractionResult, Fields};

use super::{capture, ci_regex, matched};

static RE_IMPACT: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(impact|affected|affects|what\s+breaks)\b"));
static RE_DEPENDENCIES: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(depend(s|ency|encies)?|uses)\b"));
static RE_RELATIONSHIPS: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(relationships?|related|callers?|calls|references)\b"));
static RE_LIST_REPOS: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(list|show|which|all)\b.*\b(repositor(y|ies)|repos)\b"));
static RE_STATS: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(stats|statistics|summary|overview|counts?)\b"));
static RE_QUERY: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(query|cypher|find|search|neo4j|graph)\b"));

static RE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[Cc]lass\s+([A-Z]\w+)").unwrap());
// PascalCase with at least two humps after a preposition: "of PaymentController".
static RE_PASCAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:of|for|on|to)\s+([A-Z][a-z0-9]+(?:[A-Z][a-z0-9]*)+)\b").unwrap()
});
static RE_METHOD: LazyLock<Regex> = LazyLock::new(|| ci_regex(r"\b(?:method|function)\s+([a-z_]\w*)"));
static RE_CALL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b([A-Za-z_]\w*)\(\)").unwrap());
static RE_DEPTH: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\bdepth\s+(?:of\s+)?(\d+)\b|\b(\d+)\s+levels?\b"));

pub fn extract(text: &str) -> Option<ExtractionResult> {
    let action = if RE_IMPACT.is_match(text) {
        "impact"
    } else if RE_DEPENDENCIES.is_match(text) {
        "dependencies"
    } else if RE_RELATIONSHIPS.is_match(text) {
        "relationships"
    } else if RE_LIST_REPOS.is_match(text) {
        "list_repositories"
    } else if RE_STATS.is_match(text) {
        "stats"
    } else if RE_QUERY.is_match(text) {
        "query"
    } else {
        return None;
    };

    let mut fields = Fields::new();
    let class_name = capture(&RE_CLASS, text).or_else(|| capture(&RE_PASCAL, text));
    let method_name = capture(&RE_METHOD, text).or_else(|| capture(&RE_CALL, text));
    if let Some(c) = &class_name {
        fields.insert("class_name", c.as_str());
    }
    if let Some(m) = &method_name {
        fields.insert("method_name", m.as_str());
    }
    if let Some(depth) = find_depth(text) {
        fields.insert("depth", depth);
    }

    let has_target = class_name.is_some() || method_name.is_some();
    let confidence = match action {
        "list_repositories" => 0.9,
        "stats" => 0.85,
        "query" if has_target => 0.85,
        "query" => 0.75,
        _ if has_target => 0.9,
        _ => 0.7,
    };

    let target = class_name.or(method_name);
    let rationale = match &target {
        Some(t) => format!("{action} for {t}"),
        None => format!("{action} without a class or method"),
    };
    Some(matched(action, confidence, fields, rationale))
}

fn find_depth(text: &str) -> Option<i64> {
    let caps = RE_DEPTH.captures(text)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> ExtractionResult {
        extract(text).unwrap()
    }

    #[test]
    fn dependencies_of_class() {
        let r = run("dependencies of class UserService");
        assert_eq!(r.action, "dependencies");
        assert_eq!(r.fields.get_str("class_name"), Some("UserService"));
        assert!((r.confidence - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn impact_of_method_with_depth() {
        let r = run("impact analysis for method validateUser depth 3");
        assert_eq!(r.action, "impact");
        assert_eq!(r.fields.get_str("method_name"), Some("validateUser"));
        assert_eq!(r.fields.get_int("depth"), Some(3));
    }

    #[test]
    fn relationships_pascal_case() {
        let r = run("relationships for PaymentController");
        assert_eq!(r.action, "relationships");
        assert_eq!(r.fields.get_str("class_name"), Some("PaymentController"));
    }

    #[test]
    fn repository_listing_and_stats() {
        assert_eq!(run("list all repositories in neo4j").action, "list_repositories");
        assert_eq!(run("neo4j graph statistics").action, "stats");
    }

    #[test]
    fn missing_target_lowers_confidence() {
        let r = run("show dependencies 2 levels deep");
        assert_eq!(r.fields.get_int("depth"), Some(2));
        assert!((r.confidence - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn free_query() {
        let r = run("query the graph for OrderService");
        assert_eq!(r.action, "query");
        assert_eq!(r.fields.get_str("class_name"), Some("OrderService"));
    }
}

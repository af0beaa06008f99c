//! Monitoring templates: resources, applications, health, performance, alerts.

use std::sync::LazyLock;

use regex::Regex;
use sy_protocol::{ExtractionResult, Fields};

use super::{capture, ci_regex, matched};

static RE_ALERTS: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(alerts?|alarms?|violations?|incidents?)\b"));
static RE_HEALTH: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(health|healthy|up\s+or\s+down|status\s+of)\b"));
static RE_PERFORMANCE: LazyLock<Regex> = LazyLock::new(|| {
    ci_regex(r"\b(performance|response\s+times?|latency|slow|throughput|business\s+transactions?)\b")
});
static RE_RESOURCES: LazyLock<Regex> = LazyLock::new(|| {
    ci_regex(r"\b(resources?|utili[sz]ation|usage|cpu|memory|disk|network)\b")
});
static RE_APPLICATIONS: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(applications|apps|monitored)\b"));

static RE_METRIC: LazyLock<Regex> = LazyLock::new(|| {
    ci_regex(r"\b(cpu|memory|mem|ram|disk|storage|network|response\s+times?|latency)\b")
});
static RE_APP_NAME: LazyLock<Regex> = LazyLock::new(|| {
    ci_regex(r"\b(?:of|for|on)\s+(?:the\s+)?(?:app(?:lication)?\s+)?([\w.-]+)")
});
static RE_APP_EXPLICIT: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\bapp(?:lication)?\s+(?:named\s+)?([\w.-]+)"));
static RE_RANGE_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    ci_regex(r"\b(?:last|past)\s+(\d+)\s*(minutes?|mins?|m|hours?|hrs?|h|days?|d|weeks?|w)\b")
});
static RE_RANGE_SHORT: LazyLock<Regex> = LazyLock::new(|| ci_regex(r"\b(\d+)(m|h|d|w)\b"));
static RE_RANGE_SINGULAR: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(?:last|past)\s+(hour|day|week)\b|\b(today)\b"));
static RE_THRESHOLD: LazyLock<Regex> = LazyLock::new(|| {
    ci_regex(r"\b(?:threshold|above|over|exceeds?|exceeding|greater\s+than)\s*(?:of\s+)?(\d+)\s*%?")
});

/// Words that follow "of"/"for" but are not application names.
const NOT_APPS: &[&str] = &[
    "the", "all", "my", "our", "last", "past", "cpu", "memory", "disk", "network", "response",
    "latency", "today", "appdynamics", "appd", "apps", "applications", "resources", "health",
    "performance", "alerts", "usage", "utilization", "utilisation",
];

pub fn extract(text: &str) -> Option<ExtractionResult> {
    let action = if RE_ALERTS.is_match(text) {
        "alerts"
    } else if RE_HEALTH.is_match(text) {
        "health"
    } else if RE_PERFORMANCE.is_match(text) {
        "performance"
    } else if RE_RESOURCES.is_match(text) {
        "resources"
    } else if RE_APPLICATIONS.is_match(text) {
        "applications"
    } else {
        return None;
    };

    let mut fields = Fields::new();
    let application = find_application(text);
    let metric = capture(&RE_METRIC, text).map(|m| normalize_metric(&m));
    if let Some(app) = &application {
        fields.insert("application_name", app.as_str());
    }
    if let Some(m) = &metric {
        fields.insert("metric_type", *m);
    }
    if let Some(range) = find_time_range(text) {
        fields.insert("time_range", range);
    }
    if let Some(threshold) = capture(&RE_THRESHOLD, text).and_then(|t| t.parse::<i64>().ok()) {
        fields.insert("threshold", threshold);
    }

    let confidence = match action {
        "applications" => 0.85,
        "resources" if metric.is_some() => 0.85,
        "resources" => 0.75,
        _ if application.is_some() => 0.9,
        _ => 0.75,
    };

    let rationale = match &application {
        Some(app) => format!("{action} for {app}"),
        None => format!("{action} across all applications"),
    };
    Some(matched(action, confidence, fields, rationale))
}

fn find_application(text: &str) -> Option<String> {
    let usable = |name: &String| {
        let lower = name.to_lowercase();
        !NOT_APPS.contains(&lower.as_str()) && lower.parse::<f64>().is_err()
    };
    capture(&RE_APP_EXPLICIT, text)
        .filter(usable)
        .or_else(|| {
            RE_APP_NAME
                .captures_iter(text)
                .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
                .find(usable)
        })
}

fn normalize_metric(raw: &str) -> &'static str {
    let lower = raw.to_lowercase();
    match lower.split_whitespace().next().unwrap_or_default() {
        "cpu" => "cpu",
        "memory" | "mem" | "ram" => "memory",
        "disk" | "storage" => "disk",
        "network" => "network",
        _ => "response_time",
    }
}

/// Normalize to compact "{n}{unit}" form: 30m, 1h, 24h, 7d, 2w.
fn find_time_range(text: &str) -> Option<String> {
    if let Some(c) = RE_RANGE_WORDS.captures(text) {
        let unit = match c[2].to_lowercase().chars().next() {
            Some('m') => 'm',
            Some('h') => 'h',
            Some('d') => 'd',
            _ => 'w',
        };
        return Some(format!("{}{unit}", &c[1]));
    }
    if let Some(c) = RE_RANGE_SINGULAR.captures(text) {
        let word = c.get(1).or_else(|| c.get(2))?.as_str().to_lowercase();
        return Some(
            match word.as_str() {
                "hour" => "1h",
                "week" => "7d",
                _ => "24h",
            }
            .to_string(),
        );
    }
    RE_RANGE_SHORT
        .captures(text)
        .map(|c| format!("{}{}", &c[1], c[2].to_lowercase()))
}

//! CI pipeline templates: builds, failed/running jobs, parameters, failure analysis.

use std::sync::LazyLock;

use regex::Regex;
use sy_protocol::{ExtractionResult, Fields};

use super::{PatternSettings, capture, capture_int, ci_regex, matched};

/// Suffix multibranch pipeline folders carry.
pub const MULTIBRANCH_SUFFIX: &str = "_multi";

static RE_ANALYZE: LazyLock<Regex> = LazyLock::new(|| {
    ci_regex(r"\b(analy[sz]e|investigate|diagnose|why\s+did)\b.*\bfail|\bfailure\s+analysis\b")
});
static RE_PARAMETERS: LazyLock<Regex> = LazyLock::new(|| ci_regex(r"\b(parameters?|params)\b"));
static RE_FAILED: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(failed|failing|failures?|broken)\b"));
static RE_RUNNING: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(running|in\s+progress|active|queued)\b"));
static RE_BUILDS: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(builds?|jobs?|pipelines?|jenkins)\b"));

static RE_FOLDER: LazyLock<Regex> = LazyLock::new(|| {
    ci_regex(r"\bfolder\s+([\w.-]+)(?:\s+and\s+sub\s*folder\s+([\w.-]+))?")
});
static RE_ORG_BEFORE_FOLDER: LazyLock<Regex> = LazyLock::new(|| {
    ci_regex(r"\b(?:for|in|org(?:anization)?)\s+([\w-]+)\s+and\s+folder\b")
});
static RE_DEPLOY_ALL: LazyLock<Regex> = LazyLock::new(|| ci_regex(r"\bdeploy-all\b"));
static RE_PATH: LazyLock<Regex> = LazyLock::new(|| ci_regex(r"\b([\w.-]+(?:/[\w.-]+)+)"));

static RE_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    ci_regex(r"\b(?:last|latest|recent)\s+(\d+)\b|\b(\d+)\s*(?:builds?|jobs?|runs?)\b")
});
static RE_HOURS: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(\d+)\s*(?:hours?|hrs?|h)\b"));
static RE_TIME_UNIT: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"^\s*(?:hours?|hrs?|h|days?|d|minutes?|mins?)\b"));
static RE_BUILD_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"(?:\b(?:build|run)\s*(?:number\s*)?#?\s*|#)(\d+)\b"));
static RE_JOB_NAME: LazyLock<Regex> = LazyLock::new(|| ci_regex(r"\bjob\s+([\w.-]+)"));

const NOT_JOB_NAMES: &[&str] = &["for", "in", "of", "on", "the", "and", "from", "with"];

pub fn extract(text: &str, settings: &PatternSettings) -> Option<ExtractionResult> {
    let action = if RE_ANALYZE.is_match(text) {
        "analyze_failure"
    } else if RE_PARAMETERS.is_match(text) {
        "build_parameters"
    } else if RE_FAILED.is_match(text) {
        "failed_jobs"
    } else if RE_RUNNING.is_match(text) {
        "running_jobs"
    } else if RE_BUILDS.is_match(text) || RE_FOLDER.is_match(text) || RE_DEPLOY_ALL.is_match(text) {
        "builds"
    } else {
        return None;
    };

    let mut fields = Fields::new();
    let folder_path = find_folder_path(text, &settings.organization);
    if let Some(path) = &folder_path {
        fields.insert("folder_path", path.as_str());
    }
    if let Some(count) = find_count(text) {
        fields.insert("count", count);
    }
    if let Some(hours) = capture_int(&RE_HOURS, text) {
        fields.insert("hours", hours);
    }
    let build_number = capture_int(&RE_BUILD_NUMBER, text);
    if let Some(n) = build_number {
        fields.insert("build_number", n);
    }
    let job_name = capture(&RE_JOB_NAME, text).filter(|j| {
        !NOT_JOB_NAMES.contains(&j.to_lowercase().as_str()) && j.parse::<i64>().is_err()
    });
    if let Some(job) = &job_name {
        fields.insert("job_name", job.as_str());
    }

    // Primary field per action.
    let complete = match action {
        "analyze_failure" => job_name.is_some() || build_number.is_some(),
        "build_parameters" => job_name.is_some() || folder_path.is_some(),
        _ => folder_path.is_some(),
    };
    let confidence = match (action, complete) {
        ("builds", true) | ("analyze_failure", true) => 0.9,
        (_, true) => 0.85,
        ("failed_jobs", false) | ("running_jobs", false) => 0.75,
        _ => 0.7,
    };

    let rationale = match &folder_path {
        Some(path) => format!("{action} in {path}"),
        None => format!("{action} without a folder"),
    };
    Some(matched(action, confidence, fields, rationale))
}

/// "folder X and sub folder Y" → `{org}/X_multi/Y`; "deploy-all" →
/// `{org}/deploy-all`; a literal `a/b[/c]` path is kept as written.
pub fn find_folder_path(text: &str, default_org: &str) -> Option<String> {
    if let Some(caps) = RE_FOLDER.captures(text) {
        let org = capture(&RE_ORG_BEFORE_FOLDER, text).unwrap_or_else(|| default_org.to_string());
        let folder = multibranch_folder(&caps[1]);
        return Some(match caps.get(2) {
            Some(sub) => format!("{org}/{folder}/{}", sub.as_str()),
            None => format!("{org}/{folder}"),
        });
    }
    if let Some(path) = capture(&RE_PATH, text) {
        return Some(path);
    }
    if RE_DEPLOY_ALL.is_match(text) {
        return Some(format!("{default_org}/deploy-all"));
    }
    None
}

/// Append the multibranch suffix unless already present.
pub fn multibranch_folder(name: &str) -> String {
    if name.ends_with(MULTIBRANCH_SUFFIX) {
        name.to_string()
    } else {
        format!("{name}{MULTIBRANCH_SUFFIX}")
    }
}

/// "last 5", "5 builds"; "last 6 hours" is a window, not a count.
fn find_count(text: &str) -> Option<i64> {
    RE_COUNT.captures_iter(text).find_map(|caps| {
        let m = caps.get(1).or_else(|| caps.get(2))?;
        if RE_TIME_UNIT.is_match(&text[m.end()..]) {
            return None;
        }
        m.as_str().parse().ok().filter(|n: &i64| *n > 0)
    })
}

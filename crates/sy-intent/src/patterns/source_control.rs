//! Source-control templates: commits, pull requests, clones.

use std::sync::LazyLock;

use regex::Regex;
use sy_protocol::{ExtractionResult, Fields};

use super::{PatternSettings, capture, capture_int, ci_regex, matched};

static RE_COMMITS: LazyLock<Regex> = LazyLock::new(|| ci_regex(r"\bcommits?\b"));
static RE_PR: LazyLock<Regex> = LazyLock::new(|| ci_regex(r"\b(prs?|pull\s+requests?)\b"));
static RE_CLONE: LazyLock<Regex> = LazyLock::new(|| ci_regex(r"\b(clone|fetch)\b"));

// org/repo phrasings, most explicit first. Each yields (org, repo).
static RE_SLASH: LazyLock<Regex> = LazyLock::new(|| ci_regex(r"\b([\w-]+)/([\w.-]+)\b"));
static RE_REPO_IN_ORG: LazyLock<Regex> = LazyLock::new(|| {
    ci_regex(r"\brepository\s+([\w.-]+)\s+in\s+(?:the\s+)?organi[sz]ation\s+([\w.-]+)")
});
static RE_ORG_REPO: LazyLock<Regex> = LazyLock::new(|| {
    ci_regex(r"\borgani[sz]ation\s+([\w.-]+)\s+(?:and\s+)?repository\s+([\w.-]+)")
});
static RE_X_REPO_IN_Y_ORG: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b([\w.-]+)\s+repo\s+in\s+([\w.-]+)\s+org\b"));

static RE_KNOWN_BRANCH: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(rc[1-4]|main|master|develop|dev)\b"));
static RE_BRANCH_NAMED: LazyLock<Regex> = LazyLock::new(|| ci_regex(r"\bbranch\s+([\w./-]+)"));
static RE_NAMED_BRANCH: LazyLock<Regex> = LazyLock::new(|| ci_regex(r"\b([\w./-]+)\s+branch\b"));
static RE_IN_ON: LazyLock<Regex> = LazyLock::new(|| ci_regex(r"\b(?:in|on)\s+([\w.-]+)(/?)"));

static RE_LAST_N: LazyLock<Regex> = LazyLock::new(|| ci_regex(r"\b(?:last|latest|recent)\s+(\d+)\b"));
static RE_N_ITEMS: LazyLock<Regex> = LazyLock::new(|| {
    ci_regex(r"\b(\d+)\s+(?:most\s+recent\s+|latest\s+|recent\s+)?(?:commits?|prs?|pull\s+requests?)\b")
});
static RE_LATEST_ONE: LazyLock<Regex> =
    LazyLock::new(|| ci_regex(r"\b(?:latest|last|most\s+recent)\s+commit\b"));
static RE_HEX: LazyLock<Regex> = LazyLock::new(|| ci_regex(r"\b([0-9a-f]{7,40})\b"));

const NOT_BRANCHES: &[&str] = &[
    "the", "a", "an", "my", "our", "this", "that", "in", "on", "for", "from", "of", "to", "and",
    "github", "git", "repo", "repository", "organization", "organisation", "org",
];

pub fn extract(text: &str, settings: &PatternSettings) -> Option<ExtractionResult> {
    let commit_sha = find_commit_sha(text);

    let action = if RE_COMMITS.is_match(text) || commit_sha.is_some() {
        "commits"
    } else if RE_PR.is_match(text) {
        "pr"
    } else if RE_CLONE.is_match(text) {
        "clone"
    } else {
        return None;
    };

    let mut fields = Fields::new();
    let org_repo = find_org_repo(text);
    if let Some((org, repo)) = &org_repo {
        fields.insert("org", org.as_str());
        fields.insert("repo", repo.as_str());
    }
    if let Some(branch) = find_branch(text, org_repo.as_ref()) {
        fields.insert("branch", branch);
    }
    if let Some(sha) = &commit_sha {
        fields.insert("commit_sha", sha.as_str());
    }

    let count = capture_int(&RE_LAST_N, text)
        .or_else(|| capture_int(&RE_N_ITEMS, text))
        .or_else(|| RE_LATEST_ONE.is_match(text).then_some(1));
    match count {
        Some(n) if n > 0 => fields.insert("count", n),
        _ if action == "commits" && org_repo.is_some() && commit_sha.is_none() => {
            fields.insert("count", settings.default_commit_count)
        }
        _ => {}
    }

    let confidence = match (action, org_repo.is_some()) {
        ("commits", true) => 0.9,
        ("pr", true) | ("clone", true) => 0.85,
        _ => 0.7,
    };
    let rationale = match &org_repo {
        Some((org, repo)) => format!("{action} request for {org}/{repo}"),
        None => format!("{action} request without a repository"),
    };

    Some(matched(action, confidence, fields, rationale))
}

fn find_org_repo(text: &str) -> Option<(String, String)> {
    let pair = |re: &Regex, org_idx: usize, repo_idx: usize| {
        re.captures(text)
            .map(|c| (c[org_idx].to_string(), c[repo_idx].to_string()))
    };
    pair(&RE_SLASH, 1, 2)
        .or_else(|| pair(&RE_REPO_IN_ORG, 2, 1))
        .or_else(|| pair(&RE_ORG_REPO, 1, 2))
        .or_else(|| pair(&RE_X_REPO_IN_Y_ORG, 2, 1))
}

fn find_branch(text: &str, org_repo: Option<&(String, String)>) -> Option<String> {
    let real = |b: &String| !NOT_BRANCHES.contains(&b.to_lowercase().as_str());
    let named = capture(&RE_BRANCH_NAMED, text)
        .filter(real)
        .or_else(|| capture(&RE_NAMED_BRANCH, text).filter(real));
    if let Some(b) = named {
        return Some(b);
    }
    if let Some(b) = capture(&RE_KNOWN_BRANCH, text) {
        return Some(b.to_lowercase());
    }

    // "in X" / "on X": only when X is not part of an org/repo and not filler.
    let is_org_or_repo =
        |token: &str| org_repo.is_some_and(|(org, repo)| token == org || token == repo);
    RE_IN_ON.captures_iter(text).find_map(|c| {
        let token = c.get(1)?.as_str();
        let followed_by_slash = c.get(2).is_some_and(|m| !m.as_str().is_empty());
        let usable = !followed_by_slash
            && !is_org_or_repo(token)
            && !NOT_BRANCHES.contains(&token.to_lowercase().as_str())
            && !token.chars().all(|ch| ch.is_ascii_digit());
        usable.then(|| token.to_string())
    })
}

/// 7-40 hex chars with at least one digit and one letter.
fn find_commit_sha(text: &str) -> Option<String> {
    RE_HEX.captures_iter(text).find_map(|c| {
        let token = c.get(1)?.as_str();
        let has_digit = token.chars().any(|ch| ch.is_ascii_digit());
        let has_alpha = token.chars().any(|ch| ch.is_ascii_alphabetic());
        (has_digit && has_alpha).then(|| token.to_lowercase())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> ExtractionResult {
        extract(text, &PatternSettings::default()).expect("template should match")
    }

    #[test]
    fn last_five_commits() {
        let r = run("get last 5 commits from scimarketplace/quote");
        assert_eq!(r.action, "commits");
        assert_eq!(r.fields.get_str("org"), Some("scimarketplace"));
        assert_eq!(r.fields.get_str("repo"), Some("quote"));
        assert_eq!(r.fields.get_int("count"), Some(5));
        assert!(r.confidence >= 0.7);
    }

    #[test]
    fn default_count_when_repo_named() {
        let r = run("show commits for tusharacc/cli_assist");
        assert_eq!(r.fields.get_int("count"), Some(5));
    }

    #[test]
    fn latest_commit_is_count_one() {
        let r = run("latest commit in scimarketplace/quote on rc2");
        assert_eq!(r.fields.get_int("count"), Some(1));
        assert_eq!(r.fields.get_str("branch"), Some("rc2"));
    }

    #[test]
    fn natural_language_org_repo() {
        let r = run("show pull requests for repository quote in organization scimarketplace");
        assert_eq!(r.action, "pr");
        assert_eq!(r.fields.get_str("org"), Some("scimarketplace"));
        assert_eq!(r.fields.get_str("repo"), Some("quote"));

        let r = run("list PRs for organization scimarketplace repository externaldata");
        assert_eq!(r.fields.get_str("repo"), Some("externaldata"));

        let r = run("clone quote repo in scimarketplace org");
        assert_eq!(r.action, "clone");
        assert_eq!(r.fields.get_str("org"), Some("scimarketplace"));
        assert_eq!(r.fields.get_str("repo"), Some("quote"));
    }

    #[test]
    fn explicit_branch_names() {
        let r = run("PRs for scimarketplace/quote branch feature/login");
        assert_eq!(r.fields.get_str("branch"), Some("feature/login"));
        let r = run("commits on hotfix-12 branch in scimarketplace/quote");
        assert_eq!(r.fields.get_str("branch"), Some("hotfix-12"));
    }

    #[test]
    fn in_on_skips_repository_tokens() {
        let r = run("last 3 commits in scimarketplace/quote");
        assert!(r.fields.get_str("branch").is_none());
        let r = run("commits in the quote repo in scimarketplace org");
        assert!(r.fields.get_str("branch").is_none());
    }

    #[test]
    fn commit_sha_requires_digit_and_letter() {
        let r = run("show commit a1b2c3d4 in scimarketplace/quote");
        assert_eq!(r.fields.get_str("commit_sha"), Some("a1b2c3d4"));
        assert!(r.fields.get_int("count").is_none());

        let r = run("show commits from 20240101 in scimarketplace/quote");
        assert!(r.fields.get_str("commit_sha").is_none());
    }

    #[test]
    fn missing_repo_lowers_confidence() {
        let with_repo = run("show commits for scimarketplace/quote");
        let without = run("show recent commits");
        assert!(without.confidence < with_repo.confidence);
        assert!(without.fields.get_int("count").is_none());
    }

    #[test]
    fn no_verb_no_match() {
        assert!(extract("scimarketplace/quote", &PatternSettings::default()).is_none());
    }
}

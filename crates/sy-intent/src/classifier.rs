//! Domain classification by ordered signal groups.
//!
//! Groups are checked in `Domain::ALL` order and the first group with a
//! triggering signal wins; there is no cross-group scoring. A group's
//! confidence is the fraction of all its signals (triggers and supporting
//! signals) that hit, floored at the group minimum.

use std::sync::LazyLock;

use regex::Regex;
use sy_protocol::{Domain, DomainIntent};

struct SignalGroup {
    domain: Domain,
    /// Any hit selects the group.
    triggers: Vec<Regex>,
    /// Only raise confidence once the group is selected.
    support: Vec<Regex>,
    floor: f64,
}

impl SignalGroup {
    fn new(domain: Domain, floor: f64, triggers: &[&str], support: &[&str]) -> Self {
        let compile = |patterns: &[&str]| {
            patterns
                .iter()
                .map(|p| Regex::new(p).unwrap())
                .collect::<Vec<_>>()
        };
        Self {
            domain,
            triggers: compile(triggers),
            support: compile(support),
            floor,
        }
    }

    fn score(&self, text: &str) -> Option<f64> {
        let triggered = self.triggers.iter().filter(|re| re.is_match(text)).count();
        if triggered == 0 {
            return None;
        }
        let supported = self.support.iter().filter(|re| re.is_match(text)).count();
        let total = self.triggers.len() + self.support.len();
        let fraction = (triggered + supported) as f64 / total as f64;
        Some(fraction.max(self.floor))
    }
}

static GROUPS: LazyLock<Vec<SignalGroup>> = LazyLock::new(|| {
    vec![
        SignalGroup::new(
            Domain::IssueTracker,
            0.6,
            &[
                r"\b[A-Z][A-Z0-9]+-\d+\b",
                r"(?i)\bjira\b",
                r"(?i)\btickets?\b",
            ],
            &[r"(?i)\b(comments?|assignee|reporter|story|epic)\b"],
        ),
        SignalGroup::new(
            Domain::SourceControl,
            0.5,
            &[
                r"(?i)\b(github|git)\b",
                r"(?i)\bcommits?\b",
                r"(?i)\b(pull\s+requests?|prs?)\b",
                r"(?i)\bclone\b",
            ],
            &[
                r"\b[\w-]+/[\w.-]+\b",
                r"(?i)\b(rc[1-4]|main|master|develop|dev)\b",
                r"(?i)\b(repo|repository|organi[sz]ation|org)\b",
            ],
        ),
        SignalGroup::new(
            Domain::CiPipeline,
            0.5,
            &[
                r"(?i)\bjenkins\b",
                r"(?i)\b(builds?|pipelines?|jobs?)\b",
                r"(?i)\bfolder\s+[\w.-]+\s+and\s+sub\s*folder\b",
                r"(?i)\bdeploy-all\b",
            ],
            &[r"(?i)\b(failed|failing|running|queued|parameters?)\b"],
        ),
        SignalGroup::new(
            Domain::GraphDb,
            0.5,
            &[
                r"(?i)\b(neo4j|graph)\b",
                r"(?i)\bdependenc(y|ies)\s+(of|for)\b",
                r"(?i)\bimpact\s+analysis\b",
                r"(?i)\b(depends\s+on|affected\s+by|callers\s+of)\b",
            ],
            &[r"\b(class|method)\s+[A-Za-z]\w*", r"(?i)\bcypher\b"],
        ),
        SignalGroup::new(
            Domain::Monitoring,
            0.5,
            &[
                r"(?i)\b(appdynamics|appd|monitoring)\b",
                r"(?i)\b(cpu|memory|disk|network)\s+(usage|utili[sz]ation)\b",
                r"(?i)\bhealth\s+of\b",
                r"(?i)\b(resource\s+utili[sz]ation|business\s+transactions?|response\s+times?)\b",
            ],
            &[r"(?i)\b(performance|metrics|alerts?)\b"],
        ),
        SignalGroup::new(
            Domain::CodeOps,
            0.4,
            &[r"(?i)\b(edit|modify|refactor|rename|fix|debug|review|plan|implement|generate|write|create|explain|test|optimi[sz]e)\b"],
            &[
                r"(?i)\b(code|function|method|module|file|class)\b",
                r"\b[\w/.-]+\.(rs|py|js|ts|go|java|cs|rb|toml|json|ya?ml)\b",
            ],
        ),
    ]
});

/// Classify raw user text into a domain. Always succeeds; `chat` with
/// confidence 0.0 when no group triggers.
pub fn classify(raw_text: &str) -> DomainIntent {
    for group in GROUPS.iter() {
        if let Some(confidence) = group.score(raw_text) {
            tracing::debug!(domain = %group.domain, confidence, "domain classified");
            return DomainIntent::new(group.domain, raw_text, confidence);
        }
    }
    DomainIntent::new(Domain::Chat, raw_text, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain(text: &str) -> Domain {
        classify(text).domain
    }

    #[test]
    fn source_control_commits() {
        let intent = classify("get last 5 commits from scimarketplace/quote");
        assert_eq!(intent.domain, Domain::SourceControl);
        assert!(intent.confidence >= 0.5);
        assert_eq!(intent.raw_text, "get last 5 commits from scimarketplace/quote");
    }

    #[test]
    fn ci_folder_phrase() {
        assert_eq!(
            domain("get last 5 builds for scimarketplace and folder quote and sub folder RC1"),
            Domain::CiPipeline
        );
        assert_eq!(domain("show failed jobs for scimarketplace/deploy-all"), Domain::CiPipeline);
        assert_eq!(domain("folder quote and sub folder RC1"), Domain::CiPipeline);
    }

    #[test]
    fn issue_tracker_before_source_control() {
        // A ticket key wins even when git words are present.
        assert_eq!(domain("which commits reference ABC-123"), Domain::IssueTracker);
        assert_eq!(domain("show comments on jira ticket"), Domain::IssueTracker);
    }

    #[test]
    fn graph_and_monitoring() {
        assert_eq!(domain("dependencies of class UserService"), Domain::GraphDb);
        assert_eq!(domain("impact analysis for method validateUser"), Domain::GraphDb);
        assert_eq!(domain("check health of myapp"), Domain::Monitoring);
        assert_eq!(domain("show cpu usage for checkout"), Domain::Monitoring);
    }

    #[test]
    fn code_ops_verbs() {
        assert_eq!(domain("refactor src/main.rs to use traits"), Domain::CodeOps);
        assert_eq!(domain("explain this function"), Domain::CodeOps);
    }

    #[test]
    fn chat_fallback_has_zero_confidence() {
        let intent = classify("good morning!");
        assert_eq!(intent.domain, Domain::Chat);
        assert_eq!(intent.confidence, 0.0);
    }

    #[test]
    fn confidence_is_floored_and_bounded() {
        let weak = classify("jira");
        assert_eq!(weak.domain, Domain::IssueTracker);
        assert!((weak.confidence - 0.6).abs() < f64::EPSILON);

        let strong = classify("jira ticket ABC-12 comments");
        assert!((strong.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn lowercase_hyphenated_words_are_not_ticket_keys() {
        assert_ne!(domain("deploy-all status"), Domain::IssueTracker);
    }
}

use async_trait::async_trait;
use sy_protocol::{ConsensusResult, Domain};

use super::{DomainHandler, DownstreamCall, HandlerOutcome};

pub struct SourceControlHandler {
    default_count: i64,
}

impl SourceControlHandler {
    pub fn new(default_count: i64) -> Self {
        Self { default_count }
    }
}

#[async_trait]
impl DomainHandler for SourceControlHandler {
    fn domain(&self) -> Domain {
        Domain::SourceControl
    }

    async fn handle(&self, _raw_text: &str, detected: &ConsensusResult) -> HandlerOutcome {
        let fields = &detected.fields;
        let (Some(org), Some(repo)) = (fields.get_str("org"), fields.get_str("repo")) else {
            return HandlerOutcome::NeedsInput(
                "Which repository? Name it as org/repo, e.g. scimarketplace/quote.".into(),
            );
        };
        let (org, repo) = (org.to_string(), repo.to_string());
        let branch = fields.get_str("branch").map(str::to_string);

        let call = match detected.action.as_str() {
            "commits" => {
                if let Some(sha) = fields.get_str("commit_sha") {
                    DownstreamCall::CommitDetail {
                        org,
                        repo,
                        sha: sha.to_string(),
                    }
                } else {
                    match fields.get_int("count").unwrap_or(self.default_count) {
                        1 => DownstreamCall::LatestCommit { org, repo, branch },
                        count => DownstreamCall::ListCommits {
                            org,
                            repo,
                            branch,
                            count: count.max(1),
                        },
                    }
                }
            }
            "clone" => DownstreamCall::CloneRepository { org, repo, branch },
            // "pr", and anything unrecognized: listing PRs is the safe default.
            _ => DownstreamCall::ListPullRequests { org, repo, branch },
        };
        HandlerOutcome::Call(call)
    }
}

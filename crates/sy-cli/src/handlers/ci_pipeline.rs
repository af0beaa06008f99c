use async_trait::async_trait;
use sy_protocol::{ConsensusResult, Domain};

use super::{DomainHandler, DownstreamCall, HandlerOutcome};
use crate::config::DefaultsConfig;

/// Look-back window for failed jobs when none is given.
pub const DEFAULT_FAILED_HOURS: i64 = 4;

pub struct CiPipelineHandler {
    default_folder: String,
    default_count: i64,
}

impl CiPipelineHandler {
    pub fn new(defaults: &DefaultsConfig) -> Self {
        Self {
            default_folder: format!("{}/deploy-all", defaults.organization),
            default_count: defaults.default_count,
        }
    }
}

#[async_trait]
impl DomainHandler for CiPipelineHandler {
    fn domain(&self) -> Domain {
        Domain::CiPipeline
    }

    async fn handle(&self, _raw_text: &str, detected: &ConsensusResult) -> HandlerOutcome {
        let fields = &detected.fields;
        let folder_path = fields
            .get_str("folder_path")
            .map(str::to_string)
            .unwrap_or_else(|| self.default_folder.clone());
        let job_name = fields.get_str("job_name").map(str::to_string);
        let build_number = fields.get_int("build_number");

        let call = match detected.action.as_str() {
            "failed_jobs" => DownstreamCall::FailedJobs {
                folder_path,
                hours: fields
                    .get_int("hours")
                    .filter(|h| *h > 0)
                    .unwrap_or(DEFAULT_FAILED_HOURS),
            },
            "running_jobs" => DownstreamCall::RunningJobs { folder_path },
            "build_parameters" | "analyze_failure" if job_name.is_none() && build_number.is_none() => {
                return HandlerOutcome::NeedsInput(
                    "Which build? Give a job name or build number, e.g. \"build 20 in folder deploy-all\".".into(),
                );
            }
            "build_parameters" => DownstreamCall::BuildParameters {
                folder_path,
                job_name,
                build_number,
            },
            "analyze_failure" => DownstreamCall::AnalyzeFailure {
                folder_path,
                job_name,
                build_number,
            },
            _ => DownstreamCall::RecentBuilds {
                folder_path,
                count: fields
                    .get_int("count")
                    .filter(|c| *c > 0)
                    .unwrap_or(self.default_count),
            },
        };
        HandlerOutcome::Call(call)
    }
}

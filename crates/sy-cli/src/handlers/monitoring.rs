use async_trait::async_trait;
use sy_protocol::{ConsensusResult, Domain};

use super::{DomainHandler, DownstreamCall, HandlerOutcome};

const DEFAULT_TIME_RANGE: &str = "1h";

pub struct MonitoringHandler;

#[async_trait]
impl DomainHandler for MonitoringHandler {
    fn domain(&self) -> Domain {
        Domain::Monitoring
    }

    async fn handle(&self, _raw_text: &str, detected: &ConsensusResult) -> HandlerOutcome {
        let fields = &detected.fields;
        let application = fields.get_str("application_name").map(str::to_string);
        let time_range = fields
            .get_str("time_range")
            .unwrap_or(DEFAULT_TIME_RANGE)
            .to_string();

        let call = match detected.action.as_str() {
            "applications" => DownstreamCall::ListApplications,
            "resources" => DownstreamCall::ResourceMetrics {
                application,
                metric: fields.get_str("metric_type").map(str::to_string),
                time_range,
            },
            "performance" => DownstreamCall::Performance {
                application,
                time_range,
            },
            "alerts" => DownstreamCall::Alerts {
                application,
                threshold: fields.get_int("threshold"),
            },
            // "health" and anything unrecognized.
            _ => DownstreamCall::HealthOverview { application },
        };
        HandlerOutcome::Call(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::detected;
    use sy_protocol::Fields;

    async fn handle(action: &str, fields: Fields) -> HandlerOutcome {
        MonitoringHandler
            .handle("", &detected(Domain::Monitoring, action, fields))
            .await
    }

    #[tokio::test]
    async fn unknown_is_health_overview() {
        assert_eq!(
            handle("unknown", Fields::new()).await,
            HandlerOutcome::Call(DownstreamCall::HealthOverview { application: None })
        );
    }

    #[tokio::test]
    async fn resources_carry_metric_and_range() {
        let fields = Fields::new()
            .with("application_name", "checkout")
            .with("metric_type", "cpu")
            .with("time_range", "24h");
        assert_eq!(
            handle("resources", fields).await,
            HandlerOutcome::Call(DownstreamCall::ResourceMetrics {
                application: Some("checkout".into()),
                metric: Some("cpu".into()),
                time_range: "24h".into(),
            })
        );
    }

    #[tokio::test]
    async fn performance_defaults_to_last_hour() {
        assert_eq!(
            handle("performance", Fields::new()).await,
            HandlerOutcome::Call(DownstreamCall::Performance {
                application: None,
                time_range: "1h".into(),
            })
        );
    }
}

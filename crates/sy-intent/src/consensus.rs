//! Reconcile the pattern and model extractions into one decision.

use sy_protocol::{ConsensusResult, Domain, ExtractionResult, ExtractionSource, ACTION_UNKNOWN};

/// Model confidence at or above which the model wins outright.
pub const TRUST_THRESHOLD: f64 = 0.7;
/// Multiplier applied to the winner's confidence when the extractors disagree.
pub const DISAGREEMENT_PENALTY: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsensusPolicy {
    pub trust_threshold: f64,
    pub disagreement_penalty: f64,
}

impl Default for ConsensusPolicy {
    fn default() -> Self {
        Self {
            trust_threshold: TRUST_THRESHOLD,
            disagreement_penalty: DISAGREEMENT_PENALTY,
        }
    }
}

impl ConsensusPolicy {
    pub fn with_trust_threshold(trust_threshold: f64) -> Self {
        Self {
            trust_threshold: trust_threshold.clamp(0.0, 1.0),
            ..Self::default()
        }
    }

    pub fn resolve(
        &self,
        domain: Domain,
        pattern: ExtractionResult,
        model: ExtractionResult,
    ) -> ConsensusResult {
        let model_wins = model.confidence >= self.trust_threshold
            || model.confidence > pattern.confidence;
        let (winner, loser) = if model_wins {
            (&model, &pattern)
        } else {
            (&pattern, &model)
        };

        let agreement = pattern.action == model.action;

        let mut fields = winner.fields.clone();
        for (name, value) in loser.fields.iter() {
            if !fields.contains(name) {
                fields.insert(name.clone(), value.clone());
            }
        }

        let (action, confidence) = if winner.is_error() {
            (ACTION_UNKNOWN.to_string(), 0.0)
        } else if agreement {
            (winner.action.clone(), winner.confidence)
        } else {
            (winner.action.clone(), winner.confidence * self.disagreement_penalty)
        };

        let winner_source = if model_wins {
            ExtractionSource::Model
        } else {
            ExtractionSource::Pattern
        };

        tracing::debug!(
            domain = domain.as_str(),
            pattern_action = %pattern.action,
            model_action = %model.action,
            winner = ?winner_source,
            agreement,
            confidence,
            "consensus resolved"
        );

        ConsensusResult {
            domain,
            action,
            fields,
            agreement,
            confidence,
            winner: winner_source,
            pattern,
            model: Some(model),
        }
    }
}

/// `resolve` with the default threshold and penalty.
pub fn resolve(domain: Domain, pattern: ExtractionResult, model: ExtractionResult) -> ConsensusResult {
    ConsensusPolicy::default().resolve(domain, pattern, model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sy_protocol::Fields;

    fn result(source: ExtractionSource, action: &str, confidence: f64, fields: Fields) -> ExtractionResult {
        ExtractionResult::new(source, action, confidence, fields, "test")
    }

    fn pattern(action: &str, confidence: f64) -> ExtractionResult {
        result(ExtractionSource::Pattern, action, confidence, Fields::new())
    }

    fn model(action: &str, confidence: f64) -> ExtractionResult {
        result(ExtractionSource::Model, action, confidence, Fields::new())
    }

    #[test]
    fn trusted_model_wins_outright() {
        let r = resolve(Domain::CiPipeline, pattern("builds", 0.9), model("failed_jobs", 0.7));
        assert_eq!(r.action, "failed_jobs");
        assert_eq!(r.winner, ExtractionSource::Model);
        assert!(!r.agreement);
        assert!((r.confidence - 0.7 * DISAGREEMENT_PENALTY).abs() < 1e-9);
    }

    #[test]
    fn higher_confidence_wins_below_threshold() {
        let r = resolve(Domain::CiPipeline, pattern("builds", 0.6), model("failed_jobs", 0.65));
        assert_eq!(r.action, "failed_jobs");

        let r = resolve(Domain::CiPipeline, pattern("builds", 0.5), model("failed_jobs", 0.5));
        assert_eq!(r.action, "builds");
        assert_eq!(r.winner, ExtractionSource::Pattern);
    }

    #[test]
    fn agreement_keeps_winner_confidence() {
        let r = resolve(Domain::SourceControl, pattern("commits", 0.9), model("commits", 0.95));
        assert!(r.agreement);
        assert!((r.confidence - 0.95).abs() < 1e-9);
    }

    #[test]
    fn backfills_missing_fields_from_loser() {
        let p = result(
            ExtractionSource::Pattern,
            "commits",
            0.9,
            Fields::new().with("org", "scimarketplace").with("count", 5i64),
        );
        let m = result(
            ExtractionSource::Model,
            "commits",
            0.95,
            Fields::new().with("org", "acme").with("repo", "quote"),
        );
        let r = resolve(Domain::SourceControl, p, m);
        assert_eq!(r.fields.get_str("org"), Some("acme"));
        assert_eq!(r.fields.get_str("repo"), Some("quote"));
        assert_eq!(r.fields.get_int("count"), Some(5));
    }

    #[test]
    fn model_error_falls_back_to_pattern() {
        let m = ExtractionResult::error(ExtractionSource::Model, "timeout");
        let r = resolve(Domain::SourceControl, pattern("commits", 0.9), m);
        assert_eq!(r.action, "commits");
        assert!(!r.agreement);
        assert!((r.confidence - 0.9 * DISAGREEMENT_PENALTY).abs() < 1e-9);
    }

    #[test]
    fn both_failed_is_unknown() {
        let p = ExtractionResult::error(ExtractionSource::Pattern, "boom");
        let m = ExtractionResult::error(ExtractionSource::Model, "timeout");
        let r = resolve(Domain::GraphDb, p, m);
        assert_eq!(r.action, ACTION_UNKNOWN);
        assert_eq!(r.confidence, 0.0);
        assert!(!r.is_actionable());
    }

    #[test]
    fn custom_threshold() {
        let policy = ConsensusPolicy::with_trust_threshold(0.95);
        let r = policy.resolve(Domain::CiPipeline, pattern("builds", 0.9), model("failed_jobs", 0.8));
        assert_eq!(r.action, "builds");
    }

    fn action() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["commits", "pr", "clone", "unknown", "error"]).prop_map(String::from)
    }

    proptest! {
        #[test]
        fn agreement_iff_actions_equal(
            pa in action(),
            ma in action(),
            pc in 0.0f64..=1.0,
            mc in 0.0f64..=1.0,
        ) {
            let r = resolve(Domain::SourceControl, pattern(&pa, pc), model(&ma, mc));
            prop_assert_eq!(r.agreement, pa == ma);
            prop_assert!(r.confidence <= pc.max(mc) + 1e-12);
        }

        #[test]
        fn below_threshold_order_does_not_matter(
            a in action(),
            b in action(),
            low in 0.0f64..0.34,
            high in 0.35f64..0.69,
        ) {
            let first = resolve(Domain::SourceControl, pattern(&a, high), model(&b, low));
            let swapped = resolve(Domain::SourceControl, pattern(&b, low), model(&a, high));
            prop_assert_eq!(first.action, swapped.action);
            prop_assert!((first.confidence - swapped.confidence).abs() < 1e-12);
        }
    }
}

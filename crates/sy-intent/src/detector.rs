//! Hybrid keyword detector: pattern and model extraction, then consensus.

use std::sync::Arc;

use sy_llm::ChatModel;
use sy_protocol::{ConsensusResult, Domain, DomainIntent};

use crate::classifier::classify;
use crate::consensus::ConsensusPolicy;
use crate::model::ModelExtractor;
use crate::patterns::{PatternExtractor, PatternSettings};

/// Entry point handlers call to turn raw text into an action and fields.
#[derive(Clone)]
pub struct KeywordDetector {
    patterns: PatternExtractor,
    model: ModelExtractor,
    policy: ConsensusPolicy,
}

impl KeywordDetector {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self::with_settings(model, PatternSettings::default(), ConsensusPolicy::default())
    }

    pub fn with_settings(
        model: Arc<dyn ChatModel>,
        settings: PatternSettings,
        policy: ConsensusPolicy,
    ) -> Self {
        Self {
            patterns: PatternExtractor::new(settings),
            model: ModelExtractor::new(model),
            policy,
        }
    }

    pub fn patterns(&self) -> &PatternExtractor {
        &self.patterns
    }

    /// Run both extractors for `domain` and reconcile them.
    ///
    /// Chat has nothing to extract, so the model is not consulted and the
    /// pattern result is final.
    pub async fn detect(&self, domain: Domain, raw_text: &str) -> ConsensusResult {
        let pattern = self.patterns.extract(domain, raw_text);
        if domain == Domain::Chat {
            return ConsensusResult::from_pattern(domain, pattern);
        }

        let model = self.model.extract(domain, raw_text).await;
        let result = self.policy.resolve(domain, pattern, model);
        tracing::info!(
            domain = %domain,
            action = %result.action,
            confidence = result.confidence,
            agreement = result.agreement,
            fields = result.fields.len(),
            "intent detected"
        );
        result
    }

    /// Classify then detect.
    pub async fn route(&self, raw_text: &str) -> (DomainIntent, ConsensusResult) {
        let intent = classify(raw_text);
        let result = self.detect(intent.domain, &intent.raw_text).await;
        (intent, result)
    }
}

//! Task-based backend selection with ordered fallback.
//!
//! Selection:
//! 1. Explicit override (when that backend is available)
//! 2. Preference table keyed by [`TaskType`]
//! 3. Demotion along [`BackendChoice::FALLBACK_ORDER`] when the preference is unavailable
//!
//! After a failed invocation every remaining available backend is tried once,
//! in fallback order. The outcome is a [`DispatchOutcome`]; `chat()` renders
//! an exhausted outcome as a diagnostic string instead of failing.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use sy_protocol::{BackendChoice, ChatMessage, TaskType};

use crate::backends::{ChatBackend, EnterpriseBackend, HostedBackend, OllamaBackend};
use crate::config::LlmConfig;
use crate::error::{LlmError, LlmResult};
use crate::task::classify_task_type;

/// Anything that can turn a message list into reply text.
///
/// The model-backed extractor depends on this rather than on the dispatcher
/// so it can be tested against a scripted model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> LlmResult<String>;
}

/// One failed invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFailure {
    pub backend: BackendChoice,
    pub reason: String,
}

/// Result of running the candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Answered {
        backend: BackendChoice,
        text: String,
        /// Invocations made, including the successful one.
        attempts: usize,
    },
    Exhausted {
        failures: Vec<BackendFailure>,
        /// Backends never tried because they are not configured or reachable.
        unavailable: Vec<BackendChoice>,
    },
}

impl DispatchOutcome {
    /// Reply text, or a diagnostic naming every backend tried and why.
    pub fn into_text(self) -> String {
        match self {
            DispatchOutcome::Answered { text, .. } => text,
            DispatchOutcome::Exhausted {
                failures,
                unavailable,
            } => exhausted_diagnostic(&failures, &unavailable),
        }
    }
}

fn exhausted_diagnostic(failures: &[BackendFailure], unavailable: &[BackendChoice]) -> String {
    let mut out = String::from("All language-model backends failed.");
    if !failures.is_empty() {
        out.push_str("\nTried:");
        for f in failures {
            out.push_str(&format!("\n  - {}: {}", f.backend, f.reason));
        }
    }
    if !unavailable.is_empty() {
        out.push_str("\nNot available:");
        for b in unavailable {
            out.push_str(&format!("\n  - {b}: not configured or unreachable"));
        }
    }
    out
}

/// Backend that the preference table names for a task type, before
/// availability filtering.
pub fn preferred_backend(task: TaskType, enterprise_available: bool) -> BackendChoice {
    match task {
        TaskType::CodeGeneration
        | TaskType::CodeAnalysis
        | TaskType::CodeReview
        | TaskType::Refactoring
        | TaskType::Debugging => BackendChoice::PrimaryLocal,
        TaskType::Planning | TaskType::Explanation => {
            if enterprise_available {
                BackendChoice::Enterprise
            } else {
                BackendChoice::SecondaryHosted
            }
        }
    }
}

/// Routes chat requests to one of the configured backends.
pub struct Dispatcher {
    backends: BTreeMap<BackendChoice, Arc<dyn ChatBackend>>,
    available: BTreeMap<BackendChoice, bool>,
    override_choice: Option<BackendChoice>,
}

impl Dispatcher {
    /// Build every backend from configuration and probe availability once.
    pub async fn from_config(config: &LlmConfig) -> LlmResult<Self> {
        let backends: Vec<Arc<dyn ChatBackend>> = vec![
            Arc::new(OllamaBackend::new(config.ollama.clone())?),
            Arc::new(EnterpriseBackend::new(config.enterprise.clone())?),
            Arc::new(HostedBackend::new(config.hosted.clone())?),
        ];
        Ok(Self::probe(backends)
            .await
            .with_override(config.backend_override()))
    }

    /// Probe each backend's availability and keep the result for the
    /// lifetime of the dispatcher.
    pub async fn probe(backends: Vec<Arc<dyn ChatBackend>>) -> Self {
        let mut available = BTreeMap::new();
        for backend in &backends {
            let ok = backend.is_available().await;
            tracing::info!(backend = %backend.choice(), available = ok, "backend availability");
            available.insert(backend.choice(), ok);
        }
        Self::with_availability(backends, available)
    }

    /// Build with availability already known.
    pub fn with_availability(
        backends: Vec<Arc<dyn ChatBackend>>,
        available: BTreeMap<BackendChoice, bool>,
    ) -> Self {
        let backends = backends.into_iter().map(|b| (b.choice(), b)).collect();
        Self {
            backends,
            available,
            override_choice: None,
        }
    }

    pub fn with_override(mut self, choice: Option<BackendChoice>) -> Self {
        self.override_choice = choice;
        self
    }

    pub fn is_available(&self, choice: BackendChoice) -> bool {
        self.backends.contains_key(&choice) && self.available.get(&choice).copied().unwrap_or(false)
    }

    /// Availability of every backend, in fallback order.
    pub fn availability(&self) -> Vec<(BackendChoice, bool)> {
        BackendChoice::FALLBACK_ORDER
            .iter()
            .map(|&c| (c, self.is_available(c)))
            .collect()
    }

    /// Pick the backend for a task, or `None` when nothing is available.
    pub fn choose_backend(&self, task: TaskType) -> Option<BackendChoice> {
        if let Some(choice) = self.override_choice {
            if self.is_available(choice) {
                return Some(choice);
            }
            tracing::warn!(backend = %choice, "configured backend override is unavailable, using task routing");
        }

        let preferred = preferred_backend(task, self.is_available(BackendChoice::Enterprise));
        if self.is_available(preferred) {
            return Some(preferred);
        }
        BackendChoice::FALLBACK_ORDER
            .into_iter()
            .find(|&c| self.is_available(c))
    }

    /// Call one backend directly.
    pub async fn invoke(&self, choice: BackendChoice, messages: &[ChatMessage]) -> LlmResult<String> {
        let backend = self.backends.get(&choice).ok_or_else(|| LlmError::NotConfigured {
            backend: choice,
            reason: "no backend registered".into(),
        })?;
        backend.chat(messages).await
    }

    /// Classify, choose, invoke, and fall back through the remaining
    /// available backends once each.
    pub async fn dispatch(&self, messages: &[ChatMessage]) -> DispatchOutcome {
        let task = classify_task_type(messages);
        let unavailable: Vec<BackendChoice> = BackendChoice::FALLBACK_ORDER
            .into_iter()
            .filter(|&c| !self.is_available(c))
            .collect();

        let Some(first) = self.choose_backend(task) else {
            tracing::warn!(task = %task, "no language-model backend available");
            return DispatchOutcome::Exhausted {
                failures: Vec::new(),
                unavailable,
            };
        };

        let candidates = std::iter::once(first).chain(
            BackendChoice::FALLBACK_ORDER
                .into_iter()
                .filter(|&c| c != first && self.is_available(c)),
        );

        let mut failures = Vec::new();
        for (i, backend) in candidates.enumerate() {
            tracing::info!(task = %task, backend = %backend, attempt = i + 1, "dispatching chat request");
            match self.invoke(backend, messages).await {
                Ok(text) => {
                    return DispatchOutcome::Answered {
                        backend,
                        text,
                        attempts: i + 1,
                    };
                }
                Err(e) => {
                    tracing::warn!(backend = %backend, error = %e, "backend invocation failed");
                    failures.push(BackendFailure {
                        backend,
                        reason: e.to_string(),
                    });
                }
            }
        }

        DispatchOutcome::Exhausted {
            failures,
            unavailable,
        }
    }

    /// Always returns text: the reply, or a diagnostic.
    pub async fn chat(&self, messages: &[ChatMessage]) -> String {
        if messages.is_empty() {
            return "No messages to send.".to_string();
        }
        self.dispatch(messages).await.into_text()
    }
}

#[async_trait]
impl ChatModel for Dispatcher {
    async fn complete(&self, messages: &[ChatMessage]) -> LlmResult<String> {
        if messages.is_empty() {
            return Err(LlmError::Exhausted("no messages to send".into()));
        }
        match self.dispatch(messages).await {
            DispatchOutcome::Answered { text, .. } => Ok(text),
            exhausted => Err(LlmError::Exhausted(exhausted.into_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;

    fn all_available() -> BTreeMap<BackendChoice, bool> {
        BackendChoice::FALLBACK_ORDER.into_iter().map(|c| (c, true)).collect()
    }

    fn dispatcher(mocks: &[&Arc<MockBackend>], available: BTreeMap<BackendChoice, bool>) -> Dispatcher {
        let backends = mocks
            .iter()
            .map(|m| Arc::clone(*m) as Arc<dyn ChatBackend>)
            .collect();
        Dispatcher::with_availability(backends, available)
    }

    #[test]
    fn preference_table() {
        assert_eq!(preferred_backend(TaskType::CodeGeneration, true), BackendChoice::PrimaryLocal);
        assert_eq!(preferred_backend(TaskType::Debugging, true), BackendChoice::PrimaryLocal);
        assert_eq!(preferred_backend(TaskType::Planning, true), BackendChoice::Enterprise);
        assert_eq!(preferred_backend(TaskType::Explanation, false), BackendChoice::SecondaryHosted);
    }

    #[tokio::test]
    async fn first_two_fail_third_answers() {
        let local = Arc::new(MockBackend::failing(BackendChoice::PrimaryLocal, "connection refused"));
        let enterprise = Arc::new(MockBackend::failing(BackendChoice::Enterprise, "HTTP 503"));
        let hosted = Arc::new(MockBackend::replying(BackendChoice::SecondaryHosted, "from hosted"));
        let dispatcher = dispatcher(&[&local, &enterprise, &hosted], all_available());

        let outcome = dispatcher.dispatch(&[ChatMessage::user("write a function")]).await;
        assert_eq!(
            outcome,
            DispatchOutcome::Answered {
                backend: BackendChoice::SecondaryHosted,
                text: "from hosted".into(),
                attempts: 3,
            }
        );
        let total = local.call_count() + enterprise.call_count() + hosted.call_count();
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn planning_prefers_enterprise() {
        let local = Arc::new(MockBackend::replying(BackendChoice::PrimaryLocal, "local"));
        let enterprise = Arc::new(MockBackend::replying(BackendChoice::Enterprise, "enterprise"));
        let available = BTreeMap::from([
            (BackendChoice::PrimaryLocal, true),
            (BackendChoice::Enterprise, true),
            (BackendChoice::SecondaryHosted, false),
        ]);
        let dispatcher = dispatcher(&[&local, &enterprise], available);

        assert_eq!(dispatcher.choose_backend(TaskType::Planning), Some(BackendChoice::Enterprise));
        let text = dispatcher
            .chat(&[ChatMessage::user("plan the release strategy")])
            .await;
        assert_eq!(text, "enterprise");
        assert_eq!(local.call_count(), 0);
    }

    #[tokio::test]
    async fn unavailable_preference_is_demoted() {
        let enterprise = Arc::new(MockBackend::replying(BackendChoice::Enterprise, "enterprise"));
        let available = BTreeMap::from([(BackendChoice::Enterprise, true)]);
        let dispatcher = dispatcher(&[&enterprise], available);
        assert_eq!(
            dispatcher.choose_backend(TaskType::CodeGeneration),
            Some(BackendChoice::Enterprise)
        );
    }

    #[tokio::test]
    async fn override_wins_when_available() {
        let local = Arc::new(MockBackend::replying(BackendChoice::PrimaryLocal, "local"));
        let hosted = Arc::new(MockBackend::replying(BackendChoice::SecondaryHosted, "hosted"));
        let dispatcher = dispatcher(&[&local, &hosted], all_available())
            .with_override(Some(BackendChoice::SecondaryHosted));
        assert_eq!(
            dispatcher.choose_backend(TaskType::CodeGeneration),
            Some(BackendChoice::SecondaryHosted)
        );
    }

    #[tokio::test]
    async fn exhausted_names_every_backend() {
        let local = Arc::new(MockBackend::failing(BackendChoice::PrimaryLocal, "connection refused"));
        let available = BTreeMap::from([(BackendChoice::PrimaryLocal, true)]);
        let dispatcher = dispatcher(&[&local], available);

        let text = dispatcher.chat(&[ChatMessage::user("explain lifetimes")]).await;
        assert!(text.contains("ollama"));
        assert!(text.contains("connection refused"));
        assert!(text.contains("enterprise"));
        assert!(text.contains("openai"));
    }

    #[tokio::test]
    async fn nothing_available() {
        let dispatcher = Dispatcher::with_availability(Vec::new(), BTreeMap::new());
        assert_eq!(dispatcher.choose_backend(TaskType::Planning), None);
        let outcome = dispatcher.dispatch(&[ChatMessage::user("hi")]).await;
        assert!(matches!(outcome, DispatchOutcome::Exhausted { ref failures, .. } if failures.is_empty()));
    }

    #[tokio::test]
    async fn empty_messages_are_diagnosed() {
        let local = Arc::new(MockBackend::replying(BackendChoice::PrimaryLocal, "local"));
        let dispatcher = dispatcher(&[&local], all_available());
        assert_eq!(dispatcher.chat(&[]).await, "No messages to send.");
        assert_eq!(local.call_count(), 0);
        assert!(dispatcher.complete(&[]).await.is_err());
    }

    #[tokio::test]
    async fn complete_maps_exhaustion_to_error() {
        let local = Arc::new(MockBackend::failing(BackendChoice::PrimaryLocal, "down"));
        let available = BTreeMap::from([(BackendChoice::PrimaryLocal, true)]);
        let dispatcher = dispatcher(&[&local], available);
        let err = dispatcher.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, LlmError::Exhausted(_)));
    }
}

//! Language-model backends and dispatch for switchyard.
//!
//! - `ChatBackend` trait with Ollama, hosted REST and enterprise implementations
//! - `TokenManager` for the enterprise OAuth2 client-credentials token
//! - `Dispatcher` choosing a backend per task type with ordered fallback
//! - `ChatModel` trait the intent extractor depends on
//! - `MockBackend` / `MockChatModel` for testing without a network

pub mod backends;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod mock;
pub mod task;
pub mod token;

pub use backends::{ChatBackend, EnterpriseBackend, HostedBackend, OllamaBackend};
pub use config::{EnterpriseConfig, HostedConfig, LlmConfig, OllamaConfig};
pub use dispatcher::{BackendFailure, ChatModel, DispatchOutcome, Dispatcher};
pub use error::{LlmError, LlmResult};
pub use mock::{MockBackend, MockChatModel};
pub use task::classify_task_type;
pub use token::{Clock, EnterpriseToken, ManualClock, SystemClock, TokenManager, TokenState};

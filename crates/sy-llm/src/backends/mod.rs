//! Concrete language-model backends behind one chat interface.

pub mod enterprise;
pub mod hosted;
pub mod ollama;

use async_trait::async_trait;
use sy_protocol::{BackendChoice, ChatMessage};

use crate::error::LlmResult;

pub use enterprise::EnterpriseBackend;
pub use hosted::HostedBackend;
pub use ollama::OllamaBackend;

/// A backend that can answer a chat exchange with a single text reply.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Which backend slot this implementation fills.
    fn choice(&self) -> BackendChoice;

    /// Send `messages` and return the assistant's reply text.
    async fn chat(&self, messages: &[ChatMessage]) -> LlmResult<String>;

    /// Cheap availability check. Must not hang: implementations bound it
    /// with a short timeout or answer from configuration alone.
    async fn is_available(&self) -> bool;
}

//! Scripted backends and models for testing without a network.
//!
//! Both record every call so tests can assert on invocation counts and the
//! messages that were sent.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use sy_protocol::{BackendChoice, ChatMessage};

use crate::backends::ChatBackend;
use crate::dispatcher::ChatModel;
use crate::error::{LlmError, LlmResult};

/// Mock implementation of `ChatBackend` with a fixed reply or failure.
pub struct MockBackend {
    choice: BackendChoice,
    reply: Result<String, String>,
    available: bool,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockBackend {
    pub fn replying(choice: BackendChoice, text: &str) -> Self {
        Self {
            choice,
            reply: Ok(text.to_string()),
            available: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(choice: BackendChoice, reason: &str) -> Self {
        Self {
            choice,
            reply: Err(reason.to_string()),
            available: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Messages of every call, oldest first.
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    fn choice(&self) -> BackendChoice {
        self.choice
    }

    async fn chat(&self, messages: &[ChatMessage]) -> LlmResult<String> {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.reply.clone().map_err(|reason| LlmError::Request {
            endpoint: format!("mock://{}", self.choice),
            message: reason,
        })
    }

    async fn is_available(&self) -> bool {
        self.available
    }
}

/// Mock implementation of `ChatModel` returning queued replies in order.
///
/// When the queue runs dry every further call fails.
pub struct MockChatModel {
    replies: Mutex<VecDeque<LlmResult<String>>>,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockChatModel {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply.
    pub fn reply(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    /// Queue a failure.
    pub fn fail(self, reason: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(LlmError::Exhausted(reason.to_string())));
        self
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Last message list the model received.
    pub fn last_prompt(&self) -> Option<Vec<ChatMessage>> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

impl Default for MockChatModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> LlmResult<String> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Exhausted("mock has no replies left".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn backend_records_calls() {
        let mock = MockBackend::replying(BackendChoice::PrimaryLocal, "ok");
        assert_eq!(mock.chat(&[ChatMessage::user("a")]).await.unwrap(), "ok");
        mock.chat(&[ChatMessage::user("b")]).await.unwrap();
        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.calls()[1][0].content, "b");
    }

    #[tokio::test]
    async fn failing_backend_reports_reason() {
        let mock = MockBackend::failing(BackendChoice::Enterprise, "boom").unavailable();
        assert!(!mock.is_available().await);
        let err = mock.chat(&[ChatMessage::user("a")]).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn model_replies_in_order() {
        let model = MockChatModel::new().reply("one").fail("down");
        assert_eq!(model.complete(&[]).await.unwrap(), "one");
        assert!(model.complete(&[]).await.is_err());
        assert!(model.complete(&[]).await.is_err());
        assert_eq!(model.call_count(), 3);
    }
}

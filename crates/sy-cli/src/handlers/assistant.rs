//! Code operations and chat: answered by the model dispatcher.
//!
//! Both handlers share one in-memory `Conversation`, so a follow-up sees the
//! turns before it. Nothing is persisted.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sy_llm::ChatModel;
use sy_protocol::{ChatMessage, ConsensusResult, Domain};

use super::{DomainHandler, HandlerOutcome, failure_text};

const CODE_OPS_SYSTEM_PROMPT: &str = "You are a senior software engineer working in the user's repository. \
Answer the request directly. When you propose code changes, show complete code blocks and name the \
file each belongs to.";

/// Recent user and assistant turns, newest last.
pub struct Conversation {
    turns: Mutex<VecDeque<ChatMessage>>,
    max_chars: usize,
}

impl Conversation {
    /// `max_chars` bounds the content sent back to the model.
    pub fn new(max_chars: usize) -> Self {
        Self {
            turns: Mutex::new(VecDeque::new()),
            max_chars,
        }
    }

    pub fn push(&self, message: ChatMessage) {
        let mut turns = self.turns.lock().unwrap_or_else(|e| e.into_inner());
        turns.push_back(message);
        // Newest turns within the budget; the latest is kept however long.
        let mut total = 0;
        let keep = turns
            .iter()
            .rev()
            .take_while(|m| {
                total += m.content.len();
                total <= self.max_chars
            })
            .count()
            .max(1);
        let drop = turns.len() - keep;
        turns.drain(..drop);
    }

    /// The current window, oldest first.
    pub fn recent(&self) -> Vec<ChatMessage> {
        self.turns
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.turns.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record `request`, ask the model with the recent window, and record
    /// the answer. Failures are reported but not remembered.
    async fn exchange(&self, model: &dyn ChatModel, system: Option<&str>, request: String) -> String {
        self.push(ChatMessage::user(request));
        let mut messages: Vec<ChatMessage> = system.map(ChatMessage::system).into_iter().collect();
        messages.extend(self.recent());

        match model.complete(&messages).await {
            Ok(text) => {
                self.push(ChatMessage::assistant(text.clone()));
                text
            }
            Err(e) => {
                tracing::warn!(error = %e, "assistant request failed");
                failure_text(e)
            }
        }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(4000)
    }
}

pub struct CodeOpsHandler {
    model: Arc<dyn ChatModel>,
    conversation: Arc<Conversation>,
}

impl CodeOpsHandler {
    pub fn new(model: Arc<dyn ChatModel>, conversation: Arc<Conversation>) -> Self {
        Self { model, conversation }
    }
}

#[async_trait]
impl DomainHandler for CodeOpsHandler {
    fn domain(&self) -> Domain {
        Domain::CodeOps
    }

    async fn handle(&self, raw_text: &str, detected: &ConsensusResult) -> HandlerOutcome {
        let instruction = detected
            .fields
            .get_str("instruction")
            .unwrap_or(raw_text)
            .trim();
        let request = match detected.fields.get_str("file_path") {
            Some(path) => format!("{instruction}\n\nTarget file: {path}"),
            None => instruction.to_string(),
        };
        let reply = self
            .conversation
            .exchange(self.model.as_ref(), Some(CODE_OPS_SYSTEM_PROMPT), request)
            .await;
        HandlerOutcome::Reply(reply)
    }
}

pub struct ChatHandler {
    model: Arc<dyn ChatModel>,
    conversation: Arc<Conversation>,
}

impl ChatHandler {
    pub fn new(model: Arc<dyn ChatModel>, conversation: Arc<Conversation>) -> Self {
        Self { model, conversation }
    }
}

#[async_trait]
impl DomainHandler for ChatHandler {
    fn domain(&self) -> Domain {
        Domain::Chat
    }

    async fn handle(&self, raw_text: &str, _detected: &ConsensusResult) -> HandlerOutcome {
        let reply = self
            .conversation
            .exchange(self.model.as_ref(), None, raw_text.trim().to_string())
            .await;
        HandlerOutcome::Reply(reply)
    }
}

//! Test doubles for the reasoning service and the chat transport.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::interview::state::ConversationId;
use crate::llm_client::{ChatMessage, LlmError, Reasoner};
use crate::transport::{Keyboard, Messenger, TransportError};

/// Reasoner that replays queued replies and records every request.
#[derive(Default)]
pub struct ScriptedReasoner {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedReasoner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_reply(&self, content: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(content.to_string()));
    }

    pub fn queue_error(&self, error: LlmError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Reasoner for ScriptedReasoner {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyContent))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub to: ConversationId,
    pub text: String,
    pub keyboard: Keyboard,
}

/// Messenger that records outgoing messages instead of delivering them.
/// Sends can be made to fail per recipient or per exact text; failed sends
/// are not recorded.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
    failing_recipients: Mutex<Vec<ConversationId>>,
    failing_texts: Mutex<Vec<String>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_sends_to(&self, to: ConversationId) {
        self.failing_recipients.lock().unwrap().push(to);
    }

    pub fn fail_text(&self, text: &str) {
        self.failing_texts.lock().unwrap().push(text.to_string());
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, to: ConversationId) -> Vec<Sent> {
        self.sent().into_iter().filter(|m| m.to == to).collect()
    }

    pub fn last_to(&self, to: ConversationId) -> Option<Sent> {
        self.sent_to(to).pop()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(
        &self,
        to: ConversationId,
        text: &str,
        keyboard: Keyboard,
    ) -> Result<(), TransportError> {
        if self.failing_recipients.lock().unwrap().contains(&to)
            || self.failing_texts.lock().unwrap().iter().any(|t| t == text)
        {
            return Err(TransportError::SendFailed("chat not found".into()));
        }
        self.sent.lock().unwrap().push(Sent {
            to,
            text: text.to_string(),
            keyboard,
        });
        Ok(())
    }
}

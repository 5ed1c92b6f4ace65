use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::interview::state::{ConversationId, ConversationState};

/// Key-value storage for interview progress, keyed by conversation id.
/// States of different conversations never share anything.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn load(&self, id: ConversationId) -> Option<ConversationState>;
    async fn save(&self, id: ConversationId, state: ConversationState);
    async fn remove(&self, id: ConversationId);
}

/// Ephemeral store: progress is lost on restart.
#[derive(Default)]
pub struct InMemoryStore {
    states: RwLock<HashMap<ConversationId, ConversationState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn load(&self, id: ConversationId) -> Option<ConversationState> {
        self.states.read().await.get(&id).cloned()
    }

    async fn save(&self, id: ConversationId, state: ConversationState) {
        debug!(conversation = %id, phase = ?state.phase(), "Saving conversation state");
        self.states.write().await.insert(id, state);
    }

    async fn remove(&self, id: ConversationId) {
        debug!(conversation = %id, "Clearing conversation state");
        self.states.write().await.remove(&id);
    }
}

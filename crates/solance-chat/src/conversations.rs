use std::sync::Arc;

use solance_core::models::conversation::{Conversation, ConversationId};
use solance_core::models::mode::Mode;
use solance_core::store_keys;
use solance_storage::LocalStore;
use solance_storage::state::{load_state, load_state_or_default, save_state};
use tracing::{debug, info};

use crate::error::ChatError;

/// Conversation list and active-conversation pointer in the local store.
///
/// Every call re-reads the store, so changes written by another handle to
/// the same store are picked up on the next operation.
#[derive(Clone)]
pub struct ConversationRepository {
    store: Arc<LocalStore>,
}

impl ConversationRepository {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }

    fn load_all(&self) -> Vec<Conversation> {
        load_state_or_default(&self.store, store_keys::CONVERSATIONS)
    }

    fn save_all(&self, conversations: &[Conversation]) {
        save_state(&self.store, store_keys::CONVERSATIONS, &conversations);
    }

    /// All conversations, newest first.
    pub fn list(&self) -> Vec<Conversation> {
        let mut conversations = self.load_all();
        conversations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        conversations
    }

    pub fn get(&self, id: ConversationId) -> Option<Conversation> {
        self.load_all().into_iter().find(|c| c.id == id)
    }

    /// Create an empty conversation and make it the active one.
    pub fn create(&self, mode: Mode, now: jiff::Timestamp) -> Conversation {
        let conversation = Conversation::new(mode, now);
        let mut all = self.load_all();
        all.push(conversation.clone());
        self.save_all(&all);
        save_state(&self.store, store_keys::ACTIVE_CONVERSATION, &conversation.id);
        info!(id = %conversation.id, %mode, "created conversation");
        conversation
    }

    /// Insert or replace a conversation by id.
    pub fn save(&self, conversation: &Conversation) {
        let mut all = self.load_all();
        match all.iter_mut().find(|c| c.id == conversation.id) {
            Some(existing) => *existing = conversation.clone(),
            None => all.push(conversation.clone()),
        }
        self.save_all(&all);
        debug!(id = %conversation.id, messages = conversation.messages.len(), "saved conversation");
    }

    /// Delete a conversation. If it was active, the newest remaining
    /// conversation becomes active. Returns `false` if it did not exist.
    pub fn delete(&self, id: ConversationId) -> bool {
        let mut all = self.load_all();
        let before = all.len();
        all.retain(|c| c.id != id);
        if all.len() == before {
            return false;
        }
        self.save_all(&all);

        if self.active_id() == Some(id) {
            match all.iter().max_by_key(|c| c.created_at) {
                Some(next) => save_state(&self.store, store_keys::ACTIVE_CONVERSATION, &next.id),
                None => self.store.delete(store_keys::ACTIVE_CONVERSATION),
            }
        }
        info!(%id, "deleted conversation");
        true
    }

    pub fn active_id(&self) -> Option<ConversationId> {
        load_state(&self.store, store_keys::ACTIVE_CONVERSATION)
    }

    /// The active conversation, if the pointer refers to one that exists.
    pub fn active(&self) -> Option<Conversation> {
        self.active_id().and_then(|id| self.get(id))
    }

    pub fn set_active(&self, id: ConversationId) -> Result<(), ChatError> {
        if self.get(id).is_none() {
            return Err(ChatError::ConversationNotFound(id));
        }
        save_state(&self.store, store_keys::ACTIVE_CONVERSATION, &id);
        Ok(())
    }

    pub fn rename(&self, id: ConversationId, title: &str) -> Result<Conversation, ChatError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ChatError::EmptyTitle);
        }
        let mut conversation = self.get(id).ok_or(ChatError::ConversationNotFound(id))?;
        conversation.title = title.to_string();
        self.save(&conversation);
        Ok(conversation)
    }
}

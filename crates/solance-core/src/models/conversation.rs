use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::mode::Mode;

/// Title given to a conversation until its first user message is persisted.
pub const PLACEHOLDER_TITLE: &str = "New Chat";

/// Opaque conversation identifier.
pub type ConversationId = Uuid;

/// A persisted chat between the user and whichever model answered.
///
/// Owned by the local store and mutated only by the orchestrator: messages
/// are appended in order and replayed to the model as dialogue history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    pub mode: Mode,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: jiff::Timestamp,
}

impl Conversation {
    pub fn new(mode: Mode, created_at: jiff::Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: PLACEHOLDER_TITLE.to_string(),
            mode,
            messages: Vec::new(),
            created_at,
        }
    }

    pub fn has_placeholder_title(&self) -> bool {
        self.title.is_empty() || self.title == PLACEHOLDER_TITLE
    }

    /// Replace the placeholder title with the first user message, truncated
    /// to `max_chars`. Returns `true` if the title changed.
    ///
    /// A conversation that already has a real title is left alone, so this
    /// only ever fires the first time messages are persisted.
    pub fn derive_title(&mut self, max_chars: usize) -> bool {
        if !self.has_placeholder_title() {
            return false;
        }
        let Some(first) = self.messages.iter().find(|m| m.role == Role::User) else {
            return false;
        };
        let title = truncate_title(&first.text, max_chars);
        if title.is_empty() {
            return false;
        }
        self.title = title;
        true
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Truncate `text` to at most `max_chars` characters, appending `...` when
/// anything was cut. Counts chars, not bytes, so multi-byte text is never
/// split mid-codepoint.
pub fn truncate_title(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(max_chars).collect();
    format!("{}...", head.trim_end())
}

/// A single message in a conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub timestamp: jiff::Timestamp,
    /// Model identifier that produced an assistant reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl Message {
    pub fn user(text: impl Into<String>, timestamp: jiff::Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            text: text.into(),
            timestamp,
            model_used: None,
            is_error: false,
        }
    }

    pub fn assistant(
        text: impl Into<String>,
        model_used: impl Into<String>,
        timestamp: jiff::Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            text: text.into(),
            timestamp,
            model_used: Some(model_used.into()),
            is_error: false,
        }
    }

    /// An assistant-authored message reporting a failed request.
    pub fn error(text: impl Into<String>, timestamp: jiff::Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            text: text.into(),
            timestamp,
            model_used: None,
            is_error: true,
        }
    }
}

/// Role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

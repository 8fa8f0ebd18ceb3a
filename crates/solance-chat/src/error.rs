use solance_core::models::conversation::ConversationId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("conversation not found: {0}")]
    ConversationNotFound(ConversationId),

    #[error("conversation title cannot be empty")]
    EmptyTitle,
}

//! Local store key conventions.
//!
//! These define the canonical layout of entries in the client's
//! key-value persistence.

/// JSON array of every [`Conversation`](crate::models::conversation::Conversation).
pub const CONVERSATIONS: &str = "solance.conversations";

/// Id of the conversation currently shown to the user.
pub const ACTIVE_CONVERSATION: &str = "solance.active_conversation";

/// The daily [`UsageRecord`](crate::models::usage::UsageRecord).
pub const USAGE: &str = "solance.usage";

/// Last-known-good [`FailoverCursor`](crate::models::endpoint::FailoverCursor).
pub const FAILOVER_CURSOR: &str = "solance.failover_cursor";

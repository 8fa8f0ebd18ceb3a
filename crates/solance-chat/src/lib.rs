//! solance-chat
//!
//! Conversation orchestration: the daily usage governor, the conversation
//! repository, and the orchestrator that ties them to the failover client.

pub mod clock;
pub mod conversations;
pub mod error;
pub mod orchestrator;
pub mod usage;

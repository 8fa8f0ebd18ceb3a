use std::fmt;

use serde::Serialize;

/// Text shown when every model and credential failed with a retryable
/// error. Provider error bodies never reach the user in this case.
pub const EXHAUSTED_MESSAGE: &str =
    "All AI models are busy or rate limited right now. Please try again in a few minutes.";

/// Returned to the caller when the failover loop ran out of options.
///
/// The UI layer decides how to surface it (toast, desktop notification,
/// log line); the model client never alerts on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExhaustionEvent {
    /// Requests issued during the pass that ended in exhaustion.
    pub attempts: usize,
    pub message: &'static str,
}

impl ExhaustionEvent {
    pub fn new(attempts: usize) -> Self {
        Self {
            attempts,
            message: EXHAUSTED_MESSAGE,
        }
    }
}

/// A short-lived, user-facing notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// Retrying the same model with its next credential.
    SwitchingCredential { model: String, credential: usize },
    /// Moving on to another model.
    SwitchingModel { from: String, to: String },
    /// A request succeeded somewhere other than the remembered position.
    ConnectedVia { model: String },
    EmptyMessage,
    Busy,
    LimitReached { limit: u32 },
    RequestFailed { detail: String },
    Exhausted(ExhaustionEvent),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::SwitchingCredential { model, credential } => {
                write!(f, "Rate limited, switching to key #{} for {model}...", credential + 1)
            }
            Notice::SwitchingModel { from, to } => {
                write!(f, "{from} is unavailable, switching to {to}...")
            }
            Notice::ConnectedVia { model } => write!(f, "Connected via {model}"),
            Notice::EmptyMessage => f.write_str("Type a message first."),
            Notice::Busy => f.write_str("Still waiting on the previous reply."),
            Notice::LimitReached { limit } => {
                write!(f, "Daily limit of {limit} messages reached. Come back tomorrow!")
            }
            Notice::RequestFailed { detail } => write!(f, "Request failed: {detail}"),
            Notice::Exhausted(event) => f.write_str(event.message),
        }
    }
}

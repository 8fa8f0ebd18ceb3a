//! Provider-neutral completion requests.
//!
//! A request carries the new prompt separately from the replayed history:
//! the conversation's earlier messages become `history`, the message just
//! submitted becomes `prompt`.

use serde::{Deserialize, Serialize};
use solance_core::models::conversation::{Message, Role};

/// Sampling parameters forwarded to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 2048,
        }
    }
}

/// One replayed turn of dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: Role,
    pub text: String,
}

impl HistoryTurn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub history: Vec<HistoryTurn>,
    pub system_instruction: String,
    pub generation: GenerationConfig,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, system_instruction: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            history: Vec::new(),
            system_instruction: system_instruction.into(),
            generation: GenerationConfig::default(),
        }
    }

    pub fn with_history(mut self, history: Vec<HistoryTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }
}

/// Build replayable history from stored messages, in order.
///
/// Error placeholders are assistant-authored but were never produced by a
/// model, so they are left out of what the model sees.
pub fn history_from_messages(messages: &[Message]) -> Vec<HistoryTurn> {
    messages
        .iter()
        .filter(|m| !m.is_error)
        .map(|m| HistoryTurn::new(m.role, m.text.clone()))
        .collect()
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A persona preset selecting the assistant's tone and behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Student,
    Coder,
    Chill,
    #[default]
    Solance,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Student, Mode::Coder, Mode::Chill, Mode::Solance];

    pub fn label(self) -> &'static str {
        match self {
            Mode::Student => "Student",
            Mode::Coder => "Coder",
            Mode::Chill => "Chill",
            Mode::Solance => "Solance",
        }
    }

    /// System instruction sent with every request made in this mode.
    pub fn system_instruction(self) -> &'static str {
        match self {
            Mode::Student => {
                "You are a patient tutor. Explain concepts step by step, check \
                 understanding with short questions, and prefer worked examples \
                 over bare answers. Keep explanations accurate and age-appropriate."
            }
            Mode::Coder => {
                "You are a senior software engineer. Give precise, working code \
                 with brief explanations. Point out edge cases and pitfalls, and \
                 use fenced code blocks tagged with the language."
            }
            Mode::Chill => {
                "You are a relaxed, friendly companion. Keep replies short, warm \
                 and conversational. Casual language is fine; lectures are not."
            }
            Mode::Solance => {
                "You are Solance, a thoughtful general assistant. Be helpful, \
                 honest and concise, adapt your depth to the question, and say \
                 so plainly when you are unsure."
            }
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Mode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownMode(s.to_string()))
    }
}

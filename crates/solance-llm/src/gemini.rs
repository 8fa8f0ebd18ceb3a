//! Gemini `generateContent` REST provider.
//!
//! The credential travels in the `x-goog-api-key` header rather than the
//! query string, so it never appears in URLs that end up in error text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use solance_core::models::conversation::Role;
use solance_core::models::endpoint::ApiKey;
use tracing::debug;

use crate::error::ProviderError;
use crate::provider::ModelProvider;
use crate::request::CompletionRequest;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url_for(&self, model: &str) -> String {
        format!(
            "{}/{model}:generateContent",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    async fn generate(
        &self,
        model: &str,
        credential: &ApiKey,
        request: &CompletionRequest,
    ) -> Result<String, ProviderError> {
        let body = build_request(request);
        debug!(model, credential = %credential, turns = body.contents.len(), "calling Gemini");

        let response = self
            .client
            .post(self.url_for(model))
            .header("x-goog-api-key", credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(map_http_error(status.as_u16(), &text));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::ResponseParse(e.to_string()))?;
        extract_text(parsed)
    }
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    generation_config: WireGenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

/// Google returns a structured error object; model hosts that are still
/// warming up often return a bare string instead.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Structured {
        message: Option<String>,
        status: Option<String>,
    },
    Plain(String),
}

/// Provider role for a local role: the local assistant speaks as `model`.
fn wire_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

pub(crate) fn build_request(request: &CompletionRequest) -> GenerateContentRequest {
    let mut contents: Vec<Content> = request
        .history
        .iter()
        .map(|turn| Content {
            role: wire_role(turn.role),
            parts: vec![Part {
                text: turn.text.clone(),
            }],
        })
        .collect();

    contents.push(Content {
        role: "user",
        parts: vec![Part {
            text: request.prompt.clone(),
        }],
    });

    let system_instruction = if request.system_instruction.trim().is_empty() {
        None
    } else {
        Some(SystemInstruction {
            parts: vec![Part {
                text: request.system_instruction.clone(),
            }],
        })
    };

    GenerateContentRequest {
        contents,
        system_instruction,
        generation_config: WireGenerationConfig {
            temperature: request.generation.temperature,
            max_output_tokens: request.generation.max_output_tokens,
        },
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String, ProviderError> {
    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if !text.is_empty() {
        return Ok(text);
    }

    match response.prompt_feedback.and_then(|f| f.block_reason) {
        Some(reason) => Err(ProviderError::Blocked(reason)),
        None => Err(ProviderError::EmptyResponse),
    }
}

pub(crate) fn map_http_error(status: u16, body: &str) -> ProviderError {
    let message = match serde_json::from_str::<ErrorWrapper>(body).map(|w| w.error) {
        Ok(ErrorBody::Structured { message, status }) => {
            let msg = message.unwrap_or_else(|| body.to_string());
            match status {
                Some(s) if !s.is_empty() => format!("{s}: {msg}"),
                _ => msg,
            }
        }
        Ok(ErrorBody::Plain(msg)) => msg,
        Err(_) => body.trim().to_string(),
    };

    if message.to_ascii_lowercase().contains("currently loading") {
        return ProviderError::ModelLoading(message);
    }

    ProviderError::Http { status, message }
}

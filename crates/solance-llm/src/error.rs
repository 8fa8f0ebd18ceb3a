use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("model is still loading: {0}")]
    ModelLoading(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("response parsing failed: {0}")]
    ResponseParse(String),

    #[error("prompt blocked by provider: {0}")]
    Blocked(String),

    #[error("model returned no text")]
    EmptyResponse,

    #[error("client configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    /// HTTP 429, HTTP 503 and a model that is still loading are transient:
    /// another credential or model may well succeed. Everything else is
    /// fatal for the current request.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Http { status, .. } => matches!(status, 429 | 503),
            ProviderError::ModelLoading(_) => true,
            _ => false,
        }
    }
}

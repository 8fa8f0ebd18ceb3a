use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A provider credential. `Debug` and `Display` only ever show a redacted
/// hint so keys cannot leak into logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw secret, for building the outgoing request only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn hint(&self) -> String {
        redact_key(&self.0)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({})", self.hint())
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hint())
    }
}

fn redact_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let prefix: String = chars[..4].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{prefix}...{suffix}")
}

/// One model and the credentials that may be used to call it, in
/// preference order. An empty credential list is valid: the model is
/// skipped without issuing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub model: String,
    pub credentials: Vec<ApiKey>,
}

impl Endpoint {
    pub fn new(model: impl Into<String>, credentials: Vec<ApiKey>) -> Self {
        Self {
            model: model.into(),
            credentials,
        }
    }
}

/// Ordered (model, credentials) table the failover client walks.
///
/// Loaded once at startup; never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTable {
    endpoints: Vec<Endpoint>,
}

impl EndpointTable {
    pub fn new(endpoints: Vec<Endpoint>) -> Result<Self, CoreError> {
        if endpoints.is_empty() {
            return Err(CoreError::EmptyEndpointTable);
        }
        Ok(Self { endpoints })
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn get(&self, model_index: usize) -> Option<&Endpoint> {
        self.endpoints.get(model_index)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Upper bound on requests a single failover pass can issue.
    pub fn total_credentials(&self) -> usize {
        self.endpoints.iter().map(|e| e.credentials.len()).sum()
    }
}

/// Last-known-good position in the [`EndpointTable`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FailoverCursor {
    pub model_index: usize,
    pub credential_index: usize,
}

impl FailoverCursor {
    pub fn new(model_index: usize, credential_index: usize) -> Self {
        Self {
            model_index,
            credential_index,
        }
    }
}

impl fmt::Display for FailoverCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.model_index, self.credential_index)
    }
}

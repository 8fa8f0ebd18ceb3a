use async_trait::async_trait;
use solance_core::models::endpoint::ApiKey;

use crate::error::ProviderError;
use crate::request::CompletionRequest;

/// A hosted completion endpoint.
///
/// Implementations issue exactly one request per call and never retry;
/// retry and failover policy belongs to
/// [`FailoverClient`](crate::failover::FailoverClient).
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        credential: &ApiKey,
        request: &CompletionRequest,
    ) -> Result<String, ProviderError>;
}

//! Endpoint table from the environment.
//!
//! | Variable | Meaning |
//! |---|---|
//! | `SOLANCE_MODELS` | comma-separated model ids, in failover order |
//! | `SOLANCE_API_KEYS` | comma-separated keys shared by every model |
//! | `SOLANCE_API_KEYS_<n>` | keys for model `n` (0-based) only; may be empty |
//!
//! Blank list entries are ignored. A `.env` file is loaded into the
//! environment by the binary before this runs.

use solance_core::models::endpoint::{ApiKey, Endpoint, EndpointTable};

pub const MODELS_VAR: &str = "SOLANCE_MODELS";
pub const KEYS_VAR: &str = "SOLANCE_API_KEYS";

pub fn endpoint_table_from_env() -> eyre::Result<EndpointTable> {
    endpoint_table_from_vars(|name| std::env::var(name).ok())
}

/// Build the table from any variable source.
pub fn endpoint_table_from_vars(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<EndpointTable> {
    let models = split_list(&lookup(MODELS_VAR).unwrap_or_default());
    if models.is_empty() {
        return Err(eyre::eyre!("no models configured; set {MODELS_VAR}"));
    }

    let shared = split_list(&lookup(KEYS_VAR).unwrap_or_default());

    let endpoints: Vec<Endpoint> = models
        .into_iter()
        .enumerate()
        .map(|(i, model)| {
            let keys = match lookup(&format!("{KEYS_VAR}_{i}")) {
                Some(own) => split_list(&own),
                None => shared.clone(),
            };
            if keys.is_empty() {
                tracing::warn!(%model, "no API keys configured, model will be skipped");
            }
            Endpoint::new(model, keys.into_iter().map(ApiKey::new).collect())
        })
        .collect();

    let table = EndpointTable::new(endpoints)?;
    tracing::info!(
        models = table.len(),
        credentials = table.total_credentials(),
        "endpoint table loaded"
    );
    Ok(table)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

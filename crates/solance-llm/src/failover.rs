//! Credential and model failover.
//!
//! # Attempt order
//!
//! A pass starts at the caller's [`FailoverCursor`] (the last position that
//! answered) rather than at the top of the table, so endpoints already known
//! to be dead are not retried first on every message. From there it walks
//! forward and wraps around once:
//!
//! ```text
//! cursor → next credential of the same model → … → end of table
//!        → (0, 0) → … → position just before the cursor
//! ```
//!
//! Every configured credential is tried at most once per pass. Models with
//! no credentials are skipped without a request. A credential index past
//! the end of its model's list (a cursor saved against a larger table)
//! wraps to 0; a model index past the end of the table restarts the pass
//! at (0, 0).
//!
//! # Outcome classes
//!
//! | Provider result | Action |
//! |---|---|
//! | text | stop, report the position used |
//! | 429 / 503 / model loading | notice, advance, keep going |
//! | anything else | stop, report the provider error |
//! | cancellation token fired | stop, report cancellation, cursor untouched |
//!
//! Coming back round to the cursor after only retryable failures yields an
//! [`ExhaustionEvent`] carrying a fixed message; provider error text is not
//! exposed in that case.
//!
//! The client never persists anything. It returns the cursor it ended on
//! and whether that differs from the one it was given; storing it is the
//! caller's job.

use std::sync::Arc;

use solance_core::models::endpoint::{EndpointTable, FailoverCursor};
use solance_core::models::notice::{ExhaustionEvent, Notice};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::ProviderError;
use crate::notify::Notifier;
use crate::provider::ModelProvider;
use crate::request::CompletionRequest;

/// A successful completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    /// Model identifier that produced `text`.
    pub model_used: String,
    /// Position that answered.
    pub cursor: FailoverCursor,
    /// `true` when `cursor` differs from the cursor the pass started from.
    pub cursor_changed: bool,
    /// Requests issued during this pass, including the successful one.
    pub attempts: usize,
}

#[derive(Debug)]
pub enum FailoverFailure {
    /// A non-retryable provider error ended the pass.
    Fatal { model: String, error: ProviderError },
    /// Every remaining option failed retryably.
    Exhausted(ExhaustionEvent),
}

impl FailoverFailure {
    /// Text suitable for the conversation transcript.
    pub fn user_message(&self) -> String {
        match self {
            FailoverFailure::Fatal { error, .. } => error.to_string(),
            FailoverFailure::Exhausted(event) => event.message.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum CompletionOutcome {
    Success(Completion),
    Failed(FailoverFailure),
    Cancelled,
}

impl CompletionOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CompletionOutcome::Cancelled)
    }
}

pub struct FailoverClient {
    provider: Arc<dyn ModelProvider>,
    table: EndpointTable,
}

impl FailoverClient {
    pub fn new(provider: Arc<dyn ModelProvider>, table: EndpointTable) -> Self {
        Self { provider, table }
    }

    /// Run one failover pass for `request`, starting at `entry`.
    ///
    /// `cancel` is checked before every request, raced against the request
    /// while it is in flight, and checked again once it resolves; a late
    /// result after cancellation is discarded.
    pub async fn complete(
        &self,
        request: &CompletionRequest,
        entry: FailoverCursor,
        cancel: &CancellationToken,
        notifier: &Notifier,
    ) -> CompletionOutcome {
        let endpoints = self.table.endpoints();
        let order = self.attempt_order(entry);
        let mut attempts = 0;

        for (step, &(model_index, credential_index)) in order.iter().enumerate() {
            let endpoint = &endpoints[model_index];

            if cancel.is_cancelled() {
                debug!(attempts, "cancelled before request");
                return CompletionOutcome::Cancelled;
            }

            attempts += 1;
            let credential = &endpoint.credentials[credential_index];
            debug!(
                model = %endpoint.model,
                model_index,
                credential_index,
                attempt = attempts,
                "attempting completion"
            );

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(model = %endpoint.model, "cancelled while request in flight");
                    return CompletionOutcome::Cancelled;
                }
                result = self.provider.generate(&endpoint.model, credential, request) => result,
            };

            if cancel.is_cancelled() {
                debug!(model = %endpoint.model, "discarding result that arrived after cancellation");
                return CompletionOutcome::Cancelled;
            }

            match result {
                Ok(text) => {
                    let cursor = FailoverCursor::new(model_index, credential_index);
                    let cursor_changed = cursor != entry;
                    if cursor_changed {
                        info!(model = %endpoint.model, from = %entry, to = %cursor, "failover cursor moved");
                        notifier.emit(Notice::ConnectedVia {
                            model: endpoint.model.clone(),
                        });
                    }
                    info!(model = %endpoint.model, attempts, "completion succeeded");
                    return CompletionOutcome::Success(Completion {
                        text,
                        model_used: endpoint.model.clone(),
                        cursor,
                        cursor_changed,
                        attempts,
                    });
                }
                Err(error) if error.is_retryable() => {
                    warn!(
                        model = %endpoint.model,
                        credential = %credential,
                        error = %error,
                        "retryable provider failure"
                    );
                    if let Some(&next) = order.get(step + 1) {
                        notifier.emit(self.switch_notice(model_index, next));
                    }
                }
                Err(error) => {
                    error!(model = %endpoint.model, error = %error, "fatal provider failure");
                    return CompletionOutcome::Failed(FailoverFailure::Fatal {
                        model: endpoint.model.clone(),
                        error,
                    });
                }
            }
        }

        warn!(attempts, "all models and credentials exhausted");
        CompletionOutcome::Failed(FailoverFailure::Exhausted(ExhaustionEvent::new(attempts)))
    }

    /// Every (model, credential) position, starting at `entry` and wrapping
    /// past the end of the table back to the positions before it.
    fn attempt_order(&self, entry: FailoverCursor) -> Vec<(usize, usize)> {
        let endpoints = self.table.endpoints();

        let start = if entry.model_index >= endpoints.len() {
            warn!(cursor = %entry, models = endpoints.len(), "stale failover cursor, restarting at first model");
            (0, 0)
        } else if entry.credential_index >= endpoints[entry.model_index].credentials.len() {
            (entry.model_index, 0)
        } else {
            (entry.model_index, entry.credential_index)
        };

        let mut positions = Vec::with_capacity(self.table.total_credentials());
        for (model_index, endpoint) in endpoints.iter().enumerate() {
            if endpoint.credentials.is_empty() {
                debug!(model = %endpoint.model, "no credentials configured, skipping model");
            }
            positions.extend((0..endpoint.credentials.len()).map(|c| (model_index, c)));
        }

        let split = positions.iter().position(|&p| p >= start).unwrap_or(0);
        positions.rotate_left(split);
        positions
    }

    /// Notice describing the attempt about to be made at `next`.
    fn switch_notice(&self, current_model: usize, next: (usize, usize)) -> Notice {
        let endpoints = self.table.endpoints();
        let (next_model, next_credential) = next;
        if next_model == current_model {
            Notice::SwitchingCredential {
                model: endpoints[current_model].model.clone(),
                credential: next_credential,
            }
        } else {
            Notice::SwitchingModel {
                from: endpoints[current_model].model.clone(),
                to: endpoints[next_model].model.clone(),
            }
        }
    }
}

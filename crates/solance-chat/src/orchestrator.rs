//! Message submission.
//!
//! A submission runs in two locked phases around one unlocked network
//! call:
//!
//! 1. Admission (empty input, busy, quota), then append and persist the
//!    user message, count it against the quota, and register a fresh
//!    cancellation token for the conversation.
//! 2. After the failover pass: if the token was cancelled or a newer
//!    request replaced it, drop the result without touching state.
//!    Otherwise append the assistant reply (or an error message), persist,
//!    and store the failover cursor if it moved.
//!
//! If the submitting future is dropped mid-call, its registration is
//! removed and its token cancelled, as if [`ChatOrchestrator::cancel`] had
//! been called.
//!
//! The user message is persisted before the call so it survives a failed
//! request or a closed process. Quota is spent at admission and never
//! refunded, whether the request then fails, is cancelled, or is
//! superseded.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use solance_core::models::conversation::{Conversation, ConversationId, Message};
use solance_core::models::endpoint::FailoverCursor;
use solance_core::models::mode::Mode;
use solance_core::models::notice::Notice;
use solance_core::models::usage::MAX_DAILY_MESSAGES;
use solance_core::store_keys;
use solance_llm::CancellationToken;
use solance_llm::failover::{CompletionOutcome, FailoverClient, FailoverFailure};
use solance_llm::notify::Notifier;
use solance_llm::request::{CompletionRequest, GenerationConfig, history_from_messages};
use solance_storage::LocalStore;
use solance_storage::state::{load_state_or_default, save_state};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::conversations::ConversationRepository;
use crate::error::ChatError;
use crate::usage::{UsageGovernor, UsageSnapshot};

/// What to do when a message is submitted while a request for the same
/// conversation is still in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusyPolicy {
    /// Refuse the new message with a busy notice.
    #[default]
    Reject,
    /// Cancel the in-flight request and send the new one.
    CancelPrevious,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatSettings {
    pub daily_limit: u32,
    pub title_max_chars: usize,
    pub busy_policy: BusyPolicy,
    pub generation: GenerationConfig,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            daily_limit: MAX_DAILY_MESSAGES,
            title_max_chars: 30,
            busy_policy: BusyPolicy::default(),
            generation: GenerationConfig::default(),
        }
    }
}

/// Why a submission never reached the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EmptyMessage,
    Busy,
    LimitReached,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Rejected(Rejection),
    /// The assistant reply that was appended.
    Replied(Message),
    /// The error message that was appended, and what caused it.
    Failed {
        message: Message,
        failure: FailoverFailure,
    },
    /// Cancelled or superseded; nothing was appended.
    Cancelled,
}

struct InFlight {
    request_id: Uuid,
    cancel: CancellationToken,
}

struct FlightState {
    cursor: FailoverCursor,
    in_flight: HashMap<ConversationId, InFlight>,
}

/// Clears a request's in-flight registration if the submitting future is
/// dropped before it completes.
struct FlightGuard<'a> {
    state: &'a Mutex<FlightState>,
    id: ConversationId,
    request_id: Uuid,
    cancel: CancellationToken,
    armed: bool,
}

impl FlightGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.cancel.cancel();
        let mut flight = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if flight
            .in_flight
            .get(&self.id)
            .is_some_and(|f| f.request_id == self.request_id)
        {
            flight.in_flight.remove(&self.id);
        }
        debug!(conversation = %self.id, request = %self.request_id, "submission dropped before completion");
    }
}

pub struct ChatOrchestrator {
    store: Arc<LocalStore>,
    clock: Arc<dyn Clock>,
    conversations: ConversationRepository,
    governor: UsageGovernor,
    client: FailoverClient,
    notifier: Notifier,
    settings: ChatSettings,
    state: Mutex<FlightState>,
}

impl ChatOrchestrator {
    /// Build an orchestrator over `store`, resuming from the failover
    /// cursor persisted by a previous session.
    pub fn new(
        store: Arc<LocalStore>,
        clock: Arc<dyn Clock>,
        client: FailoverClient,
        notifier: Notifier,
        settings: ChatSettings,
    ) -> Self {
        let cursor: FailoverCursor = load_state_or_default(&store, store_keys::FAILOVER_CURSOR);
        debug!(%cursor, "loaded failover cursor");
        Self {
            conversations: ConversationRepository::new(store.clone()),
            governor: UsageGovernor::new(store.clone(), clock.clone(), settings.daily_limit),
            store,
            clock,
            client,
            notifier,
            settings,
            state: Mutex::new(FlightState {
                cursor,
                in_flight: HashMap::new(),
            }),
        }
    }

    pub fn conversations(&self) -> &ConversationRepository {
        &self.conversations
    }

    pub fn usage(&self) -> UsageSnapshot {
        self.governor.snapshot()
    }

    pub fn cursor(&self) -> FailoverCursor {
        self.lock().cursor
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub fn is_busy(&self, id: ConversationId) -> bool {
        self.lock().in_flight.contains_key(&id)
    }

    pub fn create_conversation(&self, mode: Mode) -> Conversation {
        self.conversations.create(mode, self.clock.now().timestamp())
    }

    /// Delete a conversation, cancelling any request in flight for it.
    pub fn delete_conversation(&self, id: ConversationId) -> bool {
        self.cancel(id);
        self.conversations.delete(id)
    }

    /// Cancel the in-flight request for `id`. Its result, if one still
    /// arrives, is discarded. Returns `false` if nothing was in flight.
    pub fn cancel(&self, id: ConversationId) -> bool {
        match self.lock().in_flight.remove(&id) {
            Some(flight) => {
                flight.cancel.cancel();
                info!(conversation = %id, request = %flight.request_id, "cancelled in-flight request");
                true
            }
            None => false,
        }
    }

    /// Submit a user message to conversation `id` in `mode`.
    pub async fn submit(
        &self,
        id: ConversationId,
        text: &str,
        mode: Mode,
    ) -> Result<SubmitOutcome, ChatError> {
        let prompt = text.trim();
        if prompt.is_empty() {
            return Ok(self.reject(Rejection::EmptyMessage));
        }

        let (request, cancel, request_id, entry_cursor) = {
            let mut flight = self.lock();

            if flight.in_flight.contains_key(&id) && self.settings.busy_policy == BusyPolicy::Reject {
                return Ok(self.reject(Rejection::Busy));
            }

            if self.governor.is_limit_reached() {
                return Ok(self.reject(Rejection::LimitReached));
            }

            let mut conversation = self
                .conversations
                .get(id)
                .ok_or(ChatError::ConversationNotFound(id))?;

            // Only a request that is actually going out supersedes the old one.
            if let Some(previous) = flight.in_flight.remove(&id) {
                info!(conversation = %id, request = %previous.request_id, "superseding in-flight request");
                previous.cancel.cancel();
            }

            let history = history_from_messages(&conversation.messages);
            conversation.mode = mode;
            conversation
                .messages
                .push(Message::user(prompt, self.clock.now().timestamp()));
            conversation.derive_title(self.settings.title_max_chars);
            self.conversations.save(&conversation);

            let usage = self.governor.increment();
            debug!(conversation = %id, count = usage.count, limit = self.governor.limit(), "usage incremented");

            let request = CompletionRequest::new(prompt, mode.system_instruction())
                .with_history(history)
                .with_generation(self.settings.generation);

            let cancel = CancellationToken::new();
            let request_id = Uuid::new_v4();
            flight.in_flight.insert(
                id,
                InFlight {
                    request_id,
                    cancel: cancel.clone(),
                },
            );
            (request, cancel, request_id, flight.cursor)
        };

        let mut guard = FlightGuard {
            state: &self.state,
            id,
            request_id,
            cancel: cancel.clone(),
            armed: true,
        };

        info!(conversation = %id, request = %request_id, %mode, turns = request.history.len(), "sending message");
        let outcome = self
            .client
            .complete(&request, entry_cursor, &cancel, &self.notifier)
            .await;
        guard.disarm();

        let mut flight = self.lock();
        let still_current = flight
            .in_flight
            .get(&id)
            .is_some_and(|f| f.request_id == request_id);
        if still_current {
            flight.in_flight.remove(&id);
        }

        if outcome.is_cancelled() || cancel.is_cancelled() || !still_current {
            debug!(conversation = %id, request = %request_id, "discarding cancelled request");
            return Ok(SubmitOutcome::Cancelled);
        }

        let now = self.clock.now().timestamp();
        match outcome {
            CompletionOutcome::Success(done) => {
                if done.cursor_changed && done.cursor != flight.cursor {
                    flight.cursor = done.cursor;
                    save_state(&self.store, store_keys::FAILOVER_CURSOR, &done.cursor);
                }
                let message = Message::assistant(done.text, done.model_used, now);
                self.append(id, message.clone());
                Ok(SubmitOutcome::Replied(message))
            }
            CompletionOutcome::Failed(failure) => {
                let message = Message::error(failure.user_message(), now);
                self.append(id, message.clone());
                let notice = match &failure {
                    FailoverFailure::Exhausted(event) => Notice::Exhausted(event.clone()),
                    FailoverFailure::Fatal { .. } => Notice::RequestFailed {
                        detail: failure.user_message(),
                    },
                };
                self.notifier.emit(notice);
                Ok(SubmitOutcome::Failed { message, failure })
            }
            CompletionOutcome::Cancelled => Ok(SubmitOutcome::Cancelled),
        }
    }

    /// Append to the freshly re-read conversation so edits made while the
    /// request was in flight are kept.
    fn append(&self, id: ConversationId, message: Message) {
        match self.conversations.get(id) {
            Some(mut conversation) => {
                conversation.messages.push(message);
                conversation.derive_title(self.settings.title_max_chars);
                self.conversations.save(&conversation);
            }
            None => warn!(conversation = %id, "conversation vanished before reply was stored"),
        }
    }

    fn reject(&self, rejection: Rejection) -> SubmitOutcome {
        let notice = match rejection {
            Rejection::EmptyMessage => Notice::EmptyMessage,
            Rejection::Busy => Notice::Busy,
            Rejection::LimitReached => Notice::LimitReached {
                limit: self.governor.limit(),
            },
        };
        info!(?rejection, "submission rejected");
        self.notifier.emit(notice);
        SubmitOutcome::Rejected(rejection)
    }

    fn lock(&self) -> MutexGuard<'_, FlightState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

//! Shared fixtures: a scripted provider, a write-counting store backend,
//! and a ready-wired orchestrator.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use solance_chat::clock::FixedClock;
use solance_chat::orchestrator::{ChatOrchestrator, ChatSettings};
use solance_core::models::endpoint::{ApiKey, Endpoint, EndpointTable};
use solance_core::models::notice::Notice;
use solance_llm::error::ProviderError;
use solance_llm::failover::FailoverClient;
use solance_llm::notify::Notifier;
use solance_llm::provider::ModelProvider;
use solance_llm::request::CompletionRequest;
use solance_storage::backend::{MemoryBackend, StoreBackend};
use solance_storage::error::StorageError;
use solance_storage::LocalStore;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Notify;

pub enum Step {
    Reply(&'static str),
    Status(u16),
    Fatal(&'static str),
    Hang,
}

#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<(String, String)>>,
    requests: Mutex<Vec<CompletionRequest>>,
    pub started: Notify,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            script: Mutex::new(steps.into()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn generate(
        &self,
        model: &str,
        credential: &ApiKey,
        request: &CompletionRequest,
    ) -> Result<String, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), credential.expose().to_string()));
        self.requests.lock().unwrap().push(request.clone());
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("provider called more times than scripted");
        self.started.notify_one();

        match step {
            Step::Reply(text) => Ok(text.to_string()),
            Step::Status(status) => Err(ProviderError::Http {
                status,
                message: format!("scripted {status}"),
            }),
            Step::Fatal(message) => Err(ProviderError::Http {
                status: 400,
                message: message.to_string(),
            }),
            Step::Hang => std::future::pending().await,
        }
    }
}

/// Memory backend that counts successful writes per key.
#[derive(Default)]
pub struct CountingBackend {
    inner: MemoryBackend,
    writes: Arc<Mutex<HashMap<String, usize>>>,
}

impl CountingBackend {
    pub fn new() -> (Self, Arc<Mutex<HashMap<String, usize>>>) {
        let backend = Self::default();
        let writes = backend.writes.clone();
        (backend, writes)
    }
}

impl StoreBackend for CountingBackend {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        *self.writes.lock().unwrap().entry(key.to_string()).or_default() += 1;
        self.inner.set(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.inner.delete(key)
    }
}

pub fn table(models: &[(&str, usize)]) -> EndpointTable {
    EndpointTable::new(
        models.iter()
            .map(|(model, n)| {
                Endpoint::new(
                    *model,
                    (0..*n).map(|i| ApiKey::new(format!("{model}-k{i}"))).collect(),
                )
            })
            .collect(),
    )
    .unwrap()
}

pub fn call(model: &str, credential: usize) -> (String, String) {
    (model.to_string(), format!("{model}-k{credential}"))
}

pub fn zoned(y: i16, m: i8, d: i8, hour: i8, minute: i8) -> jiff::Zoned {
    jiff::civil::date(y, m, d)
        .at(hour, minute, 0, 0)
        .to_zoned(jiff::tz::TimeZone::UTC)
        .unwrap()
}

pub struct Harness {
    pub orchestrator: ChatOrchestrator,
    pub provider: Arc<ScriptedProvider>,
    pub store: Arc<LocalStore>,
    pub clock: Arc<FixedClock>,
    pub notices: UnboundedReceiver<Notice>,
}

impl Harness {
    pub fn new(steps: Vec<Step>, models: &[(&str, usize)], settings: ChatSettings) -> Self {
        Self::with_store(Arc::new(LocalStore::in_memory()), steps, models, settings)
    }

    pub fn with_store(
        store: Arc<LocalStore>,
        steps: Vec<Step>,
        models: &[(&str, usize)],
        settings: ChatSettings,
    ) -> Self {
        let provider = Arc::new(ScriptedProvider::new(steps));
        let clock = Arc::new(FixedClock::new(zoned(2026, 10, 18, 14, 0)));
        let (notifier, notices) = Notifier::channel();
        let orchestrator = ChatOrchestrator::new(
            store.clone(),
            clock.clone(),
            FailoverClient::new(provider.clone(), table(models)),
            notifier,
            settings,
        );
        Self {
            orchestrator,
            provider,
            store,
            clock,
            notices,
        }
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        let mut out = Vec::new();
        while let Ok(n) = self.notices.try_recv() {
            out.push(n);
        }
        out
    }
}

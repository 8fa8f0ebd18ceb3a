//! Scripted in-process provider for exercising the failover loop without
//! a network.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use solance_core::models::endpoint::{ApiKey, Endpoint, EndpointTable};
use solance_llm::error::ProviderError;
use solance_llm::provider::ModelProvider;
use solance_llm::request::CompletionRequest;
use solance_llm::CancellationToken;
use tokio::sync::Notify;

pub enum Step {
    Reply(&'static str),
    Status(u16),
    Loading,
    Fatal(&'static str),
    /// Never resolves; only cancellation ends the attempt.
    Hang,
    /// Fires the token from inside the call, then replies.
    ReplyAfterCancel(CancellationToken, &'static str),
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

    /// Every (model, credential) attempted, in order.
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
            Step::Loading => Err(ProviderError::ModelLoading("warming up".into())),
            Step::Fatal(message) => Err(ProviderError::Http {
                status: 400,
                message: message.to_string(),
            }),
            Step::Hang => std::future::pending().await,
            Step::ReplyAfterCancel(token, text) => {
                token.cancel();
                Ok(text.to_string())
            }
        }
    }
}

/// Build a table from `(model, credential count)` pairs. Credentials are
/// named `<model>-k<index>`.
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

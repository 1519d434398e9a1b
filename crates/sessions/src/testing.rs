//! Test doubles shared by the store tests.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use cd_client::{ChatBackend, SendOptions};
use cd_domain::error::{Error, Result};
use cd_domain::message::Message;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::kv::KeyValueStore;

/// Storage that rejects every operation.
pub struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(Error::Storage("storage unavailable".into()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(Error::Storage("storage unavailable".into()))
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Err(Error::Storage("storage unavailable".into()))
    }
}

/// One recorded backend call.
#[derive(Debug, Clone)]
pub struct Call {
    pub prompt: String,
    pub session_id: String,
    pub options: SendOptions,
}

/// Backend that plays back queued outcomes, then echoes `re: <prompt>`.
#[derive(Default)]
pub struct ScriptedBackend {
    outcomes: Mutex<VecDeque<Result<String>>>,
    delays: Vec<(String, Duration)>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedBackend {
    pub fn echo() -> Self {
        Self::default()
    }

    pub fn with(outcomes: Vec<Result<String>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            ..Self::default()
        }
    }

    /// Delay the reply to `prompt` by `delay`.
    pub fn with_delay(mut self, prompt: &str, delay: Duration) -> Self {
        self.delays.push((prompt.to_owned(), delay));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn send_prompt(
        &self,
        prompt: &str,
        session_id: &str,
        options: &SendOptions,
    ) -> Result<Message> {
        self.calls.lock().push(Call {
            prompt: prompt.to_owned(),
            session_id: session_id.to_owned(),
            options: options.clone(),
        });
        let outcome = self.outcomes.lock().pop_front();

        let delay = self
            .delays
            .iter()
            .find(|(p, _)| p == prompt)
            .map(|(_, d)| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match outcome {
            Some(Ok(text)) => Ok(Message::assistant(text)),
            Some(Err(e)) => Err(e),
            None => Ok(Message::assistant(format!("re: {prompt}"))),
        }
    }
}

/// Backend that parks every request until [`release`](Self::release).
#[derive(Default)]
pub struct GatedBackend {
    started: Notify,
    gate: Notify,
}

impl GatedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves once a request has reached the backend.
    pub async fn started(&self) {
        self.started.notified().await;
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl ChatBackend for GatedBackend {
    async fn send_prompt(
        &self,
        prompt: &str,
        _session_id: &str,
        _options: &SendOptions,
    ) -> Result<Message> {
        self.started.notify_one();
        self.gate.notified().await;
        Ok(Message::assistant(format!("re: {prompt}")))
    }
}

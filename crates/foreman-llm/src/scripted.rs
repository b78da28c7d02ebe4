//! Scripted reasoning client for tests.
//!
//! Plays back a fixed queue of decisions/errors and instruments
//! concurrency: the recorded peak of simultaneous `infer` calls is how
//! tests verify the pool's admission gate. Shared as a normal module so
//! every crate in the workspace tests against the same fake.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use foreman_core::transcript::Transcript;

use crate::client::{ReasoningClient, ToolDescriptor};
use crate::decision::Decision;
use crate::errors::InferenceError;

/// Queue-driven [`ReasoningClient`] fake.
///
/// Pops one scripted response per `infer` call. When the queue runs
/// dry it returns the repeat response if one is set, otherwise
/// [`Decision::Complete`] so driven loops always terminate.
pub struct ScriptedClient {
    script: Mutex<VecDeque<Result<Decision, InferenceError>>>,
    repeat: Option<Result<Decision, InferenceError>>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedClient {
    /// Client that plays back `script` in order.
    pub fn new(script: Vec<Result<Decision, InferenceError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            repeat: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Client that returns the same response on every call.
    pub fn always(response: Result<Decision, InferenceError>) -> Self {
        let mut client = Self::new(Vec::new());
        client.repeat = Some(response);
        client
    }

    /// Hold each `infer` call open for `delay` before answering.
    ///
    /// Needed to create real overlap in concurrency tests; without a
    /// delay the calls resolve too fast to ever coexist.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the response used once the script is exhausted.
    pub fn with_repeat(mut self, response: Result<Decision, InferenceError>) -> Self {
        self.repeat = Some(response);
        self
    }

    /// Total `infer` calls observed.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous `infer` calls observed.
    pub fn peak_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReasoningClient for ScriptedClient {
    async fn infer(
        &self,
        _transcript: &Transcript,
        _tools: &[ToolDescriptor],
        _response_schema: Option<&Value>,
    ) -> Result<Decision, InferenceError> {
        let _ = self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let response = {
            let mut script = self.script.lock();
            script.pop_front()
        };
        let _ = self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match response {
            Some(r) => r,
            None => self.repeat.clone().unwrap_or(Ok(Decision::Complete)),
        }
    }
}

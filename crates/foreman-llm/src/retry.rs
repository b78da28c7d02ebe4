//! Bounded retry around `infer`.
//!
//! Transient failures are retried with capped exponential backoff;
//! fatal failures and exhausted budgets surface to the caller. The
//! final transient error is returned as-is so the worker can record the
//! provider's reason.

use serde_json::Value;
use tracing::{debug, warn};

use foreman_core::retry::RetryConfig;
use foreman_core::transcript::Transcript;

use crate::client::{ReasoningClient, ToolDescriptor};
use crate::decision::Decision;
use crate::errors::InferenceError;

/// Call `infer`, retrying transient failures per `retry`.
pub async fn infer_with_retry(
    client: &dyn ReasoningClient,
    transcript: &Transcript,
    tools: &[ToolDescriptor],
    response_schema: Option<&Value>,
    retry: &RetryConfig,
) -> Result<Decision, InferenceError> {
    let mut attempt: u32 = 0;
    loop {
        match client.infer(transcript, tools, response_schema).await {
            Ok(decision) => return Ok(decision),
            Err(err) if err.is_transient() && attempt < retry.max_retries => {
                attempt += 1;
                let delay = retry.delay_for(attempt);
                debug!(attempt, ?delay, error = %err, "retrying transient inference failure");
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                if err.is_transient() {
                    warn!(attempts = attempt + 1, error = %err, "retry budget exhausted");
                }
                return Err(err);
            }
        }
    }
}

//! Orchestration configuration.
//!
//! Every limit the engine enforces is an explicit field threaded
//! through constructors — there is no process-wide mutable state.
//! Validation runs before any work starts; a config that cannot make
//! progress is rejected up front.

use std::time::Duration;

use foreman_core::retry::RetryConfig;

use crate::errors::RuntimeError;

/// Tunable limits for one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestrationConfig {
    /// Maximum simultaneously running worker sessions.
    pub concurrency_limit: usize,
    /// Hard cap on supervisor iterations; the sole termination
    /// guarantee independent of model behavior.
    pub max_supervisor_iterations: u32,
    /// Tool calls allowed per worker before compression is forced.
    pub per_worker_tool_call_cap: u32,
    /// Delegated topics dispatched per batch; overflow queues into
    /// subsequent batches rather than being dropped.
    pub max_units_per_batch: usize,
    /// Byte budget for the deterministic compression fallback.
    pub compression_budget: usize,
    /// Wall-clock bound on the whole run.
    pub overall_timeout: Duration,
    /// Backoff policy for transient inference failures.
    pub retry: RetryConfig,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 4,
            max_supervisor_iterations: 8,
            per_worker_tool_call_cap: 5,
            max_units_per_batch: 5,
            compression_budget: 2048,
            overall_timeout: Duration::from_secs(120),
            retry: RetryConfig::default(),
        }
    }
}

impl OrchestrationConfig {
    /// Reject configurations that cannot make progress.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.concurrency_limit == 0 {
            return Err(RuntimeError::invalid_config("concurrency_limit must be > 0"));
        }
        if self.max_supervisor_iterations == 0 {
            return Err(RuntimeError::invalid_config(
                "max_supervisor_iterations must be > 0",
            ));
        }
        if self.per_worker_tool_call_cap == 0 {
            return Err(RuntimeError::invalid_config(
                "per_worker_tool_call_cap must be > 0",
            ));
        }
        if self.max_units_per_batch == 0 {
            return Err(RuntimeError::invalid_config("max_units_per_batch must be > 0"));
        }
        if self.compression_budget == 0 {
            return Err(RuntimeError::invalid_config("compression_budget must be > 0"));
        }
        if self.overall_timeout.is_zero() {
            return Err(RuntimeError::invalid_config("overall_timeout must be > 0"));
        }
        Ok(())
    }
}

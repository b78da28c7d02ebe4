//! # foreman-runtime
//!
//! Coordination loop, bounded worker pool, and orchestration entry point.
//!
//! - **Worker session**: bounded reason-act-observe loop producing one
//!   compressed note per delegated task
//! - **Worker pool**: semaphore-gated parallel execution with shared
//!   cancellation and sibling failure isolation
//! - **Supervisor**: single-threaded coordination loop — delegate,
//!   reflect, or complete — hard-capped on iterations
//! - **Aggregator**: pure synthesis of accumulated notes
//! - **Orchestrator**: public entry point wiring the above with overall
//!   timeout and graceful cancellation
//!
//! ## Crate Position
//!
//! Aggregation layer. Depends on: foreman-core, foreman-llm,
//! foreman-tools.

#![deny(unsafe_code)]

pub mod aggregator;
pub mod config;
pub mod emitter;
pub mod errors;
pub mod orchestrator;
pub mod pool;
pub mod supervisor;
pub mod types;
pub mod worker;

// Re-export main public API
pub use aggregator::Aggregator;
pub use config::OrchestrationConfig;
pub use emitter::{EventEmitter, RunEmitter};
pub use errors::RuntimeError;
pub use orchestrator::Orchestrator;
pub use pool::WorkerPool;
pub use supervisor::Supervisor;
pub use types::{Note, NoteKind, OrchestrationResult, SupervisorState, SupervisorStatus, WorkerResult};
pub use worker::WorkerSession;

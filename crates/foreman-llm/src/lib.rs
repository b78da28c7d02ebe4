//! # foreman-llm
//!
//! The reasoning boundary of the foreman engine.
//!
//! - **Client**: [`client::ReasoningClient`] — one `infer` call takes a
//!   transcript plus available tools and returns a [`decision::Decision`]
//! - **Decisions**: closed union of model directives, kept total with an
//!   explicit `Unrecognized` branch
//! - **Errors**: [`errors::InferenceError`] split into transient
//!   (retryable) and fatal
//! - **Retry**: [`retry::infer_with_retry`] bounded-backoff wrapper
//! - **Scripted client**: [`scripted::ScriptedClient`] queue-driven fake
//!   with concurrency instrumentation, shared by tests across crates
//!
//! ## Crate Position
//!
//! Capability crate. Depends on foreman-core; consumed by foreman-runtime.

#![deny(unsafe_code)]

pub mod client;
pub mod decision;
pub mod errors;
pub mod retry;
pub mod scripted;

pub use client::ReasoningClient;
pub use decision::{Decision, ToolRequest};
pub use errors::InferenceError;
pub use retry::infer_with_retry;
pub use scripted::ScriptedClient;

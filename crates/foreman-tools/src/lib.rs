//! # foreman-tools
//!
//! Capability endpoints for worker sessions.
//!
//! - **Trait**: [`traits::Tool`] — name, description, async execute
//! - **Registry**: [`registry::ToolRegistry`] — name → tool lookup and
//!   metered invocation
//! - **Errors**: [`errors::ToolError`] — always recoverable at the call
//!   site; a failed tool becomes an observation turn, never a crash
//!
//! Concrete production tools (web search, document retrieval) live
//! outside this workspace and plug in through the trait.
//!
//! ## Crate Position
//!
//! Capability crate. Depends on foreman-core and foreman-llm (for
//! [`foreman_llm::client::ToolDescriptor`]); consumed by foreman-runtime.

#![deny(unsafe_code)]

pub mod errors;
pub mod registry;
pub mod traits;

pub use errors::ToolError;
pub use registry::ToolRegistry;
pub use traits::{Tool, ToolContext};

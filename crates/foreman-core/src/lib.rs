//! # foreman-core
//!
//! Foundation types and utilities for the foreman orchestration engine.
//!
//! This crate provides the shared vocabulary that all other foreman crates
//! depend on:
//!
//! - **Branded IDs**: [`ids::TaskId`], [`ids::RunId`] as uuid-v7 newtypes
//! - **Tasks**: [`task::Task`] with its [`task::TaskStatus`] lifecycle
//! - **Transcripts**: [`transcript::Turn`] entries and the ordered
//!   [`transcript::Transcript`] they accumulate into
//! - **Events**: [`events::RunEvent`] for run lifecycle broadcasting
//! - **Retry**: [`retry::RetryConfig`] and capped backoff calculation
//! - **Text**: [`text::clamp_utf8`] UTF-8–safe truncation
//! - **Logging**: [`logging::init`] tracing bootstrap
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other foreman crates.

#![deny(unsafe_code)]

pub mod events;
pub mod ids;
pub mod logging;
pub mod retry;
pub mod task;
pub mod text;
pub mod transcript;

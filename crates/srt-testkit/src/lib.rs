//! SRT Test Kit - scripted doubles and fixtures for replay-harness tests
//!
//! This crate provides the pieces a harness test needs besides the harness
//! itself:
//!
//! - [`ScriptedDispatch`] - a dispatcher that replays scripted outcomes and
//!   records what each call observed
//! - [`MemoryStore`] - an in-memory fixture store
//! - [`MemorySink`] - a report sink that captures verdicts for assertions
//! - [`sdk`] - a small sample SDK (clients, request/response shapes,
//!   polymorphic variants) shaped like the generated code the harness drives
//! - Tracing configuration for test output
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use srt_testkit::{MemorySink, MemoryStore, ScriptedDispatch, sdk};
//!
//! #[tokio::test]
//! async fn replay_one_operation() {
//!     srt_testkit::init_test_tracing();
//!
//!     let store = MemoryStore::new()
//!         .with_requests(key.clone(), fixture_json)
//!         .with_baseline(key.clone(), "c1", baseline);
//!     let dispatch: ScriptedDispatch<sdk::GetGatewayResponse> =
//!         ScriptedDispatch::new().push_ok(response);
//!
//!     // hand both to the harness and assert on the sink afterwards
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod dispatch;
pub mod fixtures;
pub mod sdk;
pub mod sink;
pub mod tracing_config;

pub use dispatch::{CallRecord, PanicOnDispatch, ScriptedDispatch};
pub use fixtures::MemoryStore;
pub use sink::MemorySink;
pub use tracing_config::{init_test_tracing, init_test_tracing_silent};

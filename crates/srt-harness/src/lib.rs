//! Conformance replay runtime for recorded SDK fixtures.
//!
//! Per-operation test shells hand this crate a small registration (an
//! operation key, a client builder, a dispatcher, optionally a polymorphic
//! table and a pagination adapter) and the runtime does the rest:
//!
//! - [`FixtureStore`]: recorded request payloads and response baselines
//! - [`CapabilityGate`]: early-skip decisions per (service, operation)
//! - [`decode_requests`]: loosely-typed JSON into typed requests, with
//!   data-driven resolution of sum-typed holder fields
//! - [`invoke_with_policy`]: the dispatch seam and the retry loop
//! - [`PaginationDriver`]: continuation-token threading for list operations
//! - [`ResponseValidator`]: structural comparison against baselines
//! - [`TestHarness`]: orchestration of one operation run

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod fixlint;
mod gate;
mod harness;
mod invoke;
mod pagination;
mod poly;
mod store;
mod validator;

pub use gate::{CapabilityGate, StaticGate};
pub use harness::{OperationPlan, TestHarness};
pub use invoke::{invoke_with_policy, BuildClient, Dispatch};
pub use pagination::{
    PageError, PageOutcome, PageableRequest, PageableResponse, PaginationDriver,
};
pub use poly::{decode_requests, DecodedRequest, DiscriminatorSpec, PolymorphicMap};
pub use store::{Baseline, DirFixtureStore, ExpectedError, FixtureStore};
pub use validator::ResponseValidator;

// Re-export the core types shells need, so most only import this crate.
pub use srt_core::{
    ConfigProvider, HarnessError, HarnessResult, InvokeError, OperationKey, OperationOutcome,
    OperationSummary, ReportSink, RequestMetadata, RequestReport, RetryPolicy,
    RetryPolicyFactory, SdkRequest, StaticProvider, TestingConfig, TracingSink, Verdict,
};

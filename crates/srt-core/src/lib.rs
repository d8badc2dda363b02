//! Core data model for the SDK replay testkit.
//!
//! This crate carries the types shared by the replay runtime and the
//! per-operation shells:
//!
//! - [`OperationKey`]: (service, operation) identity
//! - [`TestingConfig`] / [`ConfigProvider`]: run configuration and credentials
//! - [`RetryPolicy`] and its factory: the uniform test retry policy
//! - [`RequestMetadata`] / [`SdkRequest`]: the retry-policy injection seam
//! - [`HarnessError`] / [`InvokeError`]: the error taxonomy
//! - [`RequestReport`] / [`ReportSink`]: the reporting surface

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

mod config;
mod error;
mod operation;
mod report;
mod request;
mod retry;

pub use config::{ConfigProvider, StaticProvider, TestingConfig, DEFAULT_MAX_PAGES};
pub use error::{HarnessError, HarnessResult, InvokeError};
pub use operation::OperationKey;
pub use report::{
    OperationOutcome, OperationSummary, ReportSink, RequestReport, TracingSink, Verdict,
};
pub use request::{RequestMetadata, SdkRequest};
pub use retry::{ExponentialBackoff, RetryPolicy, RetryPolicyFactory};

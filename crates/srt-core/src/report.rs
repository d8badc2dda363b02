//! Per-request verdicts and the reporting seam.
//!
//! The harness does not own reporting: it pushes structured records into an
//! injected [`ReportSink`]. The default sink forwards to `tracing`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::OperationKey;

/// Outcome of one replayed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Live result matched the baseline.
    Passed,
    /// Live result diverged from the baseline; `message` carries the diff.
    Failed,
    /// The request could not be replayed at all (shape error, panic, ...).
    Fatal,
}

impl Verdict {
    /// Whether this verdict counts as a failure for the operation aggregate.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Fatal)
    }
}

/// Structured record for one replayed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestReport {
    /// Operation this request belongs to.
    pub operation: OperationKey,
    /// Baseline join key.
    pub container_id: String,
    /// Zero-based position in the fixture.
    pub index: usize,
    /// Outcome.
    pub verdict: Verdict,
    /// Mismatch description; empty on pass.
    pub message: String,
    /// Wall-clock time for invoke + validate.
    pub elapsed: Duration,
    /// When the verdict was produced.
    pub at: DateTime<Utc>,
}

/// Aggregate outcome for one (service, operation) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationOutcome {
    /// The capability gate disabled the operation; nothing ran.
    Skipped,
    /// Every request passed (including the zero-request case).
    Passed,
    /// At least one request failed, or the operation failed before requests.
    Failed,
}

/// Per-operation aggregate pushed once at the end of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationSummary {
    /// The operation that ran.
    pub operation: OperationKey,
    /// Aggregate outcome.
    pub outcome: OperationOutcome,
    /// Requests replayed.
    pub requests: usize,
    /// Requests with a failing verdict.
    pub failures: usize,
    /// Failure detail when the operation died before any request ran.
    pub message: String,
}

impl OperationSummary {
    /// Summary for a gated-off operation.
    #[must_use]
    pub fn skipped(operation: OperationKey) -> Self {
        Self {
            operation,
            outcome: OperationOutcome::Skipped,
            requests: 0,
            failures: 0,
            message: String::new(),
        }
    }

    /// Summary for an operation that failed before any request ran.
    pub fn fatal(operation: OperationKey, message: impl Into<String>) -> Self {
        Self {
            operation,
            outcome: OperationOutcome::Failed,
            requests: 0,
            failures: 0,
            message: message.into(),
        }
    }
}

/// Reporting collaborator. Implementations must tolerate concurrent pushes
/// from parallel operation runs.
pub trait ReportSink: Send + Sync {
    /// One record per replayed request, in fixture order within an operation.
    fn request(&self, report: &RequestReport);

    /// One record per operation run.
    fn operation(&self, summary: &OperationSummary);
}

/// Default sink: structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn request(&self, report: &RequestReport) {
        match report.verdict {
            Verdict::Passed => tracing::info!(
                operation = %report.operation,
                container_id = %report.container_id,
                index = report.index,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "request passed"
            ),
            Verdict::Failed | Verdict::Fatal => tracing::error!(
                operation = %report.operation,
                container_id = %report.container_id,
                index = report.index,
                verdict = ?report.verdict,
                message = %report.message,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "request failed"
            ),
        }
    }

    fn operation(&self, summary: &OperationSummary) {
        tracing::info!(
            operation = %summary.operation,
            outcome = ?summary.outcome,
            requests = summary.requests,
            failures = summary.failures,
            "operation finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_failure_classification() {
        assert!(!Verdict::Passed.is_failure());
        assert!(Verdict::Failed.is_failure());
        assert!(Verdict::Fatal.is_failure());
    }

    #[test]
    fn skipped_summary_is_empty() {
        let s = OperationSummary::skipped(OperationKey::new("core", "GetGateway"));
        assert_eq!(s.outcome, OperationOutcome::Skipped);
        assert_eq!(s.requests, 0);
        assert!(s.message.is_empty());
    }
}

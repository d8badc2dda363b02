//! Capturing report sink.

use parking_lot::Mutex;
use srt_core::{OperationSummary, ReportSink, RequestReport, Verdict};

/// Sink that records every report for later assertions.
#[derive(Debug, Default)]
pub struct MemorySink {
    requests: Mutex<Vec<RequestReport>>,
    operations: Mutex<Vec<OperationSummary>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All request reports, in emission order.
    #[must_use]
    pub fn requests(&self) -> Vec<RequestReport> {
        self.requests.lock().clone()
    }

    /// All operation summaries, in emission order.
    #[must_use]
    pub fn operations(&self) -> Vec<OperationSummary> {
        self.operations.lock().clone()
    }

    /// Verdicts only, in emission order.
    #[must_use]
    pub fn verdicts(&self) -> Vec<Verdict> {
        self.requests.lock().iter().map(|r| r.verdict).collect()
    }
}

impl ReportSink for MemorySink {
    fn request(&self, report: &RequestReport) {
        self.requests.lock().push(report.clone());
    }

    fn operation(&self, summary: &OperationSummary) {
        self.operations.lock().push(summary.clone());
    }
}

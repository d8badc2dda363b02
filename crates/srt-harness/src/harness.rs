//! Orchestration of one (service, operation) run.
//!
//! The harness drives: gate → build client → load fixtures → decode → for
//! each request, install the retry policy, invoke (single or paginated),
//! validate, report. Requests run sequentially in fixture order; a panic in
//! one request's step becomes a fatal verdict for that request only.
//!
//! The external test framework may run many harness runs in parallel; all
//! shared collaborators here are read-only or internally synchronized.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures_util::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use srt_core::{
    ConfigProvider, HarnessError, HarnessResult, OperationKey, OperationOutcome, OperationSummary,
    ReportSink, RequestReport, RetryPolicy, RetryPolicyFactory, SdkRequest, TestingConfig,
    TracingSink, Verdict,
};
use tokio::sync::watch;

use crate::gate::CapabilityGate;
use crate::invoke::{invoke_with_policy, BuildClient, Dispatch};
use crate::pagination::{PageError, PageableRequest, PageableResponse, PaginationDriver};
use crate::poly::{decode_requests, DecodedRequest, PolymorphicMap};
use crate::store::FixtureStore;
use crate::validator::ResponseValidator;

/// Everything a per-operation shell registers for one run: the operation
/// identity, its polymorphic registrations, and its volatile-field allowlist.
#[derive(Debug, Clone)]
pub struct OperationPlan {
    /// Operation identity.
    pub key: OperationKey,
    /// Holder-field registrations, if the request schema has sum-typed parts.
    pub poly: Option<PolymorphicMap>,
    /// Operation-level ignored fields for validation.
    pub ignored_fields: Vec<String>,
}

impl OperationPlan {
    /// Plan for an operation with no polymorphic parts and no ignores.
    pub fn new(service: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            key: OperationKey::new(service, operation),
            poly: None,
            ignored_fields: Vec::new(),
        }
    }

    /// Attach a polymorphic registration table.
    #[must_use]
    pub fn with_poly(mut self, poly: PolymorphicMap) -> Self {
        self.poly = Some(poly);
        self
    }

    /// Add ignored fields for validation.
    #[must_use]
    pub fn ignore_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_fields
            .extend(fields.into_iter().map(Into::into));
        self
    }
}

/// Drives conformance runs against recorded fixtures.
pub struct TestHarness {
    store: Arc<dyn FixtureStore>,
    gate: Arc<dyn CapabilityGate>,
    provider: Arc<dyn ConfigProvider>,
    sink: Arc<dyn ReportSink>,
    config: TestingConfig,
    shutdown: watch::Receiver<bool>,
    // Keeps the default channel open when no external handle was supplied.
    _default_shutdown: Option<Arc<watch::Sender<bool>>>,
}

impl TestHarness {
    /// Harness over the given collaborators, reporting to `tracing` and with
    /// an internal (never-fired) cancellation channel.
    pub fn new(
        store: Arc<dyn FixtureStore>,
        gate: Arc<dyn CapabilityGate>,
        provider: Arc<dyn ConfigProvider>,
        config: TestingConfig,
    ) -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            store,
            gate,
            provider,
            sink: Arc::new(TracingSink),
            config,
            shutdown: rx,
            _default_shutdown: Some(Arc::new(tx)),
        }
    }

    /// Replace the reporting sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Use the test framework's cancellation handle.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = shutdown;
        self._default_shutdown = None;
        self
    }

    /// Run a unary operation: one invoke per fixture request.
    pub async fn run_unary<C, T, S, B, D>(
        &self,
        plan: &OperationPlan,
        build: B,
        dispatch: &D,
    ) -> OperationSummary
    where
        C: Sync,
        T: SdkRequest + DeserializeOwned + Serialize + Clone + Send + Sync + 'static,
        S: Serialize + Send,
        B: BuildClient<C>,
        D: Dispatch<C, T, S> + ?Sized,
    {
        let (client, requests, validator, policy) = match self.prepare::<C, T, B>(plan, build) {
            Ok(ready) => ready,
            Err(summary) => return summary,
        };

        let mut failures = 0usize;
        let total = requests.len();
        for (index, decoded) in requests.into_iter().enumerate() {
            let verdict = self
                .replay_one(plan, index, decoded, policy.as_ref(), |container_id, req| {
                    let client = &client;
                    let validator = &validator;
                    let shutdown = &self.shutdown;
                    async move {
                        let result = invoke_with_policy(dispatch, client, &req, shutdown).await;
                        let (live, err) = match result {
                            Ok(response) => (Some(response), None),
                            Err(err) => (None, Some(err)),
                        };
                        validator.validate(&container_id, &req, &live, err.as_ref())
                    }
                })
                .await;
            if verdict.is_failure() {
                failures += 1;
            }
        }

        self.finish(plan, total, failures)
    }

    /// Run a list operation: the pagination driver produces the full page
    /// sequence per fixture request.
    pub async fn run_paginated<C, T, S, B, D>(
        &self,
        plan: &OperationPlan,
        build: B,
        dispatch: &D,
    ) -> OperationSummary
    where
        C: Sync,
        T: PageableRequest + DeserializeOwned + Serialize + Clone + Send + Sync + 'static,
        S: PageableResponse + Serialize,
        B: BuildClient<C>,
        D: Dispatch<C, T, S> + ?Sized,
    {
        let (client, requests, validator, policy) = match self.prepare::<C, T, B>(plan, build) {
            Ok(ready) => ready,
            Err(summary) => return summary,
        };
        let driver = PaginationDriver::new(self.config.max_pages, self.shutdown.clone());

        let mut failures = 0usize;
        let total = requests.len();
        for (index, decoded) in requests.into_iter().enumerate() {
            let verdict = self
                .replay_one(plan, index, decoded, policy.as_ref(), |container_id, mut req| {
                    let client = &client;
                    let validator = &validator;
                    let driver = &driver;
                    async move {
                        let outcome = driver.collect(dispatch, client, &mut req).await;
                        match outcome.error {
                            Some(PageError::Overrun { pages }) => {
                                Err(HarnessError::PaginationOverrun { pages })
                            }
                            Some(PageError::Invoke(err)) => validator.validate(
                                &container_id,
                                &req,
                                &outcome.responses,
                                Some(&err),
                            ),
                            None => {
                                validator.validate(&container_id, &req, &outcome.responses, None)
                            }
                        }
                    }
                })
                .await;
            if verdict.is_failure() {
                failures += 1;
            }
        }

        self.finish(plan, total, failures)
    }

    // Gate, client build, fixture load, decode. An Err is the already-reported
    // summary for runs that die before any request.
    #[allow(clippy::type_complexity)]
    fn prepare<C, T, B>(
        &self,
        plan: &OperationPlan,
        build: B,
    ) -> Result<
        (
            C,
            Vec<DecodedRequest<T>>,
            ResponseValidator,
            Option<Arc<RetryPolicy>>,
        ),
        OperationSummary,
    >
    where
        T: DeserializeOwned,
        B: BuildClient<C>,
    {
        let key = &plan.key;
        match self.gate.is_enabled(key) {
            Err(err) => {
                tracing::error!(operation = %key, error = %err, "capability lookup failed");
                return Err(self.summarize(OperationSummary::fatal(key.clone(), err.to_string())));
            }
            Ok(false) => {
                tracing::info!(operation = %key, "operation disabled, skipping");
                return Err(self.summarize(OperationSummary::skipped(key.clone())));
            }
            Ok(true) => {}
        }

        let client = match build.build(self.provider.as_ref(), &self.config) {
            Ok(client) => client,
            Err(err) => {
                return Err(self.summarize(OperationSummary::fatal(key.clone(), err.to_string())))
            }
        };

        let raw = match self.store.get_requests(key) {
            Ok(raw) => raw,
            Err(err) => {
                return Err(self.summarize(OperationSummary::fatal(key.clone(), err.to_string())))
            }
        };
        let requests = match decode_requests::<T>(&raw, plan.poly.as_ref()) {
            Ok(requests) => requests,
            Err(err) => {
                return Err(self.summarize(OperationSummary::fatal(key.clone(), err.to_string())))
            }
        };

        let validator = ResponseValidator::new(Arc::clone(&self.store), key.clone())
            .ignore_fields(plan.ignored_fields.iter().cloned());
        let policy = self
            .config
            .with_retry
            .then(RetryPolicyFactory::build_test_policy);

        tracing::info!(
            operation = %key,
            with_retry = self.config.with_retry,
            requests = requests.len(),
            "starting operation run"
        );
        Ok((client, requests, validator, policy))
    }

    // One request: policy injection, the supplied step, panic trapping,
    // verdict classification, report emission.
    async fn replay_one<T, F, Fut>(
        &self,
        plan: &OperationPlan,
        index: usize,
        decoded: DecodedRequest<T>,
        policy: Option<&Arc<RetryPolicy>>,
        step: F,
    ) -> Verdict
    where
        T: SdkRequest,
        F: FnOnce(String, T) -> Fut,
        Fut: std::future::Future<Output = HarnessResult<String>>,
    {
        let started = Instant::now();
        let container_id = decoded.container_id;

        let (verdict, message) = match decoded.request {
            Err(err) => (Verdict::Fatal, err.to_string()),
            Ok(mut request) => {
                if let Some(policy) = policy {
                    request.metadata_mut().retry_policy = Some(Arc::clone(policy));
                }
                let step = AssertUnwindSafe(step(container_id.clone(), request));
                match step.catch_unwind().await {
                    Err(payload) => (
                        Verdict::Fatal,
                        format!("request step panicked: {}", panic_message(payload.as_ref())),
                    ),
                    Ok(Err(err)) => (Verdict::Fatal, err.to_string()),
                    Ok(Ok(message)) if message.is_empty() => (Verdict::Passed, message),
                    Ok(Ok(message)) => (Verdict::Failed, message),
                }
            }
        };

        self.sink.request(&RequestReport {
            operation: plan.key.clone(),
            container_id,
            index,
            verdict,
            message,
            elapsed: started.elapsed(),
            at: Utc::now(),
        });
        verdict
    }

    fn finish(&self, plan: &OperationPlan, requests: usize, failures: usize) -> OperationSummary {
        let outcome = if failures == 0 {
            OperationOutcome::Passed
        } else {
            OperationOutcome::Failed
        };
        self.summarize(OperationSummary {
            operation: plan.key.clone(),
            outcome,
            requests,
            failures,
            message: String::new(),
        })
    }

    fn summarize(&self, summary: OperationSummary) -> OperationSummary {
        self.sink.operation(&summary);
        summary
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "opaque panic payload".to_owned())
}

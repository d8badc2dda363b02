//! The invocation layer: dispatch seam and the retry loop.
//!
//! Per-operation shells register a client builder and a dispatcher; the
//! harness drives both. Retries live entirely below this seam: callers see
//! one `Result` per logical invocation regardless of how many attempts ran.

use async_trait::async_trait;
use srt_core::{ConfigProvider, HarnessResult, InvokeError, SdkRequest, TestingConfig};
use tokio::sync::watch;

/// Builds the operation-specific client from credentials and test config.
///
/// Builders install the endpoint override as the client host when present,
/// the region otherwise. Build failure aborts the operation before any
/// request is attempted.
pub trait BuildClient<C> {
    /// Construct the client.
    fn build(self, provider: &dyn ConfigProvider, config: &TestingConfig) -> HarnessResult<C>;
}

impl<C, F> BuildClient<C> for F
where
    F: FnOnce(&dyn ConfigProvider, &TestingConfig) -> HarnessResult<C>,
{
    fn build(self, provider: &dyn ConfigProvider, config: &TestingConfig) -> HarnessResult<C> {
        self(provider, config)
    }
}

/// Operation-specific, type-safe dispatcher.
#[async_trait]
pub trait Dispatch<C, T, S>: Send + Sync
where
    C: Sync,
    T: Send + 'static,
{
    /// Invoke the operation once on the client.
    async fn dispatch(&self, client: &C, request: T) -> Result<S, InvokeError>;
}

/// Resolves when the shutdown channel reads `true`. Pends forever if the
/// sender is gone so a dropped test framework never looks like cancellation.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Invoke respecting the request's retry-policy slot.
///
/// No policy installed: exactly one attempt, no per-attempt timeout. Policy
/// installed: up to `max_attempts` attempts, each bounded by the policy's
/// attempt timeout, with jittered exponential backoff in between. Cancellation
/// aborts the in-flight attempt and any backoff wait.
pub async fn invoke_with_policy<C, T, S, D>(
    dispatch: &D,
    client: &C,
    request: &T,
    shutdown: &watch::Receiver<bool>,
) -> Result<S, InvokeError>
where
    C: Sync,
    T: SdkRequest + Clone + Send + Sync + 'static,
    D: Dispatch<C, T, S> + ?Sized,
{
    let mut shutdown = shutdown.clone();
    let Some(policy) = request.metadata().retry_policy.clone() else {
        return tokio::select! {
            result = dispatch.dispatch(client, request.clone()) => result,
            () = cancelled(&mut shutdown) => Err(InvokeError::Cancelled),
        };
    };

    let mut attempt: u32 = 0;
    loop {
        let outcome = tokio::select! {
            outcome = tokio::time::timeout(
                policy.attempt_timeout,
                dispatch.dispatch(client, request.clone()),
            ) => outcome.unwrap_or(Err(InvokeError::Timeout)),
            () = cancelled(&mut shutdown) => Err(InvokeError::Cancelled),
        };

        match outcome {
            Ok(response) => return Ok(response),
            Err(err) => {
                attempt += 1;
                if attempt >= policy.max_attempts || !policy.is_retryable(&err) {
                    return Err(err);
                }
                let delay = policy.backoff.delay(attempt - 1);
                tracing::debug!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retrying after backoff"
                );
                tokio::select! {
                    () = tokio::time::sleep(delay) => {}
                    () = cancelled(&mut shutdown) => return Err(InvokeError::Cancelled),
                }
            }
        }
    }
}

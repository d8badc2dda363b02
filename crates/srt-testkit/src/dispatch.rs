//! Scripted dispatchers with call recording.
//!
//! The replay runtime's dispatch seam is where transport would live; these
//! dispatchers script its outcomes instead, and record what each call
//! observed (serialized request, retry-slot identity) for assertions.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use srt_core::{InvokeError, RetryPolicy, SdkRequest};
use srt_harness::Dispatch;

/// What one dispatched call observed.
#[derive(Debug, Clone)]
pub struct CallRecord {
    /// The request as it arrived, serialized to JSON.
    pub request_json: serde_json::Value,
    /// Retry policy installed on the request's metadata at invocation time.
    pub retry_policy: Option<Arc<RetryPolicy>>,
}

/// Dispatcher that replays a scripted queue of outcomes.
pub struct ScriptedDispatch<S> {
    script: Mutex<VecDeque<Result<S, InvokeError>>>,
    calls: Mutex<Vec<CallRecord>>,
    repeat_last: bool,
}

impl<S: Clone> ScriptedDispatch<S> {
    /// Empty script; every call fails until outcomes are pushed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            repeat_last: false,
        }
    }

    /// Script a successful response.
    #[must_use]
    pub fn push_ok(self, response: S) -> Self {
        self.script.lock().push_back(Ok(response));
        self
    }

    /// Script a failing call.
    #[must_use]
    pub fn push_err(self, error: InvokeError) -> Self {
        self.script.lock().push_back(Err(error));
        self
    }

    /// Script a whole sequence of successful responses.
    #[must_use]
    pub fn push_pages<I: IntoIterator<Item = S>>(self, pages: I) -> Self {
        {
            let mut script = self.script.lock();
            for page in pages {
                script.push_back(Ok(page));
            }
        }
        self
    }

    /// Keep re-serving the final scripted outcome once the queue drains,
    /// simulating a server that never stops advertising pages.
    #[must_use]
    pub const fn repeating_last(mut self) -> Self {
        self.repeat_last = true;
        self
    }

    /// Everything recorded so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<CallRecord> {
        self.calls.lock().clone()
    }

    /// Number of calls dispatched.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn next_outcome(&self) -> Result<S, InvokeError> {
        let mut script = self.script.lock();
        if self.repeat_last && script.len() == 1 {
            return script
                .front()
                .cloned()
                .unwrap_or_else(|| Err(InvokeError::transport("empty script")));
        }
        script
            .pop_front()
            .unwrap_or_else(|| Err(InvokeError::transport("script exhausted")))
    }
}

impl<S: Clone> Default for ScriptedDispatch<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<C, T, S> Dispatch<C, T, S> for ScriptedDispatch<S>
where
    C: Sync,
    T: SdkRequest + Serialize + Send + Sync + 'static,
    S: Clone + Send + Sync,
{
    async fn dispatch(&self, _client: &C, request: T) -> Result<S, InvokeError> {
        self.calls.lock().push(CallRecord {
            request_json: serde_json::to_value(&request).unwrap_or(serde_json::Value::Null),
            retry_policy: request.metadata().retry_policy.clone(),
        });
        let outcome = self.next_outcome();
        tracing::debug!(
            call = self.call_count(),
            ok = outcome.is_ok(),
            "scripted dispatch"
        );
        outcome
    }
}

/// Dispatcher that panics, for exercising the harness's panic trap.
pub struct PanicOnDispatch(pub &'static str);

#[async_trait]
impl<C, T, S> Dispatch<C, T, S> for PanicOnDispatch
where
    C: Sync,
    T: Send + Sync + 'static,
    S: Send,
{
    async fn dispatch(&self, _client: &C, _request: T) -> Result<S, InvokeError> {
        panic!("{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::{GetGatewayRequest, GetGatewayResponse};

    #[tokio::test]
    async fn scripted_outcomes_pop_in_order() {
        let dispatch: ScriptedDispatch<GetGatewayResponse> = ScriptedDispatch::new()
            .push_ok(GetGatewayResponse::default())
            .push_err(InvokeError::Timeout);

        let first: Result<GetGatewayResponse, _> =
            Dispatch::<(), _, _>::dispatch(&dispatch, &(), GetGatewayRequest::default()).await;
        assert!(first.is_ok());

        let second: Result<GetGatewayResponse, _> =
            Dispatch::<(), _, _>::dispatch(&dispatch, &(), GetGatewayRequest::default()).await;
        assert_eq!(second.unwrap_err(), InvokeError::Timeout);

        let third: Result<GetGatewayResponse, _> =
            Dispatch::<(), _, _>::dispatch(&dispatch, &(), GetGatewayRequest::default()).await;
        assert!(matches!(third, Err(InvokeError::Transport { .. })));

        assert_eq!(dispatch.call_count(), 3);
    }

    #[tokio::test]
    async fn repeating_last_never_drains() {
        let dispatch: ScriptedDispatch<GetGatewayResponse> = ScriptedDispatch::new()
            .push_ok(GetGatewayResponse::default())
            .repeating_last();
        for _ in 0..5 {
            let out: Result<GetGatewayResponse, _> =
                Dispatch::<(), _, _>::dispatch(&dispatch, &(), GetGatewayRequest::default()).await;
            assert!(out.is_ok());
        }
    }

    #[tokio::test]
    async fn records_request_shape() {
        let dispatch: ScriptedDispatch<GetGatewayResponse> =
            ScriptedDispatch::new().push_ok(GetGatewayResponse::default());
        let request = GetGatewayRequest {
            gateway_id: "g1".to_owned(),
            ..GetGatewayRequest::default()
        };
        let _: Result<GetGatewayResponse, _> =
            Dispatch::<(), _, _>::dispatch(&dispatch, &(), request).await;
        let calls = dispatch.calls();
        assert_eq!(calls[0].request_json["GatewayId"], "g1");
        assert!(calls[0].retry_policy.is_none());
    }
}

//! Pagination driver behavior outside the full harness: token threading on
//! `collect`, laziness and termination of the stream form.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{pin_mut, StreamExt};
use srt_harness::{Dispatch, InvokeError, PageError, PaginationDriver};
use srt_testkit::init_test_tracing;
use srt_testkit::sdk::{gateway_pages, ListGatewaysRequest, ListGatewaysResponse, SampleClient};
use tokio::sync::watch;

struct CountingDispatch {
    pages: Vec<ListGatewaysResponse>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl<C: Sync> Dispatch<C, ListGatewaysRequest, ListGatewaysResponse> for CountingDispatch {
    async fn dispatch(
        &self,
        _client: &C,
        _request: ListGatewaysRequest,
    ) -> Result<ListGatewaysResponse, InvokeError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(n)
            .cloned()
            .ok_or_else(|| InvokeError::transport("no more scripted pages"))
    }
}

fn client() -> SampleClient {
    SampleClient {
        host: "gateway.us-phoenix-1.replay.example.com".to_owned(),
        region: "us-phoenix-1".to_owned(),
    }
}

#[tokio::test]
async fn collect_leaves_the_final_token_on_the_request() {
    init_test_tracing();
    let dispatch = CountingDispatch {
        pages: gateway_pages(&["a", ""]),
        calls: Arc::new(AtomicUsize::new(0)),
    };
    let (_tx, rx) = watch::channel(false);
    let driver = PaginationDriver::new(10, rx);
    let mut request = ListGatewaysRequest::default();

    let outcome = driver.collect(&dispatch, &client(), &mut request).await;

    assert!(outcome.error.is_none());
    assert_eq!(outcome.responses.len(), 2);
    // The last token written was the one that fetched the final page.
    assert_eq!(request.page.as_deref(), Some("a"));
}

#[tokio::test]
async fn collect_emits_one_response_when_the_first_page_is_last() {
    init_test_tracing();
    let dispatch = CountingDispatch {
        pages: gateway_pages(&[""]),
        calls: Arc::new(AtomicUsize::new(0)),
    };
    let (_tx, rx) = watch::channel(false);
    let driver = PaginationDriver::new(10, rx);
    let mut request = ListGatewaysRequest::default();

    let outcome = driver.collect(&dispatch, &client(), &mut request).await;

    assert!(outcome.error.is_none());
    assert_eq!(outcome.responses.len(), 1);
    // No token was ever written back.
    assert_eq!(request.page, None);
}

#[tokio::test]
async fn collect_overrun_reports_the_accumulated_page_count() {
    init_test_tracing();
    let dispatch = CountingDispatch {
        pages: gateway_pages(&["m1", "m2", "m3"]),
        calls: Arc::new(AtomicUsize::new(0)),
    };
    let (_tx, rx) = watch::channel(false);
    let driver = PaginationDriver::new(2, rx);
    let mut request = ListGatewaysRequest::default();

    let outcome = driver.collect(&dispatch, &client(), &mut request).await;

    assert_eq!(outcome.responses.len(), 2);
    assert_eq!(outcome.error, Some(PageError::Overrun { pages: 2 }));
}

#[tokio::test]
async fn stream_dispatches_nothing_until_polled() {
    init_test_tracing();
    let calls = Arc::new(AtomicUsize::new(0));
    let dispatch = CountingDispatch {
        pages: gateway_pages(&["a", ""]),
        calls: calls.clone(),
    };
    let (_tx, rx) = watch::channel(false);
    let stream = PaginationDriver::new(10, rx).into_stream(
        dispatch,
        client(),
        ListGatewaysRequest::default(),
    );
    pin_mut!(stream);

    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.opc_next_page.as_deref(), Some("a"));

    let second = stream.next().await.unwrap().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(second.opc_next_page.as_deref(), Some(""));

    assert!(stream.next().await.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn stream_ends_with_overrun_at_the_cap() {
    init_test_tracing();
    let dispatch = CountingDispatch {
        pages: gateway_pages(&["more"]),
        calls: Arc::new(AtomicUsize::new(0)),
    };
    let (_tx, rx) = watch::channel(false);
    let stream = PaginationDriver::new(1, rx).into_stream(
        dispatch,
        client(),
        ListGatewaysRequest::default(),
    );
    pin_mut!(stream);

    assert!(stream.next().await.unwrap().is_ok());
    assert_eq!(
        stream.next().await.unwrap().unwrap_err(),
        PageError::Overrun { pages: 1 }
    );
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn stream_reports_cancellation_and_stops() {
    init_test_tracing();
    let dispatch = CountingDispatch {
        pages: gateway_pages(&["more", "more"]),
        calls: Arc::new(AtomicUsize::new(0)),
    };
    let (tx, rx) = watch::channel(false);
    let stream = PaginationDriver::new(10, rx).into_stream(
        dispatch,
        client(),
        ListGatewaysRequest::default(),
    );
    pin_mut!(stream);

    assert!(stream.next().await.unwrap().is_ok());
    tx.send(true).unwrap();
    assert_eq!(
        stream.next().await.unwrap().unwrap_err(),
        PageError::Invoke(InvokeError::Cancelled)
    );
    assert!(stream.next().await.is_none());
}

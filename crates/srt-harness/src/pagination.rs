//! Pagination driver for list operations.
//!
//! Repeatedly invokes a list operation, threading the continuation token
//! from each response into the next request, until the server stops handing
//! out tokens. Responses come back in exact server order; a run-wide page
//! cap guards against servers that never terminate.

use futures_util::stream::{self, Stream};
use srt_core::{InvokeError, SdkRequest};
use tokio::sync::watch;

use crate::invoke::{invoke_with_policy, Dispatch};

/// List-operation request: exposes its continuation-token slot.
pub trait PageableRequest: SdkRequest {
    /// Current continuation token.
    fn page_token(&self) -> Option<&str>;

    /// Write the token for the next page.
    fn set_page_token(&mut self, token: Option<String>);
}

/// List-operation response: exposes the server's next-page token.
pub trait PageableResponse: Send {
    /// Token for the next page; `None` or empty means end of stream.
    fn next_page_token(&self) -> Option<&str>;
}

/// Why a page sequence ended early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// A call failed; pages accumulated so far are still delivered.
    Invoke(InvokeError),
    /// The safety cap was reached with more pages still advertised.
    Overrun {
        /// Pages delivered before the cap hit.
        pages: usize,
    },
}

/// Everything a finished page sequence produced.
#[derive(Debug)]
pub struct PageOutcome<S> {
    /// Responses in server order.
    pub responses: Vec<S>,
    /// Early-exit cause, if the sequence did not terminate normally.
    pub error: Option<PageError>,
}

/// Drives one list operation to completion.
#[derive(Debug, Clone)]
pub struct PaginationDriver {
    max_pages: usize,
    shutdown: watch::Receiver<bool>,
}

impl PaginationDriver {
    /// Driver with the given safety cap and cancellation handle.
    #[must_use]
    pub const fn new(max_pages: usize, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            max_pages,
            shutdown,
        }
    }

    /// Collect the full page sequence, mutating `request`'s token slot
    /// between pages. On early exit the accumulated responses are returned
    /// alongside the cause.
    pub async fn collect<C, T, S, D>(
        &self,
        dispatch: &D,
        client: &C,
        request: &mut T,
    ) -> PageOutcome<S>
    where
        C: Sync,
        T: PageableRequest + Clone + Send + Sync + 'static,
        S: PageableResponse,
        D: Dispatch<C, T, S> + ?Sized,
    {
        tracing::debug!(seed_token = ?request.page_token(), "starting page sequence");
        let mut responses = Vec::new();

        loop {
            if *self.shutdown.borrow() {
                return PageOutcome {
                    responses,
                    error: Some(PageError::Invoke(InvokeError::Cancelled)),
                };
            }
            if responses.len() >= self.max_pages {
                let pages = responses.len();
                tracing::warn!(pages, "pagination safety cap reached");
                return PageOutcome {
                    responses,
                    error: Some(PageError::Overrun { pages }),
                };
            }

            match invoke_with_policy(dispatch, client, &*request, &self.shutdown).await {
                Err(err) => {
                    return PageOutcome {
                        responses,
                        error: Some(PageError::Invoke(err)),
                    }
                }
                Ok(response) => {
                    let next = response
                        .next_page_token()
                        .filter(|t| !t.is_empty())
                        .map(str::to_owned);
                    responses.push(response);
                    match next {
                        None => {
                            return PageOutcome {
                                responses,
                                error: None,
                            }
                        }
                        Some(token) => request.set_page_token(Some(token)),
                    }
                }
            }
        }
    }

    /// Lazy form of [`collect`](Self::collect): a finite stream yielding each
    /// page as it arrives, terminated by at most one `Err` item.
    pub fn into_stream<C, T, S, D>(
        self,
        dispatch: D,
        client: C,
        request: T,
    ) -> impl Stream<Item = Result<S, PageError>>
    where
        C: Sync + Send,
        T: PageableRequest + Clone + Send + Sync + 'static,
        S: PageableResponse,
        D: Dispatch<C, T, S>,
    {
        struct State<C, T, D> {
            driver: PaginationDriver,
            dispatch: D,
            client: C,
            request: T,
            pages: usize,
            done: bool,
        }

        let state = State {
            driver: self,
            dispatch,
            client,
            request,
            pages: 0,
            done: false,
        };

        stream::unfold(state, |mut st| async move {
            if st.done {
                return None;
            }
            if *st.driver.shutdown.borrow() {
                st.done = true;
                return Some((Err(PageError::Invoke(InvokeError::Cancelled)), st));
            }
            if st.pages >= st.driver.max_pages {
                st.done = true;
                return Some((Err(PageError::Overrun { pages: st.pages }), st));
            }

            let result = invoke_with_policy(
                &st.dispatch,
                &st.client,
                &st.request,
                &st.driver.shutdown,
            )
            .await;
            match result {
                Err(err) => {
                    st.done = true;
                    Some((Err(PageError::Invoke(err)), st))
                }
                Ok(response) => {
                    st.pages += 1;
                    match response
                        .next_page_token()
                        .filter(|t| !t.is_empty())
                        .map(str::to_owned)
                    {
                        None => st.done = true,
                        Some(token) => st.request.set_page_token(Some(token)),
                    }
                    Some((Ok(response), st))
                }
            }
        })
    }
}

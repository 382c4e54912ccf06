//! Page-token pagination as a lazy stream

use std::future::Future;

use futures::stream::{self, Stream};

use crate::error::Result;

/// One page of a listing call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    /// A final page with no continuation
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }
}

/// Turn a page fetcher into a stream of pages.
///
/// The first call receives `None`; every following call receives the
/// previous page's `next_token`. The stream ends after a page without a
/// token, or right after yielding the first error. Nothing is fetched until
/// the stream is polled, and every call to `paginate` starts from page one.
pub fn paginate<T, F, Fut>(mut fetch: F) -> impl Stream<Item = Result<Vec<T>>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    // None: exhausted, Some(token): fetch the page for `token`
    stream::unfold(Some(None), move |cursor: Option<Option<String>>| {
        let request = cursor.map(&mut fetch);
        async move {
            let page = match request?.await {
                Ok(page) => page,
                Err(e) => return Some((Err(e), None)),
            };
            let next = page
                .next_token
                .filter(|token| !token.is_empty())
                .map(Some);
            Some((Ok(page.items), next))
        }
    })
}

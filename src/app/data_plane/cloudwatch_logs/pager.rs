//! Page iteration over a [`LogsBackend`].
//!
//! A [`Pager`] repeatedly calls one backend operation, feeding back the
//! continuation token, until the backend stops returning a token or returns
//! the same token twice in a row (the SDK paginators stop on a repeated token
//! too; `FilterLogEvents` can otherwise hand back the same token forever).

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::Result;
use futures::future::BoxFuture;
use std::time::Duration;

use super::backend::LogsBackend;
use super::sdk_errors::categorize_error;
use super::types::{
    FilterQuery, GroupsQuery, LogEvent, LogGroupSummary, LogStreamSummary, Page, StreamsQuery,
};

/// Retry behaviour for a single page request.
///
/// The default allows no retries: the first backend error is returned to the
/// caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts allowed for retryable errors
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each further attempt
    pub base_delay: Duration,
    /// Upper bound for a single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Fail on the first error
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }

    /// Retry retryable errors up to `max_retries` times
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::none()
        }
    }

    /// Set the initial backoff delay
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Backoff before retry number `attempt` (zero based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

type FetchFn<'a, T> = Box<dyn FnMut(Option<String>) -> BoxFuture<'a, Result<Page<T>>> + Send + 'a>;

/// Iterates the pages of one paginated backend operation
pub struct Pager<'a, T> {
    operation: &'static str,
    fetch: FetchFn<'a, T>,
    next_token: Option<String>,
    exhausted: bool,
    pages_fetched: usize,
    retry: RetryPolicy,
}

impl<'a, T> Pager<'a, T> {
    /// Create a pager around a single-page fetch function
    pub fn new<F>(operation: &'static str, fetch: F) -> Self
    where
        F: FnMut(Option<String>) -> BoxFuture<'a, Result<Page<T>>> + Send + 'a,
    {
        Self {
            operation,
            fetch: Box::new(fetch),
            next_token: None,
            exhausted: false,
            pages_fetched: 0,
            retry: RetryPolicy::none(),
        }
    }

    /// Set the retry policy used for each page request
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Whether another call to [`Pager::next_page`] may return items
    pub fn has_more_pages(&self) -> bool {
        !self.exhausted
    }

    /// Number of pages returned so far
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Fetch the next page, or `Ok(None)` once the operation is exhausted
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>> {
        if self.exhausted {
            return Ok(None);
        }

        let page = self.fetch_page().await?;
        match page.next_token {
            Some(token) if self.next_token.as_ref() != Some(&token) => {
                self.next_token = Some(token);
            }
            _ => self.exhausted = true,
        }
        self.pages_fetched += 1;

        Ok(Some(page.items))
    }

    /// Drain every remaining page into one vector
    pub async fn collect_all(mut self) -> Result<Vec<T>> {
        let mut all = Vec::new();
        while let Some(items) = self.next_page().await? {
            all.extend(items);
        }
        Ok(all)
    }

    async fn fetch_page(&mut self) -> Result<Page<T>> {
        let mut attempt = 0;
        loop {
            match (self.fetch)(self.next_token.clone()).await {
                Ok(page) => return Ok(page),
                Err(error) => {
                    let category = categorize_error(&error, self.operation);
                    if !category.is_retryable() || attempt >= self.retry.max_retries {
                        trace_debug!(
                            "{} failed ({}), giving up after {} retries",
                            self.operation,
                            category.short_label(),
                            attempt
                        );
                        return Err(error);
                    }

                    let delay = self.retry.delay_for(attempt);
                    trace_warn!(
                        "{}: {}, retrying in {:?} (attempt {} of {})",
                        self.operation,
                        category,
                        delay,
                        attempt + 1,
                        self.retry.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Pager over `DescribeLogGroups`
pub fn group_pager<'a, B>(backend: &'a B, query: &'a GroupsQuery) -> Pager<'a, LogGroupSummary>
where
    B: LogsBackend + ?Sized,
{
    Pager::new("DescribeLogGroups", move |token| {
        backend.describe_groups_page(query, token)
    })
}

/// Pager over `DescribeLogStreams`
pub fn stream_pager<'a, B>(backend: &'a B, query: &'a StreamsQuery) -> Pager<'a, LogStreamSummary>
where
    B: LogsBackend + ?Sized,
{
    Pager::new("DescribeLogStreams", move |token| {
        backend.describe_streams_page(query, token)
    })
}

/// Pager over `FilterLogEvents`
pub fn event_pager<'a, B>(backend: &'a B, query: &'a FilterQuery) -> Pager<'a, LogEvent>
where
    B: LogsBackend + ?Sized,
{
    Pager::new("FilterLogEvents", move |token| {
        backend.filter_events_page(query, token)
    })
}

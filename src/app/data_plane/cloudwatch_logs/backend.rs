//! Backend contract consumed by the pager, the one-shot fetchers and the
//! live tail.
//!
//! Each method performs exactly one API call and returns one page. Paging,
//! retries and exhaustion are handled by [`super::pager::Pager`].

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::Result;
use async_trait::async_trait;

use super::types::{
    FilterQuery, GroupsQuery, LogEvent, LogGroupSummary, LogStreamSummary, Page, StreamsQuery,
};

/// One-page-per-call access to a CloudWatch Logs style API
#[async_trait]
pub trait LogsBackend: Send + Sync {
    /// `DescribeLogGroups`
    async fn describe_groups_page(
        &self,
        query: &GroupsQuery,
        next_token: Option<String>,
    ) -> Result<Page<LogGroupSummary>>;

    /// `DescribeLogStreams`
    async fn describe_streams_page(
        &self,
        query: &StreamsQuery,
        next_token: Option<String>,
    ) -> Result<Page<LogStreamSummary>>;

    /// `FilterLogEvents`
    async fn filter_events_page(
        &self,
        query: &FilterQuery,
        next_token: Option<String>,
    ) -> Result<Page<LogEvent>>;
}

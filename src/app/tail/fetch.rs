//! One-shot operations: a single pass over a paginated query with no state
//! kept between calls.

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::{Context, Result};
use std::io::Write;

use crate::app::data_plane::cloudwatch_logs::{
    event_pager, group_pager, stream_pager, FilterQuery, GroupsQuery, LogGroupSummary,
    LogStreamSummary, LogsBackend, RetryPolicy, StreamsQuery,
};

use super::formatter::{EmitMode, EventFormatter};

/// All log groups matching `query`
pub async fn fetch_groups<B>(
    backend: &B,
    query: &GroupsQuery,
    retry: RetryPolicy,
) -> Result<Vec<LogGroupSummary>>
where
    B: LogsBackend + ?Sized,
{
    group_pager(backend, query).with_retry(retry).collect_all().await
}

/// All log streams matching `query`, in backend order
pub async fn fetch_streams<B>(
    backend: &B,
    query: &StreamsQuery,
    retry: RetryPolicy,
) -> Result<Vec<LogStreamSummary>>
where
    B: LogsBackend + ?Sized,
{
    stream_pager(backend, query).with_retry(retry).collect_all().await
}

/// Print every event matching a bounded query, page by page.
///
/// Returns the number of events written.
pub async fn print_events<B, W>(
    backend: &B,
    query: &FilterQuery,
    formatter: &EventFormatter,
    mode: EmitMode,
    retry: RetryPolicy,
    out: &mut W,
) -> Result<usize>
where
    B: LogsBackend + ?Sized,
    W: Write,
{
    let mut pager = event_pager(backend, query).with_retry(retry);
    let mut written = 0;

    while let Some(events) = pager.next_page().await? {
        for event in &events {
            writeln!(out, "{}", formatter.render(event, mode)).context("Failed to write event")?;
        }
        written += events.len();
        out.flush().context("Failed to flush output")?;
    }

    trace_debug!(
        "Printed {} events from {} in {} pages",
        written,
        query.group,
        pager.pages_fetched()
    );

    Ok(written)
}

//! Live tail: poll `FilterLogEvents` forever, advancing the start of the
//! query window to the newest timestamp seen and suppressing re-delivered
//! events.
//!
//! CloudWatch Logs has no cursor for "events after this one", and distinct
//! events can share a millisecond. Each cycle therefore re-queries from the
//! last seen instant *inclusively* and drops events whose id was already
//! emitted at that instant.

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::convert::Infallible;
use std::io::Write;
use std::time::Duration;

use crate::app::data_plane::cloudwatch_logs::{
    event_pager, FilterQuery, LogEvent, LogsBackend, RetryPolicy,
};

use super::formatter::{EmitMode, EventFormatter};

/// Pause between two polls
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Dedup bookkeeping for one tail.
///
/// Only the ids seen at `last_seen_time` are remembered. This relies on the
/// backend never redelivering an event whose timestamp is strictly older
/// than the current window floor; such an event would be emitted again.
#[derive(Debug, Clone, Default)]
pub struct TailState {
    last_seen_time: Option<i64>,
    seen_ids: HashSet<String>,
}

impl TailState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `event` and report whether it should be emitted
    pub fn observe(&mut self, event: &LogEvent) -> bool {
        match self.last_seen_time {
            Some(last) if event.timestamp <= last => {
                if event.timestamp < last {
                    trace_debug!(
                        "Event {} at {} is older than the window floor {}",
                        event.event_id,
                        event.timestamp,
                        last
                    );
                }
            }
            _ => {
                self.last_seen_time = Some(event.timestamp);
                self.seen_ids.clear();
            }
        }

        self.seen_ids.insert(event.event_id.clone())
    }

    /// Timestamp of the newest event observed so far
    pub fn last_seen_time(&self) -> Option<i64> {
        self.last_seen_time
    }

    /// Ids observed at [`TailState::last_seen_time`]
    pub fn seen_ids(&self) -> &HashSet<String> {
        &self.seen_ids
    }

    /// Move the query window to start at the newest observed instant
    pub fn advance(&self, query: &mut FilterQuery) {
        if let Some(last) = self.last_seen_time {
            query.start_time = Some(last);
        }
    }
}

/// A running tail over one query
pub struct LiveTail<'a, B: LogsBackend + ?Sized, W: Write> {
    backend: &'a B,
    query: FilterQuery,
    state: TailState,
    formatter: EventFormatter,
    mode: EmitMode,
    retry: RetryPolicy,
    out: W,
}

impl<'a, B: LogsBackend + ?Sized, W: Write> LiveTail<'a, B, W> {
    pub fn new(
        backend: &'a B,
        query: FilterQuery,
        formatter: EventFormatter,
        mode: EmitMode,
        out: W,
    ) -> Self {
        Self {
            backend,
            query,
            state: TailState::new(),
            formatter,
            mode,
            retry: RetryPolicy::none(),
            out,
        }
    }

    /// Retry policy for each page request
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The query the next poll will run
    pub fn query(&self) -> &FilterQuery {
        &self.query
    }

    pub fn state(&self) -> &TailState {
        &self.state
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run one poll cycle: drain every page, emit unseen events, advance the
    /// window. Returns the number of events emitted.
    pub async fn poll_once(&mut self) -> Result<usize> {
        let mut received = 0;
        let mut emitted = 0;

        {
            let mut pager = event_pager(self.backend, &self.query).with_retry(self.retry);
            while let Some(events) = pager.next_page().await? {
                received += events.len();
                for event in &events {
                    if self.state.observe(event) {
                        writeln!(self.out, "{}", self.formatter.render(event, self.mode))
                            .context("Failed to write event")?;
                        emitted += 1;
                    }
                }
            }
        }

        self.out.flush().context("Failed to flush output")?;
        self.state.advance(&mut self.query);

        trace_debug!(
            "Poll of {}: {} received, {} emitted, window starts at {:?}",
            self.query.group,
            received,
            emitted,
            self.query.start_time
        );

        Ok(emitted)
    }

    /// Poll until the process is stopped or the backend fails
    pub async fn run(mut self) -> Result<Infallible> {
        trace_info!(
            "Tailing log group {} from {:?}",
            self.query.group,
            self.query.start_time
        );

        loop {
            self.poll_once().await?;
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ev(id: &str, timestamp: i64) -> LogEvent {
        LogEvent::new(id, timestamp, "stream", format!("message {id}"))
    }

    #[test]
    fn test_first_event_sets_window() {
        let mut state = TailState::new();
        assert_eq!(state.last_seen_time(), None);

        assert!(state.observe(&ev("1", 100)));
        assert_eq!(state.last_seen_time(), Some(100));
        assert!(state.seen_ids().contains("1"));
    }

    #[test]
    fn test_same_instant_dedup() {
        let mut state = TailState::new();
        assert!(state.observe(&ev("1", 100)));
        assert!(state.observe(&ev("2", 100)));
        assert!(!state.observe(&ev("1", 100)));
        assert!(!state.observe(&ev("2", 100)));
        assert_eq!(state.seen_ids().len(), 2);
    }

    #[test]
    fn test_newer_event_resets_seen_ids() {
        let mut state = TailState::new();
        state.observe(&ev("1", 100));
        state.observe(&ev("2", 100));

        assert!(state.observe(&ev("3", 105)));
        assert_eq!(state.last_seen_time(), Some(105));
        assert_eq!(state.seen_ids().len(), 1);
        assert!(state.seen_ids().contains("3"));
    }

    #[test]
    fn test_older_event_does_not_move_window() {
        let mut state = TailState::new();
        state.observe(&ev("1", 100));

        // Precondition violated: emitted, window untouched
        assert!(state.observe(&ev("0", 90)));
        assert_eq!(state.last_seen_time(), Some(100));
    }

    #[test]
    fn test_advance_rewrites_start_time() {
        let mut query = FilterQuery::new("/app").with_start_time(1);
        let mut state = TailState::new();

        state.advance(&mut query);
        assert_eq!(query.start_time, Some(1));

        state.observe(&ev("1", 100));
        state.advance(&mut query);
        assert_eq!(query.start_time, Some(100));
    }

    proptest! {
        #[test]
        fn prop_overlapping_polls_emit_each_event_once(
            deltas in prop::collection::vec(0i64..3, 1..60),
            cuts in prop::collection::vec(0usize..60, 1..8),
        ) {
            // Events in timestamp order, many sharing an instant
            let mut timestamp = 1_000;
            let events: Vec<LogEvent> = deltas
                .iter()
                .enumerate()
                .map(|(i, delta)| {
                    timestamp += delta;
                    ev(&i.to_string(), timestamp)
                })
                .collect();

            // Each poll sees everything ingested so far at or after the floor
            let mut cuts: Vec<usize> = cuts.into_iter().map(|c| c.min(events.len())).collect();
            cuts.sort_unstable();
            cuts.push(events.len());

            let mut state = TailState::new();
            let mut emitted = Vec::new();
            for cut in cuts {
                let floor = state.last_seen_time();
                for event in events[..cut]
                    .iter()
                    .filter(|e| floor.map_or(true, |f| e.timestamp >= f))
                {
                    if state.observe(event) {
                        emitted.push(event.event_id.clone());
                    }
                }
            }

            let expected: Vec<String> = (0..events.len()).map(|i| i.to_string()).collect();
            prop_assert_eq!(emitted, expected);
        }

        #[test]
        fn prop_last_seen_time_never_decreases(
            timestamps in prop::collection::vec(0i64..50, 1..100),
        ) {
            let mut state = TailState::new();
            let mut previous = None;
            for (i, timestamp) in timestamps.into_iter().enumerate() {
                state.observe(&ev(&i.to_string(), timestamp));
                prop_assert!(state.last_seen_time() >= previous);
                previous = state.last_seen_time();
            }
        }

        #[test]
        fn prop_replayed_instant_yields_union(
            first in prop::collection::btree_set(0u32..40, 0..20),
            second in prop::collection::btree_set(0u32..40, 0..20),
        ) {
            let mut state = TailState::new();
            let mut emitted = Vec::new();
            for id in first.iter().chain(second.iter()) {
                if state.observe(&ev(&id.to_string(), 500)) {
                    emitted.push(*id);
                }
            }

            let union: std::collections::BTreeSet<u32> = first.union(&second).copied().collect();
            prop_assert_eq!(emitted.len(), union.len());
            let emitted_set: std::collections::BTreeSet<u32> = emitted.into_iter().collect();
            prop_assert_eq!(emitted_set, union);
        }
    }
}

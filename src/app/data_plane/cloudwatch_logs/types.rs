//! CloudWatch Logs Data Types
//!
//! Query descriptors, result pages and the record shapes returned by the
//! CloudWatch Logs API.

#![warn(clippy::all, rust_2018_idioms)]

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Stream ordering accepted by `DescribeLogStreams`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderBy {
    /// Order by stream name (required when a name prefix is given)
    #[default]
    LogStreamName,
    /// Order by the timestamp of the last event in each stream
    LastEventTime,
}

impl OrderBy {
    /// Name as used by the CloudWatch Logs API
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderBy::LogStreamName => "LogStreamName",
            OrderBy::LastEventTime => "LastEventTime",
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unknown stream ordering
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown stream ordering {0:?}, expected LogStreamName or LastEventTime")]
pub struct UnknownOrderBy(pub String);

impl FromStr for OrderBy {
    type Err = UnknownOrderBy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LogStreamName" => Ok(OrderBy::LogStreamName),
            "LastEventTime" => Ok(OrderBy::LastEventTime),
            other => Err(UnknownOrderBy(other.to_string())),
        }
    }
}

/// Query descriptor for listing log groups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupsQuery {
    /// Log group name prefix
    pub prefix: Option<String>,
}

/// Query descriptor for listing the streams of one log group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamsQuery {
    pub group: String,
    /// Log stream name prefix
    pub prefix: Option<String>,
    pub order_by: OrderBy,
    pub descending: bool,
}

/// Restricts a filter query to some of the group's streams
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFilter {
    /// Explicit stream names (the API accepts at most 100)
    Names(Vec<String>),
    /// Stream name prefix, resolved by the backend
    Prefix(String),
}

/// Query descriptor for `FilterLogEvents`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterQuery {
    /// Log group to query
    pub group: String,
    /// Optional stream restriction (None = all streams)
    pub stream_filter: Option<StreamFilter>,
    /// Filter pattern (CloudWatch Logs filter syntax)
    pub filter_pattern: Option<String>,
    /// Start time (Unix timestamp in milliseconds, inclusive)
    pub start_time: Option<i64>,
    /// End time (Unix timestamp in milliseconds)
    pub end_time: Option<i64>,
    /// Merge events from all streams in approximate time order
    pub interleaved: bool,
}

impl FilterQuery {
    /// Create an unbounded, interleaved query over a whole log group
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            stream_filter: None,
            filter_pattern: None,
            start_time: None,
            end_time: None,
            interleaved: true,
        }
    }

    /// Set start time
    pub fn with_start_time(mut self, start_time: i64) -> Self {
        self.start_time = Some(start_time);
        self
    }

    /// Set end time
    pub fn with_end_time(mut self, end_time: i64) -> Self {
        self.end_time = Some(end_time);
        self
    }

    /// Set filter pattern
    pub fn with_filter_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.filter_pattern = Some(pattern.into());
        self
    }

    /// Set stream filter
    pub fn with_stream_filter(mut self, filter: StreamFilter) -> Self {
        self.stream_filter = Some(filter);
        self
    }
}

/// One page of results plus the continuation token, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    /// Final page
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }

    /// Page followed by more results
    pub fn with_next(items: Vec<T>, next_token: impl Into<String>) -> Self {
        Self {
            items,
            next_token: Some(next_token.into()),
        }
    }
}

/// A single log event. Serializes with the field names `FilterLogEvents`
/// uses, for `--json` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    /// Backend-assigned identifier, unique per occurrence
    pub event_id: String,
    /// Event timestamp (Unix milliseconds)
    pub timestamp: i64,
    /// Log message content
    pub message: String,
    /// Time when the event was ingested (Unix milliseconds)
    pub ingestion_time: i64,
    /// Name of the log stream this event belongs to
    pub log_stream_name: String,
}

impl LogEvent {
    /// Create a new log event
    pub fn new(
        event_id: impl Into<String>,
        timestamp: i64,
        log_stream_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            timestamp,
            message: message.into(),
            ingestion_time: timestamp,
            log_stream_name: log_stream_name.into(),
        }
    }

    /// Set ingestion time
    pub fn with_ingestion_time(mut self, ingestion_time: i64) -> Self {
        self.ingestion_time = ingestion_time;
        self
    }
}

/// Summary of a log group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogGroupSummary {
    pub name: String,
    pub creation_time: Option<i64>,
    pub stored_bytes: Option<i64>,
    pub retention_in_days: Option<i32>,
}

impl LogGroupSummary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            creation_time: None,
            stored_bytes: None,
            retention_in_days: None,
        }
    }
}

/// Summary of a log stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogStreamSummary {
    pub name: String,
    pub creation_time: Option<i64>,
    pub first_event_timestamp: Option<i64>,
    /// Timestamp of the most recent event (Unix milliseconds)
    pub last_event_timestamp: Option<i64>,
}

impl LogStreamSummary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            creation_time: None,
            first_event_timestamp: None,
            last_event_timestamp: None,
        }
    }

    /// Set last event timestamp
    pub fn with_last_event_timestamp(mut self, timestamp: i64) -> Self {
        self.last_event_timestamp = Some(timestamp);
        self
    }
}

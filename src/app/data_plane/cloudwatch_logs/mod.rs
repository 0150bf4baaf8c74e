//! CloudWatch Logs Integration Module
//!
//! Provides paginated access to log groups, log streams and filtered log
//! events.
//!
//! ## Layers
//!
//! - [`backend::LogsBackend`]: one request, one page
//! - [`client::CloudWatchLogsClient`]: the AWS SDK implementation
//! - [`pager::Pager`]: follows continuation tokens, optionally retrying
//!   throttled or failed requests
//! - [`sdk_errors`]: decides which failures are worth a retry
//!
//! ## Usage
//!
//! ```rust,no_run
//! use logsaw::app::config::AwsConfiguration;
//! use logsaw::app::data_plane::cloudwatch_logs::{event_pager, CloudWatchLogsClient, FilterQuery};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = CloudWatchLogsClient::from_configuration(&AwsConfiguration::default()).await;
//! let query = FilterQuery::new("/aws/lambda/my-function").with_filter_pattern("ERROR");
//!
//! let mut pager = event_pager(&client, &query);
//! while let Some(events) = pager.next_page().await? {
//!     for event in events {
//!         println!("{}: {}", event.timestamp, event.message);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all, rust_2018_idioms)]

pub mod backend;
pub mod client;
pub mod pager;
pub mod sdk_errors;
pub mod types;

// Re-export commonly used types
pub use backend::LogsBackend;
pub use client::CloudWatchLogsClient;
pub use pager::{event_pager, group_pager, stream_pager, Pager, RetryPolicy};
pub use sdk_errors::{categorize_error, ErrorCategory, ServiceError};
pub use types::{
    FilterQuery, GroupsQuery, LogEvent, LogGroupSummary, LogStreamSummary, OrderBy, Page,
    StreamFilter, StreamsQuery, UnknownOrderBy,
};

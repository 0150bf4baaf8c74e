//! logsaw - CloudWatch Logs listing, filtering and live tail
//!
//! logsaw lists log groups and streams, prints the events matching a bounded
//! query, and follows a log group as new events arrive.
//!
//! # Architecture Overview
//!
//! - **Configuration** ([`app::config`]): explicit values built once by the CLI
//! - **Data plane** ([`app::data_plane`]): the CloudWatch Logs client behind the
//!   [`app::data_plane::LogsBackend`] trait, plus continuation-token paging
//! - **Tail engine** ([`app::tail`]): query building, the live tail loop and its
//!   dedup state, one-shot fetches, event formatting
//!
//! # Live tail
//!
//! [`app::tail::LiveTail`] re-queries from the newest timestamp it has seen,
//! inclusively, once per second. Events at that instant that were already
//! printed are recognised by id and skipped, so same-millisecond events that
//! arrive between polls are still printed exactly once.

#![warn(clippy::all, rust_2018_idioms)]

// Include logging macros first
#[macro_use]
pub mod logging_macros;

pub mod app;

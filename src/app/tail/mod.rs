//! Tailing and one-shot retrieval of CloudWatch Logs events.
//!
//! ## Flow
//!
//! ```text
//! Configuration ──► query_builder ──► FilterQuery ──► Pager ──► events
//!                                                                  │
//!                        live::LiveTail (dedup + advancing window) ◄┤
//!                        fetch::print_events (single pass)        ◄┘
//!                                                                  │
//!                                          formatter::EventFormatter ──► stdout
//! ```
//!
//! - [`time_spec`] turns `--start`/`--end` expressions into instants
//! - [`query_builder`] assembles the query descriptors
//! - [`live`] owns the polling loop and its dedup state
//! - [`fetch`] drains a query once
//! - [`formatter`] renders events

#![warn(clippy::all, rust_2018_idioms)]

pub mod fetch;
pub mod formatter;
pub mod live;
pub mod query_builder;
pub mod time_spec;

pub use fetch::{fetch_groups, fetch_streams, print_events};
pub use formatter::{EmitMode, EventFormatter, TimeZoneDisplay};
pub use live::{LiveTail, TailState, POLL_INTERVAL};
pub use query_builder::{
    build_filter_query, build_groups_query, build_streams_query, top_stream_names,
    MAX_FILTER_STREAMS,
};
pub use time_spec::{parse_time, ParseError};

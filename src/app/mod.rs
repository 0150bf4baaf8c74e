//! Core application modules for logsaw.
//!
//! # Module Organization
//!
//! - [`config`] - Query, AWS and output configuration values
//! - [`data_plane`] - CloudWatch Logs client, backend contract and paging
//! - [`tail`] - Query building, live tail, one-shot fetch and formatting
//!
//! # Architecture
//!
//! `main.rs` parses the command line into the [`config`] values once and
//! passes them down. [`tail`] builds queries from them and drives a
//! [`data_plane::LogsBackend`], which in production is the SDK-backed
//! [`data_plane::CloudWatchLogsClient`].

pub mod config;
pub mod data_plane;
pub mod tail;

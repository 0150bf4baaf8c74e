//! Data Plane Services Module
//!
//! AWS data plane integrations: services that return data stored in AWS
//! resources, as opposed to describing or managing the resources.
//!
//! ## Available Services
//!
//! - **CloudWatch Logs**: list log groups and streams, filter and page
//!   through log events

pub mod cloudwatch_logs;

pub use cloudwatch_logs::{CloudWatchLogsClient, LogsBackend, RetryPolicy};

//! CloudWatch Logs Client Wrapper
//!
//! Implements [`LogsBackend`] on top of the AWS SDK. Each call is a single
//! request; paging is left to [`super::pager::Pager`].

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_cloudwatchlogs as cloudwatchlogs;
use cloudwatchlogs::error::{ProvideErrorMetadata, SdkError};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::app::config::AwsConfiguration;

use super::backend::LogsBackend;
use super::sdk_errors::ServiceError;
use super::types::{
    FilterQuery, GroupsQuery, LogEvent, LogGroupSummary, LogStreamSummary, OrderBy, Page,
    StreamFilter, StreamsQuery,
};

/// CloudWatch Logs client wrapper
#[derive(Clone, Debug)]
pub struct CloudWatchLogsClient {
    client: cloudwatchlogs::Client,
}

impl CloudWatchLogsClient {
    /// Create a client from an already loaded SDK configuration
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: cloudwatchlogs::Client::new(sdk_config),
        }
    }

    /// Resolve credentials and region, then create the client
    pub async fn from_configuration(aws: &AwsConfiguration) -> Self {
        let sdk_config = aws.load_sdk_config().await;
        trace_debug!(
            "CloudWatch Logs client created for region {:?}",
            sdk_config.region().map(|r| r.as_ref().to_string())
        );
        Self::new(&sdk_config)
    }
}

fn to_sdk_order_by(order_by: OrderBy) -> cloudwatchlogs::types::OrderBy {
    match order_by {
        OrderBy::LogStreamName => cloudwatchlogs::types::OrderBy::LogStreamName,
        OrderBy::LastEventTime => cloudwatchlogs::types::OrderBy::LastEventTime,
    }
}

/// Lift the service error code out of an SDK error so that classification
/// never has to search formatted text for it
fn into_backend_error<E, R>(error: SdkError<E, R>) -> anyhow::Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: fmt::Debug + Send + Sync + 'static,
{
    match error.code().map(str::to_string) {
        Some(code) => {
            let message = error.message().unwrap_or_default().to_string();
            anyhow::Error::new(ServiceError::new(code, message).with_source(error))
        }
        None => anyhow::Error::new(error),
    }
}

/// Stand-in id for an event the service returned without one. Stable across
/// polls, so a redelivered event still deduplicates.
fn fallback_event_id(stream: &str, timestamp: i64, ingestion_time: i64, message: &str) -> String {
    let mut hasher = DefaultHasher::new();
    message.hash(&mut hasher);
    format!(
        "{}/{}/{}/{:016x}",
        stream,
        timestamp,
        ingestion_time,
        hasher.finish()
    )
}

fn to_log_event(event: cloudwatchlogs::types::FilteredLogEvent) -> LogEvent {
    let timestamp = event.timestamp.unwrap_or(0);
    let ingestion_time = event.ingestion_time.unwrap_or(timestamp);
    let log_stream_name = event.log_stream_name.unwrap_or_default();
    let message = event.message.unwrap_or_default();

    let event_id = match event.event_id.filter(|id| !id.is_empty()) {
        Some(id) => id,
        None => {
            let id = fallback_event_id(&log_stream_name, timestamp, ingestion_time, &message);
            trace_warn!(
                "Event in {} at {} has no id, using {}",
                log_stream_name,
                timestamp,
                id
            );
            id
        }
    };

    LogEvent {
        event_id,
        timestamp,
        message,
        ingestion_time,
        log_stream_name,
    }
}

#[async_trait]
impl LogsBackend for CloudWatchLogsClient {
    async fn describe_groups_page(
        &self,
        query: &GroupsQuery,
        next_token: Option<String>,
    ) -> Result<Page<LogGroupSummary>> {
        let mut request = self.client.describe_log_groups().set_next_token(next_token);

        if let Some(prefix) = &query.prefix {
            request = request.log_group_name_prefix(prefix);
        }

        let response = request
            .send()
            .await
            .map_err(into_backend_error)
            .with_context(|| "Failed to list log groups")?;

        let mut log_groups = Vec::new();

        if let Some(groups) = response.log_groups {
            for group in groups {
                if let Some(name) = group.log_group_name {
                    log_groups.push(LogGroupSummary {
                        name,
                        creation_time: group.creation_time,
                        stored_bytes: group.stored_bytes,
                        retention_in_days: group.retention_in_days,
                    });
                }
            }
        }

        Ok(Page {
            items: log_groups,
            next_token: response.next_token,
        })
    }

    async fn describe_streams_page(
        &self,
        query: &StreamsQuery,
        next_token: Option<String>,
    ) -> Result<Page<LogStreamSummary>> {
        let mut request = self
            .client
            .describe_log_streams()
            .log_group_name(&query.group)
            .order_by(to_sdk_order_by(query.order_by))
            .descending(query.descending)
            .set_next_token(next_token);

        if let Some(prefix) = &query.prefix {
            request = request.log_stream_name_prefix(prefix);
        }

        let response = request
            .send()
            .await
            .map_err(into_backend_error)
            .with_context(|| {
                format!("Failed to list log streams for log group: {}", query.group)
            })?;

        let mut log_streams = Vec::new();

        if let Some(streams) = response.log_streams {
            for stream in streams {
                if let Some(name) = stream.log_stream_name {
                    log_streams.push(LogStreamSummary {
                        name,
                        creation_time: stream.creation_time,
                        first_event_timestamp: stream.first_event_timestamp,
                        last_event_timestamp: stream.last_event_timestamp,
                    });
                }
            }
        }

        Ok(Page {
            items: log_streams,
            next_token: response.next_token,
        })
    }

    async fn filter_events_page(
        &self,
        query: &FilterQuery,
        next_token: Option<String>,
    ) -> Result<Page<LogEvent>> {
        // `interleaved` is deprecated upstream (the API always interleaves
        // now) but still honoured by older endpoints.
        #[allow(deprecated)]
        let mut request = self
            .client
            .filter_log_events()
            .log_group_name(&query.group)
            .interleaved(query.interleaved)
            .set_next_token(next_token);

        match &query.stream_filter {
            Some(StreamFilter::Names(names)) => {
                request = request.set_log_stream_names(Some(names.clone()));
            }
            Some(StreamFilter::Prefix(prefix)) => {
                request = request.log_stream_name_prefix(prefix);
            }
            None => {}
        }

        if let Some(start_time) = query.start_time {
            request = request.start_time(start_time);
        }

        if let Some(end_time) = query.end_time {
            request = request.end_time(end_time);
        }

        if let Some(filter_pattern) = &query.filter_pattern {
            request = request.filter_pattern(filter_pattern);
        }

        let response = request
            .send()
            .await
            .map_err(into_backend_error)
            .with_context(|| {
                format!("Failed to filter log events in log group: {}", query.group)
            })?;

        trace_trace!(
            "FilterLogEvents {} returned {} events, next token: {}",
            query.group,
            response.events.as_ref().map_or(0, |e| e.len()),
            response.next_token.is_some()
        );

        let events = response
            .events
            .unwrap_or_default()
            .into_iter()
            .map(to_log_event)
            .collect();

        Ok(Page {
            items: events,
            next_token: response.next_token,
        })
    }
}

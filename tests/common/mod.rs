//! Scripted in-memory backend shared by the integration tests.
//!
//! Each describe/filter call pops the next scripted response. Once a script
//! runs dry the backend answers with an empty final page, which is what
//! CloudWatch Logs returns for a quiet log group.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use logsaw::app::data_plane::cloudwatch_logs::{
    FilterQuery, GroupsQuery, LogEvent, LogGroupSummary, LogStreamSummary, LogsBackend, Page,
    StreamsQuery,
};
use logsaw::app::tail::{EventFormatter, TimeZoneDisplay};

type Scripted<T> = Mutex<VecDeque<Result<Page<T>, String>>>;

#[derive(Default)]
pub struct ScriptedBackend {
    groups: Scripted<LogGroupSummary>,
    streams: Scripted<LogStreamSummary>,
    events: Scripted<LogEvent>,
    filter_calls: Mutex<Vec<(FilterQuery, Option<String>)>>,
    stream_calls: Mutex<Vec<(StreamsQuery, Option<String>)>>,
    group_calls: Mutex<Vec<(GroupsQuery, Option<String>)>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_groups(&self, page: Page<LogGroupSummary>) -> &Self {
        self.groups.lock().unwrap().push_back(Ok(page));
        self
    }

    pub fn push_streams(&self, page: Page<LogStreamSummary>) -> &Self {
        self.streams.lock().unwrap().push_back(Ok(page));
        self
    }

    pub fn push_events(&self, page: Page<LogEvent>) -> &Self {
        self.events.lock().unwrap().push_back(Ok(page));
        self
    }

    pub fn push_events_error(&self, message: &str) -> &Self {
        self.events
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    /// Every FilterLogEvents request received, with its continuation token
    pub fn filter_calls(&self) -> Vec<(FilterQuery, Option<String>)> {
        self.filter_calls.lock().unwrap().clone()
    }

    pub fn stream_calls(&self) -> Vec<(StreamsQuery, Option<String>)> {
        self.stream_calls.lock().unwrap().clone()
    }

    pub fn group_calls(&self) -> Vec<(GroupsQuery, Option<String>)> {
        self.group_calls.lock().unwrap().clone()
    }
}

fn next_response<T>(script: &Scripted<T>) -> Result<Page<T>> {
    match script.lock().unwrap().pop_front() {
        Some(Ok(page)) => Ok(page),
        Some(Err(message)) => Err(anyhow!(message)),
        None => Ok(Page::last(Vec::new())),
    }
}

#[async_trait]
impl LogsBackend for ScriptedBackend {
    async fn describe_groups_page(
        &self,
        query: &GroupsQuery,
        next_token: Option<String>,
    ) -> Result<Page<LogGroupSummary>> {
        self.group_calls
            .lock()
            .unwrap()
            .push((query.clone(), next_token));
        next_response(&self.groups)
    }

    async fn describe_streams_page(
        &self,
        query: &StreamsQuery,
        next_token: Option<String>,
    ) -> Result<Page<LogStreamSummary>> {
        self.stream_calls
            .lock()
            .unwrap()
            .push((query.clone(), next_token));
        next_response(&self.streams)
    }

    async fn filter_events_page(
        &self,
        query: &FilterQuery,
        next_token: Option<String>,
    ) -> Result<Page<LogEvent>> {
        self.filter_calls
            .lock()
            .unwrap()
            .push((query.clone(), next_token));
        next_response(&self.events)
    }
}

pub fn event(id: &str, timestamp: i64, stream: &str, message: &str) -> LogEvent {
    LogEvent::new(id, timestamp, stream, message)
}

/// Formatter with deterministic output: no colors, UTC timestamps
pub fn plain_formatter() -> EventFormatter {
    EventFormatter::new()
        .with_color(false)
        .with_time_zone(TimeZoneDisplay::Utc)
}

pub fn lines(out: Vec<u8>) -> Vec<String> {
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

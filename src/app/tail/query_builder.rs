//! Builds backend query descriptors from a [`Configuration`].

#![warn(clippy::all, rust_2018_idioms)]

use chrono::{DateTime, Utc};

use crate::app::config::Configuration;
use crate::app::data_plane::cloudwatch_logs::{
    FilterQuery, GroupsQuery, LogStreamSummary, OrderBy, StreamFilter, StreamsQuery,
};

use super::time_spec::parse_time;

/// `FilterLogEvents` accepts at most this many stream names
pub const MAX_FILTER_STREAMS: usize = 100;

pub fn build_groups_query(prefix: Option<&str>) -> GroupsQuery {
    GroupsQuery {
        prefix: prefix.filter(|p| !p.is_empty()).map(str::to_string),
    }
}

pub fn build_streams_query(
    group: &str,
    prefix: Option<&str>,
    order_by: OrderBy,
    descending: bool,
) -> StreamsQuery {
    StreamsQuery {
        group: group.to_string(),
        prefix: prefix.filter(|p| !p.is_empty()).map(str::to_string),
        order_by,
        descending,
    }
}

/// Build the `FilterLogEvents` query for a one-shot fetch or a tail.
///
/// Time bounds that fail to parse are left unset. When `known_streams` is
/// empty but a stream prefix was configured, the prefix is passed to the
/// backend instead so the query never widens to the whole group.
pub fn build_filter_query(
    config: &Configuration,
    known_streams: &[LogStreamSummary],
    now: DateTime<Utc>,
) -> FilterQuery {
    let mut query = FilterQuery::new(config.group.clone());

    if let Some(filter) = config.filter() {
        query.filter_pattern = Some(filter.to_string());
    }

    query.start_time = resolve_bound("start", config.start.as_deref(), now);
    query.end_time = resolve_bound("end", config.end.as_deref(), now);

    if !known_streams.is_empty() {
        query.stream_filter = Some(StreamFilter::Names(top_stream_names(
            known_streams,
            MAX_FILTER_STREAMS,
        )));
    } else if let Some(prefix) = config.prefix() {
        query.stream_filter = Some(StreamFilter::Prefix(prefix.to_string()));
    }

    query.interleaved = true;
    query
}

fn resolve_bound(name: &str, spec: Option<&str>, now: DateTime<Utc>) -> Option<i64> {
    let spec = spec.filter(|s| !s.is_empty())?;
    match parse_time(spec, now) {
        Ok(instant) => Some(instant.timestamp_millis()),
        Err(error) => {
            trace_warn!("Ignoring {} time: {}", name, error);
            None
        }
    }
}

/// Names of the `limit` streams with the most recent last event.
///
/// The sort is stable, so streams with equal timestamps keep their input
/// order. A missing timestamp sorts as 0.
pub fn top_stream_names(streams: &[LogStreamSummary], limit: usize) -> Vec<String> {
    let mut by_recency: Vec<&LogStreamSummary> = streams.iter().collect();
    by_recency.sort_by(|a, b| {
        b.last_event_timestamp
            .unwrap_or(0)
            .cmp(&a.last_event_timestamp.unwrap_or(0))
    });

    by_recency
        .into_iter()
        .take(limit)
        .map(|stream| stream.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn stream(name: &str, last_event: i64) -> LogStreamSummary {
        LogStreamSummary::new(name).with_last_event_timestamp(last_event)
    }

    #[test]
    fn test_groups_and_streams_queries() {
        assert_eq!(build_groups_query(None), GroupsQuery { prefix: None });
        assert_eq!(build_groups_query(Some("")), GroupsQuery { prefix: None });
        assert_eq!(
            build_groups_query(Some("/aws/lambda")),
            GroupsQuery {
                prefix: Some("/aws/lambda".to_string())
            }
        );

        let query = build_streams_query("/app", Some("web-"), OrderBy::LastEventTime, true);
        assert_eq!(query.group, "/app");
        assert_eq!(query.prefix.as_deref(), Some("web-"));
        assert_eq!(query.order_by, OrderBy::LastEventTime);
        assert!(query.descending);
    }

    #[test]
    fn test_filter_query_time_bounds() {
        let config = Configuration {
            start: Some("-2h".to_string()),
            end: Some("2024-03-10".to_string()),
            filter: Some("ERROR".to_string()),
            ..Configuration::for_group("/app")
        };

        let query = build_filter_query(&config, &[], now());
        assert_eq!(query.group, "/app");
        assert_eq!(query.filter_pattern.as_deref(), Some("ERROR"));
        assert_eq!(
            query.start_time,
            Some((now() - Duration::hours(2)).timestamp_millis())
        );
        assert_eq!(
            query.end_time,
            Some(Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap().timestamp_millis())
        );
        assert!(query.interleaved);
        assert!(query.stream_filter.is_none());
    }

    #[test]
    fn test_unparseable_bounds_are_left_unset() {
        let config = Configuration {
            start: Some("last tuesday".to_string()),
            end: Some("-5m".to_string()),
            ..Configuration::for_group("/app")
        };

        let query = build_filter_query(&config, &[], now());
        assert_eq!(query.start_time, None);
        assert_eq!(
            query.end_time,
            Some((now() - Duration::minutes(5)).timestamp_millis())
        );
    }

    #[test]
    fn test_known_streams_become_names() {
        let streams = vec![stream("old", 10), stream("new", 30), stream("mid", 20)];
        let config = Configuration {
            prefix: Some("ignored-when-streams-known".to_string()),
            ..Configuration::for_group("/app")
        };

        let query = build_filter_query(&config, &streams, now());
        assert_eq!(
            query.stream_filter,
            Some(StreamFilter::Names(vec![
                "new".to_string(),
                "mid".to_string(),
                "old".to_string()
            ]))
        );
    }

    #[test]
    fn test_prefix_without_known_streams() {
        let config = Configuration {
            prefix: Some("web-".to_string()),
            ..Configuration::for_group("/app")
        };

        let query = build_filter_query(&config, &[], now());
        assert_eq!(
            query.stream_filter,
            Some(StreamFilter::Prefix("web-".to_string()))
        );
    }

    #[test]
    fn test_top_streams_keeps_most_recent_hundred() {
        // Shuffled so the input order says nothing about recency
        let streams: Vec<LogStreamSummary> = (0..250)
            .map(|i| (i * 37) % 250)
            .map(|ts| stream(&format!("stream-{ts}"), ts))
            .collect();

        let names = top_stream_names(&streams, MAX_FILTER_STREAMS);
        assert_eq!(names.len(), 100);

        let expected: Vec<String> = (150..250).rev().map(|ts| format!("stream-{ts}")).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_top_streams_ties_keep_input_order() {
        let mut streams: Vec<LogStreamSummary> =
            (0..101).map(|i| stream(&format!("tie-{i}"), 5)).collect();
        streams.push(LogStreamSummary::new("no-events"));

        let names = top_stream_names(&streams, MAX_FILTER_STREAMS);
        let expected: Vec<String> = (0..100).map(|i| format!("tie-{i}")).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_top_streams_fewer_than_limit() {
        let streams = vec![stream("a", 1), stream("b", 2)];
        assert_eq!(top_stream_names(&streams, MAX_FILTER_STREAMS), vec!["b", "a"]);
    }
}

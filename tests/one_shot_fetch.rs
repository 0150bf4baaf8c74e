//! One-shot fetch integration tests
//!
//! Groups, streams and bounded event queries against a scripted backend,
//! including the stream resolution that scopes `watch` and `get`.

mod common;

use chrono::{TimeZone, Utc};
use common::{event, lines, plain_formatter, ScriptedBackend};
use pretty_assertions::assert_eq;

use logsaw::app::config::Configuration;
use logsaw::app::data_plane::cloudwatch_logs::{
    LogGroupSummary, LogStreamSummary, OrderBy, Page, RetryPolicy, StreamFilter,
};
use logsaw::app::tail::{
    build_filter_query, build_groups_query, build_streams_query, fetch_groups, fetch_streams,
    print_events, EmitMode,
};

#[tokio::test]
async fn test_fetch_groups_follows_tokens() {
    let backend = ScriptedBackend::new();
    backend
        .push_groups(Page::with_next(
            vec![LogGroupSummary::new("/aws/lambda/a")],
            "g1",
        ))
        .push_groups(Page::last(vec![
            LogGroupSummary::new("/aws/lambda/b"),
            LogGroupSummary::new("/aws/lambda/c"),
        ]));

    let query = build_groups_query(Some("/aws/lambda"));
    let groups = fetch_groups(&backend, &query, RetryPolicy::none())
        .await
        .unwrap();

    let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["/aws/lambda/a", "/aws/lambda/b", "/aws/lambda/c"]);

    let calls = backend.group_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0.prefix.as_deref(), Some("/aws/lambda"));
    assert_eq!(calls[1].1.as_deref(), Some("g1"));
}

#[tokio::test]
async fn test_fetch_streams_passes_ordering() {
    let backend = ScriptedBackend::new();
    backend.push_streams(Page::last(vec![
        LogStreamSummary::new("web-2"),
        LogStreamSummary::new("web-1"),
    ]));

    let query = build_streams_query("/app", Some("web-"), OrderBy::LastEventTime, true);
    let streams = fetch_streams(&backend, &query, RetryPolicy::none())
        .await
        .unwrap();

    assert_eq!(streams.len(), 2);
    assert_eq!(streams[0].name, "web-2");

    let (sent, token) = &backend.stream_calls()[0];
    assert_eq!(token, &None);
    assert_eq!(sent.group, "/app");
    assert_eq!(sent.prefix.as_deref(), Some("web-"));
    assert_eq!(sent.order_by, OrderBy::LastEventTime);
    assert!(sent.descending);
}

#[tokio::test]
async fn test_print_events_raw_and_pretty() {
    let pages = || {
        vec![
            Page::with_next(
                vec![event("1", 1_710_072_000_000, "web-1", "GET /health 200\n")],
                "e1",
            ),
            Page::last(vec![event(
                "2",
                1_710_072_060_000,
                "web-2",
                r#"{"status":500,"path":"/api"}"#,
            )]),
        ]
    };

    let backend = ScriptedBackend::new();
    for page in pages() {
        backend.push_events(page);
    }
    let query = build_filter_query(&Configuration::for_group("/app"), &[], Utc::now());

    let mut out = Vec::new();
    let written = print_events(
        &backend,
        &query,
        &plain_formatter(),
        EmitMode::Raw,
        RetryPolicy::none(),
        &mut out,
    )
    .await
    .unwrap();
    assert_eq!(written, 2);
    assert_eq!(
        lines(out),
        vec!["GET /health 200", r#"{"status":500,"path":"/api"}"#]
    );

    let backend = ScriptedBackend::new();
    for page in pages() {
        backend.push_events(page);
    }

    let mut out = Vec::new();
    print_events(
        &backend,
        &query,
        &plain_formatter(),
        EmitMode::Pretty,
        RetryPolicy::none(),
        &mut out,
    )
    .await
    .unwrap();
    assert_eq!(
        lines(out),
        vec![
            "[2024-03-10T12:00:00Z] (web-1) GET /health 200",
            r#"[2024-03-10T12:01:00Z] (web-2) {"path":"/api","status":500}"#,
        ]
    );
}

#[tokio::test]
async fn test_print_events_error_after_first_page() {
    let backend = ScriptedBackend::new();
    backend
        .push_events(Page::with_next(vec![event("1", 1, "s", "kept")], "e1"))
        .push_events_error("ResourceNotFoundException: The specified log group does not exist.");

    let query = build_filter_query(&Configuration::for_group("/gone"), &[], Utc::now());
    let mut out = Vec::new();
    let result = print_events(
        &backend,
        &query,
        &plain_formatter(),
        EmitMode::Raw,
        RetryPolicy::none(),
        &mut out,
    )
    .await;

    assert!(result.is_err());
    // Pages are flushed as they arrive
    assert_eq!(lines(out), vec!["kept"]);
}

#[tokio::test]
async fn test_resolved_streams_scope_the_filter_query() {
    let backend = ScriptedBackend::new();
    backend.push_streams(Page::last(vec![
        LogStreamSummary::new("web-old").with_last_event_timestamp(10),
        LogStreamSummary::new("web-new").with_last_event_timestamp(30),
        LogStreamSummary::new("web-idle"),
        LogStreamSummary::new("web-mid").with_last_event_timestamp(20),
    ]));

    let config = Configuration {
        prefix: Some("web-".to_string()),
        filter: Some("ERROR".to_string()),
        start: Some("-1h".to_string()),
        end: Some("0s".to_string()),
        ..Configuration::for_group("/app")
    };
    let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();

    let streams_query = build_streams_query(
        &config.group,
        config.prefix(),
        OrderBy::LogStreamName,
        false,
    );
    let streams = fetch_streams(&backend, &streams_query, RetryPolicy::none())
        .await
        .unwrap();
    let query = build_filter_query(&config, &streams, now);

    assert_eq!(
        query.stream_filter,
        Some(StreamFilter::Names(vec![
            "web-new".to_string(),
            "web-mid".to_string(),
            "web-old".to_string(),
            "web-idle".to_string(),
        ]))
    );
    assert_eq!(query.filter_pattern.as_deref(), Some("ERROR"));
    assert_eq!(query.start_time, Some(1_710_068_400_000));
    assert_eq!(query.end_time, Some(1_710_072_000_000));
    assert!(query.interleaved);
}

#[tokio::test]
async fn test_unmatched_prefix_falls_back_to_prefix_filter() {
    let backend = ScriptedBackend::new();

    let config = Configuration {
        prefix: Some("batch-".to_string()),
        ..Configuration::for_group("/app")
    };
    let streams_query = build_streams_query(
        &config.group,
        config.prefix(),
        OrderBy::LogStreamName,
        false,
    );
    let streams = fetch_streams(&backend, &streams_query, RetryPolicy::none())
        .await
        .unwrap();
    assert!(streams.is_empty());

    let query = build_filter_query(&config, &streams, Utc::now());
    assert_eq!(
        query.stream_filter,
        Some(StreamFilter::Prefix("batch-".to_string()))
    );
}

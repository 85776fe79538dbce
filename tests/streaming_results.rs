//! End-to-end adapter behavior: event ordering, aggregation, request
//! encoding, and the failure paths.

mod support;

use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;

use quarry_client::engine::{codes, EnvelopeTag, ErrorEnvelope};
use quarry_client::streaming::ResultEvent;
use quarry_client::types::query::QueryParameters;
use quarry_client::{
    AnalyticsOptions, Cluster, ClusterOptions, ErrorKind, QueryOptions, QueryStatus, SearchOptions,
};
use support::{failure, success, ScriptedEngine};

fn cluster_with(engine: Arc<ScriptedEngine>) -> Cluster {
    Cluster::new(engine, ClusterOptions::default())
}

#[tokio::test]
async fn awaiting_yields_rows_in_response_order() {
    let engine = ScriptedEngine::new(vec![success(
        &[json!({"n": 1}), json!({"n": 2}), json!({"n": 3})],
        json!({"request_id": "req-1", "client_context_id": "c", "status": "success"}),
    )]);
    let cluster = cluster_with(engine);

    let result = cluster
        .query::<serde_json::Value>("SELECT n FROM seq", &QueryOptions::default())
        .await
        .unwrap();

    let ns: Vec<i64> = result.rows.iter().map(|r| r["n"].as_i64().unwrap()).collect();
    assert_eq!(ns, vec![1, 2, 3]);
    assert_eq!(result.meta.request_id, "req-1");
    assert_eq!(result.meta.status, QueryStatus::Success);
}

#[tokio::test]
async fn events_fire_rows_then_meta_then_end() {
    let engine = ScriptedEngine::new(vec![success(
        &[json!(1), json!(2)],
        json!({"request_id": "r", "status": "success"}),
    )]);
    let cluster = cluster_with(engine);

    let handle = cluster.query::<i64>("SELECT n", &QueryOptions::default());
    let events: Vec<_> = handle.events().collect().await;

    assert_eq!(events.len(), 4);
    assert!(matches!(events[0], ResultEvent::Row(1)));
    assert!(matches!(events[1], ResultEvent::Row(2)));
    assert!(matches!(events[2], ResultEvent::Meta(_)));
    assert!(matches!(events[3], ResultEvent::End));
}

#[tokio::test]
async fn engine_failure_rejects_with_classified_error() {
    let engine = ScriptedEngine::new(vec![failure(ErrorEnvelope {
        code: codes::query::PLANNING_FAILURE,
        tag: EnvelopeTag::Query,
        statement: Some("SELECT broken".to_string()),
        ..Default::default()
    })]);
    let cluster = cluster_with(engine);

    let error = cluster
        .query::<serde_json::Value>("SELECT broken", &QueryOptions::default())
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::PlanningFailure);
    let ctx = error.context().unwrap().as_query().unwrap();
    assert_eq!(ctx.statement, "SELECT broken");
}

#[tokio::test]
async fn failure_path_emits_no_row_or_meta_events() {
    let engine = ScriptedEngine::new(vec![failure(ErrorEnvelope {
        code: codes::common::AMBIGUOUS_TIMEOUT,
        ..Default::default()
    })]);
    let cluster = cluster_with(engine);

    let handle = cluster.query::<serde_json::Value>("SELECT 1", &QueryOptions::default());
    let events: Vec<_> = handle.events().collect().await;

    assert_eq!(events.len(), 2);
    match &events[0] {
        ResultEvent::Error(error) => assert_eq!(error.kind(), ErrorKind::AmbiguousTimeout),
        other => panic!("expected an error event, got {:?}", other),
    }
    assert!(matches!(events[1], ResultEvent::End));
}

#[tokio::test]
async fn malformed_row_aborts_the_whole_result() {
    let engine = ScriptedEngine::new(vec![support::success_raw(
        vec!["{\"n\": 1}".to_string(), "{oops".to_string()],
        json!({"request_id": "r", "status": "success"}).to_string(),
    )]);
    let cluster = cluster_with(engine.clone());

    let handle = cluster.query::<serde_json::Value>("SELECT n", &QueryOptions::default());
    let events: Vec<_> = handle.events().collect().await;

    // No partial prefix: the bad row fails everything.
    assert_eq!(events.len(), 2);
    match &events[0] {
        ResultEvent::Error(error) => assert_eq!(error.kind(), ErrorKind::DecodingFailure),
        other => panic!("expected an error event, got {:?}", other),
    }
    assert!(matches!(events[1], ResultEvent::End));
}

#[tokio::test]
async fn positional_parameters_reach_the_engine_json_encoded() {
    let engine = ScriptedEngine::new(vec![success(
        &[],
        json!({"request_id": "r", "status": "success"}),
    )]);
    let cluster = cluster_with(engine.clone());

    let options = QueryOptions::default()
        .parameters(QueryParameters::Positional(vec![json!(1), json!("x")]));
    cluster
        .query::<serde_json::Value>("SELECT 1", &options)
        .await
        .unwrap();

    let requests = engine.query_requests.lock().unwrap();
    assert_eq!(
        requests[0].positional_parameters,
        vec!["1".to_string(), "\"x\"".to_string()]
    );
}

#[tokio::test]
async fn unset_named_parameters_never_reach_the_engine() {
    let engine = ScriptedEngine::new(vec![success(
        &[],
        json!({"request_id": "r", "status": "success"}),
    )]);
    let cluster = cluster_with(engine.clone());

    let mut named = std::collections::HashMap::new();
    named.insert("present".to_string(), Some(json!("v")));
    named.insert("absent".to_string(), None);
    let options = QueryOptions::default().parameters(QueryParameters::Named(named));

    cluster
        .query::<serde_json::Value>("SELECT 1", &options)
        .await
        .unwrap();

    let requests = engine.query_requests.lock().unwrap();
    assert_eq!(
        requests[0].named_parameters.get("present").map(String::as_str),
        Some("\"v\"")
    );
    assert!(!requests[0].named_parameters.contains_key("absent"));
}

#[tokio::test]
async fn default_timeout_is_filled_without_touching_caller_options() {
    let engine = ScriptedEngine::new(vec![success(
        &[],
        json!({"request_id": "r", "status": "success"}),
    )]);
    let cluster = cluster_with(engine.clone());

    let options = QueryOptions::default();
    cluster
        .query::<serde_json::Value>("SELECT 1", &options)
        .await
        .unwrap();

    // The caller's options stay untouched; the engine request is enriched.
    assert!(options.timeout.is_none());
    let requests = engine.query_requests.lock().unwrap();
    assert_eq!(
        requests[0].timeout,
        Some(std::time::Duration::from_secs(75))
    );
}

#[tokio::test]
async fn analytics_results_aggregate_with_metrics() {
    let engine = ScriptedEngine::new(vec![success(
        &[json!({"name": "ds"})],
        json!({
            "request_id": "a-1",
            "client_context_id": "ctx",
            "status": "success",
            "metrics": {"elapsed_time": "250ms", "processed_objects": 12}
        }),
    )]);
    let cluster = cluster_with(engine.clone());

    let result = cluster
        .analytics_query::<serde_json::Value>("SELECT * FROM ds", &AnalyticsOptions::default())
        .await
        .unwrap();

    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.meta.metrics.processed_objects, 12);
    assert_eq!(
        result.meta.metrics.elapsed_time,
        std::time::Duration::from_millis(250)
    );
}

#[tokio::test]
async fn search_rows_decode_and_meta_translates() {
    let engine = ScriptedEngine::new(vec![success(
        &[json!({"index": "idx_1", "id": "doc-1", "score": 2.5})],
        json!({
            "client_context_id": "ctx",
            "metrics": {"took": 1_000_000u64, "total_rows": 1, "max_score": 2.5},
            "errors": {}
        }),
    )]);
    let cluster = cluster_with(engine.clone());

    let result = cluster
        .search_query("idx", &json!({"match": "hello"}), &SearchOptions::default())
        .await
        .unwrap();

    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].id, "doc-1");
    assert_eq!(result.meta.metrics.total_rows, 1);

    let requests = engine.search_requests.lock().unwrap();
    assert_eq!(requests[0].index_name, "idx");
    assert_eq!(requests[0].query, "{\"match\":\"hello\"}");
}

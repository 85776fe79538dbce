//! Minimal end-to-end wiring: a toy in-memory engine behind the cluster
//! facade. Run with `cargo run --example basic_usage`.

use std::sync::Arc;

use quarry_client::engine::{
    AnalyticsEngineRequest, Completion, CompletionHandler, Engine, QueryEngineRequest,
    RawResponse, SearchEngineRequest,
};
use quarry_client::{Cluster, ClusterOptions, QueryOptions};

/// Answers every query with two canned rows.
struct ToyEngine;

impl Engine for ToyEngine {
    fn query(&self, request: QueryEngineRequest, completion: CompletionHandler) {
        tracing::info!(statement = %request.statement, "toy engine received query");
        let response = RawResponse {
            rows: vec![
                "{\"greeting\": \"hello\"}".to_string(),
                "{\"greeting\": \"world\"}".to_string(),
            ],
            meta: format!(
                "{{\"request_id\": \"toy-1\", \"client_context_id\": \"{}\", \"status\": \"success\"}}",
                request.client_context_id
            ),
        };
        tokio::spawn(async move { completion(Completion::Success(response)) });
    }

    fn analytics_query(&self, _request: AnalyticsEngineRequest, completion: CompletionHandler) {
        tokio::spawn(async move { completion(Completion::Success(RawResponse::default())) });
    }

    fn search_query(&self, _request: SearchEngineRequest, completion: CompletionHandler) {
        tokio::spawn(async move { completion(Completion::Success(RawResponse::default())) });
    }
}

#[tokio::main]
async fn main() -> quarry_client::Result<()> {
    quarry_client::logging::enable_logging();

    let cluster = Cluster::new(Arc::new(ToyEngine), ClusterOptions::default());
    let result = cluster
        .query::<serde_json::Value>("SELECT greeting FROM demo", &QueryOptions::default())
        .await?;

    for row in &result.rows {
        println!("row: {}", row);
    }
    println!("status: {:?}", result.meta.status);
    Ok(())
}

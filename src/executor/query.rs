//! The read-query adapter.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::{Engine, QueryEngineRequest};
use crate::error::{Error, ErrorCause, ErrorKind};
use crate::executor::{deliver, encode_positional, encode_value_map};
use crate::streaming::{self, StreamingResult};
use crate::types::query::{
    QueryMetaData, QueryMetrics, QueryOptions, QueryParameters, QueryResult, QueryStatus,
    QueryWarning,
};
use crate::utils::duration::{format_duration, parse_duration};

/// The handle returned by [`QueryExecutor::query`]: await it for a
/// [`QueryResult`], or subscribe for row/meta events.
pub type PendingQueryResult<R> = StreamingResult<R, QueryMetaData, QueryResult<R>>;

/// Executes read queries against the engine.
pub struct QueryExecutor {
    engine: Arc<dyn Engine>,
}

impl QueryExecutor {
    pub(crate) fn new(engine: Arc<dyn Engine>) -> Self {
        Self { engine }
    }

    /// Dispatches a statement and returns its result handle immediately.
    pub fn query<R>(&self, statement: &str, options: &QueryOptions) -> PendingQueryResult<R>
    where
        R: DeserializeOwned + Clone + Send + 'static,
    {
        let request = build_request(statement, options);
        tracing::debug!(
            statement,
            client_context_id = %request.client_context_id,
            "dispatching query"
        );

        let (handle, emitter) = streaming::channel(|rows, meta| QueryResult { rows, meta });
        self.engine.query(
            request,
            Box::new(move |completion| deliver(completion, &emitter, translate_meta)),
        );
        handle
    }
}

fn build_request(statement: &str, options: &QueryOptions) -> QueryEngineRequest {
    let mut positional = Vec::new();
    let mut named = HashMap::new();
    match &options.parameters {
        Some(QueryParameters::Positional(values)) => positional = encode_positional(values),
        Some(QueryParameters::Named(values)) => named = encode_value_map(values),
        None => {}
    }

    QueryEngineRequest {
        statement: statement.to_string(),
        adhoc: options.adhoc.unwrap_or(true),
        client_context_id: options
            .client_context_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        positional_parameters: positional,
        named_parameters: named,
        raw: encode_value_map(&options.raw),
        scan_consistency: options
            .scan_consistency
            .map(|c| c.wire_name().to_string()),
        scan_wait: options.scan_wait.map(format_duration),
        scan_cap: options.scan_cap,
        read_only: options.read_only,
        flex_index: options.flex_index,
        max_parallelism: options.max_parallelism,
        pipeline_batch: options.pipeline_batch,
        pipeline_cap: options.pipeline_cap,
        profile: options.profile.map(|p| p.wire_name().to_string()),
        metrics: options.metrics,
        query_context: options.query_context.clone(),
        timeout: options.timeout,
    }
}

// Wire shapes of the metadata record, in the service's own field vocabulary.

#[derive(Debug, Deserialize)]
struct RawMeta {
    request_id: Option<String>,
    client_context_id: Option<String>,
    status: Option<String>,
    signature: Option<serde_json::Value>,
    #[serde(default)]
    warnings: Vec<RawWarning>,
    metrics: Option<RawMetrics>,
    profile: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawWarning {
    code: i32,
    message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMetrics {
    elapsed_time: Option<String>,
    execution_time: Option<String>,
    sort_count: Option<u64>,
    result_count: Option<u64>,
    result_size: Option<u64>,
    mutation_count: Option<u64>,
    error_count: Option<u64>,
    warning_count: Option<u64>,
}

fn translate_meta(encoded: &str) -> Result<QueryMetaData, Error> {
    let raw: RawMeta = serde_json::from_str(encoded).map_err(|e| {
        Error::with_message(ErrorKind::DecodingFailure, "failed to decode query metadata")
            .with_cause(ErrorCause::Decode(e.to_string()))
    })?;

    Ok(QueryMetaData {
        request_id: raw.request_id.unwrap_or_default(),
        client_context_id: raw.client_context_id.unwrap_or_default(),
        status: raw
            .status
            .as_deref()
            .map(QueryStatus::from_wire)
            .unwrap_or(QueryStatus::Unknown),
        signature: raw.signature,
        warnings: raw
            .warnings
            .into_iter()
            .map(|w| QueryWarning {
                code: w.code,
                message: w.message,
            })
            .collect(),
        metrics: raw.metrics.map(translate_metrics),
        profile: raw.profile,
    })
}

fn translate_metrics(raw: RawMetrics) -> QueryMetrics {
    QueryMetrics {
        elapsed_time: raw
            .elapsed_time
            .as_deref()
            .and_then(parse_duration)
            .unwrap_or_default(),
        execution_time: raw
            .execution_time
            .as_deref()
            .and_then(parse_duration)
            .unwrap_or_default(),
        sort_count: raw.sort_count.unwrap_or_default(),
        result_count: raw.result_count.unwrap_or_default(),
        result_size: raw.result_size.unwrap_or_default(),
        mutation_count: raw.mutation_count.unwrap_or_default(),
        error_count: raw.error_count.unwrap_or_default(),
        warning_count: raw.warning_count.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn defaults_are_applied() {
        let request = build_request("SELECT 1", &QueryOptions::default());
        assert!(request.adhoc);
        assert!(!request.read_only);
        assert!(!request.client_context_id.is_empty());
        assert!(request.scan_consistency.is_none());
    }

    #[test]
    fn positional_parameters_encode_per_value() {
        let options = QueryOptions::default()
            .parameters(QueryParameters::Positional(vec![json!(1), json!("x")]));
        let request = build_request("SELECT 1", &options);
        assert_eq!(
            request.positional_parameters,
            vec!["1".to_string(), "\"x\"".to_string()]
        );
    }

    #[test]
    fn named_parameters_drop_unset_entries() {
        let mut named = HashMap::new();
        named.insert("a".to_string(), Some(json!([1, 2])));
        named.insert("b".to_string(), None);
        let options = QueryOptions::default().parameters(QueryParameters::Named(named));

        let request = build_request("SELECT 1", &options);
        assert_eq!(
            request.named_parameters.get("a").map(String::as_str),
            Some("[1,2]")
        );
        assert!(!request.named_parameters.contains_key("b"));
    }

    #[test]
    fn scan_wait_is_wire_encoded() {
        let mut options = QueryOptions::default();
        options.scan_wait = Some(Duration::from_millis(2500));
        let request = build_request("SELECT 1", &options);
        assert_eq!(request.scan_wait.as_deref(), Some("2500ms"));
    }

    #[test]
    fn meta_translates_status_warnings_and_metrics() {
        let encoded = json!({
            "request_id": "req-1",
            "client_context_id": "ctx-1",
            "status": "success",
            "warnings": [{"code": 101, "message": "w"}],
            "metrics": {
                "elapsed_time": "1.5s",
                "execution_time": "750ms",
                "result_count": 2
            }
        })
        .to_string();

        let meta = translate_meta(&encoded).unwrap();
        assert_eq!(meta.status, QueryStatus::Success);
        assert_eq!(meta.warnings.len(), 1);
        let metrics = meta.metrics.unwrap();
        assert_eq!(metrics.elapsed_time, Duration::from_millis(1500));
        assert_eq!(metrics.execution_time, Duration::from_millis(750));
        assert_eq!(metrics.result_count, 2);
    }

    #[test]
    fn malformed_meta_is_a_decoding_failure() {
        let err = translate_meta("{not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodingFailure);
    }
}

//! The analytics-query adapter.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::{AnalyticsEngineRequest, Engine};
use crate::error::{Error, ErrorCause, ErrorKind};
use crate::executor::{deliver, encode_positional, encode_value_map};
use crate::streaming::{self, StreamingResult};
use crate::types::analytics::{
    AnalyticsMetaData, AnalyticsMetrics, AnalyticsOptions, AnalyticsResult, AnalyticsStatus,
    AnalyticsWarning,
};
use crate::types::query::QueryParameters;
use crate::utils::duration::parse_duration;

/// The handle returned by [`AnalyticsExecutor::query`].
pub type PendingAnalyticsResult<R> = StreamingResult<R, AnalyticsMetaData, AnalyticsResult<R>>;

/// Executes analytics queries against the engine.
pub struct AnalyticsExecutor {
    engine: Arc<dyn Engine>,
}

impl AnalyticsExecutor {
    pub(crate) fn new(engine: Arc<dyn Engine>) -> Self {
        Self { engine }
    }

    /// Dispatches a statement and returns its result handle immediately.
    pub fn query<R>(&self, statement: &str, options: &AnalyticsOptions) -> PendingAnalyticsResult<R>
    where
        R: DeserializeOwned + Clone + Send + 'static,
    {
        let request = build_request(statement, options);
        tracing::debug!(
            statement,
            client_context_id = %request.client_context_id,
            priority = request.priority,
            "dispatching analytics query"
        );

        let (handle, emitter) = streaming::channel(|rows, meta| AnalyticsResult { rows, meta });
        self.engine.analytics_query(
            request,
            Box::new(move |completion| deliver(completion, &emitter, translate_meta)),
        );
        handle
    }
}

fn build_request(statement: &str, options: &AnalyticsOptions) -> AnalyticsEngineRequest {
    let mut positional = Vec::new();
    let mut named = HashMap::new();
    match &options.parameters {
        Some(QueryParameters::Positional(values)) => positional = encode_positional(values),
        Some(QueryParameters::Named(values)) => named = encode_value_map(values),
        None => {}
    }

    AnalyticsEngineRequest {
        statement: statement.to_string(),
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
        priority: options.priority,
        read_only: options.read_only,
        query_context: options.query_context.clone(),
        timeout: options.timeout,
    }
}

#[derive(Debug, Deserialize)]
struct RawMeta {
    request_id: Option<String>,
    client_context_id: Option<String>,
    status: Option<String>,
    signature: Option<serde_json::Value>,
    #[serde(default)]
    warnings: Vec<RawWarning>,
    #[serde(default)]
    metrics: RawMetrics,
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
    result_count: Option<u64>,
    result_size: Option<u64>,
    error_count: Option<u64>,
    processed_objects: Option<u64>,
    warning_count: Option<u64>,
}

fn translate_meta(encoded: &str) -> Result<AnalyticsMetaData, Error> {
    let raw: RawMeta = serde_json::from_str(encoded).map_err(|e| {
        Error::with_message(
            ErrorKind::DecodingFailure,
            "failed to decode analytics metadata",
        )
        .with_cause(ErrorCause::Decode(e.to_string()))
    })?;

    Ok(AnalyticsMetaData {
        request_id: raw.request_id.unwrap_or_default(),
        client_context_id: raw.client_context_id.unwrap_or_default(),
        status: raw
            .status
            .as_deref()
            .map(AnalyticsStatus::from_wire)
            .unwrap_or(AnalyticsStatus::Unknown),
        signature: raw.signature,
        warnings: raw
            .warnings
            .into_iter()
            .map(|w| AnalyticsWarning {
                code: w.code,
                message: w.message,
            })
            .collect(),
        metrics: AnalyticsMetrics {
            elapsed_time: raw
                .metrics
                .elapsed_time
                .as_deref()
                .and_then(parse_duration)
                .unwrap_or_default(),
            execution_time: raw
                .metrics
                .execution_time
                .as_deref()
                .and_then(parse_duration)
                .unwrap_or_default(),
            result_count: raw.metrics.result_count.unwrap_or_default(),
            result_size: raw.metrics.result_size.unwrap_or_default(),
            error_count: raw.metrics.error_count.unwrap_or_default(),
            processed_objects: raw.metrics.processed_objects.unwrap_or_default(),
            warning_count: raw.metrics.warning_count.unwrap_or_default(),
        },
    })
}

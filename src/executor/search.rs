//! The search-query adapter.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::{Engine, SearchEngineRequest};
use crate::error::{Error, ErrorCause, ErrorKind};
use crate::executor::{deliver, encode_value_map};
use crate::streaming::{self, StreamingResult};
use crate::types::search::{
    SearchMetaData, SearchMetrics, SearchOptions, SearchResult, SearchRow,
};

/// The handle returned by [`SearchExecutor::query`].
pub type PendingSearchResult = StreamingResult<SearchRow, SearchMetaData, SearchResult>;

/// Executes full-text search queries against the engine.
pub struct SearchExecutor {
    engine: Arc<dyn Engine>,
}

impl SearchExecutor {
    pub(crate) fn new(engine: Arc<dyn Engine>) -> Self {
        Self { engine }
    }

    /// Dispatches a search query against the named index and returns its
    /// result handle immediately.
    pub fn query(
        &self,
        index_name: &str,
        query: &serde_json::Value,
        options: &SearchOptions,
    ) -> PendingSearchResult {
        let request = build_request(index_name, query, options);
        tracing::debug!(
            index_name,
            client_context_id = %request.client_context_id,
            "dispatching search query"
        );

        let (handle, emitter) = streaming::channel(|rows, meta| SearchResult { rows, meta });
        self.engine.search_query(
            request,
            Box::new(move |completion| deliver(completion, &emitter, translate_meta)),
        );
        handle
    }
}

fn build_request(
    index_name: &str,
    query: &serde_json::Value,
    options: &SearchOptions,
) -> SearchEngineRequest {
    SearchEngineRequest {
        index_name: index_name.to_string(),
        query: query.to_string(),
        client_context_id: options
            .client_context_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        limit: options.limit,
        skip: options.skip,
        explain: options.explain,
        highlight_style: options
            .highlight_style
            .map(|s| s.wire_name().to_string()),
        highlight_fields: options.highlight_fields.clone(),
        fields: options.fields.clone(),
        sort: options.sort.iter().map(|s| s.to_string()).collect(),
        facets: encode_value_map(&options.facets),
        consistency: options.consistency.map(|c| c.wire_name().to_string()),
        disable_scoring: options.disable_scoring,
        include_locations: options.include_locations,
        raw: encode_value_map(&options.raw),
        timeout: options.timeout,
    }
}

#[derive(Debug, Deserialize)]
struct RawMeta {
    client_context_id: Option<String>,
    #[serde(default)]
    metrics: RawMetrics,
    #[serde(default)]
    errors: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMetrics {
    /// Time taken, in nanoseconds.
    took: Option<u64>,
    total_rows: Option<u64>,
    max_score: Option<f64>,
    total_partition_count: Option<u64>,
    success_partition_count: Option<u64>,
    error_partition_count: Option<u64>,
}

fn translate_meta(encoded: &str) -> Result<SearchMetaData, Error> {
    let raw: RawMeta = serde_json::from_str(encoded).map_err(|e| {
        Error::with_message(
            ErrorKind::DecodingFailure,
            "failed to decode search metadata",
        )
        .with_cause(ErrorCause::Decode(e.to_string()))
    })?;

    Ok(SearchMetaData {
        client_context_id: raw.client_context_id.unwrap_or_default(),
        metrics: SearchMetrics {
            took: Duration::from_nanos(raw.metrics.took.unwrap_or_default()),
            total_rows: raw.metrics.total_rows.unwrap_or_default(),
            max_score: raw.metrics.max_score.unwrap_or_default(),
            total_partition_count: raw.metrics.total_partition_count.unwrap_or_default(),
            success_partition_count: raw.metrics.success_partition_count.unwrap_or_default(),
            error_partition_count: raw.metrics.error_partition_count.unwrap_or_default(),
        },
        errors: raw.errors,
    })
}

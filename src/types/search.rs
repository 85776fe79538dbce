//! Options, results, and metadata for full-text search queries.

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Consistency bound for a search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScanConsistency {
    NotBounded,
}

impl SearchScanConsistency {
    pub(crate) fn wire_name(&self) -> &'static str {
        match self {
            SearchScanConsistency::NotBounded => "not_bounded",
        }
    }
}

/// Highlight style for matched fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightStyle {
    Html,
    Ansi,
}

impl HighlightStyle {
    pub(crate) fn wire_name(&self) -> &'static str {
        match self {
            HighlightStyle::Html => "html",
            HighlightStyle::Ansi => "ansi",
        }
    }
}

/// Options for a search query. `timeout` defaults to the cluster's search
/// timeout.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub limit: Option<u32>,
    pub skip: Option<u32>,
    pub explain: bool,
    pub highlight_style: Option<HighlightStyle>,
    pub highlight_fields: Vec<String>,
    /// Document fields to include in each row.
    pub fields: Vec<String>,
    /// Sort descriptors: field names or sort objects, encoded individually.
    pub sort: Vec<serde_json::Value>,
    /// Facet definitions keyed by facet name; `None` entries are removed
    /// before encoding.
    pub facets: HashMap<String, Option<serde_json::Value>>,
    pub consistency: Option<SearchScanConsistency>,
    pub disable_scoring: bool,
    pub include_locations: bool,
    pub client_context_id: Option<String>,
    pub raw: HashMap<String, Option<serde_json::Value>>,
    pub timeout: Option<Duration>,
}

impl SearchOptions {
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn explain(mut self, explain: bool) -> Self {
        self.explain = explain;
        self
    }

    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// One search hit.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRow {
    /// The partition-level index the hit came from.
    #[serde(default)]
    pub index: String,
    /// The id of the matched document.
    pub id: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub explanation: Option<serde_json::Value>,
    /// Match locations, present when requested via
    /// [`SearchOptions::include_locations`].
    #[serde(default)]
    pub locations: Option<serde_json::Value>,
    /// Highlighted fragments keyed by field.
    #[serde(default)]
    pub fragments: Option<HashMap<String, Vec<String>>>,
    /// Stored document fields, present when requested.
    #[serde(default)]
    pub fields: Option<serde_json::Value>,
}

/// Execution metrics for a search query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchMetrics {
    pub took: Duration,
    pub total_rows: u64,
    pub max_score: f64,
    pub total_partition_count: u64,
    pub success_partition_count: u64,
    pub error_partition_count: u64,
}

/// Metadata for a completed search query.
#[derive(Debug, Clone)]
pub struct SearchMetaData {
    pub client_context_id: String,
    pub metrics: SearchMetrics,
    /// Per-partition error messages, keyed by partition name.
    pub errors: HashMap<String, String>,
}

/// The aggregated result of a search query.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub rows: Vec<SearchRow>,
    pub meta: SearchMetaData,
}

//! Options, results, and metadata for read queries.

use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Status of a completed query, translated from the service vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Running,
    Success,
    Errors,
    Completed,
    Stopped,
    Timeout,
    Closed,
    Fatal,
    Aborted,
    /// The service reported a status this client does not know.
    Unknown,
}

impl QueryStatus {
    pub(crate) fn from_wire(status: &str) -> Self {
        match status {
            "running" => QueryStatus::Running,
            "success" => QueryStatus::Success,
            "errors" => QueryStatus::Errors,
            "completed" => QueryStatus::Completed,
            "stopped" => QueryStatus::Stopped,
            "timeout" => QueryStatus::Timeout,
            "closed" => QueryStatus::Closed,
            "fatal" => QueryStatus::Fatal,
            "aborted" => QueryStatus::Aborted,
            _ => QueryStatus::Unknown,
        }
    }
}

/// How consistent the query must be with respect to prior mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryScanConsistency {
    /// No consistency bound; the fastest option.
    NotBounded,
    /// Waits for all mutations issued before the query to be indexed.
    RequestPlus,
}

impl QueryScanConsistency {
    pub(crate) fn wire_name(&self) -> &'static str {
        match self {
            QueryScanConsistency::NotBounded => "not_bounded",
            QueryScanConsistency::RequestPlus => "request_plus",
        }
    }
}

/// The profiling mode requested for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryProfileMode {
    Off,
    Phases,
    Timings,
}

impl QueryProfileMode {
    pub(crate) fn wire_name(&self) -> &'static str {
        match self {
            QueryProfileMode::Off => "off",
            QueryProfileMode::Phases => "phases",
            QueryProfileMode::Timings => "timings",
        }
    }
}

/// Positional or named statement parameters.
///
/// Named and raw maps hold `Option<Value>`: a `None` entry means "unset" and
/// is removed before encoding, so an absent value can never leak onto the
/// wire as a stringified placeholder.
#[derive(Debug, Clone)]
pub enum QueryParameters {
    Positional(Vec<serde_json::Value>),
    Named(HashMap<String, Option<serde_json::Value>>),
}

/// Options for a read query. Unset fields take the documented defaults:
/// `adhoc` defaults to true, `read_only` to false, and `timeout` to the
/// cluster's query timeout.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub parameters: Option<QueryParameters>,
    pub scan_consistency: Option<QueryScanConsistency>,
    /// `false` routes the statement through the prepared-statement cache.
    pub adhoc: Option<bool>,
    pub flex_index: bool,
    pub client_context_id: Option<String>,
    pub max_parallelism: Option<u32>,
    pub pipeline_batch: Option<u32>,
    pub pipeline_cap: Option<u32>,
    pub scan_wait: Option<Duration>,
    pub scan_cap: Option<u32>,
    pub read_only: bool,
    pub profile: Option<QueryProfileMode>,
    pub metrics: bool,
    pub query_context: Option<String>,
    /// Pass-through fields merged into the request; values encoded
    /// individually, `None` entries removed.
    pub raw: HashMap<String, Option<serde_json::Value>>,
    pub timeout: Option<Duration>,
}

impl QueryOptions {
    pub fn parameters(mut self, parameters: QueryParameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn scan_consistency(mut self, consistency: QueryScanConsistency) -> Self {
        self.scan_consistency = Some(consistency);
        self
    }

    pub fn adhoc(mut self, adhoc: bool) -> Self {
        self.adhoc = Some(adhoc);
        self
    }

    pub fn client_context_id(mut self, id: impl Into<String>) -> Self {
        self.client_context_id = Some(id.into());
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn metrics(mut self, metrics: bool) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A warning returned by the query service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryWarning {
    pub code: i32,
    pub message: String,
}

/// Execution metrics for a query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryMetrics {
    pub elapsed_time: Duration,
    pub execution_time: Duration,
    pub sort_count: u64,
    pub result_count: u64,
    pub result_size: u64,
    pub mutation_count: u64,
    pub error_count: u64,
    pub warning_count: u64,
}

/// Metadata for a completed query.
#[derive(Debug, Clone)]
pub struct QueryMetaData {
    pub request_id: String,
    pub client_context_id: String,
    pub status: QueryStatus,
    pub signature: Option<serde_json::Value>,
    pub warnings: Vec<QueryWarning>,
    /// Present when [`QueryOptions::metrics`] was requested.
    pub metrics: Option<QueryMetrics>,
    pub profile: Option<serde_json::Value>,
}

/// The aggregated result of a query: decoded rows plus metadata.
#[derive(Debug, Clone)]
pub struct QueryResult<R> {
    pub rows: Vec<R>,
    pub meta: QueryMetaData,
}

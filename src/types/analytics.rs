//! Options, results, and metadata for analytics queries.

use crate::types::query::QueryParameters;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Status of a completed analytics query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsStatus {
    Running,
    Success,
    Errors,
    Completed,
    Stopped,
    Timeout,
    Closed,
    Fatal,
    Aborted,
    Unknown,
}

impl AnalyticsStatus {
    pub(crate) fn from_wire(status: &str) -> Self {
        match status {
            "running" => AnalyticsStatus::Running,
            "success" => AnalyticsStatus::Success,
            "errors" => AnalyticsStatus::Errors,
            "completed" => AnalyticsStatus::Completed,
            "stopped" => AnalyticsStatus::Stopped,
            "timeout" => AnalyticsStatus::Timeout,
            "closed" => AnalyticsStatus::Closed,
            "fatal" => AnalyticsStatus::Fatal,
            "aborted" => AnalyticsStatus::Aborted,
            _ => AnalyticsStatus::Unknown,
        }
    }
}

/// Consistency bound for an analytics query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsScanConsistency {
    NotBounded,
    RequestPlus,
}

impl AnalyticsScanConsistency {
    pub(crate) fn wire_name(&self) -> &'static str {
        match self {
            AnalyticsScanConsistency::NotBounded => "not_bounded",
            AnalyticsScanConsistency::RequestPlus => "request_plus",
        }
    }
}

/// Options for an analytics query. `timeout` defaults to the cluster's
/// analytics timeout.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsOptions {
    pub parameters: Option<QueryParameters>,
    pub scan_consistency: Option<AnalyticsScanConsistency>,
    pub client_context_id: Option<String>,
    /// Run the query with elevated scheduling priority.
    pub priority: bool,
    pub read_only: bool,
    pub query_context: Option<String>,
    pub raw: HashMap<String, Option<serde_json::Value>>,
    pub timeout: Option<Duration>,
}

impl AnalyticsOptions {
    pub fn parameters(mut self, parameters: QueryParameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn scan_consistency(mut self, consistency: AnalyticsScanConsistency) -> Self {
        self.scan_consistency = Some(consistency);
        self
    }

    pub fn priority(mut self, priority: bool) -> Self {
        self.priority = priority;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A warning returned by the analytics service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsWarning {
    pub code: i32,
    pub message: String,
}

/// Execution metrics for an analytics query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnalyticsMetrics {
    pub elapsed_time: Duration,
    pub execution_time: Duration,
    pub result_count: u64,
    pub result_size: u64,
    pub error_count: u64,
    pub processed_objects: u64,
    pub warning_count: u64,
}

/// Metadata for a completed analytics query.
#[derive(Debug, Clone)]
pub struct AnalyticsMetaData {
    pub request_id: String,
    pub client_context_id: String,
    pub status: AnalyticsStatus,
    pub signature: Option<serde_json::Value>,
    pub warnings: Vec<AnalyticsWarning>,
    pub metrics: AnalyticsMetrics,
}

/// The aggregated result of an analytics query.
#[derive(Debug, Clone)]
pub struct AnalyticsResult<R> {
    pub rows: Vec<R>,
    pub meta: AnalyticsMetaData,
}

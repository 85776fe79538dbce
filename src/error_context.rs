//! Structured error contexts, one shape per service domain.
//!
//! A context captures everything known about the failed service interaction
//! in a form that can be logged or serialized without re-parsing the raw
//! engine envelope. The [`ErrorContext`] sum type is closed: the classifier
//! matches on it exhaustively, so adding a shape is a compile-visible change.

use serde::Serialize;

/// Dispatch and retry information shared by every context shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommonContext {
    /// The host and port the request was last sent to.
    pub last_dispatched_to: String,
    /// The host and port the request was last sent from.
    pub last_dispatched_from: String,
    /// How many times the operation was retried.
    pub retry_attempts: u32,
    /// The reasons the operation was retried, as stable labels.
    pub retry_reasons: Vec<&'static str>,
}

/// Context for a failed key-value operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeyValueErrorContext {
    #[serde(flatten)]
    pub common: CommonContext,
    /// The raw status code returned by the data service.
    pub status_code: i32,
    /// The opaque identifier of the request.
    pub opaque: u32,
    /// The document version token returned by the server.
    pub cas: u64,
    /// The key being operated on.
    pub key: String,
    pub bucket: String,
    pub scope: String,
    pub collection: String,
    /// Free-form server-side context describing the error.
    pub context: String,
    /// The server-side reference id for log correlation.
    #[serde(rename = "ref")]
    pub error_ref: String,
}

/// Context for a failed view operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewErrorContext {
    #[serde(flatten)]
    pub common: CommonContext,
    pub design_document: String,
    pub view: String,
    /// The request parameters, as the encoded form that was sent.
    pub parameters: String,
    pub http_response_code: u16,
    pub http_response_body: String,
}

/// Context for a failed query operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryErrorContext {
    #[serde(flatten)]
    pub common: CommonContext,
    /// The first error code reported by the service.
    pub first_error_code: i64,
    /// The first error message reported by the service.
    pub first_error_message: String,
    pub statement: String,
    pub client_context_id: String,
    /// The request parameters, as the encoded form that was sent.
    pub parameters: String,
    pub http_response_code: u16,
    pub http_response_body: String,
}

/// Context for a failed search operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchErrorContext {
    #[serde(flatten)]
    pub common: CommonContext,
    pub index_name: String,
    /// The encoded search query that was executed.
    pub query: String,
    pub parameters: String,
    pub http_response_code: u16,
    pub http_response_body: String,
}

/// Context for a failed analytics operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticsErrorContext {
    #[serde(flatten)]
    pub common: CommonContext,
    pub first_error_code: i64,
    pub first_error_message: String,
    pub statement: String,
    pub client_context_id: String,
    pub parameters: String,
    pub http_response_code: u16,
    pub http_response_body: String,
}

/// Context for a failed management (HTTP) operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HttpErrorContext {
    #[serde(flatten)]
    pub common: CommonContext,
    pub method: String,
    pub request_path: String,
    pub response_code: u16,
    pub response_body: String,
}

/// The closed set of context shapes an [`Error`](crate::Error) can carry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorContext {
    KeyValue(KeyValueErrorContext),
    View(ViewErrorContext),
    Query(QueryErrorContext),
    Search(SearchErrorContext),
    Analytics(AnalyticsErrorContext),
    Http(HttpErrorContext),
}

impl ErrorContext {
    pub fn as_key_value(&self) -> Option<&KeyValueErrorContext> {
        match self {
            ErrorContext::KeyValue(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_view(&self) -> Option<&ViewErrorContext> {
        match self {
            ErrorContext::View(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_query(&self) -> Option<&QueryErrorContext> {
        match self {
            ErrorContext::Query(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_search(&self) -> Option<&SearchErrorContext> {
        match self {
            ErrorContext::Search(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_analytics(&self) -> Option<&AnalyticsErrorContext> {
        match self {
            ErrorContext::Analytics(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_http(&self) -> Option<&HttpErrorContext> {
        match self {
            ErrorContext::Http(c) => Some(c),
            _ => None,
        }
    }

    /// The dispatch and retry information shared by every shape.
    pub fn common(&self) -> &CommonContext {
        match self {
            ErrorContext::KeyValue(c) => &c.common,
            ErrorContext::View(c) => &c.common,
            ErrorContext::Query(c) => &c.common,
            ErrorContext::Search(c) => &c.common,
            ErrorContext::Analytics(c) => &c.common,
            ErrorContext::Http(c) => &c.common,
        }
    }
}

/// Translates one engine retry-reason code into its stable label.
///
/// Codes with no entry collapse to `"unknown"` rather than failing; a newer
/// engine must not be able to break classification.
pub fn retry_reason_label(code: u32) -> &'static str {
    match code {
        0 => "do_not_retry",
        2 => "socket_not_available",
        3 => "service_not_available",
        4 => "node_not_available",
        5 => "kv_not_my_vbucket",
        6 => "kv_collection_outdated",
        7 => "kv_error_map_retry_indicated",
        8 => "kv_locked",
        9 => "kv_temporary_failure",
        10 => "kv_sync_write_in_progress",
        11 => "kv_sync_write_re_commit_in_progress",
        12 => "service_response_code_indicated",
        13 => "socket_closed_while_in_flight",
        14 => "circuit_breaker_open",
        15 => "query_prepared_statement_failure",
        16 => "query_index_not_found",
        17 => "analytics_temporary_failure",
        18 => "search_too_many_requests",
        19 => "views_temporary_failure",
        20 => "views_no_active_partition",
        21 => "node_restarted",
        _ => "unknown",
    }
}

pub(crate) fn retry_reason_labels(codes: &[u32]) -> Vec<&'static str> {
    codes.iter().map(|c| retry_reason_label(*c)).collect()
}

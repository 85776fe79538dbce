//! The boundary to the native execution engine.
//!
//! The engine is a black box: it accepts a fully-translated request object
//! and invokes **exactly one** completion callback, carrying either an
//! [`ErrorEnvelope`] or a [`RawResponse`] with zero or more encoded rows plus
//! an encoded metadata record. Everything above this module deals in typed
//! requests and results; everything below it is out of scope.
//!
//! The callback is always invoked asynchronously with respect to the call
//! that registered it, from the engine's own execution context.

use std::collections::HashMap;
use std::time::Duration;

/// Numeric error-code namespaces reported by the engine, partitioned by
/// service domain. The classification table in [`crate::classify`] is keyed
/// by these values.
pub mod codes {
    /// Codes shared by every service.
    pub mod common {
        pub const REQUEST_CANCELED: i64 = 2;
        pub const INVALID_ARGUMENT: i64 = 3;
        pub const SERVICE_NOT_AVAILABLE: i64 = 4;
        pub const INTERNAL_SERVER_FAILURE: i64 = 5;
        pub const AUTHENTICATION_FAILURE: i64 = 6;
        pub const TEMPORARY_FAILURE: i64 = 7;
        pub const PARSING_FAILURE: i64 = 8;
        pub const CAS_MISMATCH: i64 = 9;
        pub const BUCKET_NOT_FOUND: i64 = 10;
        pub const COLLECTION_NOT_FOUND: i64 = 11;
        pub const UNSUPPORTED_OPERATION: i64 = 12;
        pub const AMBIGUOUS_TIMEOUT: i64 = 13;
        pub const UNAMBIGUOUS_TIMEOUT: i64 = 14;
        pub const FEATURE_NOT_AVAILABLE: i64 = 15;
        pub const SCOPE_NOT_FOUND: i64 = 16;
        pub const INDEX_NOT_FOUND: i64 = 17;
        pub const INDEX_EXISTS: i64 = 18;
        pub const ENCODING_FAILURE: i64 = 19;
        pub const DECODING_FAILURE: i64 = 20;
        pub const RATE_LIMITED: i64 = 21;
        pub const QUOTA_LIMITED: i64 = 22;
    }

    /// Key-value service codes.
    pub mod key_value {
        pub const DOCUMENT_NOT_FOUND: i64 = 101;
        pub const DOCUMENT_UNRETRIEVABLE: i64 = 102;
        pub const DOCUMENT_LOCKED: i64 = 103;
        pub const VALUE_TOO_LARGE: i64 = 104;
        pub const DOCUMENT_EXISTS: i64 = 105;
        pub const VALUE_NOT_JSON: i64 = 106;
        pub const DURABILITY_LEVEL_NOT_AVAILABLE: i64 = 107;
        pub const DURABILITY_IMPOSSIBLE: i64 = 108;
        pub const DURABILITY_AMBIGUOUS: i64 = 109;
        pub const DURABLE_WRITE_IN_PROGRESS: i64 = 110;
        pub const DURABLE_WRITE_RE_COMMIT_IN_PROGRESS: i64 = 111;
        pub const MUTATION_LOST: i64 = 112;
        pub const PATH_NOT_FOUND: i64 = 113;
        pub const PATH_MISMATCH: i64 = 114;
        pub const PATH_INVALID: i64 = 115;
        pub const PATH_TOO_BIG: i64 = 116;
        pub const PATH_TOO_DEEP: i64 = 117;
        pub const VALUE_TOO_DEEP: i64 = 118;
        pub const VALUE_INVALID: i64 = 119;
        pub const DOCUMENT_NOT_JSON: i64 = 120;
        pub const NUMBER_TOO_BIG: i64 = 121;
        pub const DELTA_INVALID: i64 = 122;
        pub const PATH_EXISTS: i64 = 123;
        // 124..=127 are extended-attribute variants with no dedicated kind;
        // they classify to the generic base error on purpose.
        pub const XATTR_UNKNOWN_MACRO: i64 = 124;
        pub const XATTR_INVALID_KEY_COMBO: i64 = 125;
        pub const XATTR_UNKNOWN_VIRTUAL_ATTRIBUTE: i64 = 126;
        pub const XATTR_CANNOT_MODIFY_VIRTUAL_ATTRIBUTE: i64 = 127;
    }

    /// Query service codes.
    pub mod query {
        pub const PLANNING_FAILURE: i64 = 201;
        pub const INDEX_FAILURE: i64 = 202;
        pub const PREPARED_STATEMENT_FAILURE: i64 = 203;
        pub const DML_FAILURE: i64 = 204;
    }

    /// Analytics service codes.
    pub mod analytics {
        pub const COMPILATION_FAILURE: i64 = 301;
        pub const JOB_QUEUE_FULL: i64 = 302;
        pub const DATASET_NOT_FOUND: i64 = 303;
        pub const DATAVERSE_NOT_FOUND: i64 = 304;
        pub const DATASET_EXISTS: i64 = 305;
        pub const DATAVERSE_EXISTS: i64 = 306;
        pub const LINK_NOT_FOUND: i64 = 307;
        pub const LINK_EXISTS: i64 = 308;
    }

    /// Search service codes.
    pub mod search {
        pub const INDEX_NOT_READY: i64 = 401;
        // Consistency mismatch has no dedicated kind; generic on purpose.
        pub const CONSISTENCY_MISMATCH: i64 = 402;
    }

    /// View service codes.
    pub mod view {
        pub const VIEW_NOT_FOUND: i64 = 501;
        pub const DESIGN_DOCUMENT_NOT_FOUND: i64 = 502;
    }

    /// Management service codes.
    pub mod management {
        pub const COLLECTION_EXISTS: i64 = 601;
        pub const SCOPE_EXISTS: i64 = 602;
        pub const USER_NOT_FOUND: i64 = 603;
        pub const GROUP_NOT_FOUND: i64 = 604;
        pub const BUCKET_EXISTS: i64 = 605;
        pub const USER_EXISTS: i64 = 606;
        pub const BUCKET_NOT_FLUSHABLE: i64 = 607;
        pub const EVENTING_FUNCTION_NOT_FOUND: i64 = 608;
        pub const EVENTING_FUNCTION_NOT_DEPLOYED: i64 = 609;
        pub const EVENTING_FUNCTION_COMPILATION_FAILURE: i64 = 610;
        pub const EVENTING_FUNCTION_IDENTICAL_KEYSPACE: i64 = 611;
        pub const EVENTING_FUNCTION_NOT_BOOTSTRAPPED: i64 = 612;
        pub const EVENTING_FUNCTION_DEPLOYED: i64 = 613;
        pub const EVENTING_FUNCTION_PAUSED: i64 = 614;
    }
}

/// Failure-type values carried by `transaction_exception` envelopes.
pub mod txn_failure_type {
    pub const FAIL: i32 = 0;
    pub const EXPIRY: i32 = 1;
    pub const COMMIT_AMBIGUOUS: i32 = 2;
}

/// The context-type tag discriminating an [`ErrorEnvelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeTag {
    /// No domain-specific fields; the envelope is only a code and a message.
    #[default]
    Generic,
    KeyValue,
    View,
    Query,
    Search,
    Analytics,
    Http,
    TransactionOperationFailed,
    TransactionOpException,
    TransactionException,
}

/// The nested error context of a `transaction_op_exception` envelope. The
/// cause, when present, is a key-value or query envelope whose fields carry
/// the context of the failed inner operation.
#[derive(Debug, Clone, Default)]
pub struct TransactionOpContext {
    pub code: i64,
    pub cause: Option<Box<ErrorEnvelope>>,
}

/// The raw error payload delivered by the engine.
///
/// One flat record for all domains: which fields are populated depends on
/// [`tag`](Self::tag). `Default` produces an empty generic envelope, which
/// keeps construction terse at call sites and in tests.
#[derive(Debug, Clone, Default)]
pub struct ErrorEnvelope {
    /// The numeric error code (see [`codes`]).
    pub code: i64,
    /// The context-type tag selecting which domain fields are meaningful.
    pub tag: EnvelopeTag,
    /// The engine-supplied message, if any.
    pub message: Option<String>,

    // Dispatch and retry information, available on every tag.
    pub last_dispatched_to: Option<String>,
    pub last_dispatched_from: Option<String>,
    pub retry_attempts: u32,
    /// Raw retry-reason codes; translated through a static label table
    /// during classification.
    pub retry_reasons: Vec<u32>,

    // Key-value fields.
    pub status_code: Option<i32>,
    pub opaque: Option<u32>,
    pub cas: Option<u64>,
    pub key: Option<String>,
    pub bucket: Option<String>,
    pub scope: Option<String>,
    pub collection: Option<String>,
    pub context: Option<String>,
    pub error_ref: Option<String>,

    // Query / analytics / view / search fields.
    pub first_error_code: Option<i64>,
    pub first_error_message: Option<String>,
    pub statement: Option<String>,
    pub client_context_id: Option<String>,
    pub parameters: Option<String>,
    pub design_document: Option<String>,
    pub view: Option<String>,
    pub index_name: Option<String>,
    pub query: Option<String>,
    pub http_response_code: Option<u16>,
    pub http_response_body: Option<String>,

    // Management (HTTP) fields.
    pub method: Option<String>,
    pub request_path: Option<String>,
    pub response_code: Option<u16>,
    pub response_body: Option<String>,

    // Transaction fields.
    pub cause: Option<Box<ErrorEnvelope>>,
    pub op_context: Option<TransactionOpContext>,
    pub failure_type: Option<i32>,
    pub should_not_retry: bool,
    pub should_not_rollback: bool,
}

/// The success payload delivered by the engine: rows in response order, each
/// independently JSON-decodable, plus one encoded metadata record whose field
/// names follow the service's own vocabulary.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub rows: Vec<String>,
    pub meta: String,
}

/// The single value the engine delivers to a completion callback.
#[derive(Debug, Clone)]
pub enum Completion {
    Failure(Box<ErrorEnvelope>),
    Success(RawResponse),
}

/// The completion callback registered with an engine call.
pub type CompletionHandler = Box<dyn FnOnce(Completion) + Send + 'static>;

/// Engine-call parameters for a read query.
///
/// All option translation has already happened: parameter maps are encoded
/// JSON-per-value, durations are wire strings, enums are wire names.
#[derive(Debug, Clone)]
pub struct QueryEngineRequest {
    pub statement: String,
    /// `false` requests the prepared-statement path.
    pub adhoc: bool,
    pub client_context_id: String,
    pub positional_parameters: Vec<String>,
    pub named_parameters: HashMap<String, String>,
    pub raw: HashMap<String, String>,
    pub scan_consistency: Option<String>,
    pub scan_wait: Option<String>,
    pub scan_cap: Option<u32>,
    pub read_only: bool,
    pub flex_index: bool,
    pub max_parallelism: Option<u32>,
    pub pipeline_batch: Option<u32>,
    pub pipeline_cap: Option<u32>,
    pub profile: Option<String>,
    pub metrics: bool,
    pub query_context: Option<String>,
    pub timeout: Option<Duration>,
}

/// Engine-call parameters for an analytics query.
#[derive(Debug, Clone)]
pub struct AnalyticsEngineRequest {
    pub statement: String,
    pub client_context_id: String,
    pub positional_parameters: Vec<String>,
    pub named_parameters: HashMap<String, String>,
    pub raw: HashMap<String, String>,
    pub scan_consistency: Option<String>,
    pub priority: bool,
    pub read_only: bool,
    pub query_context: Option<String>,
    pub timeout: Option<Duration>,
}

/// Engine-call parameters for a full-text search query.
#[derive(Debug, Clone)]
pub struct SearchEngineRequest {
    pub index_name: String,
    /// The encoded search query payload.
    pub query: String,
    pub client_context_id: String,
    pub limit: Option<u32>,
    pub skip: Option<u32>,
    pub explain: bool,
    pub highlight_style: Option<String>,
    pub highlight_fields: Vec<String>,
    pub fields: Vec<String>,
    /// Sort descriptors, each encoded individually.
    pub sort: Vec<String>,
    /// Facet definitions, encoded JSON-per-value.
    pub facets: HashMap<String, String>,
    pub consistency: Option<String>,
    pub disable_scoring: bool,
    pub include_locations: bool,
    pub raw: HashMap<String, String>,
    pub timeout: Option<Duration>,
}

/// The native execution engine.
///
/// Implementations must invoke the completion handler exactly once per call,
/// asynchronously with respect to the registering call.
pub trait Engine: Send + Sync + 'static {
    fn query(&self, request: QueryEngineRequest, completion: CompletionHandler);
    fn analytics_query(&self, request: AnalyticsEngineRequest, completion: CompletionHandler);
    fn search_query(&self, request: SearchEngineRequest, completion: CompletionHandler);
}

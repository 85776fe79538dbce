//! Typed error taxonomy for the Quarry client.
//!
//! Every failure surfaced by this crate is an [`Error`]: a concrete
//! [`ErrorKind`] out of a closed set, a human-readable message, an optional
//! underlying [`ErrorCause`], and an optional structured
//! [`ErrorContext`](crate::error_context::ErrorContext) describing the service
//! interaction that failed. Classification from raw engine envelopes lives in
//! [`classify`](crate::classify); this module only defines the vocabulary.
//!
//! Timeouts deserve a note: [`ErrorKind::AmbiguousTimeout`] means the
//! operation *may* have completed on the server, while
//! [`ErrorKind::UnambiguousTimeout`] means it definitely did not. Retry logic
//! must distinguish the two.

use crate::error_context::ErrorContext;
use std::fmt;
use thiserror::Error as ThisError;

/// A raw failure code reported by the execution engine.
///
/// Kept as the innermost cause of classified errors so callers can always
/// recover the original numeric code, even when it mapped to the generic kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
#[error("engine error {code}")]
pub struct EngineFailure {
    /// The numeric error code reported by the engine.
    pub code: i64,
}

/// The underlying cause attached to an [`Error`].
#[derive(Debug, Clone)]
pub enum ErrorCause {
    /// The raw engine failure the error was classified from.
    Engine(EngineFailure),
    /// A nested, already-classified error (transactional failures wrap their
    /// cause this way).
    Typed(Box<Error>),
    /// A description of a row or metadata decoding failure.
    Decode(String),
}

impl fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCause::Engine(e) => e.fmt(f),
            ErrorCause::Typed(e) => e.fmt(f),
            ErrorCause::Decode(detail) => write!(f, "decode failure: {}", detail),
        }
    }
}

impl std::error::Error for ErrorCause {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ErrorCause::Engine(e) => Some(e),
            ErrorCause::Typed(e) => Some(e.as_ref()),
            ErrorCause::Decode(_) => None,
        }
    }
}

/// The service domain an [`ErrorKind`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorDomain {
    Common,
    KeyValue,
    Query,
    Analytics,
    Search,
    View,
    Management,
    Transaction,
}

/// The closed set of error kinds produced by this crate.
///
/// One generic base kind plus the specific kinds, grouped by service domain.
/// Unrecognized engine codes degrade to [`ErrorKind::Generic`] with the
/// original code preserved as the cause; they are never dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The generic base kind; carries whatever message and context the
    /// envelope had.
    Generic,

    // Common
    /// An operation was performed after the connection was closed.
    ConnectionClosed,
    /// An operation was performed after the cluster object was closed.
    ClusterClosed,
    /// An invalid durability level was specified.
    InvalidDurabilityLevel,
    /// The operation timed out (base kind; prefer the ambiguous/unambiguous
    /// variants when the outcome is known).
    Timeout,
    /// The request was explicitly canceled.
    RequestCanceled,
    /// One of the passed arguments was invalid.
    InvalidArgument,
    /// The operation requires a service which is not available.
    ServiceNotAvailable,
    /// An internal failure occurred on the server.
    InternalServerFailure,
    /// Authenticating the user to the cluster failed.
    AuthenticationFailure,
    /// A temporary failure occurred; the same operation may later succeed.
    TemporaryFailure,
    /// A parsing failure occurred.
    ParsingFailure,
    /// The document changed since last access; fetch it again before
    /// retrying the mutation.
    CasMismatch,
    /// The referenced bucket does not exist.
    BucketNotFound,
    /// The referenced collection does not exist.
    CollectionNotFound,
    /// A failure occurred while encoding a value.
    EncodingFailure,
    /// A failure occurred while decoding a value.
    DecodingFailure,
    /// An unsupported operation was executed.
    UnsupportedOperation,
    /// The operation timed out and may or may not have completed.
    AmbiguousTimeout,
    /// The operation timed out and is known not to have completed.
    UnambiguousTimeout,
    /// A feature which is not available on the connected server was used.
    FeatureNotAvailable,
    /// The referenced scope does not exist.
    ScopeNotFound,
    /// The referenced index does not exist.
    IndexNotFound,
    /// The referenced index already exists.
    IndexExists,
    /// The operation was rate limited.
    RateLimited,
    /// The operation was quota limited.
    QuotaLimited,

    // Key-value
    /// The referenced document does not exist.
    DocumentNotFound,
    /// The referenced document could not be retrieved.
    DocumentUnretrievable,
    /// The referenced document is locked, likely by another actor.
    DocumentLocked,
    /// A value could not be stored as it was too large.
    ValueTooLarge,
    /// The referenced document exists, but the operation expected it not to.
    DocumentExists,
    /// A JSON operation was attempted with non-JSON data.
    ValueNotJson,
    /// A durability level which is not available was specified.
    DurabilityLevelNotAvailable,
    /// The specified durability is impossible with the nodes available.
    DurabilityImpossible,
    /// A durable write failed ambiguously and may yet complete.
    DurabilityAmbiguous,
    /// A durable write against the key is already in progress.
    DurableWriteInProgress,
    /// The server is reconstructing durable data following a failover.
    DurableWriteReCommitInProgress,
    /// A mutation was lost.
    MutationLost,
    /// The referenced path was not found in the document.
    PathNotFound,
    /// The referenced path made incorrect assumptions about the document
    /// structure.
    PathMismatch,
    /// The referenced path is not valid.
    PathInvalid,
    /// The specified path was too large to parse.
    PathTooBig,
    /// The referenced path was too deep to parse.
    PathTooDeep,
    /// The operation would make the document too deep to operate on.
    ValueTooDeep,
    /// The value passed is invalid for the operation.
    ValueInvalid,
    /// An operation expecting JSON was performed on a non-JSON document.
    DocumentNotJson,
    /// A number has grown too large.
    NumberTooBig,
    /// The specified delta is invalid.
    DeltaInvalid,
    /// The referenced path already exists, but the operation expected it
    /// not to.
    PathExists,

    // Query
    /// A failure occurred while planning the query.
    PlanningFailure,
    /// A failure occurred while using an index during the query.
    IndexFailure,
    /// An error occurred with a prepared statement.
    PreparedStatementFailure,
    /// A generic DML failure occurred with the query.
    DmlFailure,
    /// The index was not ready yet.
    IndexNotReady,

    // Analytics
    /// An error occurred while compiling the statement.
    CompilationFailure,
    /// The service job queue is full; requests are rejected until it
    /// shrinks.
    JobQueueFull,
    /// The referenced dataset does not exist.
    DatasetNotFound,
    /// The referenced dataverse does not exist.
    DataverseNotFound,
    /// The referenced dataset already exists.
    DatasetExists,
    /// The referenced dataverse already exists.
    DataverseExists,
    /// The referenced link does not exist.
    LinkNotFound,
    /// The referenced link already exists.
    LinkExists,

    // View
    /// The referenced view does not exist.
    ViewNotFound,
    /// The referenced design document does not exist.
    DesignDocumentNotFound,

    // Management
    /// The referenced collection already exists.
    CollectionExists,
    /// The referenced scope already exists.
    ScopeExists,
    /// The referenced user does not exist.
    UserNotFound,
    /// The referenced group does not exist.
    GroupNotFound,
    /// The referenced bucket already exists.
    BucketExists,
    /// The referenced user already exists.
    UserExists,
    /// The bucket does not have the flush option enabled.
    BucketNotFlushable,
    /// The referenced eventing function does not exist.
    EventingFunctionNotFound,
    /// The referenced eventing function was not deployed.
    EventingFunctionNotDeployed,
    /// The eventing function could not be compiled.
    EventingFunctionCompilationFailure,
    /// The source and metadata keyspaces of an eventing function are
    /// identical.
    EventingFunctionIdenticalKeyspace,
    /// The eventing function has not completed bootstrapping.
    EventingFunctionNotBootstrapped,
    /// The eventing function is deployed, but the operation expected it
    /// not to be.
    EventingFunctionDeployed,
    /// The eventing function is paused, but the operation expected it
    /// not to be.
    EventingFunctionPaused,

    // Transactions
    /// A transactional operation failed to complete.
    TransactionOperationFailed,
    /// A transaction failed to complete.
    TransactionFailed,
    /// A transaction failed to complete because it expired.
    TransactionExpired,
    /// A transaction ended ambiguously and may or may not have committed.
    TransactionCommitAmbiguous,
}

impl ErrorKind {
    /// The default human-readable message for this kind.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::Generic => "engine error",
            ErrorKind::ConnectionClosed => "the connection has been closed",
            ErrorKind::ClusterClosed => "the parent cluster object has been closed",
            ErrorKind::InvalidDurabilityLevel => "an invalid durability level was specified",
            ErrorKind::Timeout => "timeout",
            ErrorKind::RequestCanceled => "request canceled",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::ServiceNotAvailable => "service not available",
            ErrorKind::InternalServerFailure => "internal server failure",
            ErrorKind::AuthenticationFailure => "authentication failure",
            ErrorKind::TemporaryFailure => "temporary failure",
            ErrorKind::ParsingFailure => "parsing failure",
            ErrorKind::CasMismatch => "cas mismatch",
            ErrorKind::BucketNotFound => "bucket not found",
            ErrorKind::CollectionNotFound => "collection not found",
            ErrorKind::EncodingFailure => "encoding failure",
            ErrorKind::DecodingFailure => "decoding failure",
            ErrorKind::UnsupportedOperation => "unsupported operation",
            ErrorKind::AmbiguousTimeout => "ambiguous timeout",
            ErrorKind::UnambiguousTimeout => "unambiguous timeout",
            ErrorKind::FeatureNotAvailable => "feature not available",
            ErrorKind::ScopeNotFound => "scope not found",
            ErrorKind::IndexNotFound => "index not found",
            ErrorKind::IndexExists => "index exists",
            ErrorKind::RateLimited => "operation was rate limited",
            ErrorKind::QuotaLimited => "operation was quota limited",
            ErrorKind::DocumentNotFound => "document not found",
            ErrorKind::DocumentUnretrievable => "document unretrievable",
            ErrorKind::DocumentLocked => "document locked",
            ErrorKind::ValueTooLarge => "value too large",
            ErrorKind::DocumentExists => "document exists",
            ErrorKind::ValueNotJson => "value not json",
            ErrorKind::DurabilityLevelNotAvailable => "durability level not available",
            ErrorKind::DurabilityImpossible => "durability impossible",
            ErrorKind::DurabilityAmbiguous => "durability ambiguous",
            ErrorKind::DurableWriteInProgress => "durable write in progress",
            ErrorKind::DurableWriteReCommitInProgress => {
                "durable write recommit in progress"
            }
            ErrorKind::MutationLost => "mutation lost",
            ErrorKind::PathNotFound => "path not found",
            ErrorKind::PathMismatch => "path mismatch",
            ErrorKind::PathInvalid => "path invalid",
            ErrorKind::PathTooBig => "path too big",
            ErrorKind::PathTooDeep => "path too deep",
            ErrorKind::ValueTooDeep => "value too deep",
            ErrorKind::ValueInvalid => "value invalid",
            ErrorKind::DocumentNotJson => "document not json",
            ErrorKind::NumberTooBig => "number too big",
            ErrorKind::DeltaInvalid => "delta invalid",
            ErrorKind::PathExists => "path exists",
            ErrorKind::PlanningFailure => "planning failure",
            ErrorKind::IndexFailure => "index failure",
            ErrorKind::PreparedStatementFailure => "prepared statement failure",
            ErrorKind::DmlFailure => "generic dml failure",
            ErrorKind::IndexNotReady => "index not ready",
            ErrorKind::CompilationFailure => "compilation failure",
            ErrorKind::JobQueueFull => "job queue full",
            ErrorKind::DatasetNotFound => "dataset not found",
            ErrorKind::DataverseNotFound => "dataverse not found",
            ErrorKind::DatasetExists => "dataset exists",
            ErrorKind::DataverseExists => "dataverse exists",
            ErrorKind::LinkNotFound => "link not found",
            ErrorKind::LinkExists => "link already exists",
            ErrorKind::ViewNotFound => "view not found",
            ErrorKind::DesignDocumentNotFound => "design document not found",
            ErrorKind::CollectionExists => "collection exists",
            ErrorKind::ScopeExists => "scope exists",
            ErrorKind::UserNotFound => "user not found",
            ErrorKind::GroupNotFound => "group not found",
            ErrorKind::BucketExists => "bucket exists",
            ErrorKind::UserExists => "user exists",
            ErrorKind::BucketNotFlushable => "bucket not flushable",
            ErrorKind::EventingFunctionNotFound => "eventing function not found",
            ErrorKind::EventingFunctionNotDeployed => "eventing function not deployed",
            ErrorKind::EventingFunctionCompilationFailure => {
                "eventing function compilation failed"
            }
            ErrorKind::EventingFunctionIdenticalKeyspace => {
                "eventing function identical keyspace"
            }
            ErrorKind::EventingFunctionNotBootstrapped => {
                "eventing function not bootstrapped"
            }
            ErrorKind::EventingFunctionDeployed => "eventing function deployed",
            ErrorKind::EventingFunctionPaused => "eventing function paused",
            ErrorKind::TransactionOperationFailed => "transaction operation failed",
            ErrorKind::TransactionFailed => "transaction failed",
            ErrorKind::TransactionExpired => "transaction expired",
            ErrorKind::TransactionCommitAmbiguous => "transaction commit ambiguous",
        }
    }

    /// The service domain this kind belongs to.
    pub fn domain(&self) -> ErrorDomain {
        use ErrorKind::*;
        match self {
            DocumentNotFound | DocumentUnretrievable | DocumentLocked | ValueTooLarge
            | DocumentExists | ValueNotJson | DurabilityLevelNotAvailable
            | DurabilityImpossible | DurabilityAmbiguous | DurableWriteInProgress
            | DurableWriteReCommitInProgress | MutationLost | PathNotFound | PathMismatch
            | PathInvalid | PathTooBig | PathTooDeep | ValueTooDeep | ValueInvalid
            | DocumentNotJson | NumberTooBig | DeltaInvalid | PathExists => {
                ErrorDomain::KeyValue
            }
            PlanningFailure | IndexFailure | PreparedStatementFailure | DmlFailure
            | IndexNotReady => ErrorDomain::Query,
            CompilationFailure | JobQueueFull | DatasetNotFound | DataverseNotFound
            | DatasetExists | DataverseExists | LinkNotFound | LinkExists => {
                ErrorDomain::Analytics
            }
            ViewNotFound | DesignDocumentNotFound => ErrorDomain::View,
            CollectionExists | ScopeExists | UserNotFound | GroupNotFound | BucketExists
            | UserExists | BucketNotFlushable | EventingFunctionNotFound
            | EventingFunctionNotDeployed | EventingFunctionCompilationFailure
            | EventingFunctionIdenticalKeyspace | EventingFunctionNotBootstrapped
            | EventingFunctionDeployed | EventingFunctionPaused => ErrorDomain::Management,
            TransactionOperationFailed | TransactionFailed | TransactionExpired
            | TransactionCommitAmbiguous => ErrorDomain::Transaction,
            _ => ErrorDomain::Common,
        }
    }

    /// Whether this kind is one of the timeout kinds.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ErrorKind::Timeout | ErrorKind::AmbiguousTimeout | ErrorKind::UnambiguousTimeout
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A classified, caller-facing error.
#[derive(Debug, Clone, ThisError)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    cause: Option<ErrorCause>,
    context: Option<ErrorContext>,
}

impl Error {
    /// Creates an error of the given kind with its default message.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: kind.message().to_string(),
            cause: None,
            context: None,
        }
    }

    /// Creates an error of the given kind with a custom message.
    pub fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
            context: None,
        }
    }

    /// Attaches an underlying cause.
    pub fn with_cause(mut self, cause: ErrorCause) -> Self {
        self.cause = Some(cause);
        self
    }

    /// Attaches a structured error context.
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    pub(crate) fn maybe_context(mut self, context: Option<ErrorContext>) -> Self {
        self.context = context;
        self
    }

    /// The concrete kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The underlying cause, if one is available.
    pub fn cause(&self) -> Option<&ErrorCause> {
        self.cause.as_ref()
    }

    /// The structured context for the failed service interaction, if any.
    pub fn context(&self) -> Option<&ErrorContext> {
        self.context.as_ref()
    }

    /// The raw engine code this error was classified from, if any.
    pub fn engine_code(&self) -> Option<i64> {
        match self.cause {
            Some(ErrorCause::Engine(EngineFailure { code })) => Some(code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_message_follows_kind() {
        let err = Error::new(ErrorKind::DocumentNotFound);
        assert_eq!(err.to_string(), "document not found");
        assert_eq!(err.kind(), ErrorKind::DocumentNotFound);
    }

    #[test]
    fn engine_code_is_recoverable_from_cause() {
        let err = Error::new(ErrorKind::Generic)
            .with_cause(ErrorCause::Engine(EngineFailure { code: 9999 }));
        assert_eq!(err.engine_code(), Some(9999));
    }

    #[test]
    fn timeout_kinds() {
        assert!(ErrorKind::AmbiguousTimeout.is_timeout());
        assert!(ErrorKind::UnambiguousTimeout.is_timeout());
        assert!(!ErrorKind::RequestCanceled.is_timeout());
    }

    #[test]
    fn domains() {
        assert_eq!(ErrorKind::DocumentLocked.domain(), ErrorDomain::KeyValue);
        assert_eq!(ErrorKind::DmlFailure.domain(), ErrorDomain::Query);
        assert_eq!(ErrorKind::LinkExists.domain(), ErrorDomain::Analytics);
        assert_eq!(ErrorKind::UserExists.domain(), ErrorDomain::Management);
        assert_eq!(
            ErrorKind::TransactionExpired.domain(),
            ErrorDomain::Transaction
        );
        assert_eq!(ErrorKind::RateLimited.domain(), ErrorDomain::Common);
    }
}

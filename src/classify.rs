//! 错误分类引擎：将引擎返回的原始错误信封映射为类型化错误。
//!
//! The error classification engine.
//!
//! [`classify`] turns a raw [`ErrorEnvelope`] into exactly one typed
//! [`Error`]. Dispatch happens in two stages:
//!
//! 1. **Context-tag dispatch.** The three transaction tags encode their real
//!    cause in nested fields rather than a flat code, so they are handled
//!    before anything else.
//! 2. **Flat code dispatch.** Every other envelope goes through a static
//!    code → kind table, built once at module load. Codes absent from the
//!    table degrade to [`ErrorKind::Generic`] with the original code and
//!    context preserved — never dropped, never a panic.
//!
//! Classification performs no I/O and cannot itself fail; the only
//! "failure" it can report is an invalid-argument error for an envelope
//! shape it does not recognize (an unknown transaction failure type).

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::engine::{codes, txn_failure_type, EnvelopeTag, ErrorEnvelope};
use crate::error::{EngineFailure, Error, ErrorCause, ErrorKind};
use crate::error_context::{
    retry_reason_labels, AnalyticsErrorContext, CommonContext, ErrorContext, HttpErrorContext,
    KeyValueErrorContext, QueryErrorContext, SearchErrorContext, ViewErrorContext,
};

/// The flat code → kind table, iterable so tests can assert full coverage.
///
/// Extended-attribute key-value codes and the search consistency-mismatch
/// code are intentionally absent: they collapse into the generic fallback.
static CODE_TABLE: &[(i64, ErrorKind)] = &[
    // Common
    (codes::common::REQUEST_CANCELED, ErrorKind::RequestCanceled),
    (codes::common::INVALID_ARGUMENT, ErrorKind::InvalidArgument),
    (
        codes::common::SERVICE_NOT_AVAILABLE,
        ErrorKind::ServiceNotAvailable,
    ),
    (
        codes::common::INTERNAL_SERVER_FAILURE,
        ErrorKind::InternalServerFailure,
    ),
    (
        codes::common::AUTHENTICATION_FAILURE,
        ErrorKind::AuthenticationFailure,
    ),
    (
        codes::common::TEMPORARY_FAILURE,
        ErrorKind::TemporaryFailure,
    ),
    (codes::common::PARSING_FAILURE, ErrorKind::ParsingFailure),
    (codes::common::CAS_MISMATCH, ErrorKind::CasMismatch),
    (codes::common::BUCKET_NOT_FOUND, ErrorKind::BucketNotFound),
    (
        codes::common::COLLECTION_NOT_FOUND,
        ErrorKind::CollectionNotFound,
    ),
    (
        codes::common::UNSUPPORTED_OPERATION,
        ErrorKind::UnsupportedOperation,
    ),
    (
        codes::common::AMBIGUOUS_TIMEOUT,
        ErrorKind::AmbiguousTimeout,
    ),
    (
        codes::common::UNAMBIGUOUS_TIMEOUT,
        ErrorKind::UnambiguousTimeout,
    ),
    (
        codes::common::FEATURE_NOT_AVAILABLE,
        ErrorKind::FeatureNotAvailable,
    ),
    (codes::common::SCOPE_NOT_FOUND, ErrorKind::ScopeNotFound),
    (codes::common::INDEX_NOT_FOUND, ErrorKind::IndexNotFound),
    (codes::common::INDEX_EXISTS, ErrorKind::IndexExists),
    (codes::common::ENCODING_FAILURE, ErrorKind::EncodingFailure),
    (codes::common::DECODING_FAILURE, ErrorKind::DecodingFailure),
    (codes::common::RATE_LIMITED, ErrorKind::RateLimited),
    (codes::common::QUOTA_LIMITED, ErrorKind::QuotaLimited),
    // Key-value
    (
        codes::key_value::DOCUMENT_NOT_FOUND,
        ErrorKind::DocumentNotFound,
    ),
    (
        codes::key_value::DOCUMENT_UNRETRIEVABLE,
        ErrorKind::DocumentUnretrievable,
    ),
    (
        codes::key_value::DOCUMENT_LOCKED,
        ErrorKind::DocumentLocked,
    ),
    (codes::key_value::VALUE_TOO_LARGE, ErrorKind::ValueTooLarge),
    (codes::key_value::DOCUMENT_EXISTS, ErrorKind::DocumentExists),
    (codes::key_value::VALUE_NOT_JSON, ErrorKind::ValueNotJson),
    (
        codes::key_value::DURABILITY_LEVEL_NOT_AVAILABLE,
        ErrorKind::DurabilityLevelNotAvailable,
    ),
    (
        codes::key_value::DURABILITY_IMPOSSIBLE,
        ErrorKind::DurabilityImpossible,
    ),
    (
        codes::key_value::DURABILITY_AMBIGUOUS,
        ErrorKind::DurabilityAmbiguous,
    ),
    (
        codes::key_value::DURABLE_WRITE_IN_PROGRESS,
        ErrorKind::DurableWriteInProgress,
    ),
    (
        codes::key_value::DURABLE_WRITE_RE_COMMIT_IN_PROGRESS,
        ErrorKind::DurableWriteReCommitInProgress,
    ),
    (codes::key_value::MUTATION_LOST, ErrorKind::MutationLost),
    (codes::key_value::PATH_NOT_FOUND, ErrorKind::PathNotFound),
    (codes::key_value::PATH_MISMATCH, ErrorKind::PathMismatch),
    (codes::key_value::PATH_INVALID, ErrorKind::PathInvalid),
    (codes::key_value::PATH_TOO_BIG, ErrorKind::PathTooBig),
    (codes::key_value::PATH_TOO_DEEP, ErrorKind::PathTooDeep),
    (codes::key_value::VALUE_TOO_DEEP, ErrorKind::ValueTooDeep),
    (codes::key_value::VALUE_INVALID, ErrorKind::ValueInvalid),
    (
        codes::key_value::DOCUMENT_NOT_JSON,
        ErrorKind::DocumentNotJson,
    ),
    (codes::key_value::NUMBER_TOO_BIG, ErrorKind::NumberTooBig),
    (codes::key_value::DELTA_INVALID, ErrorKind::DeltaInvalid),
    (codes::key_value::PATH_EXISTS, ErrorKind::PathExists),
    // Query
    (codes::query::PLANNING_FAILURE, ErrorKind::PlanningFailure),
    (codes::query::INDEX_FAILURE, ErrorKind::IndexFailure),
    (
        codes::query::PREPARED_STATEMENT_FAILURE,
        ErrorKind::PreparedStatementFailure,
    ),
    (codes::query::DML_FAILURE, ErrorKind::DmlFailure),
    // Analytics
    (
        codes::analytics::COMPILATION_FAILURE,
        ErrorKind::CompilationFailure,
    ),
    (codes::analytics::JOB_QUEUE_FULL, ErrorKind::JobQueueFull),
    (
        codes::analytics::DATASET_NOT_FOUND,
        ErrorKind::DatasetNotFound,
    ),
    (
        codes::analytics::DATAVERSE_NOT_FOUND,
        ErrorKind::DataverseNotFound,
    ),
    (codes::analytics::DATASET_EXISTS, ErrorKind::DatasetExists),
    (
        codes::analytics::DATAVERSE_EXISTS,
        ErrorKind::DataverseExists,
    ),
    (codes::analytics::LINK_NOT_FOUND, ErrorKind::LinkNotFound),
    (codes::analytics::LINK_EXISTS, ErrorKind::LinkExists),
    // Search
    (codes::search::INDEX_NOT_READY, ErrorKind::IndexNotReady),
    // View
    (codes::view::VIEW_NOT_FOUND, ErrorKind::ViewNotFound),
    (
        codes::view::DESIGN_DOCUMENT_NOT_FOUND,
        ErrorKind::DesignDocumentNotFound,
    ),
    // Management
    (
        codes::management::COLLECTION_EXISTS,
        ErrorKind::CollectionExists,
    ),
    (codes::management::SCOPE_EXISTS, ErrorKind::ScopeExists),
    (codes::management::USER_NOT_FOUND, ErrorKind::UserNotFound),
    (codes::management::GROUP_NOT_FOUND, ErrorKind::GroupNotFound),
    (codes::management::BUCKET_EXISTS, ErrorKind::BucketExists),
    (codes::management::USER_EXISTS, ErrorKind::UserExists),
    (
        codes::management::BUCKET_NOT_FLUSHABLE,
        ErrorKind::BucketNotFlushable,
    ),
    (
        codes::management::EVENTING_FUNCTION_NOT_FOUND,
        ErrorKind::EventingFunctionNotFound,
    ),
    (
        codes::management::EVENTING_FUNCTION_NOT_DEPLOYED,
        ErrorKind::EventingFunctionNotDeployed,
    ),
    (
        codes::management::EVENTING_FUNCTION_COMPILATION_FAILURE,
        ErrorKind::EventingFunctionCompilationFailure,
    ),
    (
        codes::management::EVENTING_FUNCTION_IDENTICAL_KEYSPACE,
        ErrorKind::EventingFunctionIdenticalKeyspace,
    ),
    (
        codes::management::EVENTING_FUNCTION_NOT_BOOTSTRAPPED,
        ErrorKind::EventingFunctionNotBootstrapped,
    ),
    (
        codes::management::EVENTING_FUNCTION_DEPLOYED,
        ErrorKind::EventingFunctionDeployed,
    ),
    (
        codes::management::EVENTING_FUNCTION_PAUSED,
        ErrorKind::EventingFunctionPaused,
    ),
];

static CODE_LOOKUP: Lazy<HashMap<i64, ErrorKind>> =
    Lazy::new(|| CODE_TABLE.iter().copied().collect());

/// The full code → kind table. Exposed so callers and tests can enumerate
/// exactly which codes carry a dedicated kind.
pub fn code_table() -> &'static [(i64, ErrorKind)] {
    CODE_TABLE
}

/// Classifies an optional error envelope.
///
/// `None` input signals success and yields `None`. A `Some` envelope always
/// yields exactly one typed error.
pub fn classify(envelope: Option<&ErrorEnvelope>) -> Option<Error> {
    envelope.map(classify_envelope)
}

fn classify_envelope(env: &ErrorEnvelope) -> Error {
    match env.tag {
        EnvelopeTag::TransactionOperationFailed => classify_txn_operation_failed(env),
        EnvelopeTag::TransactionOpException => classify_txn_op_exception(env),
        EnvelopeTag::TransactionException => classify_txn_exception(env),
        _ => classify_by_code(env),
    }
}

fn classify_by_code(env: &ErrorEnvelope) -> Error {
    let context = decorate(env);
    match CODE_LOOKUP.get(&env.code) {
        Some(kind) => Error::new(*kind)
            .with_cause(ErrorCause::Engine(EngineFailure { code: env.code }))
            .maybe_context(context),
        None => generic(env, context),
    }
}

/// The fallback for codes without a dedicated kind: the generic base error,
/// with the envelope's message, code, and context all preserved.
fn generic(env: &ErrorEnvelope, context: Option<ErrorContext>) -> Error {
    tracing::debug!(code = env.code, "no dedicated kind for engine code");
    let message = env
        .message
        .clone()
        .unwrap_or_else(|| format!("engine error {}", env.code));
    Error::with_message(ErrorKind::Generic, message)
        .with_cause(ErrorCause::Engine(EngineFailure { code: env.code }))
        .maybe_context(context)
}

/// Builds the context record matching the envelope's tag. Tags without a
/// known context shape stay undecorated.
fn decorate(env: &ErrorEnvelope) -> Option<ErrorContext> {
    let common = CommonContext {
        last_dispatched_to: env.last_dispatched_to.clone().unwrap_or_default(),
        last_dispatched_from: env.last_dispatched_from.clone().unwrap_or_default(),
        retry_attempts: env.retry_attempts,
        retry_reasons: retry_reason_labels(&env.retry_reasons),
    };

    match env.tag {
        EnvelopeTag::KeyValue => Some(ErrorContext::KeyValue(KeyValueErrorContext {
            common,
            status_code: env.status_code.unwrap_or_default(),
            opaque: env.opaque.unwrap_or_default(),
            cas: env.cas.unwrap_or_default(),
            key: env.key.clone().unwrap_or_default(),
            bucket: env.bucket.clone().unwrap_or_default(),
            scope: env.scope.clone().unwrap_or_default(),
            collection: env.collection.clone().unwrap_or_default(),
            context: env.context.clone().unwrap_or_default(),
            error_ref: env.error_ref.clone().unwrap_or_default(),
        })),
        EnvelopeTag::View => Some(ErrorContext::View(ViewErrorContext {
            common,
            design_document: env.design_document.clone().unwrap_or_default(),
            view: env.view.clone().unwrap_or_default(),
            parameters: env.parameters.clone().unwrap_or_default(),
            http_response_code: env.http_response_code.unwrap_or_default(),
            http_response_body: env.http_response_body.clone().unwrap_or_default(),
        })),
        EnvelopeTag::Query => Some(ErrorContext::Query(QueryErrorContext {
            common,
            first_error_code: env.first_error_code.unwrap_or_default(),
            first_error_message: env.first_error_message.clone().unwrap_or_default(),
            statement: env.statement.clone().unwrap_or_default(),
            client_context_id: env.client_context_id.clone().unwrap_or_default(),
            parameters: env.parameters.clone().unwrap_or_default(),
            http_response_code: env.http_response_code.unwrap_or_default(),
            http_response_body: env.http_response_body.clone().unwrap_or_default(),
        })),
        EnvelopeTag::Search => Some(ErrorContext::Search(SearchErrorContext {
            common,
            index_name: env.index_name.clone().unwrap_or_default(),
            query: env.query.clone().unwrap_or_default(),
            parameters: env.parameters.clone().unwrap_or_default(),
            http_response_code: env.http_response_code.unwrap_or_default(),
            http_response_body: env.http_response_body.clone().unwrap_or_default(),
        })),
        EnvelopeTag::Analytics => Some(ErrorContext::Analytics(AnalyticsErrorContext {
            common,
            first_error_code: env.first_error_code.unwrap_or_default(),
            first_error_message: env.first_error_message.clone().unwrap_or_default(),
            statement: env.statement.clone().unwrap_or_default(),
            client_context_id: env.client_context_id.clone().unwrap_or_default(),
            parameters: env.parameters.clone().unwrap_or_default(),
            http_response_code: env.http_response_code.unwrap_or_default(),
            http_response_body: env.http_response_body.clone().unwrap_or_default(),
        })),
        EnvelopeTag::Http => Some(ErrorContext::Http(HttpErrorContext {
            common,
            method: env.method.clone().unwrap_or_default(),
            request_path: env.request_path.clone().unwrap_or_default(),
            response_code: env.response_code.unwrap_or_default(),
            response_body: env.response_body.clone().unwrap_or_default(),
        })),
        _ => None,
    }
}

/// `transaction_operation_failed`: the real cause is a nested envelope. A
/// cause that turns out to be a feature mismatch gets an explanatory
/// feature-not-available sub-cause before the outer wrap, so callers see why
/// the transactional operation could not run at all.
fn classify_txn_operation_failed(env: &ErrorEnvelope) -> Error {
    let cause = env.cause.as_deref().map(classify_envelope).map(|inner| {
        if inner.kind() == ErrorKind::FeatureNotAvailable {
            Error::with_message(
                ErrorKind::FeatureNotAvailable,
                "the connected server version does not support this transactional operation",
            )
            .with_cause(ErrorCause::Typed(Box::new(inner)))
        } else {
            inner
        }
    });

    let err = Error::new(ErrorKind::TransactionOperationFailed);
    match cause {
        Some(inner) => err.with_cause(ErrorCause::Typed(Box::new(inner))),
        None => err,
    }
}

/// `transaction_op_exception`: context comes from the nested cause envelope;
/// the kind comes from a small fixed set of cause codes. Causes outside that
/// set pass through as the generic base error — a deliberate fallback.
fn classify_txn_op_exception(env: &ErrorEnvelope) -> Error {
    let op = match &env.op_context {
        Some(op) => op,
        // An op-exception envelope without its nested context is a shape
        // this classifier does not recognize.
        None => return Error::new(ErrorKind::InvalidArgument),
    };

    let context = op.cause.as_deref().and_then(decorate);

    let kind = match op.code {
        codes::key_value::DOCUMENT_EXISTS => Some(ErrorKind::DocumentExists),
        codes::key_value::DOCUMENT_NOT_FOUND => Some(ErrorKind::DocumentNotFound),
        codes::common::PARSING_FAILURE => Some(ErrorKind::ParsingFailure),
        _ => None,
    };

    match kind {
        Some(kind) => Error::new(kind).maybe_context(context),
        None => {
            let message = env
                .message
                .clone()
                .unwrap_or_else(|| "transaction operation exception".to_string());
            Error::with_message(ErrorKind::Generic, message)
                .with_cause(ErrorCause::Engine(EngineFailure { code: op.code }))
                .maybe_context(context)
        }
    }
}

/// `transaction_exception`: dispatch on the explicit failure-type field.
fn classify_txn_exception(env: &ErrorEnvelope) -> Error {
    let kind = match env.failure_type {
        Some(txn_failure_type::FAIL) => ErrorKind::TransactionFailed,
        Some(txn_failure_type::EXPIRY) => ErrorKind::TransactionExpired,
        Some(txn_failure_type::COMMIT_AMBIGUOUS) => ErrorKind::TransactionCommitAmbiguous,
        other => {
            tracing::warn!(failure_type = ?other, "unrecognized transaction failure type");
            return Error::new(ErrorKind::InvalidArgument);
        }
    };

    let err = Error::new(kind);
    match env.cause.as_deref().map(classify_envelope) {
        Some(inner) => err.with_cause(ErrorCause::Typed(Box::new(inner))),
        None => err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_envelope_is_success() {
        assert!(classify(None).is_none());
    }

    #[test]
    fn table_has_no_duplicate_codes() {
        let mut seen = std::collections::HashSet::new();
        for (code, _) in code_table() {
            assert!(seen.insert(*code), "duplicate code {} in table", code);
        }
    }

    #[test]
    fn collapsed_codes_stay_generic() {
        for code in [
            codes::key_value::XATTR_UNKNOWN_MACRO,
            codes::key_value::XATTR_INVALID_KEY_COMBO,
            codes::key_value::XATTR_UNKNOWN_VIRTUAL_ATTRIBUTE,
            codes::key_value::XATTR_CANNOT_MODIFY_VIRTUAL_ATTRIBUTE,
            codes::search::CONSISTENCY_MISMATCH,
        ] {
            let env = ErrorEnvelope {
                code,
                ..Default::default()
            };
            let err = classify(Some(&env)).unwrap();
            assert_eq!(err.kind(), ErrorKind::Generic, "code {}", code);
            assert_eq!(err.engine_code(), Some(code));
        }
    }
}

//! Classification coverage: every table entry maps to its exact kind, every
//! context tag decorates its shape, and nothing recognizable is ever
//! dropped or panicked on.

use quarry_client::classify::{classify, code_table};
use quarry_client::engine::{codes, txn_failure_type, EnvelopeTag, ErrorEnvelope};
use quarry_client::engine::TransactionOpContext;
use quarry_client::{ErrorCause, ErrorContext, ErrorKind};

#[test]
fn null_envelope_classifies_to_success() {
    assert!(classify(None).is_none());
}

#[test]
fn every_table_code_maps_to_its_exact_kind() {
    for (code, kind) in code_table() {
        let envelope = ErrorEnvelope {
            code: *code,
            ..Default::default()
        };
        let error = classify(Some(&envelope)).expect("an envelope always classifies");
        assert_eq!(error.kind(), *kind, "code {}", code);
        assert_eq!(error.engine_code(), Some(*code), "code {}", code);
    }
}

#[test]
fn unknown_codes_degrade_to_generic_with_everything_preserved() {
    let envelope = ErrorEnvelope {
        code: 987_654,
        tag: EnvelopeTag::Query,
        message: Some("mystery failure".to_string()),
        statement: Some("SELECT 1".to_string()),
        ..Default::default()
    };

    let error = classify(Some(&envelope)).unwrap();
    assert_eq!(error.kind(), ErrorKind::Generic);
    assert_eq!(error.message(), "mystery failure");
    assert_eq!(error.engine_code(), Some(987_654));
    let ctx = error.context().and_then(ErrorContext::as_query).unwrap();
    assert_eq!(ctx.statement, "SELECT 1");
}

#[test]
fn key_value_envelope_gets_key_value_context() {
    let envelope = ErrorEnvelope {
        code: codes::key_value::DOCUMENT_NOT_FOUND,
        tag: EnvelopeTag::KeyValue,
        key: Some("k1".to_string()),
        bucket: Some("main".to_string()),
        status_code: Some(1),
        ..Default::default()
    };

    let error = classify(Some(&envelope)).unwrap();
    assert_eq!(error.kind(), ErrorKind::DocumentNotFound);
    let ctx = error.context().and_then(ErrorContext::as_key_value).unwrap();
    assert_eq!(ctx.key, "k1");
    assert_eq!(ctx.bucket, "main");
}

#[test]
fn each_tag_decorates_its_own_shape() {
    let cases = [
        (EnvelopeTag::KeyValue, "key_value"),
        (EnvelopeTag::View, "view"),
        (EnvelopeTag::Query, "query"),
        (EnvelopeTag::Search, "search"),
        (EnvelopeTag::Analytics, "analytics"),
        (EnvelopeTag::Http, "http"),
    ];
    for (tag, expected) in cases {
        let envelope = ErrorEnvelope {
            code: 1_000_000,
            tag,
            ..Default::default()
        };
        let error = classify(Some(&envelope)).unwrap();
        let matched = match error.context().unwrap() {
            ErrorContext::KeyValue(_) => "key_value",
            ErrorContext::View(_) => "view",
            ErrorContext::Query(_) => "query",
            ErrorContext::Search(_) => "search",
            ErrorContext::Analytics(_) => "analytics",
            ErrorContext::Http(_) => "http",
        };
        assert_eq!(matched, expected);
    }
}

#[test]
fn generic_tag_stays_undecorated() {
    let envelope = ErrorEnvelope {
        code: codes::common::TEMPORARY_FAILURE,
        ..Default::default()
    };
    let error = classify(Some(&envelope)).unwrap();
    assert!(error.context().is_none());
}

#[test]
fn retry_reasons_translate_with_unknown_sentinel() {
    let envelope = ErrorEnvelope {
        code: codes::common::TEMPORARY_FAILURE,
        tag: EnvelopeTag::KeyValue,
        retry_attempts: 3,
        retry_reasons: vec![8, 42_000],
        ..Default::default()
    };

    let error = classify(Some(&envelope)).unwrap();
    let common = error.context().unwrap().common();
    assert_eq!(common.retry_attempts, 3);
    assert_eq!(common.retry_reasons, vec!["kv_locked", "unknown"]);
}

#[test]
fn transaction_operation_failed_wraps_its_cause() {
    let envelope = ErrorEnvelope {
        tag: EnvelopeTag::TransactionOperationFailed,
        cause: Some(Box::new(ErrorEnvelope {
            code: codes::key_value::DOCUMENT_LOCKED,
            tag: EnvelopeTag::KeyValue,
            ..Default::default()
        })),
        ..Default::default()
    };

    let error = classify(Some(&envelope)).unwrap();
    assert_eq!(error.kind(), ErrorKind::TransactionOperationFailed);
    match error.cause() {
        Some(ErrorCause::Typed(inner)) => {
            assert_eq!(inner.kind(), ErrorKind::DocumentLocked);
        }
        other => panic!("expected a typed cause, got {:?}", other),
    }
}

#[test]
fn transaction_feature_mismatch_synthesizes_explanation() {
    let envelope = ErrorEnvelope {
        tag: EnvelopeTag::TransactionOperationFailed,
        cause: Some(Box::new(ErrorEnvelope {
            code: codes::common::FEATURE_NOT_AVAILABLE,
            ..Default::default()
        })),
        ..Default::default()
    };

    let error = classify(Some(&envelope)).unwrap();
    assert_eq!(error.kind(), ErrorKind::TransactionOperationFailed);
    match error.cause() {
        Some(ErrorCause::Typed(inner)) => {
            assert_eq!(inner.kind(), ErrorKind::FeatureNotAvailable);
            assert!(inner.message().contains("transactional operation"));
            // The synthesized sub-cause still wraps the originally
            // classified error underneath.
            assert!(matches!(inner.cause(), Some(ErrorCause::Typed(_))));
        }
        other => panic!("expected a typed cause, got {:?}", other),
    }
}

#[test]
fn transaction_op_exception_dispatches_on_cause_code() {
    let cases = [
        (codes::key_value::DOCUMENT_EXISTS, ErrorKind::DocumentExists),
        (
            codes::key_value::DOCUMENT_NOT_FOUND,
            ErrorKind::DocumentNotFound,
        ),
        (codes::common::PARSING_FAILURE, ErrorKind::ParsingFailure),
    ];

    for (code, kind) in cases {
        let envelope = ErrorEnvelope {
            tag: EnvelopeTag::TransactionOpException,
            op_context: Some(TransactionOpContext {
                code,
                cause: Some(Box::new(ErrorEnvelope {
                    tag: EnvelopeTag::KeyValue,
                    key: Some("doc-7".to_string()),
                    ..Default::default()
                })),
            }),
            ..Default::default()
        };

        let error = classify(Some(&envelope)).unwrap();
        assert_eq!(error.kind(), kind, "cause code {}", code);
        let ctx = error.context().and_then(ErrorContext::as_key_value).unwrap();
        assert_eq!(ctx.key, "doc-7");
    }
}

#[test]
fn unmapped_transaction_cause_passes_through_as_generic() {
    let envelope = ErrorEnvelope {
        tag: EnvelopeTag::TransactionOpException,
        message: Some("op exception".to_string()),
        op_context: Some(TransactionOpContext {
            code: codes::common::TEMPORARY_FAILURE,
            cause: None,
        }),
        ..Default::default()
    };

    let error = classify(Some(&envelope)).unwrap();
    assert_eq!(error.kind(), ErrorKind::Generic);
    assert_eq!(error.engine_code(), Some(codes::common::TEMPORARY_FAILURE));
}

#[test]
fn transaction_exception_dispatches_on_failure_type() {
    let cases = [
        (txn_failure_type::FAIL, ErrorKind::TransactionFailed),
        (txn_failure_type::EXPIRY, ErrorKind::TransactionExpired),
        (
            txn_failure_type::COMMIT_AMBIGUOUS,
            ErrorKind::TransactionCommitAmbiguous,
        ),
    ];

    for (failure_type, kind) in cases {
        let envelope = ErrorEnvelope {
            tag: EnvelopeTag::TransactionException,
            failure_type: Some(failure_type),
            ..Default::default()
        };
        let error = classify(Some(&envelope)).unwrap();
        assert_eq!(error.kind(), kind);
    }
}

#[test]
fn unrecognized_failure_type_is_invalid_argument() {
    let envelope = ErrorEnvelope {
        tag: EnvelopeTag::TransactionException,
        failure_type: Some(77),
        ..Default::default()
    };
    let error = classify(Some(&envelope)).unwrap();
    assert_eq!(error.kind(), ErrorKind::InvalidArgument);
}

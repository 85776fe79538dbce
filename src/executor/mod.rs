//! Result producer adapters, one per request family.
//!
//! An adapter translates a typed request into engine-call parameters,
//! registers the single completion callback, and turns the completion into
//! the structured event sequence of a
//! [`StreamingResult`](crate::streaming::StreamingResult): decoded rows in
//! response order, one translated metadata record, then the end event — or
//! the classified error. The handle is returned before the engine completes.

pub mod analytics;
pub mod query;
pub mod search;

pub use analytics::AnalyticsExecutor;
pub use query::QueryExecutor;
pub use search::SearchExecutor;

use serde::de::DeserializeOwned;
use std::collections::HashMap;

use crate::classify::classify;
use crate::engine::{Completion, RawResponse};
use crate::error::{Error, ErrorCause, ErrorKind};
use crate::streaming::ResultEmitter;

/// Encodes positional parameters, one JSON document per value.
pub(crate) fn encode_positional(values: &[serde_json::Value]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Encodes a keyed option map, one JSON document per value. `None` entries
/// are unset and removed up front — an absent value must never reach the
/// wire as an encoded placeholder.
pub(crate) fn encode_value_map(
    values: &HashMap<String, Option<serde_json::Value>>,
) -> HashMap<String, String> {
    values
        .iter()
        .filter_map(|(key, value)| {
            value
                .as_ref()
                .map(|v| (key.clone(), v.to_string()))
        })
        .collect()
}

/// Drives one completion through an emitter.
///
/// Rows and metadata are fully decoded before anything is emitted, so a
/// malformed row fails the whole result with a decoding-failure error and
/// zero row events, rather than emitting a truncated prefix.
pub(crate) fn deliver<R, M, T>(
    completion: Completion,
    emitter: &ResultEmitter<R, M, T>,
    translate_meta: impl FnOnce(&str) -> Result<M, Error>,
) where
    R: DeserializeOwned + Clone + Send + 'static,
    M: Clone + Send + 'static,
    T: Send + 'static,
{
    match completion {
        Completion::Failure(envelope) => {
            let error = classify(Some(envelope.as_ref()))
                .unwrap_or_else(|| Error::new(ErrorKind::Generic));
            emitter.fail(error);
            emitter.end();
        }
        Completion::Success(response) => match decode_response(response, translate_meta) {
            Ok((rows, meta)) => {
                for row in rows {
                    emitter.row(row);
                }
                emitter.meta(meta);
                emitter.end();
            }
            Err(error) => {
                emitter.fail(error);
                emitter.end();
            }
        },
    }
}

fn decode_response<R, M>(
    response: RawResponse,
    translate_meta: impl FnOnce(&str) -> Result<M, Error>,
) -> Result<(Vec<R>, M), Error>
where
    R: DeserializeOwned,
{
    let mut rows = Vec::with_capacity(response.rows.len());
    for (index, encoded) in response.rows.iter().enumerate() {
        let row = serde_json::from_str::<R>(encoded).map_err(|e| {
            Error::with_message(
                ErrorKind::DecodingFailure,
                format!("failed to decode row {}", index),
            )
            .with_cause(ErrorCause::Decode(e.to_string()))
        })?;
        rows.push(row);
    }
    let meta = translate_meta(&response.meta)?;
    Ok((rows, meta))
}

//! Fail-open decoding of stored records

use serde::de::DeserializeOwned;
use tracing::warn;

/// Decode a stored JSON value, treating malformed data as absent.
///
/// Corruption degrades to re-creating the record; it never propagates as an
/// error to the caller.
pub fn decode_json<T: DeserializeOwned>(raw: Option<&str>) -> Option<T> {
    let raw = raw?;
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(error = %err, "discarding malformed stored record");
            None
        }
    }
}

//! Envelope Codec Module
//!
//! Every stored value is wrapped in an envelope carrying its type tag and
//! absolute expiry. The payload sits under its own field, so record keys can
//! never shadow envelope metadata.

use serde::{Deserialize, Serialize};

use crate::cache::{TypeTag, Value, MAX_NESTING_DEPTH};
use crate::error::{CacheError, Result};

// == Envelope ==
/// A decoded envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    #[serde(rename = "t")]
    pub type_tag: TypeTag,
    /// Absolute expiry (Unix seconds), 0 = never
    #[serde(rename = "x")]
    pub expires_at: i64,
    #[serde(rename = "d")]
    pub data: Value,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    #[serde(rename = "t")]
    type_tag: TypeTag,
    #[serde(rename = "x")]
    expires_at: i64,
    #[serde(rename = "d")]
    data: &'a Value,
}

impl Envelope {
    // == Is Expired ==
    /// Checks logical expiry against `now`.
    ///
    /// An entry is expired once `now` reaches its deadline; 0 never expires.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at != 0 && now >= self.expires_at
    }
}

// == Encode ==
/// Serializes `data` into envelope bytes.
///
/// Values nested deeper than `MAX_NESTING_DEPTH` are refused with
/// `CacheError::InvalidRequest` so that everything written can be decoded.
pub fn encode(data: &Value, expires_at: i64) -> Result<Vec<u8>> {
    if data.nests_deeper_than(MAX_NESTING_DEPTH) {
        return Err(CacheError::InvalidRequest(format!(
            "value nests deeper than {} levels",
            MAX_NESTING_DEPTH
        )));
    }
    if !data.is_finite() {
        return Err(CacheError::Encoding(
            "non-finite floats cannot be stored".to_string(),
        ));
    }

    let envelope = EnvelopeRef {
        type_tag: data.type_tag(),
        expires_at,
        data,
    };
    Ok(serde_json::to_vec(&envelope)?)
}

// == Decode ==
/// Parses envelope bytes, rejecting payloads whose shape disagrees with the tag.
pub fn decode(bytes: &[u8]) -> Result<Envelope> {
    let envelope: Envelope = serde_json::from_slice(bytes)?;

    let actual = envelope.data.type_tag();
    if actual != envelope.type_tag {
        return Err(CacheError::Encoding(format!(
            "envelope tagged {} carries a {} payload",
            envelope.type_tag, actual
        )));
    }
    if envelope.expires_at < 0 {
        return Err(CacheError::Encoding(format!(
            "negative expiry timestamp {}",
            envelope.expires_at
        )));
    }

    Ok(envelope)
}

/// Like `decode`, naming `key` in any error.
pub fn decode_keyed(key: &str, bytes: &[u8]) -> Result<Envelope> {
    decode(bytes).map_err(|err| match err {
        CacheError::Encoding(msg) => CacheError::Encoding(format!("{}: {}", key, msg)),
        other => other,
    })
}

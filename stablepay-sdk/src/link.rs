//! Content-addressed short-link ids for payment parameters.
//!
//! The id of a link is derived from the parameters themselves:
//!
//! ```text
//! id = crockford_base32(SHA-256(canonical_json(params)))[..16]
//! ```
//!
//! `canonical_json` sorts object keys, so two parameter objects with the
//! same fields always map to the same id no matter how the fields were
//! ordered when they arrived.

use serde::Serialize;

/// Number of base32 characters kept from the digest.
pub const LINK_ID_LEN: usize = 16;

/// Errors produced while deriving a link id.
#[derive(Debug, thiserror::Error)]
pub enum LinkIdError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialize `value` as JSON with object keys sorted at every level.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, LinkIdError> {
    let value = serde_json::to_value(value)?;
    let sorted = sort_keys(value);
    Ok(serde_json::to_string(&sorted)?)
}

fn sort_keys(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect(),
            )
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(sort_keys).collect())
        }
        other => other,
    }
}

/// Derive the short-link id for a parameter object.
pub fn link_id<T: Serialize>(params: &T) -> Result<String, LinkIdError> {
    let json = canonical_json(params)?;
    let digest = ring::digest::digest(&ring::digest::SHA256, json.as_bytes());
    let mut encoded = fast32::base32::CROCKFORD.encode(digest.as_ref());
    encoded.truncate(LINK_ID_LEN);
    Ok(encoded.to_ascii_lowercase())
}

/// Cheap shape check for ids arriving in URLs.
pub fn is_well_formed(id: &str) -> bool {
    id.len() == LINK_ID_LEN && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

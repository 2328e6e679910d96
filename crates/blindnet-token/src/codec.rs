//! Segment and key encodings.
//!
//! Token segments use unpadded Base64URL; keys are persisted as standard,
//! padded Base64. The two alphabets are never mixed.

use crate::error::{Result, TokenError};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// First token segment.
///
/// Field order is the serialization order, which keeps the signed bytes stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Header {
    pub alg: String,
    pub typ: String,
}

/// Second token segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Payload {
    pub app: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

/// Encode bytes as a token segment.
pub fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode a token segment.
pub fn decode_segment(segment: &str) -> Result<Vec<u8>> {
    Ok(URL_SAFE_NO_PAD.decode(segment)?)
}

/// Encode raw key material for persistence.
pub fn encode_key(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode persisted key material.
pub fn decode_key(encoded: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(encoded.trim())?)
}

/// Serialize a record to JSON and encode it as a segment.
pub fn to_segment<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_vec(value)?;
    Ok(encode_segment(&json))
}

/// Decode a segment and deserialize the JSON record it carries.
pub fn from_segment<T: DeserializeOwned>(segment: &str) -> Result<T> {
    let json = decode_segment(segment)?;
    serde_json::from_slice(&json).map_err(|e| TokenError::InvalidJson(e.to_string()))
}

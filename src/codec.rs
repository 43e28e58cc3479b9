//! Canonical encoding for structured payloads.
//!
//! One encode/decode pair is shared by every reader and writer of the
//! `example` / `output` blobs: the store adapter persists exactly these
//! bytes, and the dispatch message embeds them unchanged, so the two
//! representations are interchangeable without re-derivation.
//!
//! The encoding is JSON via `serde_json`, which is lossless for
//! `serde_json::Value` and deterministic for the same logical input
//! (object key order is preserved by the `Value` representation).

use thiserror::Error;

/// Errors produced by payload or message (de)serialization.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A value could not be serialized to the canonical form.
    #[error("Encoding failed: {0}")]
    Encode(serde_json::Error),

    /// Stored or received bytes could not be parsed back.
    #[error("Decoding failed: {0}")]
    Decode(serde_json::Error),
}

/// Encodes a structured payload into its canonical byte form.
pub fn encode_payload(value: &serde_json::Value) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(CodecError::Encode)
}

/// Decodes canonical bytes back into a structured payload.
pub fn decode_payload(bytes: &[u8]) -> Result<serde_json::Value, CodecError> {
    serde_json::from_slice(bytes).map_err(CodecError::Decode)
}

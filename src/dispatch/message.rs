//! Dispatch message handed to the grading worker pool.
//!
//! A [`DispatchMessage`] is a value object built fresh per attach-data
//! call and dropped once published; it is never persisted. Its
//! `expected_output` carries the store's canonical payload bytes
//! unchanged, so workers decode with the same codec readers use.

use serde::{Deserialize, Serialize};

use crate::codec::CodecError;

/// Wire payload published to the dispatch topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchMessage {
    /// Problem the data belongs to.
    pub problem_id: i64,
    /// Raw bytes of the uploaded test-data file.
    pub data_source: Vec<u8>,
    /// Reference solution used to grade the data.
    pub solution: String,
    /// Canonical-encoded expected output payload.
    pub expected_output: Vec<u8>,
}

impl DispatchMessage {
    /// Creates a new dispatch message.
    pub fn new(
        problem_id: i64,
        data_source: Vec<u8>,
        solution: impl Into<String>,
        expected_output: Vec<u8>,
    ) -> Self {
        Self {
            problem_id,
            data_source,
            solution: solution.into(),
            expected_output,
        }
    }

    /// Encodes the message into its wire form.
    ///
    /// Encoding is lossless and deterministic: the same logical message
    /// always produces the same bytes, and `decode(encode(m)) == m`.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(self).map_err(CodecError::Encode)
    }

    /// Decodes a message from its wire form.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        serde_json::from_slice(bytes).map_err(CodecError::Decode)
    }
}

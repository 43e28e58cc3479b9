//! Uniform response envelope.
//!
//! Every operation's outcome, success or failure, is rendered as
//! `{ code, message, data }`. The code space distinguishes each failure
//! kind; `data` is absent on failure. Errors never leak past the
//! operation that produced them.

use serde::{Deserialize, Serialize};

use crate::codec::CodecError;
use crate::service::ServiceError;
use crate::store::StoreError;

/// Response code for a successful operation.
pub const CODE_OK: u32 = 0;
/// Malformed input shape.
pub const CODE_BIND: u32 = 10001;
/// Semantically invalid entity.
pub const CODE_VALIDATION: u32 = 10002;
/// Structured payload serialization failure.
pub const CODE_ENCODING: u32 = 10003;
/// Structured payload deserialization failure.
pub const CODE_DECODING: u32 = 10004;
/// File read/write failure.
pub const CODE_INGESTION: u32 = 10101;
/// Persistence layer failure.
pub const CODE_STORE: u32 = 10201;
/// Referenced problem does not exist.
pub const CODE_MISSING_ID: u32 = 10202;
/// Invalid pagination parameters.
pub const CODE_PARAM: u32 = 10301;
/// Broker rejected or unreachable.
pub const CODE_PUBLISH: u32 = 10401;

/// Uniform `{ code, message, data }` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Zero on success, a taxonomy code on failure.
    pub code: u32,
    /// Human-readable outcome description.
    pub message: String,
    /// Operation payload; `null` on failure.
    pub data: Option<serde_json::Value>,
}

impl Envelope {
    /// Builds a success envelope with the given payload.
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            code: CODE_OK,
            message: "OK".to_string(),
            data: Some(data),
        }
    }

    /// Builds a success envelope with no payload.
    pub fn ok_empty() -> Self {
        Self {
            code: CODE_OK,
            message: "OK".to_string(),
            data: None,
        }
    }

    /// Builds an envelope for a malformed-input failure at the bind edge.
    pub fn bind_error(message: impl Into<String>) -> Self {
        Self {
            code: CODE_BIND,
            message: message.into(),
            data: None,
        }
    }

    /// Maps a service failure to its envelope code.
    pub fn from_error(err: &ServiceError) -> Self {
        let code = match err {
            ServiceError::Validation(_) => CODE_VALIDATION,
            ServiceError::Codec(CodecError::Encode(_)) => CODE_ENCODING,
            ServiceError::Codec(CodecError::Decode(_)) => CODE_DECODING,
            ServiceError::Ingest(_) => CODE_INGESTION,
            ServiceError::Store(StoreError::NotFound(_)) => CODE_MISSING_ID,
            ServiceError::Store(_) => CODE_STORE,
            ServiceError::Param(_) => CODE_PARAM,
            ServiceError::Publish(_) => CODE_PUBLISH,
        };

        Self {
            code,
            message: err.to_string(),
            data: None,
        }
    }

    /// Whether this envelope reports success.
    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::ingest::IngestError;
    use crate::problem::ValidationError;
    use crate::service::ServiceError;

    #[test]
    fn test_ok_envelope() {
        let envelope = Envelope::ok(serde_json::json!({"problem_id": 7}));
        assert!(envelope.is_ok());
        assert_eq!(envelope.data.unwrap()["problem_id"], 7);
    }

    #[test]
    fn test_failure_data_is_null() {
        let err = ServiceError::Validation(ValidationError::EmptyTitle);
        let envelope = Envelope::from_error(&err);
        assert_eq!(envelope.code, CODE_VALIDATION);
        assert!(envelope.data.is_none());

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["data"], serde_json::Value::Null);
    }

    #[test]
    fn test_missing_id_maps_to_its_own_code() {
        let err = ServiceError::Store(StoreError::NotFound(42));
        assert_eq!(Envelope::from_error(&err).code, CODE_MISSING_ID);

        let err = ServiceError::Store(StoreError::ConnectionFailed("down".to_string()));
        assert_eq!(Envelope::from_error(&err).code, CODE_STORE);
    }

    #[test]
    fn test_each_failure_kind_has_distinct_code() {
        let errors = [
            (
                Envelope::from_error(&ServiceError::Validation(ValidationError::EmptyTitle)).code,
                CODE_VALIDATION,
            ),
            (
                Envelope::from_error(&ServiceError::Ingest(IngestError::EmptyUpload)).code,
                CODE_INGESTION,
            ),
            (
                Envelope::from_error(&ServiceError::Param("bad".to_string())).code,
                CODE_PARAM,
            ),
        ];
        for (actual, expected) in errors {
            assert_eq!(actual, expected);
        }
    }
}

//! Pluggable (de)serialization for request and response bodies.
//!
//! A [`Serializer`] encodes the structured payload of a request, decodes the
//! payload of a response, and declares the MIME types it speaks so the
//! orchestrator can set `Content-Type`/`Accept` headers and validate what
//! comes back. The payload representation is the polymorphic
//! [`serde_json::Value`]; converting it into a concrete domain type is the
//! call site's concern (see `serde_json::from_value`).

use serde_json::Value;

use crate::error::BoxError;

/// Encodes and decodes structured payloads and declares compatible MIME
/// types.
///
/// Implementations are installed on a [`Resource`](crate::Resource) through
/// [`Resource::with_serializer`](crate::Resource::with_serializer); the
/// default is [`JsonSerializer`].
pub trait Serializer: Send + Sync {
    /// Encodes a structured value into body bytes.
    fn serialize(&self, value: &Value) -> Result<Vec<u8>, BoxError>;

    /// The single MIME type advertised as `Content-Type` when a body is
    /// sent.
    fn content_type(&self) -> &'static str;

    /// Decodes body bytes into a structured value.
    ///
    /// Malformed input is an error. An empty byte sequence is the caller's
    /// responsibility to special-case as "no body" before calling this.
    fn deserialize(&self, bytes: &[u8]) -> Result<Value, BoxError>;

    /// All MIME types this implementation can consume, in preference order.
    ///
    /// Used both to build the `Accept` header and to validate an incoming
    /// response's declared content type.
    fn accepted_types(&self) -> &'static [&'static str];
}

/// The default serializer: JSON in the JSON:API dialect.
///
/// Writes `application/vnd.api+json` and accepts both
/// `application/vnd.api+json` and plain `application/json`, in that order.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize(&self, value: &Value) -> Result<Vec<u8>, BoxError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn content_type(&self) -> &'static str {
        "application/vnd.api+json"
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Value, BoxError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn accepted_types(&self) -> &'static [&'static str] {
        &["application/vnd.api+json", "application/json"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Movement {
        label: String,
        date: String,
        price: f64,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct AccountBalance {
        movements: Vec<Movement>,
        total: f64,
    }

    #[test]
    fn round_trips_structured_values() {
        let balance = AccountBalance {
            movements: vec![
                Movement {
                    label: "Supermarket".to_string(),
                    date: "2021-11-29T11:45:26.371Z".to_string(),
                    price: 10.52,
                },
                Movement {
                    label: "Gas station".to_string(),
                    date: "2021-12-01T07:52:21.002Z".to_string(),
                    price: 60.1,
                },
            ],
            total: 70.62,
        };

        let serializer = JsonSerializer;
        let value = serde_json::to_value(&balance).unwrap();
        let bytes = serializer.serialize(&value).unwrap();
        let decoded = serializer.deserialize(&bytes).unwrap();

        let recovered: AccountBalance = serde_json::from_value(decoded).unwrap();
        assert_eq!(recovered, balance);
    }

    #[test]
    fn empty_input_is_a_decode_error() {
        let serializer = JsonSerializer;
        assert!(serializer.deserialize(&[]).is_err());
    }

    #[test]
    fn malformed_input_is_a_decode_error() {
        let serializer = JsonSerializer;
        assert!(serializer.deserialize(b"{not json").is_err());
    }

    #[test]
    fn advertises_json_api_mimetypes() {
        let serializer = JsonSerializer;
        assert_eq!(serializer.content_type(), "application/vnd.api+json");

        let accepted = serializer.accepted_types();
        assert!(search::find(accepted, "application/vnd.api+json", false).is_some());
        assert!(search::find(accepted, "application/json", false).is_some());
        assert_eq!(accepted[0], "application/vnd.api+json");
    }
}

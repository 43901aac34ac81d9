//! The response envelope.
//!
//! Every operation, on every path, answers with an [`Envelope`]. The HTTP
//! layer only has to copy `response_code` into the status line and serialize
//! the rest.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status codes used by the service.
pub mod status {
    pub const OK: u16 = 200;
    pub const CREATED: u16 = 201;
    /// Non-standard, kept for compatibility with existing clients
    pub const UPDATED: u16 = 209;
    /// Non-standard, kept for compatibility with existing clients
    pub const DELETED: u16 = 210;
    pub const BAD_REQUEST: u16 = 400;
    pub const NOT_FOUND: u16 = 404;
    pub const UNPROCESSABLE_ENTITY: u16 = 422;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
}

/// Fixed-shape result of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// HTTP-style status code
    pub response_code: u16,
    /// Short status text
    pub message: String,
    /// Number of items in `data`
    pub count: usize,
    /// Human-readable outcome
    pub service_message: String,
    /// Single record, list of records, or null
    pub data: Value,
}

impl Envelope {
    pub fn new(
        response_code: u16,
        message: impl Into<String>,
        count: usize,
        service_message: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            response_code,
            message: message.into(),
            count,
            service_message: service_message.into(),
            data,
        }
    }

    pub fn ok(count: usize, service_message: impl Into<String>, data: Value) -> Self {
        Self::new(status::OK, "OK", count, service_message, data)
    }

    pub fn created(service_message: impl Into<String>, data: Value) -> Self {
        Self::new(status::CREATED, "created", 1, service_message, data)
    }

    pub fn updated(service_message: impl Into<String>, data: Value) -> Self {
        Self::new(status::UPDATED, "updated", 1, service_message, data)
    }

    pub fn deleted(service_message: impl Into<String>, data: Value) -> Self {
        Self::new(status::DELETED, "deleted", 1, service_message, data)
    }

    pub fn bad_request(service_message: impl Into<String>) -> Self {
        Self::new(status::BAD_REQUEST, "Bad Request", 0, service_message, Value::Null)
    }

    pub fn not_found(service_message: impl Into<String>) -> Self {
        Self::new(status::NOT_FOUND, "Not Found", 0, service_message, Value::Null)
    }

    pub fn unprocessable(service_message: impl Into<String>) -> Self {
        Self::new(
            status::UNPROCESSABLE_ENTITY,
            "Unprocessable Entity",
            0,
            service_message,
            Value::Null,
        )
    }

    pub fn internal(service_message: impl Into<String>) -> Self {
        Self::new(
            status::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
            0,
            service_message,
            Value::Null,
        )
    }

    /// Whether the code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.response_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_shape() {
        let envelope = Envelope::ok(1, "Product retrieved successfully", json!({"id": 1}));
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "response_code": 200,
                "message": "OK",
                "count": 1,
                "service_message": "Product retrieved successfully",
                "data": {"id": 1}
            })
        );
    }

    #[test]
    fn error_envelopes_carry_no_data() {
        for envelope in [
            Envelope::bad_request("x"),
            Envelope::not_found("x"),
            Envelope::unprocessable("x"),
            Envelope::internal("x"),
        ] {
            assert_eq!(envelope.count, 0);
            assert_eq!(envelope.data, Value::Null);
            assert!(!envelope.is_success());
        }
    }

    #[test]
    fn custom_success_codes() {
        assert_eq!(Envelope::updated("x", Value::Null).response_code, 209);
        assert_eq!(Envelope::deleted("x", Value::Null).response_code, 210);
        assert!(Envelope::deleted("x", Value::Null).is_success());
    }
}

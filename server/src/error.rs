//! Unified error handling for the server.
//!
//! Everything the server sends back, success or failure, uses the engine's
//! envelope shape.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use stockroom_engine::service::GENERIC_FAILURE;
use stockroom_engine::Envelope;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let envelope = match self {
            AppError::NotFound(msg) => Envelope::not_found(msg),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                Envelope::internal(GENERIC_FAILURE)
            }
        };

        ApiReply(envelope).into_response()
    }
}

/// An envelope on its way to the wire.
///
/// The envelope's `response_code` becomes the HTTP status, including the
/// non-standard 209 and 210.
#[derive(Debug)]
pub struct ApiReply(pub Envelope);

impl IntoResponse for ApiReply {
    fn into_response(self) -> Response {
        let envelope = self.0;
        let status = StatusCode::from_u16(envelope.response_code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                code = envelope.response_code,
                "Request failed: {}",
                envelope.service_message
            );
        } else if status.is_client_error() {
            tracing::warn!(
                code = envelope.response_code,
                "Request rejected: {}",
                envelope.service_message
            );
        }

        (status, Json(envelope)).into_response()
    }
}

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, AppError>;

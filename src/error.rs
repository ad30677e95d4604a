// Error handling module for the storefront gateway
// Provides centralized error types and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::api_client::ClientError;
use crate::session::SessionError;

/// Main error type for the gateway's own failures
///
/// Upstream answers (including upstream 4xx/5xx) are relayed verbatim and never
/// pass through this type; only failures on our side of the wire do.
#[derive(Debug)]
pub enum ApiError {
    /// The request body could not be read
    /// Maps to HTTP 400 Bad Request
    BadRequest(String),

    /// The external API could not be reached
    /// Maps to HTTP 502 Bad Gateway
    UpstreamUnavailable(ClientError),

    /// Session storage failed
    /// Maps to HTTP 500 Internal Server Error
    SessionError(SessionError),

    /// Internal server errors
    /// Maps to HTTP 500 Internal Server Error
    InternalError(String),
}

/// Consistent error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "BAD_REQUEST", "UPSTREAM_UNAVAILABLE")
    pub error_code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// ISO 8601 timestamp of when the error occurred
    pub timestamp: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = self.to_error_response();
        (status, Json(error_response)).into_response()
    }
}

impl ApiError {
    /// Convert ApiError to HTTP status code and ErrorResponse
    ///
    /// Logs at error! for 5xx, warn! for upstream trouble and debug! for client mistakes.
    /// Transport and storage details stay in the logs.
    fn to_error_response(&self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::BadRequest(message) => {
                debug!("Bad request: {}", message);

                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error_code: "BAD_REQUEST".to_string(),
                        message: message.clone(),
                        details: None,
                        timestamp: Utc::now().to_rfc3339(),
                    },
                )
            }
            ApiError::UpstreamUnavailable(client_error) => {
                warn!("External API unavailable: {}", client_error);

                (
                    StatusCode::BAD_GATEWAY,
                    ErrorResponse {
                        error_code: "UPSTREAM_UNAVAILABLE".to_string(),
                        message: "The service is temporarily unavailable".to_string(),
                        details: None,
                        timestamp: Utc::now().to_rfc3339(),
                    },
                )
            }
            ApiError::SessionError(session_error) => {
                error!("Session error: {}", session_error);

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error_code: "SESSION_ERROR".to_string(),
                        message: "An internal server error occurred".to_string(),
                        details: None,
                        timestamp: Utc::now().to_rfc3339(),
                    },
                )
            }
            ApiError::InternalError(internal_msg) => {
                error!("Internal error: {}", internal_msg);

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error_code: "INTERNAL_ERROR".to_string(),
                        message: "An internal server error occurred".to_string(),
                        details: None,
                        timestamp: Utc::now().to_rfc3339(),
                    },
                )
            }
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::SessionError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert upstream client errors to ApiError
impl From<ClientError> for ApiError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::InvalidBody(message) => ApiError::InternalError(message),
            other => ApiError::UpstreamUnavailable(other),
        }
    }
}

/// Convert session store errors to ApiError
impl From<SessionError> for ApiError {
    fn from(error: SessionError) -> Self {
        ApiError::SessionError(error)
    }
}

/// Template rendering failures are internal errors
impl From<minijinja::Error> for ApiError {
    fn from(error: minijinja::Error) -> Self {
        ApiError::InternalError(format!("template error: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::BadRequest("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InternalError("x".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::UpstreamUnavailable(ClientError::Transport("refused".to_string())).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let (status, body) =
            ApiError::InternalError("secret connection string".to_string()).to_error_response();

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error_code, "INTERNAL_ERROR");
        assert!(!body.message.contains("secret"));
    }

    #[test]
    fn test_template_error_is_internal() {
        let error = minijinja::Error::new(minijinja::ErrorKind::TemplateNotFound, "missing.html");
        let api_error = ApiError::from(error);

        assert_eq!(api_error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let (_, body) = api_error.to_error_response();
        assert_eq!(body.error_code, "INTERNAL_ERROR");
        assert!(!body.message.contains("missing.html"));
    }

    #[test]
    fn test_upstream_error_is_generic() {
        let (status, body) =
            ApiError::UpstreamUnavailable(ClientError::Transport("dns failure for api.internal".to_string()))
                .to_error_response();

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.error_code, "UPSTREAM_UNAVAILABLE");
        assert!(!body.message.contains("api.internal"));
    }
}

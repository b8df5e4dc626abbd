//! Response types for the office workflow API.
//!
//! Every endpoint answers with the `{ success, data, message }` envelope the
//! office front end expects. Failures carry an additional `error` object for
//! programmatic handling.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

/// Standard response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Whether the request succeeded.
    pub success: bool,
    /// Payload, `null` on failure.
    pub data: Option<T>,
    /// Human-readable outcome, suitable for a toast.
    pub message: String,
    /// Error detail, present only on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T: Serialize> Envelope<T> {
    /// A successful envelope.
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            error: None,
        }
    }
}

/// A successful response: status code plus envelope.
pub struct ApiSuccess<T> {
    status: StatusCode,
    envelope: Envelope<T>,
}

impl<T: Serialize> ApiSuccess<T> {
    /// 200 OK.
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            envelope: Envelope::ok(data, message),
        }
    }

    /// 201 Created.
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CREATED,
            envelope: Envelope::ok(data, message),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            Json(self.envelope),
        )
            .into_response()
    }
}

/// API error detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }

    /// Creates an unauthenticated error.
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new("UNAUTHENTICATED", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// Pairs an error with a status code.
    pub fn new(status: StatusCode, error: ApiError) -> Self {
        Self { status, error }
    }

    /// 400 with a validation error.
    pub fn bad_request(error: ApiError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    /// 401 with an unauthenticated error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ApiError::unauthenticated(message))
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let envelope: Envelope<()> = Envelope {
            success: false,
            data: None,
            message: self.error.message.clone(),
            error: Some(self.error),
        };
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            Json(envelope),
        )
            .into_response()
    }
}

impl From<WorkflowError> for ApiErrorResponse {
    fn from(error: WorkflowError) -> Self {
        let message = error.to_string();
        match error {
            WorkflowError::ConfigNotFound { .. }
            | WorkflowError::ConfigParseError { .. }
            | WorkflowError::InvalidConfig { .. } => ApiErrorResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
            ),
            WorkflowError::UserNotFound { .. } => ApiErrorResponse::unauthorized(message),
            WorkflowError::NotFound { .. } => {
                ApiErrorResponse::new(StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", message))
            }
            WorkflowError::Validation { .. } => {
                ApiErrorResponse::bad_request(ApiError::validation_error(message))
            }
            WorkflowError::InvalidTransition { .. } => ApiErrorResponse::new(
                StatusCode::CONFLICT,
                ApiError::with_details(
                    "INVALID_TRANSITION",
                    message,
                    "The current status does not allow this action",
                ),
            ),
            WorkflowError::NotPermitted { .. } => ApiErrorResponse::new(
                StatusCode::FORBIDDEN,
                ApiError::new("NOT_PERMITTED", message),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_serialization() {
        let envelope = Envelope::ok(vec![1, 2], "Loaded");
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert_eq!(json["message"], "Loaded");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":\"TEST_ERROR\""));
        assert!(json.contains("\"message\":\"Test message\""));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_not_permitted_maps_to_forbidden() {
        let response: ApiErrorResponse = WorkflowError::NotPermitted {
            actor: "u-admin".to_string(),
            action: "approve".to_string(),
            reason: "requires role 'HR Manager'".to_string(),
        }
        .into();
        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(response.error.code, "NOT_PERMITTED");
    }

    #[test]
    fn test_invalid_transition_maps_to_conflict() {
        let response: ApiErrorResponse = WorkflowError::InvalidTransition {
            action: "approve".to_string(),
            status: "approved".to_string(),
        }
        .into();
        assert_eq!(response.status, StatusCode::CONFLICT);
        assert_eq!(response.error.code, "INVALID_TRANSITION");
    }

    #[test]
    fn test_not_found_and_validation_mapping() {
        let not_found: ApiErrorResponse = WorkflowError::NotFound {
            entity: "requisition",
            id: "x".to_string(),
        }
        .into();
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);

        let invalid: ApiErrorResponse = WorkflowError::validation("title", "empty").into();
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        assert_eq!(invalid.error.code, "VALIDATION_ERROR");
    }

    #[test]
    fn test_unknown_user_maps_to_unauthorized() {
        let response: ApiErrorResponse = WorkflowError::UserNotFound {
            user_id: "ghost".to_string(),
        }
        .into();
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }
}

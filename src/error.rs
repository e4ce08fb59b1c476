//! # Error Handling
//!
//! This module provides unified error handling for the RepoLens API,
//! implementing a consistent problem+json response format with trace ID propagation.

use axum::{
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::access::Denial;
use crate::github::GitHubError;
use crate::telemetry;

/// Unified API error response structure
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    /// HTTP status code for the response
    #[serde(skip_serializing, skip_deserializing)]
    pub status: StatusCode,
    /// Error code for programmatic handling
    pub code: Box<str>,
    /// Human-readable error message
    pub message: Box<str>,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Box<serde_json::Value>>,
    /// Correlation trace ID for debugging (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Box<str>>,
}

impl ApiError {
    /// Create a new API error with the given status code and message
    pub fn new<S: Into<String>>(status: StatusCode, code: S, message: S) -> Self {
        Self {
            status,
            code: code.into().into_boxed_str(),
            message: message.into().into_boxed_str(),
            details: None,
            trace_id: Self::current_trace_id(),
        }
    }

    /// Add details to the error
    pub fn with_details<V: Into<serde_json::Value>>(mut self, details: V) -> Self {
        self.details = Some(Box::new(details.into()));
        self
    }

    /// Extract current trace ID from the active trace context (falls back to a generated correlation ID)
    fn current_trace_id() -> Option<Box<str>> {
        telemetry::current_trace_id()
            .map(|trace_id| trace_id.into_boxed_str())
            .or_else(|| {
                // Fallback: generate a correlation ID for basic client-server log correlation
                Some(format!("corr-{}", &uuid::Uuid::new_v4().to_string()[..8]).into_boxed_str())
            })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/problem+json"),
        );

        (self.status, headers, axum::Json(self)).into_response()
    }
}

// Error constructors for the taxonomy this service exposes

/// Create an unauthorized error (401): no caller identity.
pub fn unauthorized(message: Option<&str>) -> ApiError {
    let msg = message.unwrap_or("Authentication required");
    ApiError::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg)
}

/// Create a forbidden error (403): identity present but not authorized for the repository.
pub fn forbidden(message: Option<&str>) -> ApiError {
    let msg = message.unwrap_or("Not authorized for this repository");
    ApiError::new(StatusCode::FORBIDDEN, "FORBIDDEN", msg)
}

/// Create a validation error with field details
pub fn validation_error(message: &str, field_errors: serde_json::Value) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message).with_details(field_errors)
}

/// Create a server configuration error (500): missing GitHub App secrets.
/// Fails closed before any upstream call is attempted.
pub fn configuration_error() -> ApiError {
    ApiError::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "SERVER_CONFIGURATION_ERROR",
        "Server configuration error",
    )
}

/// Create an upstream error carrying GitHub's own status and message where
/// available, so the UI can distinguish "reconnect needed" from "rate
/// limited" from "repository too large".
pub fn upstream_error(status: u16, message: &str) -> ApiError {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    ApiError::new(status, "UPSTREAM_ERROR", message)
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        // Log the full error for debugging
        tracing::error!("Internal error: {:?}", error);

        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "An internal error occurred",
        )
    }
}

impl From<Denial> for ApiError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Unauthenticated => unauthorized(None),
            Denial::NotConnected => forbidden(Some("Repository is not connected to this account")),
        }
    }
}

impl From<GitHubError> for ApiError {
    fn from(error: GitHubError) -> Self {
        match error {
            GitHubError::Config(_) | GitHubError::Jwt(_) => configuration_error(),
            GitHubError::Api {
                status, message, ..
            } => upstream_error(status, &message),
            GitHubError::InstallationRejected {
                status, message, ..
            } => upstream_error(status, &message),
            GitHubError::StatsUnavailable => ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "STATS_UNAVAILABLE",
                "Contributor statistics are unavailable for this repository",
            ),
            GitHubError::Network(err) => {
                tracing::error!("GitHub request failed before a response arrived: {err}");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "UPSTREAM_ERROR",
                    "Upstream request failed",
                )
            }
            GitHubError::Decode(err) => {
                tracing::error!("Unexpected GitHub payload shape: {err}");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "An internal error occurred",
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn api_error_basic() {
        let error = ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", "Test error");

        assert_eq!(error.code, Box::from("VALIDATION_FAILED"));
        assert_eq!(error.message, Box::from("Test error"));
        assert!(error.details.is_none());
        assert!(error.trace_id.is_some());
    }

    #[test]
    fn content_type_is_problem_json() {
        let error = ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", "Test error");
        let response = error.into_response();

        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/problem+json"
        );
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn denial_maps_to_status() {
        let unauthenticated: ApiError = Denial::Unauthenticated.into();
        assert_eq!(unauthenticated.status, StatusCode::UNAUTHORIZED);
        assert_eq!(unauthenticated.code, Box::from("UNAUTHORIZED"));

        let not_connected: ApiError = Denial::NotConnected.into();
        assert_eq!(not_connected.status, StatusCode::FORBIDDEN);
        assert_eq!(not_connected.code, Box::from("FORBIDDEN"));
    }

    #[test]
    fn upstream_error_propagates_status_and_message() {
        let error: ApiError = GitHubError::Api {
            status: 404,
            message: "Not Found".to_string(),
        }
        .into();
        assert_eq!(error.status, StatusCode::NOT_FOUND);
        assert_eq!(error.code, Box::from("UPSTREAM_ERROR"));
        assert_eq!(error.message, Box::from("Not Found"));

        // Statuses GitHub reports outside the valid range collapse to 500.
        let error = upstream_error(1000, "strange");
        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn missing_configuration_maps_to_500() {
        let error: ApiError = GitHubError::Config("app id missing".to_string()).into();
        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.code, Box::from("SERVER_CONFIGURATION_ERROR"));
    }

    #[test]
    fn stats_unavailable_maps_to_422() {
        let error: ApiError = GitHubError::StatsUnavailable.into();
        assert_eq!(error.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error.code, Box::from("STATS_UNAVAILABLE"));
    }

    #[test]
    fn validation_error_carries_details() {
        let error = validation_error("Validation failed", json!({"owner": "required"}));
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.details, Some(Box::new(json!({"owner": "required"}))));
    }
}

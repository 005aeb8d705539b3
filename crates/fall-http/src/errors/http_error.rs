//! HTTP error types
//!
//! Configuration-time errors (route conflicts, registry failures) abort
//! startup; request-time errors are turned into responses.

use crate::foundation::constants::HEADER_ALLOW;
use crate::response::FallResponse;
use axum::http::{Method, StatusCode};
use fall_core::{ConfigError, CoreError};
use thiserror::Error;

/// Result type for HTTP operations
pub type HttpResult<T> = Result<T, HttpError>;

/// HTTP errors
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Route conflict: {method} {path} is already registered")]
    RouteConflict { method: Method, path: String },

    #[error("Invalid route pattern '{path}': {reason}")]
    InvalidRoute { path: String, reason: String },

    #[error("No route matches {method} {path}")]
    NotFound { method: Method, path: String },

    #[error("Method {method} not allowed for {path}")]
    MethodNotAllowed {
        method: Method,
        path: String,
        allowed: Vec<Method>,
    },

    #[error("Invalid request: {message}")]
    BadRequest { message: String },

    #[error("Request too large: body exceeds limit of {limit} bytes")]
    RequestTooLarge { limit: usize },

    #[error("Internal server error: {message}")]
    InternalError { message: String },

    #[error("Server startup failed: {message}")]
    StartupFailed { message: String },

    #[error("Registry error: {0}")]
    Registry(#[from] CoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl HttpError {
    /// Create a bad request error
    pub fn bad_request<T: Into<String>>(message: T) -> Self {
        HttpError::BadRequest {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<T: Into<String>>(message: T) -> Self {
        HttpError::InternalError {
            message: message.into(),
        }
    }

    /// Create a startup error
    pub fn startup<T: Into<String>>(message: T) -> Self {
        HttpError::StartupFailed {
            message: message.into(),
        }
    }

    /// Status code used when this error is returned to a client
    pub fn status_code(&self) -> StatusCode {
        match self {
            HttpError::NotFound { .. } => StatusCode::NOT_FOUND,
            HttpError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            HttpError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            HttpError::RequestTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for consistent API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            HttpError::RouteConflict { .. } => "ROUTE_CONFLICT",
            HttpError::InvalidRoute { .. } => "INVALID_ROUTE",
            HttpError::NotFound { .. } => "NOT_FOUND",
            HttpError::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            HttpError::BadRequest { .. } => "BAD_REQUEST",
            HttpError::RequestTooLarge { .. } => "REQUEST_TOO_LARGE",
            HttpError::InternalError { .. } => "INTERNAL_ERROR",
            HttpError::StartupFailed { .. } => "SERVER_STARTUP_FAILED",
            HttpError::Registry(_) => "REGISTRY_ERROR",
            HttpError::Config(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Build the client-facing response for this error
    ///
    /// Server-side failures are logged and reported without their details.
    pub fn into_response(self) -> FallResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let mut response = FallResponse::with_status(status).json_value(serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": message,
            }
        }));

        if let HttpError::MethodNotAllowed { allowed, .. } = &self {
            let allow = allowed
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            response = response.with_header(HEADER_ALLOW, allow);
        }
        response
    }
}

impl From<serde_json::Error> for HttpError {
    fn from(err: serde_json::Error) -> Self {
        HttpError::InternalError {
            message: format!("JSON serialization error: {}", err),
        }
    }
}

impl From<std::io::Error> for HttpError {
    fn from(err: std::io::Error) -> Self {
        HttpError::InternalError {
            message: format!("IO error: {}", err),
        }
    }
}

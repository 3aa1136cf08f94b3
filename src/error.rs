//! Dispatch and registration error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::container::ContainerError;
use crate::http::method::{Method, UnsupportedMethod};

/// Errors raised while resolving a request.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no route matches {method} {path}")]
    RouteNotFound { method: Method, path: String },

    #[error("method {method} is not allowed for {path}")]
    MethodNotAllowed { method: Method, path: String },

    #[error(transparent)]
    UnsupportedMethod(#[from] UnsupportedMethod),

    #[error("controller {controller} has no action `{action}`")]
    UnknownAction {
        controller: &'static str,
        action: String,
    },

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error("failed to serialize output: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DispatchError {
    /// An error carrying an explicit HTTP status.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        DispatchError::Http {
            status,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            DispatchError::MethodNotAllowed { .. } | DispatchError::UnsupportedMethod(_) => {
                StatusCode::METHOD_NOT_ALLOWED
            }
            DispatchError::BadRequest(_) => StatusCode::BAD_REQUEST,
            DispatchError::Http { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            DispatchError::UnknownAction { .. }
            | DispatchError::Container(_)
            | DispatchError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            DispatchError::RouteNotFound { .. } => "ROUTE_NOT_FOUND",
            DispatchError::MethodNotAllowed { .. } | DispatchError::UnsupportedMethod(_) => {
                "METHOD_NOT_ALLOWED"
            }
            DispatchError::UnknownAction { .. } => "UNKNOWN_ACTION",
            DispatchError::BadRequest(_) => "BAD_REQUEST",
            DispatchError::Http { .. } => "HTTP_ERROR",
            DispatchError::Container(_) => "UNRESOLVED_DEPENDENCY",
            DispatchError::Serialization(_) => "SERIALIZATION_FAILED",
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // internals stay in the log, not the body
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Dispatch failed");
            status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Errors raised while registering routes or generating URLs.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid route pattern {path}: {source}")]
    InvalidPattern {
        path: String,
        #[source]
        source: regex::Error,
    },

    #[error("route {path} needs a value for parameter #{index}")]
    MissingParameter { path: String, index: usize },

    #[error("no route named {0}")]
    UnknownRoute(String),

    #[error("controller {controller} has no action `{action}`")]
    UnknownAction {
        controller: &'static str,
        action: String,
    },

    #[error(transparent)]
    Container(#[from] ContainerError),
}

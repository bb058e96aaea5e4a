//! HTTP error mapping.
//!
//! Bodies are always `{"error": "<message>"}`. Server-side failures are logged
//! with detail and reported to the client without it.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use newsdesk_core::ArticleServiceError;
use serde_json::json;
use std::error::Error;
use std::fmt::{Display, Formatter};

const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

#[derive(Debug)]
pub enum ApiError {
    Service(ArticleServiceError),
    /// Request body or query string could not be decoded.
    BadRequest(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Service(ArticleServiceError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Service(err) if err.is_validation() => StatusCode::BAD_REQUEST,
            Self::Service(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service(err) => write!(f, "{err}"),
            Self::BadRequest(message) => write!(f, "{message}"),
            Self::Internal(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Service(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ArticleServiceError> for ApiError {
    fn from(value: ArticleServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(
                "event=http_error module=server status=error http_status={} error={}",
                status.as_u16(),
                self
            );
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

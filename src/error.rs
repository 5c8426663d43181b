use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::services::schedule::Mode;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Upstream schedule fetch failed: {0}")]
    UpstreamFetch(String),

    #[error("Upstream schedule request timed out")]
    UpstreamTimeout,

    #[error("No {mode} slot starts at {start_t}")]
    MissingCounterpart { mode: Mode, start_t: i64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AppError::UpstreamTimeout
        } else {
            AppError::UpstreamFetch(e.to_string())
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(e.into())
    }
}

#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: ErrorBody,
}

#[derive(Serialize)]
pub(crate) struct ErrorBody {
    pub(crate) code: String,
    pub(crate) message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub(crate) fn new(code: &str, message: impl Into<String>) -> Self {
        ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: message.into(),
                details: None,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::UpstreamFetch(msg) => {
                tracing::error!("Upstream schedule error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_FETCH_FAILED",
                    "Failed to fetch the schedule from the upstream API".to_string(),
                )
            }
            AppError::UpstreamTimeout => {
                tracing::error!("Upstream schedule request timed out");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "UPSTREAM_TIMEOUT",
                    self.to_string(),
                )
            }
            AppError::MissingCounterpart { .. } => {
                tracing::error!("Render failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "MISSING_COUNTERPART",
                    self.to_string(),
                )
            }
            AppError::Config(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIG_ERROR",
                    "Server configuration error".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_upstream_errors_to_gateway_statuses() {
        let res = AppError::UpstreamFetch("boom".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

        let res = AppError::UpstreamTimeout.into_response();
        assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn missing_counterpart_names_mode_and_start() {
        let err = AppError::MissingCounterpart {
            mode: Mode::League,
            start_t: 1500000000,
        };
        assert_eq!(err.to_string(), "No league slot starts at 1500000000");
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

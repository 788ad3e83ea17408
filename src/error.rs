use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

use crate::agent::AgentError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Query execution or connectivity failure. Never retried here.
    #[error("Data source unavailable: {0}")]
    DataSourceUnavailable(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Betting agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Agent(AgentError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Agent(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Generic, user-facing half of the `{error, details}` body.
    fn headline(&self) -> &'static str {
        match self {
            AppError::DataSourceUnavailable(_) => "Failed to fetch odds data",
            AppError::Agent(AgentError::Timeout(_)) => "Betting agent timed out",
            AppError::Agent(_) => "Betting agent failed",
            AppError::InvalidRequest(_) => "Invalid request",
            _ => "Internal server error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = serde_json::json!({
            "error": self.headline(),
            "details": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

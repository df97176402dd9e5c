use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// The trigger request never completed (connect failure, reset, deadline).
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Webhook returned HTTP error status {status}")]
    HttpStatus { status: u16 },

    #[error("Webhook response was not valid JSON: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("An analysis run is already in progress")]
    AnalysisInProgress,

    #[error("No analysis result available yet")]
    NoResult,

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Trigger failures are surfaced to the user as a retryable state.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Network(_) | AppError::HttpStatus { .. } | AppError::Decode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::Network(_) | AppError::HttpStatus { .. } | AppError::Decode(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::AnalysisInProgress => StatusCode::CONFLICT,
            AppError::NoResult => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

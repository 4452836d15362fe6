//! Error types for sgf-bot

use crate::matcher::MatchError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors raised while handling a conversation event
#[derive(Debug, Error)]
pub enum BotError {
    /// Slash command the bot does not know
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Option token that does not decode to a command
    #[error("Unknown option: {0}")]
    UnknownOption(String),

    /// Search could not run
    #[error("Match error: {0}")]
    Match(#[from] MatchError),

    /// sgf-common error
    #[error("Common error: {0}")]
    Common(#[from] sgf_common::Error),
}

impl BotError {
    /// True for errors caused by user input, answered with a hint instead of a failure
    pub fn is_user_error(&self) -> bool {
        matches!(self, BotError::UnknownCommand(_) | BotError::UnknownOption(_))
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Required backend not configured (503)
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Event handling failure
    #[error(transparent)]
    Bot(#[from] BotError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", msg)
            }
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
            ApiError::Bot(ref err) if err.is_user_error() => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", err.to_string())
            }
            ApiError::Bot(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "BOT_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

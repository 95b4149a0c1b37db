use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid characters in expression")]
    InvalidCharacters,

    #[error("Expression must use the provided numbers")]
    NumbersMismatch,

    #[error("Expression could not be evaluated")]
    EvaluationFailed,

    #[error("Expression does not evaluate to 24")]
    NotTwentyFour,

    #[error("Room is full (max {0} players)")]
    RoomFull(i32),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("State conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Database(ref e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                e.to_string(),
            ),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InvalidCharacters => (
                StatusCode::BAD_REQUEST,
                "INVALID_CHARACTERS",
                self.to_string(),
            ),
            AppError::NumbersMismatch => (
                StatusCode::BAD_REQUEST,
                "NUMBERS_MISMATCH",
                self.to_string(),
            ),
            AppError::EvaluationFailed => (
                StatusCode::BAD_REQUEST,
                "EVALUATION_FAILED",
                self.to_string(),
            ),
            AppError::NotTwentyFour => (
                StatusCode::BAD_REQUEST,
                "NOT_TWENTY_FOUR",
                self.to_string(),
            ),
            AppError::RoomFull(_) => (StatusCode::BAD_REQUEST, "ROOM_FULL", self.to_string()),
            AppError::Forbidden(ref msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, "STATE_CONFLICT", msg.clone()),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                self.to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

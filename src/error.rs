use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    // Auth errors
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Admin access required")]
    AdminOnly,
    #[error("Incorrect password. Access denied.")]
    IncorrectPassword,

    // Account errors
    #[error("Account not found")]
    AccountNotFound,
    #[error("Username already exists")]
    UsernameTaken,
    #[error("You cannot delete your own account.")]
    CannotDeleteSelf,

    // Device errors
    #[error("Device not found")]
    DeviceNotFound,

    // Student errors
    #[error("Student not found")]
    StudentNotFound,
    #[error("Student ID or RFID UID already registered")]
    StudentAlreadyExists,

    // Schedule errors
    #[error("Schedule not found")]
    ScheduleNotFound,

    // Registration errors
    #[error("Pending registration not found")]
    PendingNotFound,
    #[error("Registration already processed")]
    AlreadyProcessed,

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Bad request: {0}")]
    BadRequest(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // Redis errors
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    // JWT errors
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    // Internal errors
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) | AppError::CannotDeleteSelf => {
                StatusCode::BAD_REQUEST
            }

            AppError::InvalidCredentials
            | AppError::InvalidToken
            | AppError::Unauthorized
            | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,

            AppError::AdminOnly | AppError::IncorrectPassword => StatusCode::FORBIDDEN,

            AppError::AccountNotFound
            | AppError::DeviceNotFound
            | AppError::StudentNotFound
            | AppError::ScheduleNotFound
            | AppError::PendingNotFound => StatusCode::NOT_FOUND,

            AppError::UsernameTaken
            | AppError::StudentAlreadyExists
            | AppError::AlreadyProcessed => StatusCode::CONFLICT,

            AppError::Database(_) | AppError::Redis(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Maps a unique-constraint violation to `conflict`, passing other errors through.
pub fn on_unique_violation(err: sqlx::Error, conflict: AppError) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => conflict,
        _ => AppError::Database(err),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Validation(msg) | AppError::BadRequest(msg) => msg.clone(),
            AppError::Jwt(_) => "Invalid token".to_string(),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Database error".to_string()
            }
            AppError::Redis(e) => {
                tracing::error!("Redis error: {}", e);
                "Cache error".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_http_status() {
        assert_eq!(AppError::DeviceNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Validation("RFID UID is required".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::AdminOnly.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::UsernameTaken.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn internal_errors_are_masked() {
        let response = AppError::Internal(anyhow::anyhow!("secret detail")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "Internal server error");
    }

    #[tokio::test]
    async fn validation_message_is_returned_verbatim() {
        let response = AppError::Validation("RFID UID is required".into()).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "RFID UID is required");
    }
}

// src/error.rs

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::fmt;

use crate::views;

/// Global Application Error Enum.
/// Every failure is scoped to the current user action and ends up as a rendered message.
#[derive(Debug)]
pub enum AppError {
    // 502 Bad Gateway: the article could not be fetched or had no usable text
    Ingestion(String),

    // 502 Bad Gateway: the completion API failed or returned an unusable reply
    Ai(String),

    // 500 Internal Server Error: connectivity or query failure
    Database(String),

    // 422 Unprocessable Entity: form input rejected
    Validation(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., access code collision that could not be resolved)
    Conflict(String),

    // Startup only: missing or malformed environment
    Config(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Ingestion(_) | AppError::Ai(_) => StatusCode::BAD_GATEWAY,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Config(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Text safe to show to the person at the browser.
    /// Database and internal details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Ingestion(msg) => format!("Could not load the article: {}", msg),
            AppError::Ai(msg) => format!("The AI service failed: {}", msg),
            AppError::Validation(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => {
                msg.clone()
            }
            AppError::Database(_) => "The database is unavailable, please try again.".to_string(),
            AppError::Config(_) | AppError::InternalServerError(_) => {
                "Internal Server Error".to_string()
            }
        }
    }

    /// Logs the failure at a level matching its severity.
    pub fn log(&self) {
        match self {
            AppError::Database(msg) => tracing::error!("Database error: {}", msg),
            AppError::Config(msg) => tracing::error!("Configuration error: {}", msg),
            AppError::InternalServerError(msg) => tracing::error!("Internal Server Error: {}", msg),
            AppError::Ingestion(msg) => tracing::warn!("Ingestion failed: {}", msg),
            AppError::Ai(msg) => tracing::warn!("AI request failed: {}", msg),
            AppError::Validation(_) | AppError::NotFound(_) | AppError::Conflict(_) => {
                tracing::debug!("Rejected request: {:?}", self)
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Ingestion(msg) => write!(f, "ingestion error: {}", msg),
            AppError::Ai(msg) => write!(f, "ai error: {}", msg),
            AppError::Database(msg) => write!(f, "database error: {}", msg),
            AppError::Validation(msg) => write!(f, "validation error: {}", msg),
            AppError::NotFound(msg) => write!(f, "not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "conflict: {}", msg),
            AppError::Config(msg) => write!(f, "configuration error: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts the error into an HTML error page with the matching status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status();
        let page = views::error_page(status, &self.user_message());
        (status, Html(page.into_string())).into_response()
    }
}

/// Unique violations become `Conflict` so callers can retry. A foreign-key violation means the
/// parent test is gone, the same `NotFound` the memory store reports.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(db_err.message().to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                AppError::NotFound("Test not found".to_string())
            }
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            _ => AppError::Database(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid value for {}", field),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join(" "))
    }
}

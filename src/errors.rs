use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::models::token::ValidationError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    InvalidBody(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("token not found")]
    TokenNotFound,

    #[error("a suggestion request is already in flight")]
    SuggestionInFlight,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(v) => AppError::Validation(v),
            e @ StoreError::InvalidTransition { .. } => AppError::InvalidTransition(e.to_string()),
            e @ StoreError::IdCollision(_) => AppError::Internal(anyhow::anyhow!(e)),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::Validation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_request_error",
                "validation_failed",
                e.to_string(),
            ),
            AppError::InvalidBody(reason) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_request_error",
                "validation_failed",
                reason.clone(),
            ),
            AppError::InvalidTransition(reason) => (
                StatusCode::CONFLICT,
                "invalid_request_error",
                "invalid_status_transition",
                reason.clone(),
            ),
            AppError::TokenNotFound => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                "token_not_found",
                "token not found".to_string(),
            ),
            AppError::SuggestionInFlight => (
                StatusCode::CONFLICT,
                "conflict_error",
                "suggestion_in_flight",
                "suggestions are already being generated".to_string(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        let mut response = (status, body).into_response();

        if matches!(self, AppError::SuggestionInFlight) {
            response.headers_mut().insert(
                "retry-after",
                axum::http::HeaderValue::from_static("2"),
            );
        }

        response
    }
}

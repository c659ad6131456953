//! Common API types and utilities

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::shared::error::SubscriptionError;

/// Error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Errors surfaced by HTTP handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest { message: String },

    #[error(transparent)]
    Subscription(#[from] SubscriptionError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(format!("Invalid query parameters: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::BadRequest { message } => {
                tracing::warn!(error = %message, "Rejected request");
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", message.clone())
            }
            ApiError::Subscription(SubscriptionError::NotFound { .. }) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string())
            }
            ApiError::Subscription(SubscriptionError::InvalidPeriod { .. }) => {
                (StatusCode::BAD_REQUEST, "INVALID_PERIOD", self.to_string())
            }
            ApiError::Subscription(SubscriptionError::Internal { message, source }) => {
                // Storage detail stays in the logs
                tracing::error!(
                    error = %message,
                    cause = ?source.as_ref().map(|e| e.to_string()),
                    "Internal error while handling request"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Response for resource creation
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedResponse {
    pub id: String,
}

impl CreatedResponse {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Acknowledgement with a human-readable message
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

impl StatusResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use st_common::MonthDate;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::bad_request("nope"), StatusCode::BAD_REQUEST),
            (SubscriptionError::not_found("abc").into(), StatusCode::NOT_FOUND),
            (
                SubscriptionError::invalid_period(
                    MonthDate::new(2024, 5).unwrap(),
                    MonthDate::new(2024, 1).unwrap(),
                )
                .into(),
                StatusCode::BAD_REQUEST,
            ),
            (SubscriptionError::internal("db down").into(), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_internal_error_body_is_opaque() {
        let response = ApiError::from(SubscriptionError::internal("relation \"subscriptions\" does not exist"))
            .into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();

        assert!(text.contains("INTERNAL_ERROR"));
        assert!(!text.contains("relation"));
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Errors returned by the business handlers.
//!
//! The body mirrors [`AuthError`](crate::auth::AuthError) so clients can
//! branch on one field: `{"error": <message>, "error_code": <code>}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ApiErrorBody<'a> {
    error: &'a str,
    error_code: &'static str,
}

impl ApiError {
    fn with(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with(StatusCode::BAD_REQUEST, "invalid_request", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::with(StatusCode::CONFLICT, "conflict", message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::with(StatusCode::SERVICE_UNAVAILABLE, "unavailable", message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::with(StatusCode::BAD_GATEWAY, "upstream_error", message)
    }

    /// Internal failure. `detail` is logged, never returned.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(detail = %detail, "Internal error");
        Self::with(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal server error",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: &self.message,
            error_code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn each_class_has_its_status_and_code() {
        let cases = [
            (ApiError::not_found("x"), StatusCode::NOT_FOUND, "not_found"),
            (ApiError::bad_request("x"), StatusCode::BAD_REQUEST, "invalid_request"),
            (ApiError::conflict("x"), StatusCode::CONFLICT, "conflict"),
            (ApiError::service_unavailable("x"), StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
            (ApiError::bad_gateway("x"), StatusCode::BAD_GATEWAY, "upstream_error"),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status, status);
            assert_eq!(err.code, code);
            assert_eq!(err.to_string(), "x");
        }
    }

    #[test]
    fn internal_hides_detail() {
        let err = ApiError::internal("connection refused at 10.0.0.3");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, "internal_error");
        assert!(!err.message.contains("10.0.0.3"));
    }

    #[tokio::test]
    async fn body_carries_message_and_code() {
        let response = ApiError::conflict("already exists").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "already exists");
        assert_eq!(body["error_code"], "conflict");
    }
}

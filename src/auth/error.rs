// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::codec::CodecError;

/// Authentication error type.
///
/// Every variant is converted to its documented response at the boundary
/// (middleware or handler). The `Display` text is the client-facing detail,
/// except for [`AuthError::Internal`] whose payload is only logged.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No token in the `Authorization` header or the `token` query parameter
    #[error("No token provided, please log in")]
    MissingCredential,
    /// Signature or structure did not verify
    #[error("Invalid token, please log in again")]
    MalformedToken,
    /// Signature is valid but the token is past its expiry
    #[error("Session expired, please log in again")]
    ExpiredToken,
    /// Direct login identifier/secret mismatch
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// Federated login attempted while it is not configured
    #[error("Google OAuth is not configured")]
    ProviderUnconfigured,
    /// Anything unexpected; the payload never leaves the server
    #[error("internal authentication error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    error_code: &'static str,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_token",
            AuthError::MalformedToken => "invalid_token",
            AuthError::ExpiredToken => "token_expired",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::ProviderUnconfigured => "oauth_not_configured",
            AuthError::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredential
            | AuthError::MalformedToken
            | AuthError::ExpiredToken
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::ProviderUnconfigured => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> AuthErrorBody {
        let error_code = self.error_code();
        match self {
            AuthError::MissingCredential | AuthError::MalformedToken | AuthError::ExpiredToken => {
                AuthErrorBody {
                    error: "User not authenticated",
                    details: Some(self.to_string()),
                    message: None,
                    error_code,
                }
            }
            AuthError::InvalidCredentials => AuthErrorBody {
                error: "Invalid credentials",
                details: None,
                message: None,
                error_code,
            },
            AuthError::ProviderUnconfigured => AuthErrorBody {
                error: "Google OAuth is not configured",
                details: None,
                message: Some(
                    "Google login is unavailable on this server. Sign in with email and password instead.",
                ),
                error_code,
            },
            AuthError::Internal(_) => AuthErrorBody {
                error: "Internal server error",
                details: Some("Authentication could not be completed".to_string()),
                message: None,
                error_code,
            },
        }
    }
}

impl From<CodecError> for AuthError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Malformed => AuthError::MalformedToken,
            CodecError::Expired => AuthError::ExpiredToken,
            other => AuthError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(detail) = &self {
            tracing::error!(detail = %detail, "Authentication failed unexpectedly");
        }
        (self.status_code(), Json(self.body())).into_response()
    }
}

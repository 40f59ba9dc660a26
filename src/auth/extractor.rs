// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the authenticated identity.
//!
//! Use the `Auth` extractor in handlers mounted behind
//! [`require_auth`](super::middleware::require_auth):
//!
//! ```rust,ignore
//! async fn my_handler(Auth(claim): Auth) -> impl IntoResponse {
//!     // claim is IdentityClaim
//! }
//! ```
//!
//! The extractor never verifies tokens on its own. If the claim is missing,
//! the route was mounted outside the guard, which is reported as an internal
//! error rather than silently authenticating a second way.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, IdentityClaim};

/// Extractor for the identity attached by the Credential Verifier.
pub struct Auth(pub IdentityClaim);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<IdentityClaim>()
            .cloned()
            .map(Auth)
            .ok_or_else(|| {
                AuthError::Internal(format!(
                    "route {} is not composed with the credential verifier",
                    parts.uri.path()
                ))
            })
    }
}

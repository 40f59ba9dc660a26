// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential Verifier middleware for Axum.
//!
//! Every protected router subtree is wrapped with [`require_auth`] via
//! `route_layer(axum::middleware::from_fn_with_state(state, require_auth))`.
//! On success the decoded [`IdentityClaim`] is inserted into the request
//! extensions, where the [`Auth`](super::Auth) extractor picks it up.
//!
//! ## Token sources
//!
//! 1. `Authorization: Bearer <token>` (exact, case-sensitive prefix)
//! 2. `?token=<token>` query parameter
//!
//! The header wins when both are present. A header using another scheme is
//! ignored rather than rejected, so the query parameter still applies.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::{AuthError, IdentityClaim};
use crate::state::AppState;

/// Name of the query parameter accepted as a token fallback.
pub const TOKEN_QUERY_PARAM: &str = "token";

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the raw token from the `Authorization` header or the query string.
pub fn extract_token(headers: &HeaderMap, query: Option<&str>) -> Option<String> {
    let from_header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = from_header {
        return Some(token.to_string());
    }

    query.and_then(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(name, _)| name == TOKEN_QUERY_PARAM)
            .map(|(_, value)| value.trim().to_string())
            .filter(|token| !token.is_empty())
    })
}

/// Decode the presented credential into an identity claim.
pub fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
    query: Option<&str>,
) -> Result<IdentityClaim, AuthError> {
    let token = extract_token(headers, query).ok_or(AuthError::MissingCredential)?;
    Ok(state.codec.verify(&token)?)
}

/// Authentication middleware function.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers(), request.uri().query()) {
        Ok(claim) => {
            request.extensions_mut().insert(claim);
            next.run(request).await
        }
        Err(err) => {
            debug!(
                path = %request.uri().path(),
                reason = err.error_code(),
                "Rejected unauthenticated request"
            );
            err.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ClaimFields;
    use axum::{
        body::{to_bytes, Body},
        http::{Request as HttpRequest, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Extension, Router,
    };
    use tower::ServiceExt;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn header_takes_precedence_over_query() {
        let headers = headers_with("Bearer from-header");
        assert_eq!(
            extract_token(&headers, Some("token=from-query")),
            Some("from-header".to_string())
        );
    }

    #[test]
    fn falls_back_to_query_parameter() {
        assert_eq!(
            extract_token(&HeaderMap::new(), Some("a=1&token=abc%2Edef")),
            Some("abc.def".to_string())
        );
    }

    #[test]
    fn bearer_prefix_is_case_sensitive() {
        let headers = headers_with("bearer abc");
        assert_eq!(extract_token(&headers, None), None);

        let headers = headers_with("Basic dXNlcjpwYXNz");
        assert_eq!(extract_token(&headers, Some("token=q")), Some("q".to_string()));
    }

    #[test]
    fn empty_values_count_as_absent() {
        let headers = headers_with("Bearer ");
        assert_eq!(extract_token(&headers, Some("token=")), None);
        assert_eq!(extract_token(&HeaderMap::new(), None), None);
    }

    async fn whoami(Extension(claim): Extension<IdentityClaim>) -> String {
        claim.sub
    }

    fn guarded_app(state: AppState) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .route_layer(from_fn_with_state(state.clone(), require_auth))
            .with_state(state)
    }

    async fn call(app: Router, request: HttpRequest<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn no_token_is_rejected_with_missing_detail() {
        let app = guarded_app(AppState::for_tests());
        let request = HttpRequest::get("/whoami").body(Body::empty()).unwrap();

        let (status, body) = call(app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["error"], "User not authenticated");
        assert_eq!(body["error_code"], "missing_token");
    }

    #[tokio::test]
    async fn garbage_bearer_is_invalid_not_missing() {
        let app = guarded_app(AppState::for_tests());
        let request = HttpRequest::get("/whoami")
            .header(AUTHORIZATION, "Bearer garbage")
            .body(Body::empty())
            .unwrap();

        let (status, body) = call(app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["error_code"], "invalid_token");
        assert!(body["details"].as_str().unwrap().contains("Invalid token"));
    }

    #[tokio::test]
    async fn expired_token_reports_session_expired() {
        let state = AppState::for_tests();
        let token = state
            .codec
            .issue_at(ClaimFields::new("u1", None, "Ada"), 1_000)
            .unwrap();
        let app = guarded_app(state);
        let request = HttpRequest::get("/whoami")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();

        let (status, body) = call(app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["error_code"], "token_expired");
    }

    #[tokio::test]
    async fn valid_token_attaches_identity() {
        let state = AppState::for_tests();
        let token = state.codec.issue(ClaimFields::new("u1", None, "Ada")).unwrap();
        let app = guarded_app(state);

        let request = HttpRequest::get(format!("/whoami?token={token}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "u1");
    }

    #[tokio::test]
    async fn unconfigured_codec_yields_generic_500() {
        let state = AppState::for_tests().with_codec(crate::auth::TokenCodec::new("", 3600));
        let app = guarded_app(state);
        let request = HttpRequest::get("/whoami")
            .header(AUTHORIZATION, "Bearer a.b.c")
            .body(Body::empty())
            .unwrap();

        let (status, body) = call(app, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("signing secret"));
    }
}

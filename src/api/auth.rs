// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication endpoints: direct login, registration and Google sign-in.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::{
    auth::{
        accounts::AccountStoreError,
        federated::CallbackParams,
        login::{direct_login, issue_for_account},
        Auth, AuthError, CallbackOutcome, IdentityClaim, ProviderRegistration, UserSummary,
    },
    error::ApiError,
    state::AppState,
};

/// Query marker appended to the frontend login page when Google login is off.
pub const OAUTH_NOT_CONFIGURED: &str = "oauth_not_configured";
/// Query marker appended to the frontend login page when Google login failed.
pub const OAUTH_FAILED: &str = "oauth_failed";

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Email address
    pub identifier: String,
    pub secret: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Email address
    pub identifier: String,
    pub secret: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OAuthStatusResponse {
    pub configured: bool,
    pub registration: ProviderRegistration,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: UserSummary,
    /// Token expiry (Unix seconds)
    pub expires_at: i64,
}

impl From<IdentityClaim> for MeResponse {
    fn from(claim: IdentityClaim) -> Self {
        Self {
            user: UserSummary::from(&claim),
            expires_at: claim.exp,
        }
    }
}

fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

fn frontend_redirect(base: &str, path: &str, key: &str, value: &str) -> Response {
    let encoded: String = url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
    found(format!("{base}{path}?{key}={encoded}"))
}

/// Log in with email and password.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let (token, account) = direct_login(
        state.accounts.as_ref(),
        &state.codec,
        &request.identifier,
        &request.secret,
    )
    .await?;

    Ok(Json(TokenResponse {
        token,
        user: UserSummary {
            id: account.id,
            email: Some(account.email),
            name: account.name,
        },
    }))
}

/// Create an account and log in.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = TokenResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Account already exists")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let account = state
        .accounts
        .register(&request.identifier, &request.secret, &request.name)
        .await
        .map_err(|e| match e {
            AccountStoreError::AlreadyExists => ApiError::conflict(e.to_string()),
            AccountStoreError::InvalidInput(msg) => ApiError::bad_request(msg),
            AccountStoreError::Hashing(_) => ApiError::internal(e),
        })?;

    let token = issue_for_account(&state.codec, &account).map_err(ApiError::internal)?;
    info!(user_id = %account.id, "Account registered");

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            token,
            user: UserSummary {
                id: account.id,
                email: Some(account.email),
                name: account.name,
            },
        }),
    ))
}

/// Start Google sign-in.
#[utoipa::path(
    get,
    path = "/api/auth/google",
    tag = "Auth",
    responses(
        (status = 302, description = "Redirect to Google consent screen"),
        (status = 503, description = "Google OAuth is not configured")
    )
)]
pub async fn google_login(State(state): State<AppState>) -> Response {
    match state.federated.initiate(Utc::now().timestamp()) {
        Ok(location) => found(location),
        Err(err) => err.into_response(),
    }
}

/// Google OAuth callback.
#[utoipa::path(
    get,
    path = "/api/auth/google/callback",
    tag = "Auth",
    params(CallbackParams),
    responses(
        (status = 302, description = "Redirect to the frontend with a token or an error marker")
    )
)]
pub async fn google_callback(
    State(state): State<AppState>,
    query: Result<Query<CallbackParams>, QueryRejection>,
) -> Response {
    let params = query.map(|Query(params)| params).unwrap_or_else(|rejection| {
        debug!(reason = %rejection.body_text(), "Unparseable Google callback query");
        CallbackParams {
            error: Some("invalid_request".to_string()),
            error_description: Some(rejection.body_text()),
            ..CallbackParams::default()
        }
    });
    let frontend = &*state.frontend_url;
    match state
        .federated
        .callback(&state.codec, params, Utc::now().timestamp())
        .await
    {
        CallbackOutcome::Issued { token, claim } => {
            info!(user_id = %claim.sub, "Google login succeeded");
            frontend_redirect(frontend, "/auth/callback", "token", &token)
        }
        CallbackOutcome::NotConfigured => {
            frontend_redirect(frontend, "/login", "error", OAUTH_NOT_CONFIGURED)
        }
        CallbackOutcome::Failed(_) => frontend_redirect(frontend, "/login", "error", OAUTH_FAILED),
    }
}

/// Whether Google sign-in is available.
#[utoipa::path(
    get,
    path = "/api/auth/google/status",
    tag = "Auth",
    responses((status = 200, body = OAuthStatusResponse))
)]
pub async fn google_status(State(state): State<AppState>) -> Json<OAuthStatusResponse> {
    let registration = state.federated.registration();
    Json(OAuthStatusResponse {
        configured: registration == ProviderRegistration::Ready,
        registration,
    })
}

/// Identity attached to the current request.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, body = MeResponse),
        (status = 401, description = "Unauthorized - invalid or missing token")
    )
)]
pub async fn me(Auth(claim): Auth) -> Json<MeResponse> {
    Json(claim.into())
}

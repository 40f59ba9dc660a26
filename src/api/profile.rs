// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::{
    auth::Auth,
    error::ApiError,
    models::{Profile, UpdateProfileRequest},
    state::AppState,
};

/// Profile of the caller. Defaults are derived from the token claim until
/// the first update.
#[utoipa::path(
    get,
    path = "/api/profile",
    tag = "Profile",
    security(("bearer" = [])),
    responses(
        (status = 200, body = Profile),
        (status = 401, description = "Unauthorized - invalid or missing token")
    )
)]
pub async fn get_profile(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Profile>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.profile(&user)))
}

#[utoipa::path(
    put,
    path = "/api/profile",
    tag = "Profile",
    request_body = UpdateProfileRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, body = Profile),
        (status = 400, description = "Invalid profile field"),
        (status = 401, description = "Unauthorized - invalid or missing token")
    )
)]
pub async fn update_profile(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    let mut store = state.store.write().await;
    Ok(Json(store.update_profile(&user, request)?))
}

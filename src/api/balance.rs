// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Running balance endpoints.
//!
//! The balance moves with every transaction and can be reset to a known
//! figure, e.g. after reconciling with a bank statement.

use axum::{extract::State, Json};

use crate::{auth::Auth, error::ApiError, models::Balance, state::AppState};

#[utoipa::path(
    get,
    path = "/api/balance",
    tag = "Balance",
    security(("bearer" = [])),
    responses(
        (status = 200, body = Balance),
        (status = 401, description = "Unauthorized - invalid or missing token")
    )
)]
pub async fn get_balance(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Balance>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.balance(&user.sub)))
}

#[utoipa::path(
    put,
    path = "/api/balance",
    tag = "Balance",
    request_body = Balance,
    security(("bearer" = [])),
    responses(
        (status = 200, body = Balance),
        (status = 401, description = "Unauthorized - invalid or missing token")
    )
)]
pub async fn set_balance(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<Balance>,
) -> Result<Json<Balance>, ApiError> {
    let mut store = state.store.write().await;
    Ok(Json(store.set_balance(&user.sub, request.balance_cents)))
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Upcoming bills for the authenticated user.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::Auth,
    error::ApiError,
    models::{Bill, CreateBillRequest, UpdateBillPaidRequest},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/api/bills",
    tag = "Bills",
    security(("bearer" = [])),
    responses(
        (status = 200, body = [Bill]),
        (status = 401, description = "Unauthorized - invalid or missing token")
    )
)]
pub async fn list_bills(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Bill>>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.list_bills(&user.sub)))
}

#[utoipa::path(
    post,
    path = "/api/bills",
    tag = "Bills",
    request_body = CreateBillRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, body = Bill),
        (status = 400, description = "Invalid name or amount"),
        (status = 401, description = "Unauthorized - invalid or missing token")
    )
)]
pub async fn create_bill(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateBillRequest>,
) -> Result<(StatusCode, Json<Bill>), ApiError> {
    let mut store = state.store.write().await;
    let bill = store.create_bill(&user.sub, request)?;
    Ok((StatusCode::CREATED, Json(bill)))
}

#[utoipa::path(
    put,
    path = "/api/bills/{bill_id}/paid",
    tag = "Bills",
    params(
        ("bill_id" = String, Path, description = "Identifier of the bill")
    ),
    request_body = UpdateBillPaidRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, body = Bill),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "Bill not found")
    )
)]
pub async fn set_bill_paid(
    Auth(user): Auth,
    Path(bill_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<UpdateBillPaidRequest>,
) -> Result<Json<Bill>, ApiError> {
    let mut store = state.store.write().await;
    Ok(Json(store.set_bill_paid(&user.sub, &bill_id, request.paid)?))
}

#[utoipa::path(
    delete,
    path = "/api/bills/{bill_id}",
    tag = "Bills",
    params(
        ("bill_id" = String, Path, description = "Identifier of the bill to delete")
    ),
    security(("bearer" = [])),
    responses(
        (status = 204),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "Bill not found")
    )
)]
pub async fn delete_bill(
    Auth(user): Auth,
    Path(bill_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let mut store = state.store.write().await;
    store.delete_bill(&user.sub, &bill_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    auth::Auth,
    error::ApiError,
    models::AnalyticsSummary,
    state::AppState,
    store::Month,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AnalyticsQuery {
    /// Restrict to one calendar month, formatted `YYYY-MM`
    pub month: Option<String>,
}

/// Income, expense and unpaid-bill totals for the caller.
#[utoipa::path(
    get,
    path = "/api/analytics",
    tag = "Analytics",
    params(AnalyticsQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, body = AnalyticsSummary),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Unauthorized - invalid or missing token")
    )
)]
pub async fn get_analytics(
    Auth(user): Auth,
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsSummary>, ApiError> {
    let month = query.month.as_deref().map(Month::parse).transpose()?;
    let store = state.store.read().await;
    Ok(Json(store.analytics(&user.sub, month)))
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use tracing::info;

use crate::{auth::Auth, error::ApiError, models::ClearDataResponse, state::AppState};

/// Delete the caller's transactions and bills and reset the balance.
#[utoipa::path(
    delete,
    path = "/api/clear-data",
    tag = "Data",
    security(("bearer" = [])),
    responses(
        (status = 200, body = ClearDataResponse),
        (status = 401, description = "Unauthorized - invalid or missing token")
    )
)]
pub async fn clear_data(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<ClearDataResponse>, ApiError> {
    let mut store = state.store.write().await;
    let removed = store.clear(&user.sub);
    info!(
        user_id = %user.sub,
        transactions = removed.transactions_removed,
        bills = removed.bills_removed,
        "User data cleared"
    );
    Ok(Json(removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::test_claim;
    use crate::models::{CreateTransactionRequest, TransactionKind};

    #[tokio::test]
    async fn clear_only_touches_caller() {
        let state = AppState::for_tests();
        let request = || CreateTransactionRequest {
            kind: TransactionKind::Income,
            amount_cents: 900,
            category: "salary".into(),
            description: None,
            date: None,
        };
        {
            let mut store = state.store.write().await;
            store.create_transaction("alice", request()).unwrap();
            store.create_transaction("bob", request()).unwrap();
        }

        let Json(removed) = clear_data(Auth(test_claim("alice")), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(removed.transactions_removed, 1);

        let store = state.store.read().await;
        assert!(store.list_transactions("alice").is_empty());
        assert_eq!(store.balance("alice").balance_cents, 0);
        assert_eq!(store.list_transactions("bob").len(), 1);
    }
}

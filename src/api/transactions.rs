// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Income and expense records for the authenticated user.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::Auth,
    error::ApiError,
    models::{CreateTransactionRequest, Transaction},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/api/transactions",
    tag = "Transactions",
    security(("bearer" = [])),
    responses(
        (status = 200, body = [Transaction]),
        (status = 401, description = "Unauthorized - invalid or missing token")
    )
)]
pub async fn list_transactions(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.list_transactions(&user.sub)))
}

#[utoipa::path(
    post,
    path = "/api/transactions",
    tag = "Transactions",
    request_body = CreateTransactionRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, body = Transaction),
        (status = 400, description = "Invalid amount or category"),
        (status = 401, description = "Unauthorized - invalid or missing token")
    )
)]
pub async fn create_transaction(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let mut store = state.store.write().await;
    let transaction = store.create_transaction(&user.sub, request)?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

#[utoipa::path(
    delete,
    path = "/api/transactions/{transaction_id}",
    tag = "Transactions",
    params(
        ("transaction_id" = String, Path, description = "Identifier of the transaction to delete")
    ),
    security(("bearer" = [])),
    responses(
        (status = 204),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "Transaction not found")
    )
)]
pub async fn delete_transaction(
    Auth(user): Auth,
    Path(transaction_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let mut store = state.store.write().await;
    store.delete_transaction(&user.sub, &transaction_id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::test_claim;
    use crate::models::TransactionKind;

    fn expense(amount_cents: i64) -> CreateTransactionRequest {
        CreateTransactionRequest {
            kind: TransactionKind::Expense,
            amount_cents,
            category: "groceries".into(),
            description: Some("weekly shop".into()),
            date: None,
        }
    }

    #[tokio::test]
    async fn create_and_list_are_scoped_to_caller() {
        let state = AppState::for_tests();

        let (status, Json(created)) = create_transaction(
            Auth(test_claim("alice")),
            State(state.clone()),
            Json(expense(1250)),
        )
        .await
        .expect("transaction creation succeeds");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.amount_cents, 1250);

        let Json(mine) = list_transactions(Auth(test_claim("alice")), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(mine, vec![created]);

        let Json(theirs) = list_transactions(Auth(test_claim("bob")), State(state))
            .await
            .unwrap();
        assert!(theirs.is_empty());
    }

    #[tokio::test]
    async fn create_rejects_non_positive_amount() {
        let state = AppState::for_tests();
        let err = create_transaction(Auth(test_claim("alice")), State(state), Json(expense(0)))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_other_users_transaction_is_not_found() {
        let state = AppState::for_tests();
        let created = state
            .store
            .write()
            .await
            .create_transaction("alice", expense(500))
            .unwrap();

        let err = delete_transaction(
            Auth(test_claim("bob")),
            Path(created.id.clone()),
            State(state.clone()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let status = delete_transaction(Auth(test_claim("alice")), Path(created.id), State(state))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}

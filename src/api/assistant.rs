// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! AI chat and forecast endpoints.
//!
//! Both answer 503 when no completion API is configured and 502 when the
//! upstream call fails.

use axum::{extract::State, Json};

use crate::{
    auth::Auth,
    error::ApiError,
    models::{ChatRequest, ChatResponse, ForecastResponse},
    providers::assistant::{chat_messages, forecast_messages},
    state::AppState,
};

const MAX_MESSAGE_CHARS: usize = 4_000;

#[utoipa::path(
    post,
    path = "/api/ai/chat",
    tag = "AI",
    request_body = ChatRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, body = ChatResponse),
        (status = 400, description = "Empty or oversized message"),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 502, description = "Completion API failed"),
        (status = 503, description = "AI assistant is not configured")
    )
)]
pub async fn chat(
    Auth(_user): Auth,
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ApiError::bad_request("message cannot be empty"));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::bad_request(format!(
            "message cannot exceed {MAX_MESSAGE_CHARS} characters"
        )));
    }

    let reply = state
        .assistant
        .complete(chat_messages(message, &request.history))
        .await?;
    Ok(Json(ChatResponse { reply }))
}

#[utoipa::path(
    post,
    path = "/api/ai/forecast",
    tag = "AI",
    security(("bearer" = [])),
    responses(
        (status = 200, body = ForecastResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 502, description = "Completion API failed"),
        (status = 503, description = "AI assistant is not configured")
    )
)]
pub async fn forecast(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let messages = {
        let store = state.store.read().await;
        forecast_messages(
            &store.analytics(&user.sub, None),
            store.balance(&user.sub),
            &store.list_transactions(&user.sub),
        )
    };

    let forecast = state.assistant.complete(messages).await?;
    Ok(Json(ForecastResponse { forecast }))
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! AI completion client for the chat and forecast endpoints.
//!
//! Thin pass-through to an OpenAI-compatible chat completions API. When no
//! API key is configured the [`DisabledAssistant`] answers every call with
//! [`AssistantError::NotConfigured`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::config::AssistantSettings;
use crate::error::ApiError;
use crate::models::{AnalyticsSummary, Balance, ChatMessage, ChatRole, Transaction};

/// Completion requests are slower than other provider calls.
const COMPLETION_TIMEOUT: Duration = Duration::from_secs(25);

/// Most recent history entries forwarded with a chat message.
const MAX_HISTORY: usize = 20;

/// Most recent transactions included in a forecast prompt.
const FORECAST_TRANSACTIONS: usize = 50;

const CHAT_SYSTEM_PROMPT: &str = "You are a concise personal finance assistant. \
Answer questions about budgeting, saving and spending. Do not give legal or tax advice.";

const FORECAST_SYSTEM_PROMPT: &str = "You are a personal finance analyst. Given a user's \
recent ledger, forecast next month's income, expenses and ending balance, and name the \
two or three categories most worth watching. Amounts are in cents.";

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("AI assistant is not configured")]
    NotConfigured,

    #[error("completion request failed: {0}")]
    Request(String),

    #[error("completion response was invalid: {0}")]
    InvalidResponse(String),
}

impl From<AssistantError> for ApiError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::NotConfigured => ApiError::service_unavailable(err.to_string()),
            other => {
                tracing::warn!(error = %other, "Completion API call failed");
                ApiError::bad_gateway("AI assistant is temporarily unavailable")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CompletionMessage {
    pub role: &'static str,
    pub content: String,
}

impl CompletionMessage {
    fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

impl From<&ChatMessage> for CompletionMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: match message.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            },
            content: message.content.clone(),
        }
    }
}

#[async_trait]
pub trait Assistant: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn complete(&self, messages: Vec<CompletionMessage>) -> Result<String, AssistantError>;
}

/// Assistant used when no completion API key is configured.
pub struct DisabledAssistant;

#[async_trait]
impl Assistant for DisabledAssistant {
    fn is_configured(&self) -> bool {
        false
    }

    async fn complete(&self, _messages: Vec<CompletionMessage>) -> Result<String, AssistantError> {
        Err(AssistantError::NotConfigured)
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CompletionClient {
    api_url: String,
    api_key: String,
    model: String,
    http: Client,
}

impl CompletionClient {
    pub fn new(settings: &AssistantSettings) -> Result<Self, AssistantError> {
        let http = Client::builder()
            .timeout(COMPLETION_TIMEOUT)
            .build()
            .map_err(|e| AssistantError::Request(format!("failed to build HTTP client: {e}")))?;

        info!(model = %settings.model, "AI assistant enabled");
        Ok(Self {
            api_url: settings.api_url.clone(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            http,
        })
    }
}

#[async_trait]
impl Assistant for CompletionClient {
    fn is_configured(&self) -> bool {
        true
    }

    async fn complete(&self, messages: Vec<CompletionMessage>) -> Result<String, AssistantError> {
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": messages,
            }))
            .send()
            .await
            .map_err(|e| AssistantError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Request(format!(
                "completion API returned {status}: {body}"
            )));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::InvalidResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| AssistantError::InvalidResponse("no completion content".to_string()))
    }
}

/// Messages for a chat turn: system prompt, trimmed history, then the new message.
pub fn chat_messages(message: &str, history: &[ChatMessage]) -> Vec<CompletionMessage> {
    let skip = history.len().saturating_sub(MAX_HISTORY);
    std::iter::once(CompletionMessage::system(CHAT_SYSTEM_PROMPT))
        .chain(history.iter().skip(skip).map(CompletionMessage::from))
        .chain(std::iter::once(CompletionMessage::user(message.trim())))
        .collect()
}

/// Messages asking for a forecast over the caller's ledger.
pub fn forecast_messages(
    summary: &AnalyticsSummary,
    balance: Balance,
    transactions: &[Transaction],
) -> Vec<CompletionMessage> {
    let recent: Vec<_> = transactions
        .iter()
        .take(FORECAST_TRANSACTIONS)
        .map(|tx| {
            json!({
                "date": tx.date,
                "kind": tx.kind,
                "amount_cents": tx.amount_cents,
                "category": tx.category,
            })
        })
        .collect();

    let ledger = json!({
        "balance_cents": balance.balance_cents,
        "summary": summary,
        "recent_transactions": recent,
    });

    vec![
        CompletionMessage::system(FORECAST_SYSTEM_PROMPT),
        CompletionMessage::user(ledger.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(role: ChatRole, content: &str) -> ChatMessage {
        ChatMessage {
            role,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn disabled_assistant_reports_not_configured() {
        let assistant = DisabledAssistant;
        assert!(!assistant.is_configured());
        assert!(matches!(
            assistant.complete(vec![]).await,
            Err(AssistantError::NotConfigured)
        ));
    }

    #[test]
    fn not_configured_maps_to_503_and_failures_to_502() {
        let err: ApiError = AssistantError::NotConfigured.into();
        assert_eq!(err.status, axum::http::StatusCode::SERVICE_UNAVAILABLE);

        let err: ApiError = AssistantError::Request("boom".into()).into();
        assert_eq!(err.status, axum::http::StatusCode::BAD_GATEWAY);
        assert!(!err.message.contains("boom"));
    }

    #[test]
    fn chat_messages_keep_order_and_cap_history() {
        let history: Vec<ChatMessage> = (0..30)
            .map(|i| message(ChatRole::User, &format!("q{i}")))
            .collect();
        let messages = chat_messages(" latest ", &history);

        assert_eq!(messages.len(), 1 + MAX_HISTORY + 1);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].content, "q10");
        assert_eq!(messages.last().unwrap().content, "latest");
    }

    #[test]
    fn forecast_messages_embed_ledger() {
        let summary = AnalyticsSummary {
            month: None,
            income_cents: 100,
            expense_cents: 40,
            net_cents: 60,
            expense_by_category: vec![],
            unpaid_bills: 0,
            unpaid_bills_cents: 0,
        };
        let messages = forecast_messages(&summary, Balance { balance_cents: 60 }, &[]);

        assert_eq!(messages.len(), 2);
        let ledger: serde_json::Value = serde_json::from_str(&messages[1].content).unwrap();
        assert_eq!(ledger["balance_cents"], 60);
        assert_eq!(ledger["summary"]["net_cents"], 60);
    }
}

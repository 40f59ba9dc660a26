// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::auth::{AccountStore, FederatedLogin, InMemoryAccountStore, TokenCodec};
use crate::config::AppConfig;
use crate::providers::{Assistant, CompletionClient, DisabledAssistant};
use crate::store::InMemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Provider(#[from] crate::auth::google::ProviderError),

    #[error(transparent)]
    Assistant(#[from] crate::providers::AssistantError),
}

/// Shared application state.
///
/// Everything except `store` is read-only after boot.
#[derive(Clone)]
pub struct AppState {
    pub codec: Arc<TokenCodec>,
    pub federated: Arc<FederatedLogin>,
    pub accounts: Arc<dyn AccountStore>,
    pub assistant: Arc<dyn Assistant>,
    pub store: Arc<RwLock<InMemoryStore>>,
    pub frontend_url: Arc<str>,
}

impl AppState {
    pub fn new(
        codec: TokenCodec,
        federated: FederatedLogin,
        accounts: Arc<dyn AccountStore>,
        assistant: Arc<dyn Assistant>,
        frontend_url: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            codec: Arc::new(codec),
            federated: Arc::new(federated),
            accounts,
            assistant,
            store: Arc::new(RwLock::new(InMemoryStore::new())),
            frontend_url: frontend_url.into(),
        }
    }

    /// Wire the application from validated boot configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, StateError> {
        let codec = TokenCodec::new(&config.jwt_secret, config.jwt_ttl_secs);
        let federated = FederatedLogin::from_settings(config.google.as_ref(), &config.jwt_secret)?;
        let assistant: Arc<dyn Assistant> = match &config.assistant {
            Some(settings) => Arc::new(CompletionClient::new(settings)?),
            None => Arc::new(DisabledAssistant),
        };

        Ok(Self::new(
            codec,
            federated,
            Arc::new(InMemoryAccountStore::new()),
            assistant,
            config.frontend_url.as_str(),
        ))
    }

    pub fn with_federated(mut self, federated: FederatedLogin) -> Self {
        self.federated = Arc::new(federated);
        self
    }

    pub fn with_assistant(mut self, assistant: Arc<dyn Assistant>) -> Self {
        self.assistant = assistant;
        self
    }

    pub fn with_codec(mut self, codec: TokenCodec) -> Self {
        self.codec = Arc::new(codec);
        self
    }
}

#[cfg(test)]
impl AppState {
    pub const TEST_SECRET: &'static str = "s3cret";
    pub const TEST_FRONTEND: &'static str = "http://frontend.test";

    /// State with federated login and the assistant disabled.
    pub fn for_tests() -> Self {
        Self::new(
            TokenCodec::new(Self::TEST_SECRET, 3600),
            FederatedLogin::Unconfigured,
            Arc::new(InMemoryAccountStore::new()),
            Arc::new(DisabledAssistant),
            Self::TEST_FRONTEND,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ProviderRegistration;

    #[test]
    fn from_config_without_google_is_unconfigured() {
        let config = AppConfig::from_lookup(|name| {
            (name == crate::config::JWT_SECRET_ENV).then(|| "s3cret".to_string())
        })
        .unwrap();
        let state = AppState::from_config(&config).unwrap();

        assert_eq!(state.federated.registration(), ProviderRegistration::Unconfigured);
        assert!(!state.assistant.is_configured());
        assert!(state.codec.is_configured());
        assert_eq!(&*state.frontend_url, "http://localhost:3000");
    }

    #[test]
    fn from_config_with_google_is_ready() {
        let config = AppConfig::from_lookup(|name| match name {
            "JWT_SECRET" => Some("s3cret".to_string()),
            "GOOGLE_CLIENT_ID" => Some("id".to_string()),
            "GOOGLE_CLIENT_SECRET" => Some("secret".to_string()),
            _ => None,
        })
        .unwrap();
        let state = AppState::from_config(&config).unwrap();
        assert_eq!(state.federated.registration(), ProviderRegistration::Ready);
    }
}

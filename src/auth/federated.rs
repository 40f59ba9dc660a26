// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Federated login gate and handler.
//!
//! [`FederatedLogin`] is decided once at boot: `Ready` when both Google
//! client credentials are configured, `Unconfigured` otherwise. It never
//! changes afterwards. While `Unconfigured` there is no protocol handler to
//! call at all, so both entry points answer deterministically.
//!
//! ## OAuth `state`
//!
//! The `state` parameter is stateless: `<nonce>.<issued_at>.<mac>` where the
//! MAC is HMAC-SHA256 over nonce and timestamp, keyed by the signing secret.
//! It is accepted for [`STATE_TTL_SECS`] after issue.

use std::sync::Arc;

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{
    codec::TokenCodec,
    google::{GoogleOAuthClient, IdentityProvider, ProviderError},
    AuthError, IdentityClaim,
};
use crate::config::GoogleOAuthSettings;

/// How long an issued `state` value is accepted by the callback.
pub const STATE_TTL_SECS: i64 = 10 * 60;

const STATE_MAC_CONTEXT: &[u8] = b"ledgerline/oauth-state/v1:";

type HmacSha256 = Hmac<Sha256>;

/// Registration state of the federated-login provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProviderRegistration {
    Unconfigured,
    Ready,
}

/// Query parameters Google appends to the callback URL.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackParams {
    /// Authorization code
    pub code: Option<String>,
    /// State value issued at initiation
    pub state: Option<String>,
    /// Provider error, e.g. `access_denied`
    pub error: Option<String>,
    /// Human-readable provider error
    pub error_description: Option<String>,
}

/// Result of a callback, before it is turned into a redirect.
#[derive(Debug)]
pub enum CallbackOutcome {
    /// Token issued for the mapped identity
    Issued { token: String, claim: IdentityClaim },
    /// Gate is `Unconfigured`; no provider was contacted
    NotConfigured,
    /// Consent denied, bad state, or exchange failure
    Failed(String),
}

/// Signs and checks the OAuth `state` parameter.
#[derive(Clone)]
pub struct OAuthStateSigner {
    key: Arc<[u8]>,
}

impl OAuthStateSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            key: Arc::from(secret.as_bytes()),
        }
    }

    fn mac(&self, payload: &str) -> Result<HmacSha256, AuthError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| AuthError::Internal(format!("invalid state key: {e}")))?;
        mac.update(STATE_MAC_CONTEXT);
        mac.update(payload.as_bytes());
        Ok(mac)
    }

    pub fn issue(&self, now: i64) -> Result<String, AuthError> {
        let payload = format!("{}.{now}", Uuid::new_v4().simple());
        let tag = self.mac(&payload)?.finalize().into_bytes();
        Ok(format!("{payload}.{}", Base64UrlUnpadded::encode_string(&tag)))
    }

    pub fn verify(&self, state: &str, now: i64) -> bool {
        let Some((payload, tag)) = state.rsplit_once('.') else {
            return false;
        };
        let Some(issued_at) = payload
            .split_once('.')
            .and_then(|(_, ts)| ts.parse::<i64>().ok())
        else {
            return false;
        };
        if issued_at > now || now - issued_at > STATE_TTL_SECS {
            return false;
        }
        let Ok(tag) = Base64UrlUnpadded::decode_vec(tag) else {
            return false;
        };
        match self.mac(payload) {
            Ok(mac) => mac.verify_slice(&tag).is_ok(),
            Err(_) => false,
        }
    }
}

/// The protocol handler behind a `Ready` gate.
#[derive(Clone)]
pub struct FederatedLoginHandler {
    provider: Arc<dyn IdentityProvider>,
    state: OAuthStateSigner,
}

impl FederatedLoginHandler {
    pub fn new(provider: Arc<dyn IdentityProvider>, state: OAuthStateSigner) -> Self {
        Self { provider, state }
    }

    /// Build the consent-screen redirect.
    pub fn initiate(&self, now: i64) -> Result<String, AuthError> {
        let state = self.state.issue(now)?;
        self.provider
            .authorization_url(&state)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Complete the code exchange and issue a token for the mapped profile.
    pub async fn callback(
        &self,
        codec: &TokenCodec,
        params: CallbackParams,
        now: i64,
    ) -> CallbackOutcome {
        if let Some(error) = params.error {
            let description = params.error_description.unwrap_or_default();
            return CallbackOutcome::Failed(format!("provider returned {error}: {description}"));
        }

        let Some(code) = params.code.filter(|code| !code.is_empty()) else {
            return CallbackOutcome::Failed("no authorization code received".to_string());
        };

        match params.state.as_deref() {
            Some(state) if self.state.verify(state, now) => {}
            _ => return CallbackOutcome::Failed("missing or invalid state".to_string()),
        }

        let profile = match self.provider.exchange_code(&code).await {
            Ok(profile) => profile,
            Err(err) => return CallbackOutcome::Failed(err.to_string()),
        };
        if profile.id.trim().is_empty() {
            return CallbackOutcome::Failed("provider profile has no subject".to_string());
        }

        let fields = profile.claim_fields();
        let token = match codec.issue_at(fields, now) {
            Ok(token) => token,
            Err(err) => return CallbackOutcome::Failed(err.to_string()),
        };
        match codec.verify_at(&token, now) {
            Ok(claim) => CallbackOutcome::Issued { token, claim },
            Err(err) => CallbackOutcome::Failed(err.to_string()),
        }
    }
}

/// Federated login gate.
#[derive(Clone)]
pub enum FederatedLogin {
    Unconfigured,
    Ready(FederatedLoginHandler),
}

impl FederatedLogin {
    /// Decide the gate state from boot configuration.
    pub fn from_settings(
        settings: Option<&GoogleOAuthSettings>,
        signing_secret: &str,
    ) -> Result<Self, ProviderError> {
        match settings {
            Some(settings) => {
                let client = GoogleOAuthClient::new(settings)?;
                info!(callback_url = %settings.callback_url, "Google login enabled");
                Ok(Self::ready(Arc::new(client), signing_secret))
            }
            None => {
                info!("Google login not configured; federated endpoints will degrade");
                Ok(Self::Unconfigured)
            }
        }
    }

    pub fn ready(provider: Arc<dyn IdentityProvider>, signing_secret: &str) -> Self {
        Self::Ready(FederatedLoginHandler::new(
            provider,
            OAuthStateSigner::new(signing_secret),
        ))
    }

    pub fn registration(&self) -> ProviderRegistration {
        match self {
            Self::Unconfigured => ProviderRegistration::Unconfigured,
            Self::Ready(_) => ProviderRegistration::Ready,
        }
    }

    /// Initiation entry point.
    pub fn initiate(&self, now: i64) -> Result<String, AuthError> {
        match self {
            Self::Unconfigured => Err(AuthError::ProviderUnconfigured),
            Self::Ready(handler) => handler.initiate(now),
        }
    }

    /// Callback entry point.
    pub async fn callback(
        &self,
        codec: &TokenCodec,
        params: CallbackParams,
        now: i64,
    ) -> CallbackOutcome {
        match self {
            Self::Unconfigured => CallbackOutcome::NotConfigured,
            Self::Ready(handler) => {
                let outcome = handler.callback(codec, params, now).await;
                if let CallbackOutcome::Failed(reason) = &outcome {
                    warn!(reason = %reason, "Google login failed");
                }
                outcome
            }
        }
    }
}

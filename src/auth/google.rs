// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Google OAuth2 authorization-code client.
//!
//! ## Flow
//!
//! 1. Browser is redirected to Google's consent screen (`profile email`)
//! 2. Google redirects back with `?code=...&state=...`
//! 3. The code is exchanged at the token endpoint for an access token
//! 4. The access token is used once to fetch the user's profile
//!
//! The resulting [`FederatedProfile`] is transient: it is mapped to claim
//! fields and dropped.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::claims::ClaimFields;
use crate::config::GoogleOAuthSettings;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const GOOGLE_SCOPES: &str = "profile email";

/// HTTP timeout for each provider round trip.
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("identity provider configuration invalid: {0}")]
    Configuration(String),

    #[error("identity provider denied the request: {0}")]
    Denied(String),

    #[error("identity provider request failed: {0}")]
    Request(String),

    #[error("identity provider response was invalid: {0}")]
    InvalidResponse(String),
}

/// An email address reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEmail {
    pub value: String,
    pub verified: bool,
}

/// Profile returned by the external identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedProfile {
    pub id: String,
    pub display_name: String,
    pub emails: Vec<ProfileEmail>,
    pub photo: Option<String>,
}

impl FederatedProfile {
    /// First verified email, if any.
    pub fn verified_email(&self) -> Option<&str> {
        self.emails
            .iter()
            .find(|email| email.verified)
            .map(|email| email.value.as_str())
    }

    /// Map the profile 1:1 onto claim fields.
    pub fn claim_fields(&self) -> ClaimFields {
        let email = self.verified_email().map(str::to_string);
        let name = if self.display_name.trim().is_empty() {
            email.clone().unwrap_or_default()
        } else {
            self.display_name.clone()
        };
        ClaimFields::new(self.id.clone(), email, name)
    }
}

/// The OAuth2 protocol side of federated login.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Consent-screen URL carrying the given `state` value.
    fn authorization_url(&self, state: &str) -> Result<String, ProviderError>;

    /// Exchange an authorization code for the caller's profile.
    async fn exchange_code(&self, code: &str) -> Result<FederatedProfile, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
    #[serde(default)]
    picture: Option<String>,
}

impl From<UserInfo> for FederatedProfile {
    fn from(info: UserInfo) -> Self {
        let verified = info.email_verified.unwrap_or(false);
        Self {
            id: info.sub,
            display_name: info.name.unwrap_or_default(),
            emails: info
                .email
                .map(|value| vec![ProfileEmail { value, verified }])
                .unwrap_or_default(),
            photo: info.picture,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GoogleOAuthClient {
    client_id: String,
    client_secret: String,
    callback_url: String,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
    http: Client,
}

impl GoogleOAuthClient {
    pub fn new(settings: &GoogleOAuthSettings) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            callback_url: settings.callback_url.clone(),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
            http,
        })
    }

    async fn request_access_token(&self, code: &str) -> Result<String, ProviderError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.callback_url.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Denied(format!(
                "token request returned {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("invalid token response: {e}")))?;

        if token.access_token.trim().is_empty() {
            return Err(ProviderError::InvalidResponse(
                "token response did not include access_token".to_string(),
            ));
        }

        Ok(token.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<FederatedProfile, ProviderError> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("userinfo request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ProviderError::Request(format!(
                "userinfo request returned {}",
                response.status()
            )));
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("invalid userinfo: {e}")))?;

        if info.sub.trim().is_empty() {
            return Err(ProviderError::InvalidResponse(
                "userinfo did not include a subject".to_string(),
            ));
        }

        Ok(info.into())
    }
}

#[async_trait]
impl IdentityProvider for GoogleOAuthClient {
    fn authorization_url(&self, state: &str) -> Result<String, ProviderError> {
        let mut url = Url::parse(&self.auth_url)
            .map_err(|e| ProviderError::Configuration(format!("invalid authorization URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.callback_url)
            .append_pair("scope", GOOGLE_SCOPES)
            .append_pair("state", state);
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<FederatedProfile, ProviderError> {
        let access_token = self.request_access_token(code).await?;
        let profile = self.fetch_profile(&access_token).await?;
        debug!(provider = "google", "Fetched federated profile");
        Ok(profile)
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment exactly once at startup and
//! validated into an [`AppConfig`]. Nothing in request handling re-reads the
//! environment.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `JWT_SECRET` | Token signing secret | Required |
//! | `JWT_TTL_SECS` | Token lifetime in seconds | `604800` |
//! | `GOOGLE_CLIENT_ID` | Google OAuth client ID | Optional |
//! | `GOOGLE_CLIENT_SECRET` | Google OAuth client secret | Optional |
//! | `BACKEND_URL` | Public base URL of this server (OAuth callback) | `http://localhost:<PORT>` |
//! | `FRONTEND_URL` | Frontend base URL for login redirects | `http://localhost:3000` |
//! | `REQUEST_TIMEOUT_SECS` | Per-request timeout | `30` |
//! | `CORS_ALLOWED_ORIGINS` | Comma-separated CORS allow-list | Permissive |
//! | `AI_API_KEY` | Completion API key | Optional |
//! | `AI_API_URL` | Completion API endpoint | OpenAI chat completions |
//! | `AI_MODEL` | Completion model | `gpt-4o-mini` |
//! | `SEED_ACCOUNT_EMAIL` | Account created at boot | Optional |
//! | `SEED_ACCOUNT_PASSWORD` | Password for the seeded account | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::time::Duration;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_TTL_ENV: &str = "JWT_TTL_SECS";
pub const GOOGLE_CLIENT_ID_ENV: &str = "GOOGLE_CLIENT_ID";
pub const GOOGLE_CLIENT_SECRET_ENV: &str = "GOOGLE_CLIENT_SECRET";
pub const BACKEND_URL_ENV: &str = "BACKEND_URL";
pub const FRONTEND_URL_ENV: &str = "FRONTEND_URL";
pub const REQUEST_TIMEOUT_ENV: &str = "REQUEST_TIMEOUT_SECS";
pub const CORS_ALLOWED_ORIGINS_ENV: &str = "CORS_ALLOWED_ORIGINS";
pub const AI_API_KEY_ENV: &str = "AI_API_KEY";
pub const AI_API_URL_ENV: &str = "AI_API_URL";
pub const AI_MODEL_ENV: &str = "AI_MODEL";
pub const SEED_ACCOUNT_EMAIL_ENV: &str = "SEED_ACCOUNT_EMAIL";
pub const SEED_ACCOUNT_PASSWORD_ENV: &str = "SEED_ACCOUNT_PASSWORD";

/// Seven days, matching the lifetime clients were built around.
pub const DEFAULT_JWT_TTL_SECS: i64 = 7 * 24 * 60 * 60;
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
pub const DEFAULT_AI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Path of the Google OAuth callback, relative to `BACKEND_URL`.
pub const GOOGLE_CALLBACK_PATH: &str = "/api/auth/google/callback";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required configuration missing: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Google OAuth client registration. Only constructed when both the client
/// ID and the client secret are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleOAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}

/// Completion API settings. Only constructed when an API key is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantSettings {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_secs: i64,
    pub google: Option<GoogleOAuthSettings>,
    pub backend_url: String,
    pub frontend_url: String,
    pub request_timeout: Duration,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub assistant: Option<AssistantSettings>,
    pub seed_account: Option<(String, String)>,
}

impl AppConfig {
    /// Load and validate configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let jwt_secret = get(JWT_SECRET_ENV).ok_or(ConfigError::Missing(JWT_SECRET_ENV))?;

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: PORT_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let jwt_ttl_secs = match get(JWT_TTL_ENV) {
            Some(raw) => {
                let ttl = raw.parse::<i64>().map_err(|e| ConfigError::Invalid {
                    name: JWT_TTL_ENV,
                    reason: e.to_string(),
                })?;
                if ttl <= 0 {
                    return Err(ConfigError::Invalid {
                        name: JWT_TTL_ENV,
                        reason: "must be greater than zero".to_string(),
                    });
                }
                ttl
            }
            None => DEFAULT_JWT_TTL_SECS,
        };

        let request_timeout = match get(REQUEST_TIMEOUT_ENV) {
            Some(raw) => Duration::from_secs(raw.parse::<u64>().map_err(|e| {
                ConfigError::Invalid {
                    name: REQUEST_TIMEOUT_ENV,
                    reason: e.to_string(),
                }
            })?),
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        let backend_url = get(BACKEND_URL_ENV)
            .unwrap_or_else(|| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();
        let frontend_url = get(FRONTEND_URL_ENV)
            .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let google = match (get(GOOGLE_CLIENT_ID_ENV), get(GOOGLE_CLIENT_SECRET_ENV)) {
            (Some(client_id), Some(client_secret)) => Some(GoogleOAuthSettings {
                client_id,
                client_secret,
                callback_url: format!("{backend_url}{GOOGLE_CALLBACK_PATH}"),
            }),
            (Some(_), None) | (None, Some(_)) => {
                tracing::warn!(
                    "Only one of {GOOGLE_CLIENT_ID_ENV} and {GOOGLE_CLIENT_SECRET_ENV} is set; \
                     Google login stays disabled"
                );
                None
            }
            (None, None) => None,
        };

        let cors_allowed_origins = get(CORS_ALLOWED_ORIGINS_ENV).map(|raw| {
            raw.split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect::<Vec<_>>()
        });

        let assistant = get(AI_API_KEY_ENV).map(|api_key| AssistantSettings {
            api_key,
            api_url: get(AI_API_URL_ENV).unwrap_or_else(|| DEFAULT_AI_API_URL.to_string()),
            model: get(AI_MODEL_ENV).unwrap_or_else(|| DEFAULT_AI_MODEL.to_string()),
        });

        let seed_account = match (get(SEED_ACCOUNT_EMAIL_ENV), get(SEED_ACCOUNT_PASSWORD_ENV)) {
            (Some(email), Some(password)) => Some((email, password)),
            _ => None,
        };

        Ok(Self {
            host,
            port,
            jwt_secret,
            jwt_ttl_secs,
            google,
            backend_url,
            frontend_url,
            request_timeout,
            cors_allowed_origins,
            assistant,
            seed_account,
        })
    }
}

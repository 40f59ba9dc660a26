// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account store collaborator for direct (password) login.
//!
//! The authentication core only needs "identifier + secret in, verified
//! account out". [`InMemoryAccountStore`] is the bundled implementation;
//! secrets are stored as Argon2 PHC strings and hashing runs on the blocking
//! pool so it never stalls request workers.

use std::collections::HashMap;

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use password_hash::{PasswordHash, SaltString};
use serde::Serialize;
use tokio::sync::{OnceCell, RwLock};
use utoipa::ToSchema;
use uuid::Uuid;

use super::claims::ClaimFields;

/// Minimum accepted secret length for new accounts.
pub const MIN_SECRET_LEN: usize = 8;

/// Secret behind the hash checked for unknown identifiers.
const DUMMY_SECRET: &str = "ledgerline-unknown-account";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AccountStoreError {
    #[error("an account with this identifier already exists")]
    AlreadyExists,

    #[error("{0}")]
    InvalidInput(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// A verified account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl Account {
    pub fn claim_fields(&self) -> ClaimFields {
        ClaimFields::new(self.id.clone(), Some(self.email.clone()), self.name.clone())
    }
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Return the account if `secret` matches, `None` on any mismatch.
    async fn verify_credentials(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<Option<Account>, AccountStoreError>;

    /// Create a new account.
    async fn register(
        &self,
        identifier: &str,
        secret: &str,
        name: &str,
    ) -> Result<Account, AccountStoreError>;
}

struct StoredAccount {
    account: Account,
    password_hash: String,
}

#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<String, StoredAccount>>,
    /// Verified against when the identifier is unknown, so both outcomes
    /// cost one Argon2 check.
    dummy_hash: OnceCell<String>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn dummy_hash(&self) -> Result<String, AccountStoreError> {
        self.dummy_hash
            .get_or_try_init(|| async { blocking(|| hash_secret(DUMMY_SECRET)).await? })
            .await
            .cloned()
    }
}

fn normalize_identifier(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

fn hash_secret(secret: &str) -> Result<String, AccountStoreError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| AccountStoreError::Hashing(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AccountStoreError::Hashing(e.to_string()))?;
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AccountStoreError::Hashing(e.to_string()))
}

fn verify_secret(hash: &str, secret: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

async fn blocking<T, F>(f: F) -> Result<T, AccountStoreError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AccountStoreError::Hashing(format!("hashing task failed: {e}")))
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn verify_credentials(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<Option<Account>, AccountStoreError> {
        let key = normalize_identifier(identifier);
        let stored = {
            let accounts = self.accounts.read().await;
            accounts
                .get(&key)
                .map(|stored| (stored.account.clone(), stored.password_hash.clone()))
        };
        let (account, hash) = match stored {
            Some((account, hash)) => (Some(account), hash),
            None => (None, self.dummy_hash().await?),
        };

        let secret = secret.to_string();
        let matches = blocking(move || verify_secret(&hash, &secret)).await?;
        Ok(account.filter(|_| matches))
    }

    async fn register(
        &self,
        identifier: &str,
        secret: &str,
        name: &str,
    ) -> Result<Account, AccountStoreError> {
        let key = normalize_identifier(identifier);
        if key.is_empty() || !key.contains('@') {
            return Err(AccountStoreError::InvalidInput(
                "a valid email address is required".to_string(),
            ));
        }
        if secret.chars().count() < MIN_SECRET_LEN {
            return Err(AccountStoreError::InvalidInput(format!(
                "password must be at least {MIN_SECRET_LEN} characters"
            )));
        }
        if self.accounts.read().await.contains_key(&key) {
            return Err(AccountStoreError::AlreadyExists);
        }

        let owned_secret = secret.to_string();
        let password_hash = blocking(move || hash_secret(&owned_secret)).await??;

        let name = name.trim();
        let account = Account {
            id: Uuid::new_v4().to_string(),
            email: key.clone(),
            name: if name.is_empty() { key.clone() } else { name.to_string() },
        };

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&key) {
            return Err(AccountStoreError::AlreadyExists);
        }
        accounts.insert(
            key,
            StoredAccount {
                account: account.clone(),
                password_hash,
            },
        );
        Ok(account)
    }
}

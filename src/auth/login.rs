// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Direct login: verified identity in, signed token out.

use tracing::{info, warn};

use super::{
    accounts::{Account, AccountStore},
    codec::TokenCodec,
    AuthError,
};

/// Verify `identifier`/`secret` against the account store and issue a token.
///
/// Any mismatch yields [`AuthError::InvalidCredentials`] without saying
/// which field was wrong.
pub async fn direct_login(
    accounts: &dyn AccountStore,
    codec: &TokenCodec,
    identifier: &str,
    secret: &str,
) -> Result<(String, Account), AuthError> {
    if identifier.trim().is_empty() || secret.is_empty() {
        return Err(AuthError::InvalidCredentials);
    }

    let account = accounts
        .verify_credentials(identifier, secret)
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?
        .ok_or_else(|| {
            warn!("Direct login rejected");
            AuthError::InvalidCredentials
        })?;

    let token = issue_for_account(codec, &account)?;
    info!(user_id = %account.id, "Direct login succeeded");
    Ok((token, account))
}

/// Issue a token for an already-verified account.
pub fn issue_for_account(codec: &TokenCodec, account: &Account) -> Result<String, AuthError> {
    Ok(codec.issue(account.claim_fields())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::accounts::InMemoryAccountStore;

    async fn store_with_ada() -> InMemoryAccountStore {
        let store = InMemoryAccountStore::new();
        store
            .register("ada@example.com", "correct horse", "Ada")
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn issues_token_for_valid_credentials() {
        let store = store_with_ada().await;
        let codec = TokenCodec::new("s3cret", 3600);

        let (token, account) = direct_login(&store, &codec, "ada@example.com", "correct horse")
            .await
            .unwrap();
        let claim = codec.verify(&token).unwrap();
        assert_eq!(claim.sub, account.id);
        assert_eq!(claim.email.as_deref(), Some("ada@example.com"));
        assert_eq!(claim.name, "Ada");
    }

    #[tokio::test]
    async fn mismatch_is_invalid_credentials() {
        let store = store_with_ada().await;
        let codec = TokenCodec::new("s3cret", 3600);

        for (identifier, secret) in [
            ("ada@example.com", "wrong"),
            ("nobody@example.com", "correct horse"),
            ("", "correct horse"),
            ("ada@example.com", ""),
        ] {
            let result = direct_login(&store, &codec, identifier, secret).await;
            assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        }
    }

    #[tokio::test]
    async fn unconfigured_codec_is_internal() {
        let store = store_with_ada().await;
        let codec = TokenCodec::new("", 3600);

        let result = direct_login(&store, &codec, "ada@example.com", "correct horse").await;
        assert!(matches!(result, Err(AuthError::Internal(_))));
    }
}

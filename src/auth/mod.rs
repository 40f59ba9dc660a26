// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Stateless bearer-token authentication for the Ledgerline API.
//!
//! ## Auth Flow
//!
//! 1. The client obtains a token through one of two paths:
//!    - direct login (`POST /api/auth/login`) against the account store
//!    - Google sign-in (`/api/auth/google` → `/api/auth/google/callback`)
//! 2. Both paths sign the same [`IdentityClaim`] shape with the [`TokenCodec`]
//! 3. The client sends `Authorization: Bearer <token>` (or `?token=`)
//! 4. [`middleware::require_auth`] verifies it and attaches the claim to the
//!    request; handlers read it with the [`Auth`] extractor
//!
//! ## Security
//!
//! - No server-side session state; the token is the sole source of truth
//! - HS256 with a process-wide secret, required at boot
//! - Google sign-in is decided once at boot and degrades to a deterministic
//!   "not configured" answer when credentials are absent

pub mod accounts;
pub mod claims;
pub mod codec;
pub mod error;
pub mod extractor;
pub mod federated;
pub mod google;
pub mod login;
pub mod middleware;

pub use accounts::{Account, AccountStore, InMemoryAccountStore};
pub use claims::{ClaimFields, IdentityClaim, UserSummary};
pub use codec::{CodecError, TokenCodec};
pub use error::AuthError;
pub use extractor::Auth;
pub use federated::{CallbackOutcome, FederatedLogin, ProviderRegistration};
pub use middleware::require_auth;

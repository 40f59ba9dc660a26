// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledgerline - Personal Finance API Server
//!
//! Stateless bearer-token authentication in front of a personal finance
//! API. Tokens are issued by direct login or, when configured, Google
//! sign-in, and every business route group sits behind one credential
//! verifier.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers and route composition (Axum)
//! - `auth` - Token codec, credential verifier, login handlers
//! - `config` - Environment configuration, validated at boot
//! - `providers` - AI completion client
//! - `store` - In-memory per-user ledger

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod providers;
pub mod state;
pub mod store;

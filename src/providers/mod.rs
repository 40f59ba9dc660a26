// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Outbound third-party API clients.

pub mod assistant;

pub use assistant::{Assistant, AssistantError, CompletionClient, DisabledAssistant};

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity claims carried inside issued tokens.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The signed payload representing an authenticated principal.
///
/// This is also the value the Credential Verifier attaches to each request,
/// so downstream handlers read the caller's identity from here and nowhere
/// else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IdentityClaim {
    /// Unique subject identifier (account ID or provider external ID)
    pub sub: String,

    /// Email address, absent for federated profiles without a verified email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Issued at (Unix seconds)
    pub iat: i64,

    /// Expiration (Unix seconds), always strictly after `iat`
    pub exp: i64,
}

impl IdentityClaim {
    /// Whether the claim is past its expiry at `now`.
    ///
    /// A claim stays usable through its `exp` second.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp < now
    }
}

/// Identity fields supplied by a login handler before timestamps are added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimFields {
    pub subject: String,
    pub email: Option<String>,
    pub name: String,
}

impl ClaimFields {
    pub fn new(subject: impl Into<String>, email: Option<String>, name: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            email,
            name: name.into(),
        }
    }

    pub(crate) fn into_claim(self, iat: i64, exp: i64) -> IdentityClaim {
        IdentityClaim {
            sub: self.subject,
            email: self.email,
            name: self.name,
            iat,
            exp,
        }
    }
}

/// Public view of a user returned next to a freshly issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub name: String,
}

impl From<&IdentityClaim> for UserSummary {
    fn from(claim: &IdentityClaim) -> Self {
        Self {
            id: claim.sub.clone(),
            email: claim.email.clone(),
            name: claim.name.clone(),
        }
    }
}

/// Claim for handler tests, valid for an hour from a fixed instant.
#[cfg(test)]
pub(crate) fn test_claim(sub: &str) -> IdentityClaim {
    ClaimFields::new(sub, Some(format!("{sub}@example.com")), sub.to_uppercase())
        .into_claim(1_700_000_000, 1_700_003_600)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claim() -> IdentityClaim {
        ClaimFields::new("u1", Some("a@b.com".to_string()), "Ada").into_claim(1_000, 4_600)
    }

    #[test]
    fn into_claim_copies_fields() {
        let claim = sample_claim();
        assert_eq!(claim.sub, "u1");
        assert_eq!(claim.email.as_deref(), Some("a@b.com"));
        assert_eq!(claim.name, "Ada");
        assert_eq!(claim.iat, 1_000);
        assert_eq!(claim.exp, 4_600);
    }

    #[test]
    fn expiry_is_inclusive_of_exp_second() {
        let claim = sample_claim();
        assert!(!claim.is_expired_at(4_599));
        assert!(!claim.is_expired_at(4_600));
        assert!(claim.is_expired_at(4_601));
    }

    #[test]
    fn email_is_omitted_when_absent() {
        let mut claim = sample_claim();
        claim.email = None;
        let json = serde_json::to_value(&claim).unwrap();
        assert!(json.get("email").is_none());
    }

    #[test]
    fn user_summary_from_claim() {
        let summary = UserSummary::from(&sample_claim());
        assert_eq!(summary.id, "u1");
        assert_eq!(summary.name, "Ada");
    }
}

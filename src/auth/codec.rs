// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token codec: signs identity claims into compact JWTs and verifies them.
//!
//! ## Format
//!
//! HS256 JWT with claims `{sub, email?, name, iat, exp}`. The signing secret
//! is process-wide and read-only after boot.
//!
//! ## Expiry
//!
//! Expiry is checked by the codec itself against the supplied clock instead
//! of inside `jsonwebtoken`, so that `verify_at` is a pure function of
//! `(secret, token, now)` with zero leeway.

use std::fmt;

use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::claims::{ClaimFields, IdentityClaim};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// No signing secret, or an unusable token lifetime.
    #[error("token codec is not configured: {0}")]
    Configuration(&'static str),

    /// Signature does not verify or the token cannot be parsed.
    #[error("token is malformed or its signature is invalid")]
    Malformed,

    /// Signature is valid but the embedded expiry has passed.
    #[error("token has expired")]
    Expired,

    /// Signing failed for a reason unrelated to the input claims.
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Issues and verifies signed identity tokens.
pub struct TokenCodec {
    keys: Option<SigningKeys>,
    ttl_secs: i64,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("configured", &self.keys.is_some())
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl TokenCodec {
    /// Create a codec from a signing secret and token lifetime.
    ///
    /// An empty secret yields an unconfigured codec whose every operation
    /// fails with [`CodecError::Configuration`].
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        let keys = (!secret.is_empty()).then(|| SigningKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        });
        Self { keys, ttl_secs }
    }

    pub fn is_configured(&self) -> bool {
        self.keys.is_some()
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issue a token for `fields`, valid from now for the configured lifetime.
    pub fn issue(&self, fields: ClaimFields) -> Result<String, CodecError> {
        self.issue_at(fields, Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, fields: ClaimFields, now: i64) -> Result<String, CodecError> {
        let keys = self.keys()?;
        if self.ttl_secs <= 0 {
            return Err(CodecError::Configuration("token lifetime must be positive"));
        }

        let claim = fields.into_claim(now, now + self.ttl_secs);
        encode(&Header::new(Algorithm::HS256), &claim, &keys.encoding)
            .map_err(|e| CodecError::Encoding(e.to_string()))
    }

    /// Verify signature and expiry against the wall clock.
    pub fn verify(&self, token: &str) -> Result<IdentityClaim, CodecError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify signature and expiry as if the current time were `now`.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<IdentityClaim, CodecError> {
        let keys = self.keys()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claim = decode::<IdentityClaim>(token, &keys.decoding, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => CodecError::Expired,
                _ => CodecError::Malformed,
            })?
            .claims;

        if claim.exp <= claim.iat {
            return Err(CodecError::Malformed);
        }
        if claim.is_expired_at(now) {
            return Err(CodecError::Expired);
        }

        Ok(claim)
    }

    fn keys(&self) -> Result<&SigningKeys, CodecError> {
        self.keys
            .as_ref()
            .ok_or(CodecError::Configuration("signing secret is not set"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    const T: i64 = 1_700_000_000;

    fn codec() -> TokenCodec {
        TokenCodec::new("s3cret", 3600)
    }

    fn fields() -> ClaimFields {
        ClaimFields::new("u1", Some("a@b.com".to_string()), "")
    }

    #[test]
    fn round_trip_returns_identical_claim() {
        let codec = codec();
        let token = codec.issue_at(fields(), T).unwrap();
        let claim = codec.verify_at(&token, T + 10).unwrap();

        assert_eq!(
            claim,
            IdentityClaim {
                sub: "u1".to_string(),
                email: Some("a@b.com".to_string()),
                name: String::new(),
                iat: T,
                exp: T + 3600,
            }
        );
    }

    #[test]
    fn issue_is_deterministic() {
        let codec = codec();
        let a = codec.issue_at(fields(), T).unwrap();
        let b = codec.issue_at(fields(), T).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn expired_after_exp_even_with_valid_signature() {
        let codec = codec();
        let token = codec.issue_at(fields(), T).unwrap();

        assert!(codec.verify_at(&token, T + 3600).is_ok());
        assert_eq!(codec.verify_at(&token, T + 3601), Err(CodecError::Expired));
    }

    #[test]
    fn any_single_bit_flip_in_signature_is_malformed() {
        let codec = codec();
        let token = codec.issue_at(fields(), T).unwrap();
        let (signed_part, signature) = token.rsplit_once('.').unwrap();
        let sig_bytes = URL_SAFE_NO_PAD.decode(signature).unwrap();

        for byte in 0..sig_bytes.len() {
            for bit in 0..8 {
                let mut tampered = sig_bytes.clone();
                tampered[byte] ^= 1 << bit;
                let forged = format!("{signed_part}.{}", URL_SAFE_NO_PAD.encode(&tampered));
                assert_eq!(
                    codec.verify_at(&forged, T + 10),
                    Err(CodecError::Malformed),
                    "bit {bit} of byte {byte}"
                );
            }
        }
    }

    #[test]
    fn altered_payload_is_malformed() {
        let codec = codec();
        let token = codec.issue_at(fields(), T).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let forged_payload = URL_SAFE_NO_PAD.encode(
            format!(r#"{{"sub":"admin","name":"","iat":{T},"exp":{}}}"#, T + 999_999).as_bytes(),
        );
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(codec.verify_at(&forged, T + 10), Err(CodecError::Malformed));
    }

    #[test]
    fn other_secret_is_malformed() {
        let token = codec().issue_at(fields(), T).unwrap();
        let other = TokenCodec::new("different", 3600);
        assert_eq!(other.verify_at(&token, T + 10), Err(CodecError::Malformed));
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(codec().verify_at("garbage", T), Err(CodecError::Malformed));
        assert_eq!(codec().verify_at("", T), Err(CodecError::Malformed));
        assert_eq!(codec().verify_at("a.b.c", T), Err(CodecError::Malformed));
    }

    #[test]
    fn exp_not_after_iat_is_malformed() {
        let claim = IdentityClaim {
            sub: "u1".to_string(),
            email: None,
            name: String::new(),
            iat: T,
            exp: T,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claim,
            &EncodingKey::from_secret(b"s3cret"),
        )
        .unwrap();

        assert_eq!(codec().verify_at(&token, T - 100), Err(CodecError::Malformed));
    }

    #[test]
    fn unconfigured_codec_refuses_to_operate() {
        let codec = TokenCodec::new("", 3600);
        assert!(!codec.is_configured());
        assert!(matches!(codec.issue(fields()), Err(CodecError::Configuration(_))));
        assert!(matches!(codec.verify("x.y.z"), Err(CodecError::Configuration(_))));
    }

    #[test]
    fn non_positive_ttl_refuses_to_issue() {
        let codec = TokenCodec::new("s3cret", 0);
        assert!(matches!(
            codec.issue_at(fields(), T),
            Err(CodecError::Configuration(_))
        ));
    }

    #[test]
    fn wall_clock_round_trip() {
        let codec = codec();
        let token = codec.issue(fields()).unwrap();
        assert_eq!(codec.verify(&token).unwrap().sub, "u1");
    }
}

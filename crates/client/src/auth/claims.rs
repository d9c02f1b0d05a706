//! Identity-claim decoding.
//!
//! The client projects the user from the token payload without verifying
//! the signature - verification is the backend's job, and the claims only
//! drive display and expiry scheduling here. Claim names follow the
//! provider's standard OpenID Connect profile scope.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use verdant_core::{UserId, UserProfile};

use crate::error::AuthError;

/// Claims projected from an identity or access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject identifier.
    pub sub: String,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Given name.
    #[serde(default)]
    pub given_name: Option<String>,
    /// Family name.
    #[serde(default)]
    pub family_name: Option<String>,
    /// Preferred username.
    #[serde(default)]
    pub preferred_username: Option<String>,
    /// Phone number.
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Expiry as a unix timestamp.
    #[serde(default)]
    pub exp: Option<i64>,
}

impl IdentityClaims {
    /// Seconds until the token expires, negative when already expired.
    /// `None` when the token carries no `exp` claim.
    #[must_use]
    pub fn remaining_secs(&self, now: i64) -> Option<i64> {
        self.exp.map(|exp| exp - now)
    }

    /// Whether the token is certainly expired at `now`.
    ///
    /// A token with no `exp` claim is never *certainly* expired.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp.is_some_and(|exp| exp <= now)
    }

    /// Build the user projection from the claims.
    #[must_use]
    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            id: UserId::new(self.sub.clone()),
            email: self.email.clone(),
            first_name: self.given_name.clone(),
            last_name: self.family_name.clone(),
            preferred_username: self.preferred_username.clone(),
            phone: self.phone_number.clone(),
        }
    }
}

/// Decode the payload of a JWT into identity claims.
///
/// # Errors
///
/// Fails when the token is not a three-part JWT, the payload is not valid
/// base64url, or the payload JSON lacks a subject.
pub fn decode_claims(token: &str) -> Result<IdentityClaims, AuthError> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::Decode("token is not a JWT".to_string()));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| AuthError::Decode(format!("payload is not base64url: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::Decode(format!("payload is not a claim set: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn token_with_payload(payload: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).unwrap());
        format!("{header}.{body}.signature")
    }

    #[test]
    fn test_decode_standard_claims() {
        let token = token_with_payload(&serde_json::json!({
            "sub": "sub-1",
            "email": "jo@example.com",
            "given_name": "Jo",
            "family_name": "March",
            "preferred_username": "jo",
            "exp": 2_000_000_000_i64,
        }));

        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.sub, "sub-1");
        assert_eq!(claims.exp, Some(2_000_000_000));

        let profile = claims.to_profile();
        assert_eq!(profile.full_name(), "Jo March");
        assert_eq!(profile.preferred_username.as_deref(), Some("jo"));
    }

    #[test]
    fn test_missing_optional_claims_decode() {
        let token = token_with_payload(&serde_json::json!({ "sub": "sub-2" }));
        let claims = decode_claims(&token).unwrap();
        assert!(claims.email.is_none());
        assert!(claims.exp.is_none());
        assert!(!claims.is_expired_at(i64::MAX));
    }

    #[test]
    fn test_expiry_checks() {
        let token = token_with_payload(&serde_json::json!({ "sub": "s", "exp": 1_000 }));
        let claims = decode_claims(&token).unwrap();
        assert!(claims.is_expired_at(1_000));
        assert!(!claims.is_expired_at(999));
        assert_eq!(claims.remaining_secs(900), Some(100));
    }

    #[test]
    fn test_rejects_opaque_tokens() {
        assert!(matches!(
            decode_claims("not-a-jwt"),
            Err(AuthError::Decode(_))
        ));
        assert!(matches!(
            decode_claims("a.b.c.d"),
            Err(AuthError::Decode(_))
        ));
        assert!(matches!(
            decode_claims("aa.!!.cc"),
            Err(AuthError::Decode(_))
        ));
    }
}

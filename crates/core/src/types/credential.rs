//! Credential bundle issued by the identity provider.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// The token pair plus lifetime metadata from a token-endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialBundle {
    /// Bearer credential for protected API calls.
    pub access_token: String,
    /// OpenID Connect identity token, when the provider issued one.
    pub id_token: Option<String>,
    /// Credential used to obtain new bundles.
    pub refresh_token: Option<String>,
    /// Token type, normally `Bearer`.
    pub token_type: String,
    /// Issued lifetime in seconds.
    pub expires_in: Option<i64>,
    /// Unix timestamp when the bundle was obtained.
    pub obtained_at: i64,
}

impl CredentialBundle {
    /// Unix timestamp at which the issued lifetime runs out, if known.
    ///
    /// The decoded `exp` claim is the authoritative expiry; this is the
    /// fallback when the access token cannot be decoded.
    #[must_use]
    pub fn expires_at(&self) -> Option<i64> {
        self.expires_in
            .map(|expires_in| self.obtained_at + expires_in)
    }

    /// Whether the issued lifetime had run out at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at().is_some_and(|expires_at| now >= expires_at)
    }

    /// Whether the issued lifetime has run out.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }
}

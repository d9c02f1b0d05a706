//! The authenticated user projection.

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// The user as projected from the identity provider's claims.
///
/// This is never independently fetched while the claims decode cleanly; the
/// user-info endpoint is only consulted when they do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// The provider's subject identifier.
    pub id: UserId,
    /// Email address, when the provider released it.
    pub email: Option<String>,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Preferred username, when distinct from the email.
    pub preferred_username: Option<String>,
    /// Phone number, when the provider released it.
    pub phone: Option<String>,
}

impl UserProfile {
    /// The user's full name, falling back to whatever parts exist.
    #[must_use]
    pub fn full_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => String::new(),
        }
    }

    /// A short display label: name, username, or email, in that order.
    #[must_use]
    pub fn display_label(&self) -> String {
        let name = self.full_name();
        if !name.is_empty() {
            return name;
        }
        if let Some(username) = &self.preferred_username {
            return username.clone();
        }
        self.email.clone().unwrap_or_else(|| self.id.to_string())
    }
}

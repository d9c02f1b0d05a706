//! Error taxonomy for the engine.
//!
//! Every fallible call returns a typed `Result`; callers branch on these
//! variants instead of duck-typing message fields. A degraded local state is
//! deliberately *not* an error - it is a store condition reported through
//! [`crate::commerce::MutationOutcome`] and [`crate::commerce::SyncState`].

use thiserror::Error;

/// Errors surfaced by the request gateway and the commerce API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure, or a non-2xx response with no actionable
    /// classification. Commerce stores recover from this locally.
    #[error("network error: {0}")]
    Network(String),

    /// Structured rejection from the backend (4xx with a message body),
    /// surfaced verbatim. No local fallback makes sense for these.
    #[error("{0}")]
    Validation(String),

    /// A protected call failed authorization even after the single
    /// refresh-and-retry. The session has been cleared; the caller should
    /// send the shopper back to login.
    #[error("session expired, sign in again")]
    SessionExpired,
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// Errors surfaced by the auth session manager and the identity provider.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The anti-forgery state returned on the login callback did not match
    /// the value stored when the login began. The login is rejected.
    #[error("login callback state mismatch")]
    StateMismatch,

    /// A refresh was attempted against a certainly-expired credential; the
    /// session has been logged out.
    #[error("credential expired")]
    CredentialExpired,

    /// The identity provider rejected a request or was unreachable.
    #[error("identity provider error: {0}")]
    Provider(String),

    /// A token could not be decoded into identity claims.
    #[error("token decode error: {0}")]
    Decode(String),

    /// An operation that needs an authenticated session found none.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The persistent store failed while reading or writing session state.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        Self::Provider(err.to_string())
    }
}

/// Errors surfaced by the persistent store adapter.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Underlying storage I/O failed.
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted record could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A persisted record carries a schema version this build cannot read.
    #[error("unsupported schema version {found} (this build reads {expected})")]
    SchemaVersion {
        /// Version this build writes and reads.
        expected: u32,
        /// Version found in the stored record.
        found: u32,
    },
}

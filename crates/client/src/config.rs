//! Engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `VERDANT_API_BASE_URL` - Commerce API origin (e.g., <https://shop.example.com/api>)
//! - `VERDANT_OIDC_PROVIDER_URL` - Identity provider origin
//! - `VERDANT_OIDC_REALM` - Provider realm / tenant identifier
//! - `VERDANT_OIDC_CLIENT_ID` - OAuth client identifier
//! - `VERDANT_OIDC_REDIRECT_URI` - Callback URI registered with the provider
//!
//! ## Optional
//! - `VERDANT_OIDC_CLIENT_SECRET` - Client secret (confidential clients only)
//! - `VERDANT_STATE_DIR` - Directory for the boot cache (default: `.verdant`)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Values that mean someone shipped the sample config (case-insensitive).
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "your-",
    "todo",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Commerce API origin, without a trailing slash.
    pub api_base_url: String,
    /// Identity provider configuration.
    pub oidc: OidcConfig,
    /// Directory holding the persisted boot cache.
    pub state_dir: PathBuf,
    /// Sentry DSN for error tracking.
    pub sentry_dsn: Option<String>,
}

/// Identity provider configuration.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct OidcConfig {
    /// Provider origin (e.g., <https://id.example.com>).
    pub provider_url: String,
    /// Realm / tenant identifier.
    pub realm: String,
    /// OAuth client identifier.
    pub client_id: String,
    /// Client secret for confidential clients.
    pub client_secret: Option<SecretString>,
    /// Callback URI registered with the provider.
    pub redirect_uri: String,
}

impl std::fmt::Debug for OidcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcConfig")
            .field("provider_url", &self.provider_url)
            .field("realm", &self.realm)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = get_base_url("VERDANT_API_BASE_URL")?;
        let oidc = OidcConfig::from_env()?;
        let state_dir = PathBuf::from(get_env_or_default("VERDANT_STATE_DIR", ".verdant"));
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            api_base_url,
            oidc,
            state_dir,
            sentry_dsn,
        })
    }
}

impl OidcConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let client_secret = match get_optional_env("VERDANT_OIDC_CLIENT_SECRET") {
            Some(value) => {
                validate_secret_strength(&value, "VERDANT_OIDC_CLIENT_SECRET")?;
                Some(SecretString::from(value))
            }
            None => None,
        };

        Ok(Self {
            provider_url: get_base_url("VERDANT_OIDC_PROVIDER_URL")?,
            realm: get_required_env("VERDANT_OIDC_REALM")?,
            client_id: get_required_env("VERDANT_OIDC_CLIENT_ID")?,
            client_secret,
            redirect_uri: get_required_env("VERDANT_OIDC_REDIRECT_URI")?,
        })
    }

    /// The realm's OpenID Connect endpoint for the given leaf.
    ///
    /// Keycloak layout: `{provider}/realms/{realm}/protocol/openid-connect/{leaf}`.
    #[must_use]
    pub fn endpoint(&self, leaf: &str) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/{leaf}",
            self.provider_url, self.realm
        )
    }

    /// Expose the client secret for a token-endpoint form, if configured.
    #[must_use]
    pub fn client_secret_value(&self) -> Option<String> {
        self.client_secret
            .as_ref()
            .map(|secret| secret.expose_secret().to_string())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a required URL, validated and stripped of any trailing slash.
fn get_base_url(key: &str) -> Result<String, ConfigError> {
    let value = get_required_env(key)?;
    Url::parse(&value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    Ok(value.trim_end_matches('/').to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

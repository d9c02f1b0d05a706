//! OpenID Connect token-endpoint client.
//!
//! Talks to the identity provider's standard endpoints: the authorization
//! endpoint (redirect-based code grant), the token endpoint
//! (authorization-code and refresh-token grants), the user-info endpoint,
//! and the end-session endpoint. The provider's internal login flow is not
//! this client's business - it only consumes the token-issuance contract.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use verdant_core::CredentialBundle;

use crate::auth::claims::IdentityClaims;
use crate::config::OidcConfig;
use crate::error::AuthError;

/// Client for the identity provider's OpenID Connect endpoints.
#[derive(Clone)]
pub struct OidcClient {
    inner: Arc<OidcClientInner>,
}

struct OidcClientInner {
    client: reqwest::Client,
    config: OidcConfig,
}

/// Raw token response from the provider's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    id_token: Option<String>,
    refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: Option<i64>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl From<TokenResponse> for CredentialBundle {
    fn from(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            id_token: response.id_token,
            refresh_token: response.refresh_token,
            token_type: response.token_type,
            expires_in: response.expires_in,
            obtained_at: Utc::now().timestamp(),
        }
    }
}

impl OidcClient {
    /// Create a new provider client.
    #[must_use]
    pub fn new(config: OidcConfig) -> Self {
        Self {
            inner: Arc::new(OidcClientInner {
                client: reqwest::Client::new(),
                config,
            }),
        }
    }

    /// Generate the authorization URL for login.
    ///
    /// Redirect the user agent to this URL to begin the code grant; `state`
    /// is the anti-forgery token validated when the callback returns.
    #[must_use]
    pub fn authorization_url(&self, state: &str) -> String {
        let config = &self.inner.config;
        format!(
            "{}?client_id={}&response_type=code&scope=openid%20profile%20email&redirect_uri={}&state={}",
            config.endpoint("auth"),
            urlencoding::encode(&config.client_id),
            urlencoding::encode(&config.redirect_uri),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for a credential bundle.
    ///
    /// # Errors
    ///
    /// Returns an error if the token exchange fails.
    pub async fn exchange_code(&self, code: &str) -> Result<CredentialBundle, AuthError> {
        let config = &self.inner.config;
        let mut params = vec![
            ("grant_type", "authorization_code".to_string()),
            ("client_id", config.client_id.clone()),
            ("code", code.to_string()),
            ("redirect_uri", config.redirect_uri.clone()),
        ];
        if let Some(secret) = config.client_secret_value() {
            params.push(("client_secret", secret));
        }

        self.token_request(&params).await
    }

    /// Exchange a refresh credential for a new bundle.
    ///
    /// # Errors
    ///
    /// Returns an error if the token refresh fails.
    pub async fn refresh(&self, refresh_token: &str) -> Result<CredentialBundle, AuthError> {
        let config = &self.inner.config;
        let mut params = vec![
            ("grant_type", "refresh_token".to_string()),
            ("client_id", config.client_id.clone()),
            ("refresh_token", refresh_token.to_string()),
        ];
        if let Some(secret) = config.client_secret_value() {
            params.push(("client_secret", secret));
        }

        self.token_request(&params).await
    }

    /// Look up the user's claims at the user-info endpoint.
    ///
    /// Only used when a persisted access token cannot be decoded locally.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    pub async fn user_info(&self, access_token: &str) -> Result<IdentityClaims, AuthError> {
        let response = self
            .inner
            .client
            .get(self.inner.config.endpoint("userinfo"))
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::Provider(format!(
                "user-info lookup failed ({status}): {text}"
            )));
        }

        Ok(response.json().await?)
    }

    /// Notify the provider that the session is ending.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unreachable or rejects the
    /// request; callers treat this as best-effort.
    pub async fn end_session(&self, refresh_token: &str) -> Result<(), AuthError> {
        let config = &self.inner.config;
        let mut params = vec![
            ("client_id", config.client_id.clone()),
            ("refresh_token", refresh_token.to_string()),
        ];
        if let Some(secret) = config.client_secret_value() {
            params.push(("client_secret", secret));
        }

        let response = self
            .inner
            .client
            .post(config.endpoint("logout"))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AuthError::Provider(format!("logout failed ({status})")));
        }
        Ok(())
    }

    async fn token_request(
        &self,
        params: &[(&str, String)],
    ) -> Result<CredentialBundle, AuthError> {
        let response = self
            .inner
            .client
            .post(self.inner.config.endpoint("token"))
            .form(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::Provider(format!(
                "token request failed ({status}): {text}"
            )));
        }

        let token_response: TokenResponse = response.json().await?;
        Ok(token_response.into())
    }
}

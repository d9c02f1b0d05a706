//! Request gateway for the commerce API.
//!
//! Every outbound commerce call goes through here. The gateway classifies
//! endpoints as public or protected, attaches the bearer credential to
//! protected calls, performs exactly one transactional refresh-and-retry
//! when a protected call comes back 401, and normalizes every other
//! non-2xx response to a single message string so callers never branch on
//! transport shapes.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{ApiError, AuthError};

/// Read-only surfaces that never carry a credential.
const PUBLIC_PREFIXES: &[&str] = &["/products", "/categories", "/orders"];

/// Whether an endpoint may be called without credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Read-only catalog, category and order-lookup surfaces.
    Public,
    /// Everything else; receives a bearer credential when one is present.
    Protected,
}

/// Classify an API path.
#[must_use]
pub fn classify(path: &str) -> Access {
    if PUBLIC_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
    {
        Access::Public
    } else {
        Access::Protected
    }
}

/// The gateway's view of the auth session.
///
/// Implemented by [`crate::auth::AuthSessionManager`]; a trait so gateway
/// behavior can be exercised against scripted credentials in tests.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Current bearer credential, if the session holds one.
    async fn bearer(&self) -> Option<String>;
    /// Perform the single transactional refresh; returns the new bearer
    /// credential.
    async fn renew(&self) -> Result<String, AuthError>;
    /// Clear the session after an unrecoverable authorization failure.
    async fn invalidate(&self);
}

/// Gateway over the commerce API.
pub struct RequestGateway {
    client: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialSource>,
}

impl RequestGateway {
    /// Create a gateway for the API at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Issue a request and deserialize the JSON response.
    ///
    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T, ApiError> {
        let response = self.send(method, path, body).await?;
        response
            .json()
            .await
            .map_err(|err| ApiError::Network(format!("malformed response body: {err}")))
    }

    /// Like [`Self::send_json`], but a 404 becomes `None` instead of an
    /// error - used for resources that legitimately may not exist yet.
    ///
    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn send_optional_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Option<T>, ApiError> {
        let response = self.dispatch(method, path, body).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check(response).await?;
        let value = response
            .json()
            .await
            .map_err(|err| ApiError::Network(format!("malformed response body: {err}")))?;
        Ok(Some(value))
    }

    /// Issue a request, discarding any response body.
    ///
    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn send_unit(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<(), ApiError> {
        self.send(method, path, body).await.map(|_| ())
    }

    /// Issue a multipart request (image/file upload).
    ///
    /// The content type is left to the transport so it can set the correct
    /// multipart boundary. Multipart bodies are not replayable, so this
    /// path does not retry on 401.
    ///
    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn send_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        let mut request = self.client.post(self.url(path)).multipart(form);
        if classify(path) == Access::Protected
            && let Some(token) = self.credentials.bearer().await
        {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let response = Self::check(response).await?;
        response
            .json()
            .await
            .map_err(|err| ApiError::Network(format!("malformed response body: {err}")))
    }

    /// Issue a request with classification, credential attachment, and the
    /// single refresh-and-retry on 401.
    ///
    /// # Errors
    ///
    /// - [`ApiError::SessionExpired`] when a protected call stays 401 after
    ///   the one refresh-and-retry (credentials are cleared first).
    /// - [`ApiError::Validation`] for structured 4xx rejections.
    /// - [`ApiError::Network`] for everything else.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let response = self.dispatch(method, path, body).await?;
        Self::check(response).await
    }

    /// Dispatch with classification, credential attachment, and the single
    /// refresh-and-retry; status mapping (other than the 401 escalation) is
    /// left to the caller.
    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let access = classify(path);
        let token = match access {
            Access::Protected => self.credentials.bearer().await,
            Access::Public => None,
        };

        let response = self
            .execute(method.clone(), path, body, token.as_deref())
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED && access == Access::Protected {
            debug!(%path, "401 on protected call, attempting one refresh");
            let renewed = match self.credentials.renew().await {
                Ok(token) => token,
                Err(err) => {
                    warn!(error = %err, "credential refresh failed, session cleared");
                    self.credentials.invalidate().await;
                    return Err(ApiError::SessionExpired);
                }
            };

            let retry = self.execute(method, path, body, Some(&renewed)).await?;
            if retry.status() == StatusCode::UNAUTHORIZED {
                warn!(%path, "still unauthorized after refresh, session cleared");
                self.credentials.invalidate().await;
                return Err(ApiError::SessionExpired);
            }
            return Ok(retry);
        }

        Ok(response)
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        bearer: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut request = self.client.request(method, self.url(path));
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Map a non-2xx response to the error taxonomy.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(status, &body);

        if status.is_client_error() && body_has_structured_message(&body) {
            Err(ApiError::Validation(message))
        } else {
            Err(ApiError::Network(format!("{} {message}", status.as_u16())))
        }
    }
}

/// Extract a human-readable message from an error body.
///
/// Fixed priority: `error` field, then `detail`, then `message`, then the
/// transport status text.
fn extract_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "detail", "message"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                return message.to_string();
            }
        }
    }
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

/// Whether the body carries one of the recognized message fields.
fn body_has_structured_message(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body).is_ok_and(|value| {
        ["error", "detail", "message"]
            .iter()
            .any(|key| value.get(key).and_then(|v| v.as_str()).is_some())
    })
}

//! Auth session manager.
//!
//! Owns the authenticated identity: authorization-code exchange, proactive
//! credential renewal, logout, and rehydration on process start. Commerce
//! stores learn about authentication transitions through the watch channel
//! exposed by [`AuthSessionManager::subscribe`]; nothing here imports the
//! stores.

pub mod claims;
pub mod oidc;
pub mod renewal;

pub use oidc::OidcClient;

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};
use verdant_core::{CredentialBundle, UserProfile};

use crate::error::AuthError;
use crate::gateway::CredentialSource;
use crate::persist::{SessionRecord, StateStore, keys, load_record, save_record};

use claims::decode_claims;
use renewal::{RETRY_DELAY, RenewalTimer, renewal_delay};

/// Length of the anti-forgery state token.
const STATE_TOKEN_LENGTH: usize = 32;

/// Manages the authenticated session: login, renewal, logout, rehydration.
///
/// Construct once with [`AuthSessionManager::new`] and share by `Arc`; the
/// manager spawns its own renewal timer and needs no other background
/// wiring.
pub struct AuthSessionManager {
    oidc: OidcClient,
    store: Arc<dyn StateStore>,
    state: Mutex<SessionRecord>,
    auth_tx: watch::Sender<bool>,
    timer: RenewalTimer,
    weak_self: Weak<Self>,
}

impl AuthSessionManager {
    /// Create a new, unauthenticated session manager.
    #[must_use]
    pub fn new(oidc: OidcClient, store: Arc<dyn StateStore>) -> Arc<Self> {
        let (auth_tx, _) = watch::channel(false);
        Arc::new_cyclic(|weak| Self {
            oidc,
            store,
            state: Mutex::new(SessionRecord::default()),
            auth_tx,
            timer: RenewalTimer::default(),
            weak_self: weak.clone(),
        })
    }

    /// Subscribe to authentication-state transitions.
    ///
    /// The channel publishes `true` when a session becomes authenticated
    /// and `false` when it ends.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.auth_tx.subscribe()
    }

    /// Whether the session is currently authenticated.
    pub async fn is_authenticated(&self) -> bool {
        self.state.lock().await.authenticated
    }

    /// The current user projection, if authenticated.
    pub async fn current_user(&self) -> Option<UserProfile> {
        self.state.lock().await.user.clone()
    }

    /// Begin a login: returns the authorization URL to send the user agent
    /// to.
    ///
    /// The generated anti-forgery state survives only the redirect round
    /// trip; it is consumed by the next [`Self::complete_login`] call.
    ///
    /// # Errors
    ///
    /// Fails if the state token cannot be persisted (without it the
    /// callback could not be validated).
    pub async fn begin_login(&self) -> Result<String, AuthError> {
        let state_token = random_token(STATE_TOKEN_LENGTH);
        save_record(self.store.as_ref(), keys::OAUTH_STATE, &state_token).await?;
        Ok(self.oidc.authorization_url(&state_token))
    }

    /// Complete a login from the provider callback.
    ///
    /// Validates the returned anti-forgery state against the stored value -
    /// a mismatch rejects the login outright - then exchanges the code,
    /// decodes the identity claims, persists the bundle, and marks the
    /// session authenticated.
    ///
    /// # Errors
    ///
    /// [`AuthError::StateMismatch`] on a bad state token, or a provider /
    /// decode error from the exchange.
    pub async fn complete_login(
        &self,
        code: &str,
        returned_state: &str,
    ) -> Result<UserProfile, AuthError> {
        let stored: Option<String> = load_record(self.store.as_ref(), keys::OAUTH_STATE)
            .await
            .unwrap_or_else(|err| {
                warn!(error = %err, "stored login state unreadable");
                None
            });

        // One-time use: consumed on every callback attempt, match or not
        if let Err(err) = self.store.remove(keys::OAUTH_STATE).await {
            warn!(error = %err, "failed to clear stored login state");
        }

        if stored.as_deref() != Some(returned_state) {
            warn!("login callback state mismatch, rejecting login");
            return Err(AuthError::StateMismatch);
        }

        let bundle = self.oidc.exchange_code(code).await?;
        let profile = self.install_bundle(bundle).await?;
        info!(user = %profile.display_label(), "session authenticated");
        Ok(profile)
    }

    /// Exchange the refresh credential for a new bundle.
    ///
    /// On failure: if the access credential is certainly expired the
    /// session is logged out; otherwise the failure is transient and the
    /// renewal timer retries shortly.
    ///
    /// # Errors
    ///
    /// [`AuthError::CredentialExpired`] after a forced logout, the
    /// provider error otherwise.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let (refresh_token, bundle) = {
            let state = self.state.lock().await;
            let Some(bundle) = state.credentials.clone() else {
                return Err(AuthError::NotAuthenticated);
            };
            match bundle.refresh_token.clone() {
                Some(token) => (token, bundle),
                None => {
                    drop(state);
                    warn!("no refresh credential, session cannot be renewed");
                    self.logout().await;
                    return Err(AuthError::CredentialExpired);
                }
            }
        };

        match self.oidc.refresh(&refresh_token).await {
            Ok(new_bundle) => {
                self.install_bundle(new_bundle).await?;
                debug!("credentials renewed");
                Ok(())
            }
            Err(err) => {
                let now = Utc::now().timestamp();
                let certainly_expired =
                    access_remaining(&bundle, now).is_some_and(|remaining| remaining <= 0);
                if certainly_expired {
                    warn!(error = %err, "refresh failed and credential is expired, logging out");
                    self.logout().await;
                    Err(AuthError::CredentialExpired)
                } else {
                    warn!(error = %err, "refresh failed, treating as transient");
                    Err(err)
                }
            }
        }
    }

    /// End the session.
    ///
    /// Notifies the identity provider on a best-effort basis - local logout
    /// proceeds whether or not the provider is reachable - then clears the
    /// persisted credentials and the user projection.
    pub async fn logout(&self) {
        self.timer.cancel();

        let refresh_token = {
            let state = self.state.lock().await;
            state
                .credentials
                .as_ref()
                .and_then(|bundle| bundle.refresh_token.clone())
        };
        if let Some(token) = refresh_token
            && let Err(err) = self.oidc.end_session(&token).await
        {
            warn!(error = %err, "provider logout failed, clearing local session anyway");
        }

        {
            let mut state = self.state.lock().await;
            *state = SessionRecord::default();
        }
        if let Err(err) = self.store.remove(keys::SESSION).await {
            warn!(error = %err, "failed to clear persisted session");
        }
        self.auth_tx.send_replace(false);
        info!("session logged out");
    }

    /// Rehydrate the session from the boot cache on process start.
    ///
    /// Decodes the persisted access credential (or, when it does not
    /// decode, performs a user-info lookup). Any failure clears the
    /// persisted credentials and leaves the session unauthenticated rather
    /// than erroring the caller. Returns whether the session is
    /// authenticated.
    pub async fn check_status(&self) -> bool {
        let record = match load_record::<SessionRecord>(self.store.as_ref(), keys::SESSION).await
        {
            Ok(Some(record)) => record,
            Ok(None) => return false,
            Err(err) => {
                warn!(error = %err, "persisted session unreadable, clearing");
                let _ = self.store.remove(keys::SESSION).await;
                return false;
            }
        };
        let Some(bundle) = record.credentials else {
            let _ = self.store.remove(keys::SESSION).await;
            return false;
        };

        match self.install_bundle(bundle).await {
            Ok(profile) => {
                info!(user = %profile.display_label(), "session rehydrated");
                true
            }
            // install_bundle already logged out for an expired credential
            Err(AuthError::CredentialExpired) => false,
            Err(err) => {
                warn!(error = %err, "session rehydration failed, clearing");
                self.logout().await;
                false
            }
        }
    }

    /// Adopt a credential bundle: decode claims, persist, publish, and
    /// rearm the renewal timer.
    async fn install_bundle(&self, bundle: CredentialBundle) -> Result<UserProfile, AuthError> {
        let now = Utc::now().timestamp();

        // Claims come from the identity token, falling back to the access
        // token, then to a user-info lookup.
        let identity_claims = bundle
            .id_token
            .as_deref()
            .and_then(|token| decode_claims(token).ok())
            .or_else(|| decode_claims(&bundle.access_token).ok());
        let profile = match identity_claims {
            Some(claims) => claims.to_profile(),
            None => {
                debug!("tokens do not decode, consulting user-info endpoint");
                self.oidc.user_info(&bundle.access_token).await?.to_profile()
            }
        };

        match access_remaining(&bundle, now) {
            Some(remaining) => match renewal_delay(remaining) {
                Some(delay) => self.schedule_renewal(delay),
                None => {
                    warn!("credential bundle already expired, logging out");
                    self.logout().await;
                    return Err(AuthError::CredentialExpired);
                }
            },
            // Unknown lifetime: nothing to schedule against
            None => self.timer.cancel(),
        }

        {
            let mut state = self.state.lock().await;
            state.user = Some(profile.clone());
            state.credentials = Some(bundle);
            state.authenticated = true;
            if let Err(err) = save_record(self.store.as_ref(), keys::SESSION, &*state).await {
                warn!(error = %err, "failed to persist session state");
            }
        }
        self.auth_tx.send_replace(true);
        Ok(profile)
    }

    fn schedule_renewal(&self, delay: Duration) {
        let Some(manager) = self.weak_self.upgrade() else {
            return;
        };
        debug!(delay_secs = delay.as_secs(), "renewal scheduled");
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            manager.renewal_tick().await;
        });
        self.timer.replace(handle.abort_handle());
    }

    async fn renewal_tick(&self) {
        match self.refresh().await {
            Ok(()) => {}
            // refresh already logged the session out
            Err(AuthError::CredentialExpired) => {}
            Err(err) => {
                debug!(error = %err, "transient renewal failure, retrying shortly");
                self.schedule_renewal(RETRY_DELAY);
            }
        }
    }
}

#[async_trait::async_trait]
impl CredentialSource for AuthSessionManager {
    async fn bearer(&self) -> Option<String> {
        let state = self.state.lock().await;
        if state.authenticated {
            state
                .credentials
                .as_ref()
                .map(|bundle| bundle.access_token.clone())
        } else {
            None
        }
    }

    async fn renew(&self) -> Result<String, AuthError> {
        self.refresh().await?;
        let state = self.state.lock().await;
        state
            .credentials
            .as_ref()
            .map(|bundle| bundle.access_token.clone())
            .ok_or(AuthError::NotAuthenticated)
    }

    async fn invalidate(&self) {
        self.logout().await;
    }
}

/// Seconds of access-credential lifetime left, by decoded expiry first,
/// falling back to the issued lifetime. `None` when neither is known.
fn access_remaining(bundle: &CredentialBundle, now: i64) -> Option<i64> {
    decode_claims(&bundle.access_token)
        .ok()
        .and_then(|claims| claims.remaining_secs(now))
        .or_else(|| bundle.expires_at().map(|expires_at| expires_at - now))
}

/// Generate a random alphanumeric token.
fn random_token(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            // SAFETY: idx is always within bounds since random_range returns 0..CHARSET.len()
            char::from(*CHARSET.get(idx).expect("idx within bounds"))
        })
        .collect()
}

//! Token lifecycle manager.
//!
//! [`SessionManager`] owns the persisted session (access token, refresh
//! token, expiry, cached user record) and keeps the engine's bearer token
//! in step with it.
//!
//! ```text
//! Anonymous ──login/signup──▶ Authenticated ──expiry──▶ Expired
//!     ▲                            ▲                       │
//!     │                            └──────refresh ok───────┤
//!     └───────────logout / refresh failed──────────────────┘
//! ```
//!
//! Every mutation runs under one async mutex, so concurrent callers never
//! interleave writes and at most one refresh is in flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use chefbot_core::auth::{
    AuthResponse, CredentialsRequest, GoogleProfile, RefreshTokenRequest, SecureLoginRequest,
};
use chefbot_core::device::DeviceIdentity;
use chefbot_core::error::CoreError;
use chefbot_core::types::{self, Timestamp};
use chefbot_core::user::UserRecord;
use chefbot_core::{credentials, endpoints, storage_keys};

use crate::config::ClientConfig;
use crate::device::DeviceRegistry;
use crate::engine::{RequestEngine, RequestOptions};
use crate::error::{ClientError, ClientResult};
use crate::storage::SessionStorage;

/// Snapshot of the persisted session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// `None` when the stored expiry is missing or unreadable; such a
    /// session counts as expired.
    pub expires_at: Option<Timestamp>,
    pub user: Option<UserRecord>,
}

impl Session {
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        is_expired(self.expires_at, now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now())
    }
}

/// Coarse session state, without triggering a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
    Expired,
}

/// Which flow produced an [`AuthResponse`]. A refresh keeps the stored
/// refresh token and user record when the response omits them; every
/// sign-in replaces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthSource {
    SignIn,
    Refresh,
}

/// Owns the persisted session and serializes every change to it.
pub struct SessionManager<S: SessionStorage> {
    engine: Arc<RequestEngine>,
    storage: Arc<S>,
    devices: DeviceRegistry<S>,
    token_lifetime: chrono::Duration,
    write_lock: Mutex<()>,
    /// Bumped whenever the stored token changes; lets a queued refresh see
    /// that another caller already refreshed.
    generation: AtomicU64,
}

impl<S: SessionStorage> SessionManager<S> {
    pub fn new(engine: Arc<RequestEngine>, storage: Arc<S>, config: &ClientConfig) -> Self {
        let devices = DeviceRegistry::new(storage.clone(), config.platform.clone());
        Self {
            engine,
            storage,
            devices,
            token_lifetime: config.token_lifetime,
            write_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// The device identity of this install, created on first use.
    pub async fn device(&self) -> ClientResult<&DeviceIdentity> {
        self.devices.identity().await
    }

    // -----------------------------------------------------------------------
    // Sign-in flows
    // -----------------------------------------------------------------------

    /// Sign in with email and password.
    ///
    /// Tries the device-aware endpoint first; any failure there (older
    /// backend, network, rejection) falls back to the plain login endpoint.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Session> {
        credentials::validate_login(email, password)?;
        let email = email.trim();

        let _guard = self.write_lock.lock().await;

        let response = match self.secure_login(email, password).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Secure login failed, falling back to plain login");
                let body = serde_json::to_value(CredentialsRequest { email, password })?;
                self.engine
                    .request(endpoints::LOGIN, &RequestOptions::post_json(body))
                    .await?
            }
        };

        let session = self.store_auth(response, AuthSource::SignIn).await?;
        tracing::info!("Logged in");
        Ok(session)
    }

    /// Create an account and sign in to it.
    pub async fn signup(&self, email: &str, password: &str) -> ClientResult<Session> {
        credentials::validate_signup(email, password)?;
        let email = email.trim();

        let _guard = self.write_lock.lock().await;

        let body = serde_json::to_value(CredentialsRequest { email, password })?;
        let response = self
            .engine
            .request(endpoints::SIGNUP, &RequestOptions::post_json(body))
            .await?;

        let session = self.store_auth(response, AuthSource::SignIn).await?;
        tracing::info!("Signed up");
        Ok(session)
    }

    /// Exchange a completed Google sign-in for a backend session.
    pub async fn google_login(&self, profile: &GoogleProfile) -> ClientResult<Session> {
        credentials::validate_email(&profile.email)?;
        if profile.id_token.trim().is_empty() {
            return Err(CoreError::Validation("Google ID token must not be empty".into()).into());
        }

        let _guard = self.write_lock.lock().await;

        let body = serde_json::to_value(profile)?;
        let response = self
            .engine
            .request(endpoints::GOOGLE_AUTH, &RequestOptions::post_json(body))
            .await?;

        let session = self.store_auth(response, AuthSource::SignIn).await?;
        tracing::info!("Logged in with Google");
        Ok(session)
    }

    // -----------------------------------------------------------------------
    // Token access
    // -----------------------------------------------------------------------

    /// A usable access token, refreshing an expired one first.
    ///
    /// Returns `Ok(None)` when there is no session, or when refresh failed
    /// and the session was cleared. Never returns an expired token.
    pub async fn get_valid_token(&self) -> ClientResult<Option<String>> {
        let _guard = self.write_lock.lock().await;

        let Some(token) = self.storage.get(storage_keys::ACCESS_TOKEN).await? else {
            self.engine.set_token(None).await;
            return Ok(None);
        };

        let expires_at = self.stored_expiry().await?;
        if !is_expired(expires_at, chrono::Utc::now()) {
            self.sync_engine(&token).await;
            return Ok(Some(token));
        }

        tracing::info!("Access token expired, refreshing");
        match self.refresh_locked().await {
            Ok(session) => Ok(Some(session.access_token)),
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, clearing session");
                self.logout_locked().await?;
                Ok(None)
            }
        }
    }

    /// Whether a usable session exists. May refresh an expired token.
    pub async fn is_authenticated(&self) -> ClientResult<bool> {
        Ok(self.get_valid_token().await?.is_some())
    }

    /// Restore a persisted session into the engine at start-up.
    pub async fn initialize(&self) -> ClientResult<bool> {
        let restored = self.get_valid_token().await?.is_some();
        tracing::info!(restored, "Session initialized");
        Ok(restored)
    }

    /// Exchange the stored refresh token for a new token pair.
    ///
    /// Callers that queued behind an in-flight refresh get its result
    /// instead of refreshing again. A missing or rejected refresh token
    /// clears the session and fails with [`ClientError::Auth`].
    pub async fn refresh(&self) -> ClientResult<Session> {
        let observed = self.generation.load(Ordering::Acquire);
        let _guard = self.write_lock.lock().await;

        if self.generation.load(Ordering::Acquire) != observed {
            if let Some(session) = self.load_session().await? {
                if !session.is_expired() {
                    tracing::debug!("Token already refreshed by a concurrent caller");
                    return Ok(session);
                }
            }
        }

        match self.refresh_locked().await {
            Ok(session) => Ok(session),
            Err(e @ ClientError::Auth(_)) => {
                if let Err(clear_err) = self.logout_locked().await {
                    tracing::error!(error = %clear_err, "Failed to clear session after refresh rejection");
                }
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// End the session.
    ///
    /// The server-side invalidation is best effort; local state is cleared
    /// regardless. Calling this without a session is a no-op.
    pub async fn logout(&self) -> ClientResult<()> {
        let _guard = self.write_lock.lock().await;
        self.logout_locked().await
    }

    // -----------------------------------------------------------------------
    // Cached state
    // -----------------------------------------------------------------------

    /// The persisted session, without refreshing it.
    pub async fn current_session(&self) -> ClientResult<Option<Session>> {
        self.load_session().await
    }

    pub async fn state(&self) -> ClientResult<SessionState> {
        Ok(match self.load_session().await? {
            None => SessionState::Anonymous,
            Some(session) if session.is_expired() => SessionState::Expired,
            Some(_) => SessionState::Authenticated,
        })
    }

    /// The cached user record, if any.
    pub async fn current_user(&self) -> ClientResult<Option<UserRecord>> {
        let Some(raw) = self.storage.get(storage_keys::USER).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<UserRecord>(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                tracing::warn!(error = %e, "Cached user record is unreadable");
                Ok(None)
            }
        }
    }

    /// Fetch `/api/auth/me` and replace the cached user record.
    ///
    /// A 401/403 from the backend means the token was revoked; the local
    /// session is cleared before the error is returned.
    pub async fn refresh_profile(&self) -> ClientResult<UserRecord> {
        if self.get_valid_token().await?.is_none() {
            return Err(ClientError::Auth("not signed in".into()));
        }

        let value = match self
            .engine
            .request_json(endpoints::PROFILE, &RequestOptions::get())
            .await
        {
            Ok(value) => value,
            Err(e) if e.is_auth_rejection() => {
                tracing::warn!(error = %e, "Backend rejected the session, clearing it");
                let _guard = self.write_lock.lock().await;
                self.logout_locked().await?;
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        let user = UserRecord::from_value(value)
            .ok_or_else(|| ClientError::Decode("profile response is not a user object".into()))?;

        let _guard = self.write_lock.lock().await;
        if self.storage.get(storage_keys::ACCESS_TOKEN).await?.is_none() {
            return Err(ClientError::Auth(
                "session ended while the profile was loading".into(),
            ));
        }
        self.storage
            .set(storage_keys::USER, &serde_json::to_string(&user)?)
            .await?;
        Ok(user)
    }

    // ---- private helpers (callers hold `write_lock`) ----

    async fn secure_login(&self, email: &str, password: &str) -> ClientResult<AuthResponse> {
        let device = self.devices.identity().await?;
        let body = serde_json::to_value(SecureLoginRequest::new(email, password, device))?;
        self.engine
            .request(endpoints::SECURE_LOGIN, &RequestOptions::post_json(body))
            .await
    }

    async fn refresh_locked(&self) -> ClientResult<Session> {
        let Some(refresh_token) = self.storage.get(storage_keys::REFRESH_TOKEN).await? else {
            return Err(ClientError::Auth("no refresh token stored".into()));
        };

        let body = serde_json::to_value(RefreshTokenRequest {
            refresh_token: &refresh_token,
        })?;
        let response: AuthResponse = self
            .engine
            .request(endpoints::REFRESH, &RequestOptions::post_json(body))
            .await
            .map_err(|e| match e {
                ClientError::Http {
                    status: 401 | 403,
                    detail,
                    body,
                    ..
                } => ClientError::Auth(detail.unwrap_or(body)),
                other => other,
            })?;

        let session = self.store_auth(response, AuthSource::Refresh).await?;
        tracing::info!("Access token refreshed");
        Ok(session)
    }

    async fn logout_locked(&self) -> ClientResult<()> {
        match self.storage.get(storage_keys::REFRESH_TOKEN).await {
            Ok(Some(refresh_token)) => {
                let body = RefreshTokenRequest {
                    refresh_token: &refresh_token,
                };
                match serde_json::to_value(body) {
                    Ok(body) => {
                        let options = RequestOptions::post_json(body).single_attempt();
                        if let Err(e) = self.engine.request_json(endpoints::LOGOUT, &options).await {
                            tracing::warn!(error = %e, "Server-side logout failed, clearing local session anyway");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Could not encode logout request");
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Could not read refresh token for server-side logout");
            }
        }

        let mut first_err = None;
        for key in storage_keys::SESSION_KEYS {
            if let Err(e) = self.storage.remove(key).await {
                tracing::error!(key, error = %e, "Failed to clear session key");
                first_err.get_or_insert(e);
            }
        }
        self.engine.set_token(None).await;
        self.generation.fetch_add(1, Ordering::AcqRel);

        match first_err {
            Some(e) => Err(e),
            None => {
                tracing::info!("Session cleared");
                Ok(())
            }
        }
    }

    async fn store_auth(&self, response: AuthResponse, source: AuthSource) -> ClientResult<Session> {
        if response.token.trim().is_empty() {
            return Err(ClientError::Decode("auth response carries no token".into()));
        }

        let expires_at = self.expiry_for(response.expires_in)?;

        self.storage
            .set(storage_keys::ACCESS_TOKEN, &response.token)
            .await?;
        self.storage
            .set(
                storage_keys::TOKEN_EXPIRY,
                &expires_at.timestamp_millis().to_string(),
            )
            .await?;

        match (&response.refresh_token, source) {
            (Some(refresh_token), _) => {
                self.storage
                    .set(storage_keys::REFRESH_TOKEN, refresh_token)
                    .await?
            }
            (None, AuthSource::SignIn) => self.storage.remove(storage_keys::REFRESH_TOKEN).await?,
            (None, AuthSource::Refresh) => {}
        }

        match (UserRecord::from_value(response.user), source) {
            (Some(user), _) => {
                self.storage
                    .set(storage_keys::USER, &serde_json::to_string(&user)?)
                    .await?
            }
            (None, AuthSource::SignIn) => self.storage.remove(storage_keys::USER).await?,
            (None, AuthSource::Refresh) => {}
        }

        self.engine.set_token(Some(response.token.clone())).await;
        self.generation.fetch_add(1, Ordering::AcqRel);

        let session = self.load_session().await?;
        session.ok_or_else(|| ClientError::Storage("stored session vanished".into()))
    }

    /// Expiry of a freshly issued token. An out-of-range `expires_in` falls
    /// back to the configured lifetime.
    fn expiry_for(&self, expires_in: Option<i64>) -> ClientResult<Timestamp> {
        let now = chrono::Utc::now();

        if let Some(secs) = expires_in.filter(|secs| *secs > 0) {
            match chrono::Duration::try_seconds(secs).and_then(|d| now.checked_add_signed(d)) {
                Some(at) => {
                    tracing::debug!(expires_in = secs, "Using server-declared token lifetime");
                    return Ok(at);
                }
                None => {
                    tracing::warn!(expires_in = secs, "Server-declared token lifetime out of range, using default");
                }
            }
        }

        now.checked_add_signed(self.token_lifetime)
            .ok_or_else(|| ClientError::Config("token lifetime out of range".into()))
    }

    async fn load_session(&self) -> ClientResult<Option<Session>> {
        let Some(access_token) = self.storage.get(storage_keys::ACCESS_TOKEN).await? else {
            return Ok(None);
        };
        Ok(Some(Session {
            access_token,
            refresh_token: self.storage.get(storage_keys::REFRESH_TOKEN).await?,
            expires_at: self.stored_expiry().await?,
            user: self.current_user().await?,
        }))
    }

    async fn stored_expiry(&self) -> ClientResult<Option<Timestamp>> {
        let Some(raw) = self.storage.get(storage_keys::TOKEN_EXPIRY).await? else {
            return Ok(None);
        };
        let parsed = raw.trim().parse::<i64>().ok().and_then(types::from_millis);
        if parsed.is_none() {
            tracing::warn!(raw = %raw, "Stored token expiry is unreadable, treating token as expired");
        }
        Ok(parsed)
    }

    async fn sync_engine(&self, token: &str) {
        if self.engine.token().await.as_deref() != Some(token) {
            self.engine.set_token(Some(token.to_string())).await;
        }
    }
}

/// A missing expiry counts as expired.
fn is_expired(expires_at: Option<Timestamp>, now: Timestamp) -> bool {
    expires_at.map_or(true, |at| at <= now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn manager() -> (SessionManager<MemoryStorage>, Arc<MemoryStorage>, Arc<RequestEngine>) {
        let config = ClientConfig::new("http://127.0.0.1:1");
        let engine = Arc::new(RequestEngine::new(&config));
        let storage = Arc::new(MemoryStorage::new());
        let manager = SessionManager::new(engine.clone(), storage.clone(), &config);
        (manager, storage, engine)
    }

    #[test]
    fn missing_expiry_is_expired() {
        let now = chrono::Utc::now();
        assert!(is_expired(None, now));
        assert!(is_expired(Some(now), now));
        assert!(!is_expired(Some(now + chrono::Duration::minutes(1)), now));
    }

    #[test]
    fn out_of_range_server_lifetime_uses_default() {
        let (manager, _, _) = manager();
        let default = chrono::Utc::now() + chrono::Duration::hours(24);

        for expires_in in [Some(9_000_000_000_000), Some(i64::MAX), Some(0), Some(-5), None] {
            let at = manager.expiry_for(expires_in).unwrap();
            assert!((at - default).num_seconds().abs() < 60, "{expires_in:?}");
        }

        let at = manager.expiry_for(Some(3600)).unwrap();
        let expected = chrono::Utc::now() + chrono::Duration::hours(1);
        assert!((at - expected).num_seconds().abs() < 60);
    }

    #[tokio::test]
    async fn valid_stored_token_is_returned_and_synced() {
        let (manager, storage, engine) = manager();
        let expiry = (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp_millis();
        storage.set(storage_keys::ACCESS_TOKEN, "T1").await.unwrap();
        storage
            .set(storage_keys::TOKEN_EXPIRY, &expiry.to_string())
            .await
            .unwrap();

        assert_eq!(manager.get_valid_token().await.unwrap().as_deref(), Some("T1"));
        assert_eq!(engine.token().await.as_deref(), Some("T1"));
        assert_eq!(manager.state().await.unwrap(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn token_without_expiry_is_never_returned() {
        let (manager, storage, engine) = manager();
        storage.set(storage_keys::ACCESS_TOKEN, "stale").await.unwrap();
        assert_eq!(manager.state().await.unwrap(), SessionState::Expired);

        // No refresh token: refresh fails, the session is cleared.
        assert!(manager.get_valid_token().await.unwrap().is_none());
        assert!(storage.is_empty().await);
        assert!(engine.token().await.is_none());
        assert_eq!(manager.state().await.unwrap(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn unreadable_expiry_counts_as_expired() {
        let (manager, storage, _) = manager();
        storage.set(storage_keys::ACCESS_TOKEN, "T1").await.unwrap();
        storage
            .set(storage_keys::TOKEN_EXPIRY, "tomorrow")
            .await
            .unwrap();

        let session = manager.current_session().await.unwrap().unwrap();
        assert!(session.expires_at.is_none());
        assert!(session.is_expired());
    }

    #[tokio::test]
    async fn refresh_without_refresh_token_is_auth_error_and_logs_out() {
        let (manager, storage, _) = manager();
        storage.set(storage_keys::ACCESS_TOKEN, "T1").await.unwrap();

        let err = manager.refresh().await.unwrap_err();
        assert!(matches!(err, ClientError::Auth(_)));
        assert!(storage.get(storage_keys::ACCESS_TOKEN).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_any_request() {
        let (manager, _, _) = manager();
        assert!(matches!(
            manager.login("not-an-email", "pw").await,
            Err(ClientError::Validation(_))
        ));
        assert!(matches!(
            manager.signup("a@b.com", "123").await,
            Err(ClientError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn device_identity_survives_logout() {
        let (manager, storage, _) = manager();
        let id = manager.device().await.unwrap().device_id.clone();
        manager.logout().await.unwrap();
        assert!(storage
            .get(storage_keys::DEVICE_ID)
            .await
            .unwrap()
            .unwrap()
            .contains(&id));
    }
}

//! Access/refresh token lifecycle for the upstream API.
//!
//! [`TokenAuthenticator`] owns the credential session for the whole process.
//! Token exchanges are single-flight: the first caller runs the exchange and
//! any caller arriving meanwhile waits for it to settle instead of issuing a
//! second request. Refresh failures are counted; once the count reaches the
//! cap, refreshes are suppressed until the cooldown window has passed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};
use tracing::{debug, error, info, instrument, warn};

use crate::credentials::CredentialSource;
use crate::error::{Result, WgerError};
use crate::models::{RefreshedAccess, TokenPair};

/// Default cap on consecutive failed refreshes.
pub const DEFAULT_MAX_REFRESH_ATTEMPTS: u32 = 4;

/// Default window after which a capped refresh counter is reset.
pub const DEFAULT_REFRESH_COOLDOWN: Duration = Duration::from_secs(30 * 60);

const TOKEN_PATH: &str = "token";
const REFRESH_PATH: &str = "token/refresh/";

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Consecutive refresh failures tolerated before refreshes are suppressed.
    pub max_refresh_attempts: u32,
    /// How long refreshes stay suppressed once the cap is reached.
    pub refresh_cooldown: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_refresh_attempts: DEFAULT_MAX_REFRESH_ATTEMPTS,
            refresh_cooldown: DEFAULT_REFRESH_COOLDOWN,
        }
    }
}

impl AuthConfig {
    pub fn with_max_refresh_attempts(mut self, attempts: u32) -> Self {
        self.max_refresh_attempts = attempts.max(1);
        self
    }

    pub fn with_refresh_cooldown(mut self, cooldown: Duration) -> Self {
        self.refresh_cooldown = cooldown;
        self
    }
}

/// What a call to [`TokenAuthenticator::refresh_token_if_needed`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Another task was already exchanging tokens; waited for it instead.
    InFlight,
    /// Attempt cap reached and the cooldown has not elapsed. No upstream call.
    Suppressed,
    /// No refresh token was held, so a full credential grant ran.
    Authenticated,
    /// The refresh token was exchanged for a new access token.
    Refreshed,
    /// The refresh token was rejected; a full credential grant succeeded.
    ReAuthenticated,
    /// The refresh failed; both tokens were cleared.
    Failed,
}

/// Point-in-time view of the credential session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub has_access_token: bool,
    pub has_refresh_token: bool,
    pub refresh_attempts: u32,
    pub authenticating: bool,
}

#[derive(Debug, Default)]
struct CredentialSession {
    access_token: Option<String>,
    refresh_token: Option<String>,
    refresh_attempts: u32,
    /// Set the first time the cap is observed; cleared on reset.
    cooldown_started: Option<Instant>,
}

impl CredentialSession {
    fn store_pair(&mut self, pair: TokenPair) {
        self.access_token = Some(pair.access);
        self.refresh_token = Some(pair.refresh);
    }

    fn clear_tokens(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
    }

    fn reset_attempts(&mut self) {
        self.refresh_attempts = 0;
        self.cooldown_started = None;
    }

    /// Returns `true` while refreshes must be skipped.
    ///
    /// Resets the counter once the cooldown measured from the first
    /// suppressed call has elapsed.
    fn refresh_suppressed(&mut self, config: &AuthConfig, now: Instant) -> bool {
        if self.refresh_attempts < config.max_refresh_attempts {
            return false;
        }

        match self.cooldown_started {
            Some(started) if now.saturating_duration_since(started) >= config.refresh_cooldown => {
                self.reset_attempts();
                false
            }
            Some(_) => true,
            None => {
                self.cooldown_started = Some(now);
                true
            }
        }
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

/// Holds the exchange lock and keeps the `authenticating` flag raised.
struct AuthenticatingGuard<'a> {
    _permit: AsyncMutexGuard<'a, ()>,
    flag: &'a AtomicBool,
}

impl Drop for AuthenticatingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Obtains and renews the upstream token pair.
pub struct TokenAuthenticator {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialSource>,
    config: AuthConfig,
    session: Mutex<CredentialSession>,
    exchange_lock: AsyncMutex<()>,
    authenticating: AtomicBool,
}

impl TokenAuthenticator {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        credentials: Arc<dyn CredentialSource>,
        config: AuthConfig,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            credentials,
            config,
            session: Mutex::new(CredentialSession::default()),
            exchange_lock: AsyncMutex::new(()),
            authenticating: AtomicBool::new(false),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn access_token(&self) -> Option<String> {
        self.session.lock().access_token.clone()
    }

    #[inline]
    pub fn has_access_token(&self) -> bool {
        self.session.lock().access_token.is_some()
    }

    #[inline]
    pub fn is_authenticating(&self) -> bool {
        self.authenticating.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let session = self.session.lock();
        SessionSnapshot {
            has_access_token: session.access_token.is_some(),
            has_refresh_token: session.refresh_token.is_some(),
            refresh_attempts: session.refresh_attempts,
            authenticating: self.is_authenticating(),
        }
    }

    /// Run the credential grant and store the resulting token pair.
    ///
    /// If an exchange is already running, no second request is made; this
    /// waits for the running one and returns `Ok(())` whatever its result.
    #[instrument(skip(self))]
    pub async fn initialize_authentication(&self) -> Result<()> {
        let Some(_guard) = self.begin_exchange().await else {
            return Ok(());
        };

        self.authenticate_with_credentials().await
    }

    /// Renew the access token after the upstream reported it expired.
    ///
    /// Only a missing-refresh-token fallback can return `Err`; every other
    /// failure is absorbed into the attempt counter and reported through
    /// [`RefreshOutcome`].
    #[instrument(skip(self))]
    pub async fn refresh_token_if_needed(&self) -> Result<RefreshOutcome> {
        let Some(_guard) = self.begin_exchange().await else {
            return Ok(RefreshOutcome::InFlight);
        };

        let refresh_token = {
            let mut session = self.session.lock();
            if session.refresh_suppressed(&self.config, Instant::now()) {
                error!(
                    attempts = session.refresh_attempts,
                    cooldown_secs = self.config.refresh_cooldown.as_secs(),
                    "Maximum token refresh attempts exceeded"
                );
                return Ok(RefreshOutcome::Suppressed);
            }
            session.refresh_token.clone()
        };

        let Some(refresh_token) = refresh_token else {
            debug!("No refresh token held; running credential grant");
            self.authenticate_with_credentials().await?;
            return Ok(RefreshOutcome::Authenticated);
        };

        match self.exchange_refresh_token(&refresh_token).await {
            Ok(access) => {
                let mut session = self.session.lock();
                session.reset_attempts();
                session.access_token = Some(access);
                debug!("Access token refreshed");
                Ok(RefreshOutcome::Refreshed)
            }
            Err(WgerError::Authentication { status }) => {
                let attempts = {
                    let mut session = self.session.lock();
                    session.refresh_attempts += 1;
                    session.refresh_attempts
                };
                warn!(
                    %status,
                    attempts,
                    "Refresh token rejected; falling back to credential grant"
                );

                match self.authenticate_with_credentials().await {
                    Ok(()) => Ok(RefreshOutcome::ReAuthenticated),
                    Err(e) => Ok(self.fail_refresh(&e)),
                }
            }
            Err(e) => Ok(self.fail_refresh(&e)),
        }
    }

    /// Take the exchange lock, or wait out the exchange that holds it.
    async fn begin_exchange(&self) -> Option<AuthenticatingGuard<'_>> {
        match self.exchange_lock.try_lock() {
            Ok(permit) => {
                self.authenticating.store(true, Ordering::Release);
                Some(AuthenticatingGuard {
                    _permit: permit,
                    flag: &self.authenticating,
                })
            }
            Err(_) => {
                debug!("Token exchange already in progress; waiting for it to settle");
                drop(self.exchange_lock.lock().await);
                None
            }
        }
    }

    async fn authenticate_with_credentials(&self) -> Result<()> {
        let credentials = self.credentials.credentials()?;

        let response = self
            .client
            .post(self.endpoint(TOKEN_PATH))
            .json(&TokenRequest {
                username: &credentials.username,
                password: &credentials.password,
            })
            .send()
            .await
            .inspect_err(|e| warn!(error = %e, "Authentication request failed"))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Upstream rejected credentials");
            return Err(WgerError::Authentication { status });
        }

        let pair: TokenPair = response
            .json()
            .await
            .map_err(|e| WgerError::Parse(e.to_string()))?;

        self.session.lock().store_pair(pair);
        info!(username = %credentials.username, "Authenticated with upstream");
        Ok(())
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint(REFRESH_PATH))
            .json(&RefreshRequest {
                refresh: refresh_token,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WgerError::Authentication { status });
        }

        let body: RefreshedAccess = response
            .json()
            .await
            .map_err(|e| WgerError::Parse(e.to_string()))?;

        Ok(body.access)
    }

    fn fail_refresh(&self, error: &WgerError) -> RefreshOutcome {
        let mut session = self.session.lock();
        session.clear_tokens();
        session.refresh_attempts += 1;
        error!(
            error = %error,
            attempts = session.refresh_attempts,
            "Error refreshing token; session cleared"
        );
        RefreshOutcome::Failed
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

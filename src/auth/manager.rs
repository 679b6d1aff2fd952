//! Credential lifecycle for the remote store
//!
//! [`CredentialProvider`] is the seam the store backends call before every
//! request. [`AuthManager`] implements it for Google Drive:
//!
//! 1. Return the in-memory token when present and not expired.
//! 2. Otherwise load the persisted token; use it when still valid.
//! 3. If it expired and carries a refresh token, refresh it.
//! 4. Otherwise run the browser sign-in flow.
//!
//! The resolved token is cached for the process lifetime, so a valid
//! credential never re-prompts. [`CredentialProvider::invalidate`] drops the
//! cached and persisted token after the store answers `401`, forcing a fresh
//! sign-in on next use.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::auth::flow::{BrowserLauncher, OAuthFlow, OAuthFlowConfig, SystemBrowser};
use crate::auth::token_store::{OAuthToken, TokenStorage};
use crate::error::Result;

/// Supplies bearer credentials to remote store backends.
#[async_trait::async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Returns a usable credential, signing in if needed.
    async fn credential(&self) -> Result<OAuthToken>;

    /// Forgets the current credential after the store rejected it.
    async fn invalidate(&self);
}

// ---------------------------------------------------------------------------
// StaticCredential
// ---------------------------------------------------------------------------

/// A fixed token, e.g. the API token of an HTTP backup server.
#[derive(Debug, Clone)]
pub struct StaticCredential {
    token: OAuthToken,
}

impl StaticCredential {
    /// Wraps a fixed bearer token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            token: OAuthToken::bearer(access_token),
        }
    }
}

#[async_trait::async_trait]
impl CredentialProvider for StaticCredential {
    async fn credential(&self) -> Result<OAuthToken> {
        Ok(self.token.clone())
    }

    async fn invalidate(&self) {
        tracing::warn!("Static API token was rejected by the server; check the configured token");
    }
}

// ---------------------------------------------------------------------------
// AuthManager
// ---------------------------------------------------------------------------

/// Caching OAuth credential provider.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use chatvault::auth::{AuthManager, CredentialProvider};
/// use chatvault::auth::flow::OAuthFlowConfig;
/// use chatvault::auth::token_store::KeyringTokenStore;
/// use chatvault::config::GDriveConfig;
///
/// # async fn example() -> chatvault::error::Result<()> {
/// let mut gdrive = GDriveConfig::default();
/// gdrive.client_id = "client.apps.googleusercontent.com".to_string();
/// let manager = AuthManager::new(
///     reqwest::Client::new(),
///     OAuthFlowConfig::from_gdrive(&gdrive)?,
///     Arc::new(KeyringTokenStore),
///     "gdrive",
/// );
/// let token = manager.credential().await?;
/// # Ok(())
/// # }
/// ```
pub struct AuthManager {
    http: reqwest::Client,
    flow_config: OAuthFlowConfig,
    token_store: Arc<dyn TokenStorage>,
    account: String,
    launcher: Arc<dyn BrowserLauncher>,
    cancel: CancellationToken,
    cached: Mutex<Option<OAuthToken>>,
}

impl AuthManager {
    /// Creates a manager that signs in through the system browser.
    ///
    /// `account` keys the persisted token, so different stores do not share
    /// credentials.
    pub fn new(
        http: reqwest::Client,
        flow_config: OAuthFlowConfig,
        token_store: Arc<dyn TokenStorage>,
        account: impl Into<String>,
    ) -> Self {
        Self {
            http,
            flow_config,
            token_store,
            account: account.into(),
            launcher: Arc::new(SystemBrowser),
            cancel: CancellationToken::new(),
            cached: Mutex::new(None),
        }
    }

    /// Replaces the browser launcher.
    pub fn with_launcher(mut self, launcher: Arc<dyn BrowserLauncher>) -> Self {
        self.launcher = launcher;
        self
    }

    /// Uses `cancel` to abort a sign-in that is waiting for the browser.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Removes the cached and persisted credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the persistent token store fails.
    pub async fn sign_out(&self) -> Result<()> {
        self.cached.lock().await.take();
        self.token_store.delete_token(&self.account)
    }

    fn new_flow(&self) -> OAuthFlow {
        OAuthFlow::with_launcher(
            self.http.clone(),
            self.flow_config.clone(),
            Arc::clone(&self.launcher),
        )
    }

    async fn refresh(&self, expired: &OAuthToken, refresh: &str) -> Result<OAuthToken> {
        let mut fresh = self.new_flow().refresh_token(refresh).await?;
        if fresh.refresh_token.is_none() {
            fresh.refresh_token = expired.refresh_token.clone();
        }
        Ok(fresh)
    }

    fn persist(&self, token: &OAuthToken) {
        // The token is still usable for this process if persisting fails.
        if let Err(e) = self.token_store.save_token(&self.account, token) {
            tracing::warn!("Failed to persist credential: {}", e);
        }
    }
}

#[async_trait::async_trait]
impl CredentialProvider for AuthManager {
    async fn credential(&self) -> Result<OAuthToken> {
        // Held for the whole resolution so concurrent callers share one sign-in.
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.clone());
            }
        }

        let candidate = match cached.take() {
            Some(token) => Some(token),
            None => self.token_store.load_token(&self.account).unwrap_or_else(|e| {
                tracing::warn!("Failed to load persisted credential: {}", e);
                None
            }),
        };

        if let Some(token) = candidate {
            if !token.is_expired() {
                tracing::debug!("Using persisted credential");
                *cached = Some(token.clone());
                return Ok(token);
            }

            if let Some(refresh) = token.refresh_token.as_deref() {
                match self.refresh(&token, refresh).await {
                    Ok(fresh) => {
                        tracing::info!("Refreshed access token");
                        self.persist(&fresh);
                        *cached = Some(fresh.clone());
                        return Ok(fresh);
                    }
                    Err(e) => {
                        tracing::warn!("Token refresh failed: {}. Running full sign-in.", e);
                    }
                }
            }
        }

        tracing::info!("Please authorize access to the remote store...");
        let token = self.new_flow().authorize(&self.cancel).await?;
        self.persist(&token);
        *cached = Some(token.clone());
        Ok(token)
    }

    async fn invalidate(&self) {
        tracing::warn!("Credential rejected by the remote store; signing in again on next use");
        self.cached.lock().await.take();
        if let Err(e) = self.token_store.delete_token(&self.account) {
            tracing::warn!("Failed to delete persisted credential: {}", e);
        }
    }
}

//! OAuth token persistence
//!
//! Tokens survive process restarts in the operating system's native
//! credential store (Keychain on macOS, Secret Service on Linux, Windows
//! Credential Manager on Windows). Tokens are serialized to JSON before
//! storage and deserialized on load.
//!
//! [`TokenStorage`] is the seam the [`AuthManager`](super::manager::AuthManager)
//! talks to; [`KeyringTokenStore`] is the production implementation and
//! [`MemoryTokenStore`] keeps tokens in process memory.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ChatVaultError, Result};

// ---------------------------------------------------------------------------
// OAuthToken
// ---------------------------------------------------------------------------

/// A bearer credential for the remote store.
///
/// `expires_at` is computed from the `expires_in` seconds of the token
/// response so that expiry can be decided without a server round-trip.
///
/// # Examples
///
/// ```
/// use chatvault::auth::token_store::OAuthToken;
///
/// let token = OAuthToken::bearer("my_access_token");
/// // A token with no expiry is never considered expired.
/// assert!(!token.is_expired());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OAuthToken {
    /// The access token string issued by the authorization server.
    pub access_token: String,

    /// The token type, typically `"Bearer"`.
    pub token_type: String,

    /// UTC timestamp at which the access token expires; `None` never expires.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_seconds_option"
    )]
    pub expires_at: Option<DateTime<Utc>>,

    /// Refresh token used to obtain a new access token without a new sign-in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Space-separated scopes granted by the authorization server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl OAuthToken {
    /// Builds a non-expiring bearer token with no refresh token.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "Bearer".to_string(),
            expires_at: None,
            refresh_token: None,
            scope: None,
        }
    }

    /// Returns `true` when the access token is expired or about to expire.
    ///
    /// A 60-second buffer is applied so that a request started now does not
    /// reach the server with a token that expired in flight.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            None => false,
            Some(expires_at) => Utc::now() >= expires_at - chrono::Duration::seconds(60),
        }
    }
}

// ---------------------------------------------------------------------------
// TokenStorage
// ---------------------------------------------------------------------------

/// Persistent storage for OAuth tokens, keyed by account identifier.
pub trait TokenStorage: Send + Sync {
    /// Persists `token` for `account`, replacing any previous value.
    fn save_token(&self, account: &str, token: &OAuthToken) -> Result<()>;

    /// Loads the token for `account`; `Ok(None)` when nothing is stored.
    fn load_token(&self, account: &str) -> Result<Option<OAuthToken>>;

    /// Deletes the token for `account`; a no-op when nothing is stored.
    fn delete_token(&self, account: &str) -> Result<()>;
}

/// Token storage backed by the OS native keyring.
///
/// # Examples
///
/// ```no_run
/// use chatvault::auth::token_store::{KeyringTokenStore, OAuthToken, TokenStorage};
///
/// let store = KeyringTokenStore;
/// store.save_token("gdrive", &OAuthToken::bearer("tok")).unwrap();
/// assert!(store.load_token("gdrive").unwrap().is_some());
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringTokenStore;

impl KeyringTokenStore {
    /// Builds the keyring service name for an account.
    fn service_name(account: &str) -> String {
        format!("chatvault-{}", account)
    }

    fn entry(account: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&Self::service_name(account), account)
            .map_err(|e| ChatVaultError::Keyring(e).into())
    }
}

impl TokenStorage for KeyringTokenStore {
    fn save_token(&self, account: &str, token: &OAuthToken) -> Result<()> {
        let json_str = serde_json::to_string(token)?;
        Self::entry(account)?
            .set_password(&json_str)
            .map_err(ChatVaultError::Keyring)?;
        Ok(())
    }

    fn load_token(&self, account: &str) -> Result<Option<OAuthToken>> {
        match Self::entry(account)?.get_password() {
            Ok(json_str) => Ok(Some(serde_json::from_str(&json_str)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(ChatVaultError::Keyring(e).into()),
        }
    }

    fn delete_token(&self, account: &str) -> Result<()> {
        match Self::entry(account)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(ChatVaultError::Keyring(e).into()),
        }
    }
}

/// Token storage that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<HashMap<String, OAuthToken>>,
}

impl MemoryTokenStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, OAuthToken>> {
        self.tokens.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TokenStorage for MemoryTokenStore {
    fn save_token(&self, account: &str, token: &OAuthToken) -> Result<()> {
        self.lock().insert(account.to_string(), token.clone());
        Ok(())
    }

    fn load_token(&self, account: &str) -> Result<Option<OAuthToken>> {
        Ok(self.lock().get(account).cloned())
    }

    fn delete_token(&self, account: &str) -> Result<()> {
        self.lock().remove(account);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

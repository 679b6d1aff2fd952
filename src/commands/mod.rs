//! Command handlers for the CLI
//!
//! Each handler builds what it needs from the [`Config`], runs one
//! operation and prints the result:
//!
//! - [`auth`] -- sign in to, or sign out of, the remote store
//! - [`snapshots`] -- backup, list, restore and the watch loop

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::auth::flow::OAuthFlowConfig;
use crate::auth::token_store::KeyringTokenStore;
use crate::auth::{AuthManager, CredentialProvider, StaticCredential};
use crate::chats::JsonFileChats;
use crate::config::Config;
use crate::error::{ChatVaultError, Result};
use crate::store::{GoogleDriveStore, HttpServerStore, MemoryStore, RemoteStore};
use crate::sync::SyncManager;

pub mod snapshots;

/// Keyring account holding the Google Drive token.
pub const GDRIVE_ACCOUNT: &str = "gdrive";

fn http_client(timeout_seconds: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
        .map_err(|e| ChatVaultError::Http(e).into())
}

fn parse_url(field: &str, value: &str) -> Result<Url> {
    Url::parse(value)
        .map_err(|e| ChatVaultError::Config(format!("{} is not a valid URL: {}", field, e)).into())
}

/// Builds the Google Drive credential manager.
///
/// `cancel` aborts a sign-in that is waiting for the browser.
pub fn build_auth_manager(config: &Config, cancel: CancellationToken) -> Result<AuthManager> {
    let gdrive = &config.store.gdrive;
    Ok(AuthManager::new(
        http_client(gdrive.timeout_seconds)?,
        OAuthFlowConfig::from_gdrive(gdrive)?,
        Arc::new(KeyringTokenStore),
        GDRIVE_ACCOUNT,
    )
    .with_cancellation(cancel))
}

/// Builds the configured remote store.
///
/// # Errors
///
/// Returns a configuration error for an unknown store type or a bad URL.
pub fn build_store(config: &Config, cancel: CancellationToken) -> Result<Arc<dyn RemoteStore>> {
    match config.store.store_type.as_str() {
        "gdrive" => {
            let gdrive = &config.store.gdrive;
            let credentials: Arc<dyn CredentialProvider> =
                Arc::new(build_auth_manager(config, cancel)?);
            Ok(Arc::new(GoogleDriveStore::new(
                http_client(gdrive.timeout_seconds)?,
                parse_url("store.gdrive.api_base", &gdrive.api_base)?,
                credentials,
            )))
        }
        "http" => {
            let http = &config.store.http;
            let credentials = http
                .api_token
                .as_ref()
                .filter(|t| !t.is_empty())
                .map(|t| Arc::new(StaticCredential::new(t.clone())) as Arc<dyn CredentialProvider>);
            Ok(Arc::new(HttpServerStore::new(
                http_client(http.timeout_seconds)?,
                parse_url("store.http.url", &http.url)?,
                credentials,
            )))
        }
        "memory" => {
            tracing::warn!("Using the in-memory store; backups are discarded on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
        other => Err(ChatVaultError::Config(format!("Unknown store type: {}", other)).into()),
    }
}

/// Builds a sync session over the configured store and chat file.
pub fn build_manager(config: &Config, cancel: CancellationToken) -> Result<SyncManager> {
    let store = build_store(config, cancel)?;
    let chats = Arc::new(JsonFileChats::new(&config.chats.path));
    Ok(SyncManager::new(store, chats, config.backup.clone()))
}

// Authentication command handlers
pub mod auth {
    //! `chatvault auth` and `chatvault logout`.
    //!
    //! Only the Google Drive store signs in interactively; the HTTP backup
    //! server uses the configured API token as is.

    use super::*;
    use colored::Colorize;

    /// Signs in to the configured store and caches the credential.
    pub async fn authenticate(config: &Config) -> Result<()> {
        if config.store.store_type != "gdrive" {
            println!(
                "Store type '{}' does not use interactive sign-in.",
                config.store.store_type
            );
            return Ok(());
        }

        let cancel = CancellationToken::new();
        let watcher = cancel.clone();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                watcher.cancel();
            }
        });

        println!("Opening your browser to sign in to Google Drive...");
        let manager = build_auth_manager(config, cancel)?;
        let result = manager.credential().await;
        interrupt.abort();

        let token = result?;
        println!("{}", "Signed in to Google Drive.".green());
        if let Some(expires_at) = token.expires_at {
            tracing::debug!("Access token valid until {}", expires_at);
        }
        Ok(())
    }

    /// Removes the cached credential.
    pub async fn logout(config: &Config) -> Result<()> {
        if config.store.store_type != "gdrive" {
            println!(
                "Store type '{}' keeps no cached credential.",
                config.store.store_type
            );
            return Ok(());
        }

        build_auth_manager(config, CancellationToken::new())?
            .sign_out()
            .await?;
        println!("{}", "Signed out of Google Drive.".green());
        Ok(())
    }
}

//! Configuration management for ChatVault
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{ChatVaultError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for ChatVault
///
/// Holds the backup policy, the remote store selection and its settings,
/// and the location of the local chat data.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Backup policy (folder, naming, retention, schedule)
    #[serde(default)]
    pub backup: BackupConfig,
    /// Remote store configuration
    #[serde(default)]
    pub store: StoreConfig,
    /// Local chat data configuration
    #[serde(default)]
    pub chats: ChatsConfig,
}

/// Largest accepted `backup.frequency_hours` (ten years).
pub const MAX_FREQUENCY_HOURS: u64 = 24 * 366 * 10;

/// Largest accepted `backup.check_interval_seconds` (thirty days).
pub const MAX_CHECK_INTERVAL_SECONDS: u64 = 30 * 24 * 3600;

/// Backup policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Display name of the remote folder holding the snapshots
    #[serde(default = "default_folder_name")]
    pub folder_name: String,

    /// Prefix of every snapshot file name
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Minimum interval between automatic backups (hours)
    #[serde(default = "default_frequency_hours")]
    pub frequency_hours: u64,

    /// Number of snapshots to keep after each backup
    #[serde(default = "default_keep_backups")]
    pub keep_backups: usize,

    /// How often the scheduler checks whether a backup is due (seconds)
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,

    /// Run one backup immediately when the scheduler starts
    #[serde(default = "default_backup_on_start")]
    pub backup_on_start: bool,
}

fn default_folder_name() -> String {
    "TypingMind Backup & Cloud Sync".to_string()
}

fn default_file_prefix() -> String {
    "TypingMind_Backup".to_string()
}

fn default_frequency_hours() -> u64 {
    24
}

fn default_keep_backups() -> usize {
    7
}

fn default_check_interval() -> u64 {
    3600
}

fn default_backup_on_start() -> bool {
    true
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            folder_name: default_folder_name(),
            file_prefix: default_file_prefix(),
            frequency_hours: default_frequency_hours(),
            keep_backups: default_keep_backups(),
            check_interval_seconds: default_check_interval(),
            backup_on_start: default_backup_on_start(),
        }
    }
}

impl BackupConfig {
    /// Minimum interval between automatic backups, capped at
    /// [`MAX_FREQUENCY_HOURS`].
    pub fn frequency(&self) -> chrono::Duration {
        let hours = self.frequency_hours.min(MAX_FREQUENCY_HOURS);
        chrono::Duration::hours(hours as i64)
    }

    /// Scheduler check cadence, between one second and
    /// [`MAX_CHECK_INTERVAL_SECONDS`].
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds.clamp(1, MAX_CHECK_INTERVAL_SECONDS))
    }
}

/// Remote store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Type of store to use (gdrive, http, memory)
    #[serde(rename = "type", default = "default_store_type")]
    pub store_type: String,

    /// Google Drive settings
    #[serde(default)]
    pub gdrive: GDriveConfig,

    /// HTTP backup server settings
    #[serde(default)]
    pub http: HttpServerConfig,
}

fn default_store_type() -> String {
    "gdrive".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: default_store_type(),
            gdrive: GDriveConfig::default(),
            http: HttpServerConfig::default(),
        }
    }
}

/// Google Drive store and OAuth configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GDriveConfig {
    /// OAuth client identifier of the installed application
    #[serde(default)]
    pub client_id: String,

    /// OAuth client secret (Google issues one even to installed apps)
    #[serde(default)]
    pub client_secret: Option<String>,

    /// OAuth scope requested at sign-in
    #[serde(default = "default_gdrive_scope")]
    pub scope: String,

    /// Base URL of the Drive REST API (overridable for tests and mocks)
    #[serde(default = "default_gdrive_api_base")]
    pub api_base: String,

    /// OAuth authorization endpoint
    #[serde(default = "default_auth_endpoint")]
    pub auth_endpoint: String,

    /// OAuth token endpoint
    #[serde(default = "default_token_endpoint")]
    pub token_endpoint: String,

    /// Local port for the redirect listener; `0` picks a free port
    #[serde(default)]
    pub redirect_port: u16,

    /// Launch the system browser for sign-in; when false the URL is only printed
    #[serde(default = "default_open_browser")]
    pub open_browser: bool,

    /// How long to wait for the browser redirect (seconds)
    #[serde(default = "default_auth_timeout")]
    pub auth_timeout_seconds: u64,

    /// Per-request timeout for Drive API calls (seconds)
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,
}

fn default_gdrive_scope() -> String {
    "https://www.googleapis.com/auth/drive.file".to_string()
}

fn default_gdrive_api_base() -> String {
    "https://www.googleapis.com".to_string()
}

fn default_auth_endpoint() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}

fn default_token_endpoint() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_open_browser() -> bool {
    true
}

fn default_auth_timeout() -> u64 {
    300
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for GDriveConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: None,
            scope: default_gdrive_scope(),
            api_base: default_gdrive_api_base(),
            auth_endpoint: default_auth_endpoint(),
            token_endpoint: default_token_endpoint(),
            redirect_port: 0,
            open_browser: default_open_browser(),
            auth_timeout_seconds: default_auth_timeout(),
            timeout_seconds: default_request_timeout(),
        }
    }
}

/// HTTP backup server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    /// Base URL of the backup server (e.g. `https://host/backup-sync`)
    #[serde(default)]
    pub url: String,

    /// Optional bearer token sent with every request
    #[serde(default)]
    pub api_token: Option<String>,

    /// Per-request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_token: None,
            timeout_seconds: default_request_timeout(),
        }
    }
}

/// Local chat data configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatsConfig {
    /// JSON file holding the application's exported chat records
    #[serde(default = "default_chats_path")]
    pub path: PathBuf,
}

fn default_chats_path() -> PathBuf {
    PathBuf::from("chats.json")
}

impl Default for ChatsConfig {
    fn default() -> Self {
        Self {
            path: default_chats_path(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else if let Some(user_path) = Self::user_config_path().filter(|p| p.exists()) {
            tracing::debug!("Using user config at {}", user_path.display());
            Self::from_file(&user_path.to_string_lossy())?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    /// Per-user configuration file, e.g. `~/.config/chatvault/config.yaml`.
    pub fn user_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "chatvault", "chatvault")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChatVaultError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ChatVaultError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(store_type) = std::env::var("CHATVAULT_STORE_TYPE") {
            self.store.store_type = store_type;
        }

        if let Ok(folder) = std::env::var("CHATVAULT_FOLDER_NAME") {
            self.backup.folder_name = folder;
        }

        if let Ok(keep) = std::env::var("CHATVAULT_KEEP_BACKUPS") {
            match keep.parse::<usize>() {
                Ok(v) => self.backup.keep_backups = v,
                Err(_) => tracing::warn!("Ignoring invalid CHATVAULT_KEEP_BACKUPS: {}", keep),
            }
        }

        if let Ok(hours) = std::env::var("CHATVAULT_FREQUENCY_HOURS") {
            match hours.parse::<u64>() {
                Ok(v) => self.backup.frequency_hours = v,
                Err(_) => tracing::warn!("Ignoring invalid CHATVAULT_FREQUENCY_HOURS: {}", hours),
            }
        }

        if let Ok(path) = std::env::var("CHATVAULT_CHATS_PATH") {
            self.chats.path = PathBuf::from(path);
        }

        if let Ok(client_id) = std::env::var("CHATVAULT_GDRIVE_CLIENT_ID") {
            self.store.gdrive.client_id = client_id;
        }

        if let Ok(secret) = std::env::var("CHATVAULT_GDRIVE_CLIENT_SECRET") {
            self.store.gdrive.client_secret = Some(secret);
        }

        if let Ok(url) = std::env::var("CHATVAULT_HTTP_URL") {
            self.store.http.url = url;
        }

        if let Ok(token) = std::env::var("CHATVAULT_HTTP_API_TOKEN") {
            self.store.http.api_token = Some(token);
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(path) = &cli.chats {
            self.chats.path = path.clone();
        }
        if let Some(store) = &cli.store {
            self.store.store_type = store.clone();
        }
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.backup.folder_name.trim().is_empty() {
            return Err(
                ChatVaultError::Config("backup.folder_name cannot be empty".to_string()).into(),
            );
        }

        if self.backup.file_prefix.trim().is_empty() {
            return Err(
                ChatVaultError::Config("backup.file_prefix cannot be empty".to_string()).into(),
            );
        }

        if self.backup.keep_backups == 0 {
            return Err(ChatVaultError::Config(
                "backup.keep_backups must be greater than 0".to_string(),
            )
            .into());
        }

        if self.backup.frequency_hours == 0 || self.backup.frequency_hours > MAX_FREQUENCY_HOURS {
            return Err(ChatVaultError::Config(format!(
                "backup.frequency_hours must be between 1 and {}",
                MAX_FREQUENCY_HOURS
            ))
            .into());
        }

        if self.backup.check_interval_seconds == 0
            || self.backup.check_interval_seconds > MAX_CHECK_INTERVAL_SECONDS
        {
            return Err(ChatVaultError::Config(format!(
                "backup.check_interval_seconds must be between 1 and {}",
                MAX_CHECK_INTERVAL_SECONDS
            ))
            .into());
        }

        let valid_stores = ["gdrive", "http", "memory"];
        if !valid_stores.contains(&self.store.store_type.as_str()) {
            return Err(ChatVaultError::Config(format!(
                "Invalid store type: {}. Must be one of: {}",
                self.store.store_type,
                valid_stores.join(", ")
            ))
            .into());
        }

        match self.store.store_type.as_str() {
            "gdrive" => {
                if self.store.gdrive.client_id.trim().is_empty() {
                    return Err(ChatVaultError::Config(
                        "store.gdrive.client_id is required for the gdrive store".to_string(),
                    )
                    .into());
                }
                if self.store.gdrive.auth_timeout_seconds == 0 {
                    return Err(ChatVaultError::Config(
                        "store.gdrive.auth_timeout_seconds must be greater than 0".to_string(),
                    )
                    .into());
                }
                for (field, value) in [
                    ("api_base", &self.store.gdrive.api_base),
                    ("auth_endpoint", &self.store.gdrive.auth_endpoint),
                    ("token_endpoint", &self.store.gdrive.token_endpoint),
                ] {
                    url::Url::parse(value).map_err(|e| {
                        ChatVaultError::Config(format!(
                            "store.gdrive.{} is not a valid URL: {}",
                            field, e
                        ))
                    })?;
                }
            }
            "http" => {
                url::Url::parse(&self.store.http.url).map_err(|e| {
                    ChatVaultError::Config(format!("store.http.url is not a valid URL: {}", e))
                })?;
            }
            _ => {}
        }

        Ok(())
    }
}

//! Error types for ChatVault
//!
//! This module defines the error taxonomy used throughout the crate, using
//! `thiserror` for ergonomic error handling. The four pipeline categories
//! (authentication, remote store, snapshot write, snapshot restore) each
//! carry a reason tag so callers can react to the failure class while the
//! user still gets a short human-readable message.

use thiserror::Error;

/// Why obtaining a credential failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// The user denied consent or abandoned the flow.
    UserCancelled,
    /// The authorization window (system browser) could not be opened.
    PopupBlocked,
    /// No redirect arrived before the authorization deadline.
    Timeout,
    /// The token could not be obtained, refreshed or was rejected.
    TokenInvalid,
}

impl AuthFailure {
    /// Snake-case tag used in logs and status messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserCancelled => "user_cancelled",
            Self::PopupBlocked => "popup_blocked",
            Self::Timeout => "timeout",
            Self::TokenInvalid => "token_invalid",
        }
    }
}

/// Why a remote store call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFailure {
    /// Transport-level failure or an unexpected server response.
    Network,
    /// The credential was rejected or lacks access.
    Permission,
    /// Storage quota or rate limit exceeded.
    Quota,
    /// The addressed container or object does not exist.
    NotFound,
}

impl StoreFailure {
    /// Snake-case tag used in logs and status messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Permission => "permission",
            Self::Quota => "quota",
            Self::NotFound => "not_found",
        }
    }
}

/// Why a snapshot write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteFailure {
    /// The chat set could not be read or serialized.
    SerializeFailed,
    /// The remote store did not accept the upload.
    UploadFailed,
}

impl WriteFailure {
    /// Snake-case tag used in logs and status messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SerializeFailed => "serialize_failed",
            Self::UploadFailed => "upload_failed",
        }
    }
}

/// Why a restore failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreFailure {
    /// The container holds no snapshots.
    NoBackupsFound,
    /// The snapshot could not be located or downloaded.
    FetchFailed,
    /// The snapshot content is not a valid payload.
    ParseFailed,
}

impl RestoreFailure {
    /// Snake-case tag used in logs and status messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoBackupsFound => "no_backups_found",
            Self::FetchFailed => "fetch_failed",
            Self::ParseFailed => "parse_failed",
        }
    }
}

/// Main error type for ChatVault operations
#[derive(Error, Debug)]
pub enum ChatVaultError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential could not be obtained
    #[error("Authentication failed ({}): {message}", .reason.as_str())]
    Auth {
        /// Failure class
        reason: AuthFailure,
        /// Human-readable detail
        message: String,
    },

    /// Remote store call failed
    #[error("Remote store error ({}): {message}", .reason.as_str())]
    Store {
        /// Failure class
        reason: StoreFailure,
        /// Human-readable detail
        message: String,
    },

    /// Snapshot write failed
    #[error("Backup failed ({}): {message}", .reason.as_str())]
    Write {
        /// Failure class
        reason: WriteFailure,
        /// Human-readable detail
        message: String,
    },

    /// Snapshot restore failed
    #[error("Restore failed ({}): {message}", .reason.as_str())]
    Restore {
        /// Failure class
        reason: RestoreFailure,
        /// Human-readable detail
        message: String,
    },

    /// Local chat data could not be read or written
    #[error("Chat source error: {0}")]
    ChatSource(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl ChatVaultError {
    /// Builds an [`ChatVaultError::Auth`] error.
    pub fn auth(reason: AuthFailure, message: impl Into<String>) -> Self {
        Self::Auth {
            reason,
            message: message.into(),
        }
    }

    /// Builds a [`ChatVaultError::Store`] error.
    pub fn store(reason: StoreFailure, message: impl Into<String>) -> Self {
        Self::Store {
            reason,
            message: message.into(),
        }
    }

    /// Builds a [`ChatVaultError::Write`] error.
    pub fn write(reason: WriteFailure, message: impl Into<String>) -> Self {
        Self::Write {
            reason,
            message: message.into(),
        }
    }

    /// Builds a [`ChatVaultError::Restore`] error.
    pub fn restore(reason: RestoreFailure, message: impl Into<String>) -> Self {
        Self::Restore {
            reason,
            message: message.into(),
        }
    }
}

/// Result type alias for ChatVault operations
///
/// Uses `anyhow::Error` so context can be attached freely; callers that
/// need the failure class downcast to [`ChatVaultError`].
pub type Result<T> = anyhow::Result<T>;

/// Returns the [`ChatVaultError`] behind an `anyhow::Error`, if any.
pub fn classify(err: &anyhow::Error) -> Option<&ChatVaultError> {
    err.downcast_ref::<ChatVaultError>()
}

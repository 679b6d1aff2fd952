//! Command-line interface definition for ChatVault
//!
//! This module defines the CLI structure using clap's derive API. The
//! subcommands stand in for the "Backup" and "Restore" controls of a chat
//! application: `backup` writes a snapshot, `list` shows the retention set,
//! `restore` brings one back, and `watch` keeps the periodic scheduler
//! running until interrupted.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ChatVault - chat history snapshots to cloud storage
///
/// Exports local chat history to Google Drive or an HTTP backup server on a
/// schedule, keeps the newest N snapshots, and restores them on demand.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatvault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the chat data file from config
    #[arg(long)]
    pub chats: Option<PathBuf>,

    /// Override the remote store type (gdrive, http, memory)
    #[arg(long)]
    pub store: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for ChatVault
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Sign in to the remote store and cache the credential
    Auth,

    /// Remove the cached credential
    Logout,

    /// Create a snapshot of the current chats now
    Backup,

    /// List snapshots in the backup folder, newest first
    List {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Restore chats from a snapshot (newest when no snapshot is given)
    Restore {
        /// Snapshot id or file name to restore
        #[arg(short, long)]
        snapshot: Option<String>,
    },

    /// Run the periodic backup scheduler until interrupted
    Watch,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            chats: None,
            store: None,
            command: Commands::Backup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Backup));
    }

    #[test]
    fn test_cli_parse_backup() {
        let cli = Cli::try_parse_from(["chatvault", "backup"]).unwrap();
        assert!(matches!(cli.command, Commands::Backup));
    }

    #[test]
    fn test_cli_parse_restore_with_snapshot() {
        let cli = Cli::try_parse_from(["chatvault", "restore", "--snapshot", "abc123"]).unwrap();
        match cli.command {
            Commands::Restore { snapshot } => assert_eq!(snapshot.as_deref(), Some("abc123")),
            _ => panic!("Expected Restore command"),
        }
    }

    #[test]
    fn test_cli_parse_restore_latest() {
        let cli = Cli::try_parse_from(["chatvault", "restore"]).unwrap();
        match cli.command {
            Commands::Restore { snapshot } => assert!(snapshot.is_none()),
            _ => panic!("Expected Restore command"),
        }
    }

    #[test]
    fn test_cli_parse_list_json() {
        let cli = Cli::try_parse_from(["chatvault", "list", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::List { json: true }));
    }

    #[test]
    fn test_cli_global_overrides() {
        let cli = Cli::try_parse_from([
            "chatvault",
            "--config",
            "custom.yaml",
            "--store",
            "memory",
            "--chats",
            "data/chats.json",
            "-v",
            "watch",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some("custom.yaml"));
        assert_eq!(cli.store.as_deref(), Some("memory"));
        assert_eq!(cli.chats, Some(PathBuf::from("data/chats.json")));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Watch));
    }

    #[test]
    fn test_cli_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["chatvault", "sync-everything"]).is_err());
    }
}

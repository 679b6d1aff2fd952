//! Chat data kept in a JSON file
//!
//! The file holds either a bare array of chat records or an object with the
//! array under `chats` (the shape of an application export). A missing or
//! blank file is an error when reading, so a mistyped path never produces an
//! empty backup that would push real ones out of retention. Restores keep
//! that shape and replace the file through a temporary sibling and a rename,
//! so readers never observe a half-written file.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::chats::ChatSource;
use crate::error::{ChatVaultError, Result};

/// Chats stored in a JSON file on disk.
///
/// # Examples
///
/// ```no_run
/// use chatvault::chats::{ChatSource, JsonFileChats};
///
/// # async fn example() -> chatvault::error::Result<()> {
/// let chats = JsonFileChats::new("chats.json");
/// let records = chats.get_chats().await?;
/// println!("{} chats", records.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileChats {
    path: PathBuf,
}

impl JsonFileChats {
    /// Uses the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the chat file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<Option<Value>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(None),
            Ok(contents) => serde_json::from_str(&contents).map(Some).map_err(|e| {
                ChatVaultError::ChatSource(format!(
                    "{} is not valid JSON: {}",
                    self.path.display(),
                    e
                ))
                .into()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ChatVaultError::ChatSource(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))
            .into()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "chats.json".into());
        name.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
        self.path.with_file_name(name)
    }
}

/// Extracts the chat array from a chat file document.
fn chats_of(path: &Path, document: Value) -> Result<Vec<Value>> {
    match document {
        Value::Array(chats) => Ok(chats),
        Value::Object(mut map) => match map.remove("chats") {
            Some(Value::Array(chats)) => Ok(chats),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(_) => Err(ChatVaultError::ChatSource(format!(
                "{}: `chats` is not an array",
                path.display()
            ))
            .into()),
        },
        _ => Err(ChatVaultError::ChatSource(format!(
            "{}: expected an array of chats or an object with `chats`",
            path.display()
        ))
        .into()),
    }
}

#[async_trait::async_trait]
impl ChatSource for JsonFileChats {
    async fn get_chats(&self) -> Result<Vec<Value>> {
        match self.read_document().await? {
            Some(document) => chats_of(&self.path, document),
            None => Err(ChatVaultError::ChatSource(format!(
                "no chat data at {} (file is missing or empty)",
                self.path.display()
            ))
            .into()),
        }
    }

    async fn restore_chats(&self, chats: Vec<Value>) -> Result<()> {
        // Keep the surrounding object when the file is an export document.
        let document = match self.read_document().await {
            Ok(Some(Value::Object(mut map))) => {
                map.insert("chats".to_string(), Value::Array(chats));
                Value::Object(map)
            }
            _ => Value::Array(chats),
        };
        let contents = serde_json::to_vec_pretty(&document)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp = self.temp_path();
        if let Err(e) = tokio::fs::write(&temp, &contents).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(ChatVaultError::ChatSource(format!(
                "Failed to write {}: {}",
                temp.display(),
                e
            ))
            .into());
        }
        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(ChatVaultError::ChatSource(format!(
                "Failed to replace {}: {}",
                self.path.display(),
                e
            ))
            .into());
        }

        tracing::debug!("Wrote chats to {}", self.path.display());
        Ok(())
    }
}

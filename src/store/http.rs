//! HTTP backup server store
//!
//! Talks to a small self-hosted backup service. JSON responses use a
//! `{ "success": bool, "error": string }` envelope with the payload in a
//! named field next to it:
//!
//! | Call              | Request                                               | Payload  |
//! |-------------------|-------------------------------------------------------|----------|
//! | find folders      | `GET /folders?name=<name>`                            | `folders`|
//! | create folder     | `POST /folders` `{name}`                              | `folder` |
//! | list snapshots    | `GET /folders/<id>/files`                             | `files`  |
//! | upload snapshot   | `POST /folders/<id>/files` `{name, mimeType, content}`| `file`   |
//! | download snapshot | `GET /files/<id>` (raw body)                          |          |
//! | delete snapshot   | `DELETE /files/<id>`                                  |          |
//!
//! When a credential provider is configured its token is sent as a bearer
//! `Authorization` header.

use std::sync::Arc;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::auth::CredentialProvider;
use crate::error::{ChatVaultError, Result, StoreFailure};
use crate::store::{
    classify_status, network_error, ContainerRef, NewObject, ObjectMeta, RemoteStore,
};

/// Response envelope of the backup server.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Folders {
    #[serde(default)]
    folders: Vec<ContainerRef>,
}

#[derive(Debug, Deserialize)]
struct Folder {
    folder: ContainerRef,
}

#[derive(Debug, Deserialize)]
struct Files {
    #[serde(default)]
    files: Vec<ObjectMeta>,
}

#[derive(Debug, Deserialize)]
struct File {
    file: ObjectMeta,
}

#[derive(Debug, Deserialize)]
struct Empty {}

/// Remote store backed by an HTTP backup server.
///
/// # Examples
///
/// ```no_run
/// use chatvault::store::{HttpServerStore, RemoteStore};
///
/// # async fn example() -> chatvault::error::Result<()> {
/// let store = HttpServerStore::new(
///     reqwest::Client::new(),
///     url::Url::parse("https://backup.example.com/backup-sync")?,
///     None,
/// );
/// let snapshots = store.list_objects("folder-1").await?;
/// # Ok(())
/// # }
/// ```
pub struct HttpServerStore {
    http: reqwest::Client,
    base: Url,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

impl std::fmt::Debug for HttpServerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpServerStore")
            .field("base", &self.base.as_str())
            .field("authenticated", &self.credentials.is_some())
            .finish()
    }
}

impl HttpServerStore {
    /// Creates a store for the server rooted at `base`.
    pub fn new(
        http: reqwest::Client,
        base: Url,
        credentials: Option<Arc<dyn CredentialProvider>>,
    ) -> Self {
        Self {
            http,
            base,
            credentials,
        }
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ChatVaultError::Config(format!("Backup server URL cannot be a base: {}", self.base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, what: &str, mut request: RequestBuilder) -> Result<Response> {
        if let Some(credentials) = &self.credentials {
            let token = credentials.credential().await?;
            request = request.bearer_auth(&token.access_token);
        }

        let response = request.send().await.map_err(|e| network_error(what, e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            if let Some(credentials) = &self.credentials {
                credentials.invalidate().await;
            }
        }
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<Envelope<Empty>>(&body)
            .ok()
            .and_then(|e| e.error)
            .unwrap_or_else(|| format!("HTTP {status}"));
        let reason = classify_status(status, &body);
        Err(ChatVaultError::store(reason, format!("{what}: {detail}")).into())
    }

    /// Decodes an envelope and returns its payload.
    async fn payload<T: DeserializeOwned>(what: &str, response: Response) -> Result<T> {
        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            ChatVaultError::store(
                StoreFailure::Network,
                format!("{what} returned an unexpected body: {e}"),
            )
        })?;
        if !envelope.success {
            return Err(ChatVaultError::store(
                StoreFailure::Network,
                format!(
                    "{what}: {}",
                    envelope.error.as_deref().unwrap_or("server reported failure")
                ),
            )
            .into());
        }
        envelope.data.ok_or_else(|| {
            ChatVaultError::store(
                StoreFailure::Network,
                format!("{what} response is missing its payload"),
            )
            .into()
        })
    }
}

#[async_trait::async_trait]
impl RemoteStore for HttpServerStore {
    async fn list_containers(&self, name: &str) -> Result<Vec<ContainerRef>> {
        let request = self.http.get(self.url(&["folders"])?).query(&[("name", name)]);
        let response = self.send("folder lookup", request).await?;
        Ok(Self::payload::<Folders>("folder lookup", response).await?.folders)
    }

    async fn create_container(&self, name: &str) -> Result<ContainerRef> {
        let request = self
            .http
            .post(self.url(&["folders"])?)
            .json(&serde_json::json!({ "name": name }));
        let response = self.send("folder creation", request).await?;
        Ok(Self::payload::<Folder>("folder creation", response).await?.folder)
    }

    async fn create_object(&self, object: NewObject) -> Result<ObjectMeta> {
        let request = self
            .http
            .post(self.url(&["folders", &object.parent_id, "files"])?)
            .json(&serde_json::json!({
                "name": object.name,
                "mimeType": object.mime_type,
                "content": String::from_utf8_lossy(&object.content),
            }));
        let response = self.send("upload", request).await?;
        Ok(Self::payload::<File>("upload", response).await?.file)
    }

    async fn list_objects(&self, parent_id: &str) -> Result<Vec<ObjectMeta>> {
        let request = self.http.get(self.url(&["folders", parent_id, "files"])?);
        let response = self.send("snapshot listing", request).await?;
        let mut files = Self::payload::<Files>("snapshot listing", response).await?.files;
        files.sort_by(|a, b| b.created_time.cmp(&a.created_time));
        Ok(files)
    }

    async fn get_object_content(&self, id: &str) -> Result<Vec<u8>> {
        let request = self.http.get(self.url(&["files", id])?);
        let response = self.send("download", request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| network_error("download", e))?;
        Ok(bytes.to_vec())
    }

    async fn delete_object(&self, id: &str) -> Result<()> {
        let request = self.http.delete(self.url(&["files", id])?);
        let response = self.send("delete", request).await?;
        // Some servers answer 204 with no body.
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(());
        }
        Self::payload::<Empty>("delete", response).await?;
        Ok(())
    }
}

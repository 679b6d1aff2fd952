//! Google Drive v3 store
//!
//! Folders are Drive files with the folder MIME type; snapshots are JSON
//! files whose single parent is the backup folder. Every request carries the
//! bearer token from the [`CredentialProvider`]. A `401` answer invalidates
//! that credential so the next call signs in again.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::auth::CredentialProvider;
use crate::error::{ChatVaultError, Result, StoreFailure};
use crate::store::{
    classify_status, network_error, ContainerRef, NewObject, ObjectMeta, RemoteStore,
};

/// MIME type Drive uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

const OBJECT_FIELDS: &str = "id,name,createdTime";
const PAGE_SIZE: &str = "100";

#[derive(Debug, Deserialize)]
struct FolderList {
    #[serde(default)]
    files: Vec<ContainerRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectPage {
    #[serde(default)]
    files: Vec<ObjectMeta>,
    next_page_token: Option<String>,
}

/// Remote store backed by the Google Drive REST API.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use chatvault::auth::StaticCredential;
/// use chatvault::store::{GoogleDriveStore, RemoteStore};
///
/// # async fn example() -> chatvault::error::Result<()> {
/// let store = GoogleDriveStore::new(
///     reqwest::Client::new(),
///     url::Url::parse("https://www.googleapis.com")?,
///     Arc::new(StaticCredential::new("ya29.token")),
/// );
/// let folders = store.list_containers("TypingMind Backup & Cloud Sync").await?;
/// # Ok(())
/// # }
/// ```
pub struct GoogleDriveStore {
    http: reqwest::Client,
    api_base: Url,
    credentials: Arc<dyn CredentialProvider>,
}

impl std::fmt::Debug for GoogleDriveStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleDriveStore")
            .field("api_base", &self.api_base.as_str())
            .finish_non_exhaustive()
    }
}

impl GoogleDriveStore {
    /// Creates a store talking to the Drive API rooted at `api_base`.
    ///
    /// Request timeouts are those of `http`.
    pub fn new(
        http: reqwest::Client,
        api_base: Url,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            http,
            api_base,
            credentials,
        }
    }

    /// `<api_base>/<prefix...>/drive/v3/files/<segments...>`
    fn files_url(&self, upload: bool, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ChatVaultError::Config(format!(
                    "Drive API base cannot be a base URL: {}",
                    self.api_base
                ))
            })?;
            path.pop_if_empty();
            if upload {
                path.push("upload");
            }
            path.extend(["drive", "v3", "files"]);
            path.extend(segments);
        }
        Ok(url)
    }

    /// Sends an authorized request and maps error statuses.
    async fn send(&self, what: &str, request: RequestBuilder) -> Result<Response> {
        let token = self.credentials.credential().await?;
        let response = request
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| network_error(what, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            self.credentials.invalidate().await;
        }
        let body = response.text().await.unwrap_or_default();
        tracing::debug!("Drive {} returned {}: {}", what, status, body);
        Err(ChatVaultError::store(
            classify_status(status, &body),
            format!("{what} returned HTTP {status}"),
        )
        .into())
    }

    async fn json<T: serde::de::DeserializeOwned>(what: &str, response: Response) -> Result<T> {
        response.json::<T>().await.map_err(|e| {
            ChatVaultError::store(
                StoreFailure::Network,
                format!("{what} returned an unexpected body: {e}"),
            )
            .into()
        })
    }
}

/// Quotes a value for a Drive `q` expression.
pub(crate) fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Builds a `multipart/related` upload body: JSON metadata, then the content.
fn multipart_body(boundary: &str, metadata: &serde_json::Value, object: &NewObject) -> Vec<u8> {
    let mut body = Vec::with_capacity(object.content.len() + 512);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n\
             {metadata}\r\n--{boundary}\r\nContent-Type: {}\r\n\r\n",
            object.mime_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(&object.content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[async_trait::async_trait]
impl RemoteStore for GoogleDriveStore {
    async fn list_containers(&self, name: &str) -> Result<Vec<ContainerRef>> {
        let query = format!(
            "name='{}' and mimeType='{}' and trashed=false",
            escape_query_value(name),
            FOLDER_MIME_TYPE
        );
        let request = self
            .http
            .get(self.files_url(false, &[])?)
            .query(&[("q", query.as_str()), ("fields", "files(id,name)"), ("spaces", "drive")]);

        let response = self.send("folder lookup", request).await?;
        let list: FolderList = Self::json("folder lookup", response).await?;
        Ok(list.files)
    }

    async fn create_container(&self, name: &str) -> Result<ContainerRef> {
        let request = self
            .http
            .post(self.files_url(false, &[])?)
            .query(&[("fields", "id,name")])
            .json(&serde_json::json!({ "name": name, "mimeType": FOLDER_MIME_TYPE }));

        let response = self.send("folder creation", request).await?;
        Self::json("folder creation", response).await
    }

    async fn create_object(&self, object: NewObject) -> Result<ObjectMeta> {
        let boundary = format!("chatvault-{}", uuid::Uuid::new_v4().simple());
        let metadata = serde_json::json!({
            "name": object.name,
            "parents": [object.parent_id],
            "mimeType": object.mime_type,
        });
        let body = multipart_body(&boundary, &metadata, &object);

        let request = self
            .http
            .post(self.files_url(true, &[])?)
            .query(&[("uploadType", "multipart"), ("fields", OBJECT_FIELDS)])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body);

        let response = self.send("upload", request).await?;
        Self::json("upload", response).await
    }

    async fn list_objects(&self, parent_id: &str) -> Result<Vec<ObjectMeta>> {
        let query = format!(
            "'{}' in parents and mimeType='application/json' and trashed=false",
            escape_query_value(parent_id)
        );
        let fields = format!("nextPageToken,files({OBJECT_FIELDS})");
        let mut objects = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.http.get(self.files_url(false, &[])?).query(&[
                ("q", query.as_str()),
                ("orderBy", "createdTime desc"),
                ("fields", fields.as_str()),
                ("pageSize", PAGE_SIZE),
            ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = self.send("snapshot listing", request).await?;
            let page: ObjectPage = Self::json("snapshot listing", response).await?;
            objects.extend(page.files);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(objects)
    }

    async fn get_object_content(&self, id: &str) -> Result<Vec<u8>> {
        let request = self
            .http
            .get(self.files_url(false, &[id])?)
            .query(&[("alt", "media")]);
        let response = self.send("download", request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| network_error("download", e))?;
        Ok(bytes.to_vec())
    }

    async fn delete_object(&self, id: &str) -> Result<()> {
        let request = self.http.request(Method::DELETE, self.files_url(false, &[id])?);
        self.send("delete", request).await?;
        Ok(())
    }
}

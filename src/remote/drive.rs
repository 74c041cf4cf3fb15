use crate::error::{ReconcileError, Result};
use crate::store::{FileRef, FileStore, FolderRef, MIME_FOLDER};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
const PAGE_SIZE: u32 = 100;

/// Google Drive v3 file store. Token acquisition (service-account flow) is
/// the caller's concern; the client only needs a ready bearer token.
pub struct DriveClient {
    client: Client,
    access_token: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct FileListResponse {
    #[serde(default)]
    files: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    id: String,
    name: String,
}

impl DriveClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            access_token: access_token.into(),
            base_url: DRIVE_BASE_URL.to_string(),
        }
    }

    /// Overrides the API endpoint, for tests against a local server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn list(&self, query: &str) -> Result<Vec<FileEntry>> {
        let url = format!("{}/files", self.base_url);
        let res = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("q", query),
                ("pageSize", &PAGE_SIZE.to_string()),
                ("fields", "files(id, name)"),
            ])
            .send()
            .await
            .map_err(|e| ReconcileError::StoreFailure(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let error_text = res.text().await.unwrap_or_default();
            return Err(ReconcileError::StoreFailure(format!(
                "Drive query failed (status {}): {}",
                status, error_text
            )));
        }

        let body: FileListResponse = res
            .json()
            .await
            .map_err(|e| ReconcileError::StoreFailure(e.to_string()))?;
        Ok(body.files)
    }
}

/// Single quotes must be escaped inside Drive query string literals.
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn build_query(
    parent_id: Option<&str>,
    name_contains: &str,
    mime_type: Option<&str>,
) -> String {
    let mut clauses = Vec::new();
    if let Some(parent) = parent_id {
        clauses.push(format!("'{}' in parents", escape(parent)));
    }
    if !name_contains.is_empty() {
        clauses.push(format!("name contains '{}'", escape(name_contains)));
    }
    if let Some(mime) = mime_type {
        clauses.push(format!("mimeType = '{}'", mime));
    }
    clauses.join(" and ")
}

#[async_trait]
impl FileStore for DriveClient {
    async fn find_folders(
        &self,
        parent_id: Option<&str>,
        name_contains: &str,
    ) -> Result<Vec<FolderRef>> {
        let query = build_query(parent_id, name_contains, Some(MIME_FOLDER));
        let entries = self.list(&query).await?;
        Ok(entries
            .into_iter()
            .map(|e| FolderRef {
                id: e.id,
                name: e.name,
            })
            .collect())
    }

    async fn find_files(
        &self,
        parent_id: &str,
        name_contains: &str,
        mime_type: Option<&str>,
    ) -> Result<Vec<FileRef>> {
        let query = build_query(Some(parent_id), name_contains, mime_type);
        let entries = self.list(&query).await?;
        Ok(entries
            .into_iter()
            .map(|e| FileRef {
                id: e.id,
                name: e.name,
            })
            .collect())
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        let url = format!("{}/files/{}", self.base_url, file_id);
        let res = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("alt", "media")])
            .send()
            .await
            .map_err(|e| ReconcileError::StoreFailure(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let error_text = res.text().await.unwrap_or_default();
            return Err(ReconcileError::StoreFailure(format!(
                "Drive download failed (status {}): {}",
                status, error_text
            )));
        }

        let bytes = res
            .bytes()
            .await
            .map_err(|e| ReconcileError::StoreFailure(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

//! File-store capability: the hierarchical folder/file namespace the
//! reconciliation reads its source documents from.
//!
//! The trait is the seam for testing; the production implementation backed
//! by Google Drive lives in [`crate::remote`] behind the `remote` feature.

use crate::config::FormType;
use crate::error::Result;
use async_trait::async_trait;

pub const MIME_FOLDER: &str = "application/vnd.google-apps.folder";
pub const MIME_PDF: &str = "application/pdf";
pub const MIME_XLSX: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub id: String,
    pub name: String,
}

/// Inferred document kind, tagged by the search that produced the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    BankStatement,
    TaxForm(FormType),
    TrialBalance,
    GeneralLedger,
    VatSummary,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Folders whose name contains `name_contains`, optionally scoped to a
    /// parent folder id.
    async fn find_folders(
        &self,
        parent_id: Option<&str>,
        name_contains: &str,
    ) -> Result<Vec<FolderRef>>;

    /// Files under `parent_id` whose name contains `name_contains`,
    /// optionally filtered by content type.
    async fn find_files(
        &self,
        parent_id: &str,
        name_contains: &str,
        mime_type: Option<&str>,
    ) -> Result<Vec<FileRef>>;

    /// Whole-file binary download.
    async fn download(&self, file_id: &str) -> Result<Vec<u8>>;
}

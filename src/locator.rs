//! Document discovery: resolves the company folder and finds the monthly
//! source documents by the naming conventions of the shared drive layout.
//!
//! Folder names embed the reporting year (`Bank_2025`); filenames embed
//! `{year}{month:02}`. All lookups are substring matches and "nothing
//! found" is a normal, reportable outcome rather than an error.

use crate::config::FormType;
use crate::error::{ReconcileError, Result};
use crate::store::{FileRef, FileStore, FolderRef, MIME_PDF, MIME_XLSX};
use log::{info, warn};
use std::collections::BTreeMap;

/// Thai folder fragments used by the drive layout: `ภพ30` holds the VAT
/// filings, `ภงด` is the parent of the withholding-tax subfolders.
pub const BANK_FOLDER_PREFIX: &str = "Bank_";
pub const PP30_FOLDER_FRAGMENT: &str = "ภพ30";
pub const PND_FOLDER_FRAGMENT: &str = "ภงด";

/// Filename fragments for the single-document spreadsheet artifacts.
pub const TB_FILE_FRAGMENT: &str = "TB";
pub const GL_FILE_FRAGMENT: &str = "GL";
/// Filing-summary export cross-read for the comparison sheet.
pub const VAT_SUMMARY_FILE_FRAGMENT: &str = "ยื่นแบบ";

/// Reporting period selecting the documents of one monthly run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Filename tag, e.g. `202503` for March 2025.
    pub fn tag(&self) -> String {
        format!("{}{:02}", self.year, self.month)
    }
}

/// Everything the locator could find for one run.
#[derive(Debug, Default)]
pub struct LocatedDocuments {
    pub bank_statements: Vec<FileRef>,
    pub form_filings: BTreeMap<FormType, Vec<FileRef>>,
    pub trial_balance: Option<FileRef>,
    pub general_ledger: Option<FileRef>,
    pub vat_summaries: Vec<FileRef>,
}

pub struct DocumentLocator<'a> {
    store: &'a dyn FileStore,
    root: FolderRef,
}

impl<'a> DocumentLocator<'a> {
    pub fn new(store: &'a dyn FileStore, root: FolderRef) -> Self {
        Self { store, root }
    }

    /// Finds the company's top-level folder by name. Absence is fatal for
    /// the whole run, so this is the one lookup that errors.
    pub async fn resolve_company_root(
        store: &'a dyn FileStore,
        company_name: &str,
    ) -> Result<Self> {
        info!("Searching for company folder '{}'", company_name);
        let folders = store.find_folders(None, company_name).await?;
        let root = first_or_warn(folders, company_name).ok_or_else(|| {
            ReconcileError::NotFound(format!(
                "No folder found for company '{}'",
                company_name
            ))
        })?;
        info!("Found company folder '{}' ({})", root.name, root.id);
        Ok(Self::new(store, root))
    }

    /// Direct child folders of a named parent, for folder configuration.
    pub async fn list_children(
        store: &dyn FileStore,
        parent_name: &str,
    ) -> Result<Vec<FolderRef>> {
        let parents = store.find_folders(None, parent_name).await?;
        match first_or_warn(parents, parent_name) {
            Some(parent) => store.find_folders(Some(&parent.id), "").await,
            None => Ok(Vec::new()),
        }
    }

    pub fn root(&self) -> &FolderRef {
        &self.root
    }

    async fn subfolder(&self, fragment: &str) -> Result<Option<FolderRef>> {
        let folders = self
            .store
            .find_folders(Some(&self.root.id), fragment)
            .await?;
        Ok(first_or_warn(folders, fragment))
    }

    /// PDFs for the period inside a named subfolder of the company root.
    /// Empty when the subfolder or the files are absent.
    async fn monthly_pdfs(&self, folder_fragment: &str, period: Period) -> Result<Vec<FileRef>> {
        let Some(folder) = self.subfolder(folder_fragment).await? else {
            warn!("Subfolder '{}' not found, skipping", folder_fragment);
            return Ok(Vec::new());
        };
        let files = self
            .store
            .find_files(&folder.id, &period.tag(), Some(MIME_PDF))
            .await?;
        info!(
            "Found {} file(s) in '{}' for {}",
            files.len(),
            folder.name,
            period.tag()
        );
        Ok(files)
    }

    /// PDFs for the period inside a subfolder of a nested parent folder
    /// (the withholding-tax layout: `ภงด/PND1`, `ภงด/SSO`, ...).
    async fn nested_monthly_pdfs(
        &self,
        parent: &FolderRef,
        sub_fragment: &str,
        period: Period,
    ) -> Result<Vec<FileRef>> {
        let folders = self
            .store
            .find_folders(Some(&parent.id), sub_fragment)
            .await?;
        let Some(folder) = first_or_warn(folders, sub_fragment) else {
            warn!("Subfolder '{}' not found under '{}'", sub_fragment, parent.name);
            return Ok(Vec::new());
        };
        self.store
            .find_files(&folder.id, &period.tag(), Some(MIME_PDF))
            .await
    }

    /// Single-document spreadsheet artifact (TB, GL). When several files
    /// match, the one whose name ends with `{tag}.xlsx` wins, otherwise the
    /// first match.
    async fn single_xlsx(&self, fragment: &str, period: Period) -> Result<Option<FileRef>> {
        let files = self
            .store
            .find_files(&self.root.id, fragment, Some(MIME_XLSX))
            .await?;
        let tag = period.tag();
        let in_period: Vec<FileRef> = files
            .into_iter()
            .filter(|f| f.name.contains(&tag))
            .collect();

        let exact_suffix = format!("{}.xlsx", tag);
        let best = in_period
            .iter()
            .find(|f| f.name.ends_with(&exact_suffix))
            .cloned()
            .or_else(|| in_period.into_iter().next());
        Ok(best)
    }

    async fn vat_summaries(&self, period: Period) -> Result<Vec<FileRef>> {
        let files = self
            .store
            .find_files(&self.root.id, VAT_SUMMARY_FILE_FRAGMENT, Some(MIME_XLSX))
            .await?;
        let tag = period.tag();
        Ok(files
            .into_iter()
            .filter(|f| f.name.contains(&tag))
            .collect())
    }

    /// Runs the full discovery pass for one reporting period.
    pub async fn locate_all(&self, period: Period) -> Result<LocatedDocuments> {
        let bank_folder = format!("{}{}", BANK_FOLDER_PREFIX, period.year);
        let bank_statements = self.monthly_pdfs(&bank_folder, period).await?;

        let mut form_filings: BTreeMap<FormType, Vec<FileRef>> = BTreeMap::new();
        form_filings.insert(
            FormType::Pp30,
            self.monthly_pdfs(PP30_FOLDER_FRAGMENT, period).await?,
        );

        if let Some(pnd_parent) = self.subfolder(PND_FOLDER_FRAGMENT).await? {
            for form in [FormType::Sso, FormType::Pnd1, FormType::Pnd3, FormType::Pnd53] {
                let files = self
                    .nested_monthly_pdfs(&pnd_parent, form.subfolder_fragment(), period)
                    .await?;
                form_filings.insert(form, files);
            }
        } else {
            warn!("Folder '{}' not found, no withholding-tax filings", PND_FOLDER_FRAGMENT);
        }

        Ok(LocatedDocuments {
            bank_statements,
            form_filings,
            trial_balance: self.single_xlsx(TB_FILE_FRAGMENT, period).await?,
            general_ledger: self.single_xlsx(GL_FILE_FRAGMENT, period).await?,
            vat_summaries: self.vat_summaries(period).await?,
        })
    }
}

/// First match wins; more than one match is flagged but not fatal.
fn first_or_warn(mut folders: Vec<FolderRef>, search: &str) -> Option<FolderRef> {
    if folders.len() > 1 {
        warn!(
            "Search '{}' matched {} folders, using the first ('{}')",
            search,
            folders.len(),
            folders[0].name
        );
    }
    if folders.is_empty() {
        None
    } else {
        Some(folders.remove(0))
    }
}

/// Bank statements whose filename contains the bank's display name,
/// case-insensitively, as the statements are named after the bank.
pub fn files_for_bank<'f>(files: &'f [FileRef], bank_name: &str) -> Vec<&'f FileRef> {
    let needle = bank_name.to_lowercase();
    files
        .iter()
        .filter(|f| f.name.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_tag_zero_pads_month() {
        assert_eq!(Period::new(2025, 3).tag(), "202503");
        assert_eq!(Period::new(2025, 12).tag(), "202512");
    }

    #[test]
    fn test_files_for_bank_is_case_insensitive() {
        let files = vec![
            FileRef {
                id: "1".into(),
                name: "KBANK_202503.pdf".into(),
            },
            FileRef {
                id: "2".into(),
                name: "scb_202503.pdf".into(),
            },
        ];
        let matched = files_for_bank(&files, "KBank");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, "1");
        assert!(files_for_bank(&files, "TMB").is_empty());
    }

    #[test]
    fn test_first_or_warn_takes_first() {
        let folders = vec![
            FolderRef {
                id: "a".into(),
                name: "ACME 2024".into(),
            },
            FolderRef {
                id: "b".into(),
                name: "ACME 2025".into(),
            },
        ];
        assert_eq!(first_or_warn(folders, "ACME").unwrap().id, "a");
        assert!(first_or_warn(Vec::new(), "ACME").is_none());
    }
}

//! OCR extraction adapter: wraps the black-box document-to-text service
//! with the per-document-type instruction table and the multi-file
//! aggregation rule.

use crate::amount::{normalize, Amount};
use crate::error::Result;
use crate::store::{DocumentKind, FileRef, FileStore};
use async_trait::async_trait;
use log::{debug, warn};

/// Sentinel returned in place of service output when extraction could not
/// run or failed; deliberately non-numeric so it never survives
/// normalization into a sum.
pub const OCR_ERROR_SENTINEL: &str = "ERROR";

/// Black-box OCR/LLM capability: document bytes plus an instruction string
/// in, free-form text out. The production Gemini-backed implementation
/// lives in [`crate::remote`].
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn extract_text(
        &self,
        document: &[u8],
        file_name: &str,
        prompt: &str,
    ) -> Result<String>;
}

/// Fixed instruction per document kind, each requesting a bare numeric
/// answer so the response can go straight through the normalizer.
pub fn prompt_for(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::BankStatement => {
            "This is a scanned bank statement. Answer with the closing balance \
             for the statement period as a plain number with no currency \
             symbol, no thousands separators and no explanation."
        }
        DocumentKind::TaxForm(form) => match form {
            crate::config::FormType::Pp30 => {
                "This is a Thai PP30 VAT filing (ภ.พ.30). Answer with the net \
                 VAT amount payable as a plain number only."
            }
            crate::config::FormType::Sso => {
                "This is a Thai social security contribution filing. Answer \
                 with the total contribution amount as a plain number only."
            }
            _ => {
                "This is a Thai withholding tax filing (ภ.ง.ด.). Answer with \
                 the total tax remitted as a plain number only."
            }
        },
        // Structured spreadsheets are parsed directly and should not reach
        // the OCR path; the generic prompt keeps the table total anyway.
        DocumentKind::TrialBalance | DocumentKind::GeneralLedger | DocumentKind::VatSummary => {
            "Answer with the document's total amount as a plain number only."
        }
    }
}

pub struct OcrAdapter<'a> {
    engine: &'a dyn OcrEngine,
}

impl<'a> OcrAdapter<'a> {
    pub fn new(engine: &'a dyn OcrEngine) -> Self {
        Self { engine }
    }

    /// Runs the service on one document. Never errors past this boundary:
    /// empty input or a failed call yields the sentinel string.
    pub async fn extract(&self, document: &[u8], file_name: &str, kind: DocumentKind) -> String {
        if document.is_empty() {
            warn!("Empty document content for '{}', skipping OCR", file_name);
            return OCR_ERROR_SENTINEL.to_string();
        }
        match self
            .engine
            .extract_text(document, file_name, prompt_for(kind))
            .await
        {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!("OCR failed for '{}': {}", file_name, e);
                OCR_ERROR_SENTINEL.to_string()
            }
        }
    }

    /// Extracts an amount from every file and sums the ones that
    /// normalize. Zero documents yields [`Amount::NotFound`]; so does a
    /// set where nothing normalized. Partial failures are excluded from
    /// the sum rather than failing the aggregate.
    pub async fn extract_and_sum(
        &self,
        store: &dyn FileStore,
        files: &[FileRef],
        kind: DocumentKind,
    ) -> Amount {
        if files.is_empty() {
            return Amount::NotFound;
        }

        let mut sum = 0.0;
        let mut resolved = 0usize;

        for file in files {
            let bytes = match store.download(&file.id).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Download failed for '{}': {}", file.name, e);
                    continue;
                }
            };
            let text = self.extract(&bytes, &file.name, kind).await;
            match normalize(&text) {
                Amount::Value(v) => {
                    debug!("'{}' extracted as {}", file.name, v);
                    sum += v;
                    resolved += 1;
                }
                other => {
                    warn!(
                        "Could not normalize OCR output for '{}': {:?}",
                        file.name, other
                    );
                }
            }
        }

        if resolved == 0 {
            Amount::NotFound
        } else {
            Amount::Value(sum)
        }
    }
}

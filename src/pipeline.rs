//! Report-run orchestration: one strictly sequential pipeline of file-store
//! lookups, downloads, OCR calls and in-memory workbook assembly per run.
//!
//! Nothing is shared across runs; every run re-reads the store and operates
//! on its own company record, so concurrent runs for different companies do
//! not interfere. Either a complete workbook comes back or a structured
//! error naming the stage that failed.

use crate::config::{Category, CompanyConfig, FormType};
use crate::error::{ReconcileError, Result};
use crate::ledger;
use crate::locator::{files_for_bank, DocumentLocator, LocatedDocuments, Period};
use crate::monthly;
use crate::ocr::{OcrAdapter, OcrEngine};
use crate::report::{self, ComparisonRow, ReportInputs, ReportParts};
use crate::sheet::{self, SheetData};
use crate::store::{DocumentKind, FileStore};
use crate::trial_balance;
use crate::vat;
use log::{info, warn};
use std::collections::BTreeMap;

/// Parameters selecting one report run.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub company: CompanyConfig,
    pub period: Period,
    pub parts: ReportParts,
}

impl ReportRequest {
    pub fn new(company: CompanyConfig, period: Period) -> Self {
        Self {
            company,
            period,
            parts: ReportParts::default(),
        }
    }

    pub fn workflow_file_name(&self) -> String {
        format!("{}_{}_workflow.xlsx", self.company.name, self.period.tag())
    }

    pub fn reconcile_file_name(&self) -> String {
        format!("{}_{}_reconcile.xlsx", self.company.name, self.period.tag())
    }
}

pub struct ReconcileEngine {
    store: Box<dyn FileStore>,
    ocr: Box<dyn OcrEngine>,
}

impl ReconcileEngine {
    pub fn new(store: Box<dyn FileStore>, ocr: Box<dyn OcrEngine>) -> Self {
        Self { store, ocr }
    }

    /// Workflow variant: discovery, extraction and the comparison sheet
    /// only.
    pub async fn build_workflow_report(&self, request: &ReportRequest) -> Result<Vec<u8>> {
        info!(
            "Workflow run for '{}' period {}",
            request.company.name,
            request.period.tag()
        );
        let locator =
            DocumentLocator::resolve_company_root(self.store.as_ref(), &request.company.name)
                .await?;
        let documents = locator.locate_all(request.period).await?;

        let inputs = ReportInputs::with_comparison(
            self.comparison_rows(&request.company, &documents).await?,
        );
        report::build_workbook(
            &request.company.name,
            request.period,
            ReportParts {
                tb_sheet: false,
                gl_sheet: false,
                pp30_sheet: false,
            },
            &inputs,
        )
    }

    /// Reconcile variant: comparison sheet plus the requested TB/GL/PP30
    /// stages. A missing GL degrades by omitting its dependent sheets; a
    /// missing TB aborts when the TB stage was requested.
    pub async fn build_reconcile_report(&self, request: &ReportRequest) -> Result<Vec<u8>> {
        info!(
            "Reconcile run for '{}' period {}",
            request.company.name,
            request.period.tag()
        );
        let locator =
            DocumentLocator::resolve_company_root(self.store.as_ref(), &request.company.name)
                .await?;
        let documents = locator.locate_all(request.period).await?;

        let mut inputs =
            ReportInputs::with_comparison(self.comparison_rows(&request.company, &documents).await?);

        if request.parts.tb_sheet {
            let tb = self.load_trial_balance(&documents).await?.ok_or_else(|| {
                ReconcileError::stage("trial balance", "TB file not found")
            })?;
            inputs.trial_balance = Some(tb);
        }

        if request.parts.gl_sheet || request.parts.pp30_sheet {
            match self.load_ledger(&documents).await? {
                Some(sheets) => {
                    if request.parts.pp30_sheet {
                        self.aggregate_revenue(&request.company, &sheets, &mut inputs);
                    }
                    if request.parts.gl_sheet {
                        let primary = &sheets[0];
                        let segmented = ledger::segment(&primary.rows);
                        info!("Segmented GL into {} account block(s)", segmented.len());
                        inputs.segmented = Some(segmented);
                        inputs.ledger_sheets = Some(sheets);
                    }
                }
                None => {
                    warn!("No GL file found; omitting ledger-derived sheets");
                }
            }
        }

        if request.parts.pp30_sheet {
            let pp30_files = documents
                .form_filings
                .get(&FormType::Pp30)
                .cloned()
                .unwrap_or_default();
            inputs.pp30_filing = OcrAdapter::new(self.ocr.as_ref())
                .extract_and_sum(
                    self.store.as_ref(),
                    &pp30_files,
                    DocumentKind::TaxForm(FormType::Pp30),
                )
                .await;
        }

        report::build_workbook(
            &request.company.name,
            request.period,
            request.parts,
            &inputs,
        )
    }

    /// Builds the comparison rows shared by both report variants: one row
    /// per configured bank and tax form, with the OCR, TB and
    /// filing-summary amounts side by side.
    async fn comparison_rows(
        &self,
        company: &CompanyConfig,
        documents: &LocatedDocuments,
    ) -> Result<Vec<ComparisonRow>> {
        let adapter = OcrAdapter::new(self.ocr.as_ref());

        let tb_balances = match self.load_trial_balance(documents).await? {
            Some(tb) => Some(trial_balance::read_trial_balance(&tb)),
            None => {
                warn!("TB file not found; comparison TB column left blank");
                None
            }
        };
        let filing_totals = self.load_vat_totals(documents).await?;

        let mut rows = Vec::new();
        for category in company.categories() {
            let (files, kind) = match &category {
                Category::Bank { name, .. } => (
                    files_for_bank(&documents.bank_statements, name)
                        .into_iter()
                        .cloned()
                        .collect::<Vec<_>>(),
                    DocumentKind::BankStatement,
                ),
                Category::Form { form, .. } => (
                    documents
                        .form_filings
                        .get(form)
                        .cloned()
                        .unwrap_or_default(),
                    DocumentKind::TaxForm(*form),
                ),
            };

            let ocr_amount = adapter
                .extract_and_sum(self.store.as_ref(), &files, kind)
                .await;

            let tb_amount = tb_balances
                .as_ref()
                .and_then(|balances| lookup_balance(balances, category.tb_code()));

            let filing_amount = match &category {
                Category::Form { form, .. } => filing_totals.get(form).copied(),
                Category::Bank { .. } => None,
            };

            rows.push(ComparisonRow {
                name: category.display_name().to_string(),
                tb_code: category.tb_code().to_string(),
                files_found: files.iter().map(|f| f.name.clone()).collect(),
                ocr_amount,
                tb_amount,
                filing_amount,
            });
        }
        Ok(rows)
    }

    async fn load_trial_balance(
        &self,
        documents: &LocatedDocuments,
    ) -> Result<Option<SheetData>> {
        let Some(file) = &documents.trial_balance else {
            return Ok(None);
        };
        let bytes = self.store.download(&file.id).await?;
        let sheet = sheet::load_first_sheet(&bytes)
            .map_err(|e| ReconcileError::stage("trial balance", e))?;
        Ok(sheet)
    }

    async fn load_ledger(&self, documents: &LocatedDocuments) -> Result<Option<Vec<SheetData>>> {
        let Some(file) = &documents.general_ledger else {
            return Ok(None);
        };
        let bytes = self.store.download(&file.id).await?;
        let sheets =
            sheet::load_workbook(&bytes).map_err(|e| ReconcileError::stage("general ledger", e))?;
        if sheets.is_empty() {
            warn!("GL workbook '{}' has no sheets", file.name);
            return Ok(None);
        }
        Ok(Some(sheets))
    }

    async fn load_vat_totals(
        &self,
        documents: &LocatedDocuments,
    ) -> Result<BTreeMap<FormType, f64>> {
        let mut totals = BTreeMap::new();
        // Source-file iteration order is preserved: the last file wins for
        // a repeated form key.
        for file in &documents.vat_summaries {
            let bytes = match self.store.download(&file.id).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Download failed for filing summary '{}': {}", file.name, e);
                    continue;
                }
            };
            match sheet::load_first_sheet(&bytes) {
                Ok(Some(summary)) => vat::read_vat_summary(&summary, &mut totals),
                Ok(None) => warn!("Filing summary '{}' is empty", file.name),
                Err(e) => warn!("Could not read filing summary '{}': {}", file.name, e),
            }
        }
        Ok(totals)
    }

    /// Ledger-derived monthly revenue and credit-note totals for the PP30
    /// sheet. Missing configuration skips the computation; it is never
    /// defaulted to an account code.
    fn aggregate_revenue(
        &self,
        company: &CompanyConfig,
        sheets: &[SheetData],
        inputs: &mut ReportInputs,
    ) {
        let revenue_codes = company.configured_revenue_codes();
        if revenue_codes.is_empty() {
            warn!(
                "No revenue TB code configured for '{}'; PP30 revenue columns skipped",
                company.name
            );
        }
        for code in revenue_codes {
            let bucket = monthly::aggregate_by_category(sheets, code);
            inputs.revenue_monthly.push((code.to_string(), bucket));
        }
        if let Some(code) = company.configured_credit_note_code() {
            let bucket = monthly::aggregate_by_category(sheets, code);
            inputs.credit_note_monthly = Some((code.to_string(), bucket));
        }
    }
}

/// TB lookup by code prefix: configured codes are matched against the TB's
/// code strings by prefix so sub-account suffixes still resolve.
fn lookup_balance(balances: &BTreeMap<String, f64>, code: &str) -> Option<f64> {
    if code.trim().is_empty() {
        return None;
    }
    if let Some(v) = balances.get(code) {
        return Some(*v);
    }
    balances
        .iter()
        .find(|(tb_code, _)| tb_code.starts_with(code))
        .map(|(_, v)| *v)
}

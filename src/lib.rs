//! # Accounting Reconciler
//!
//! A library for reconciling the monthly accounting records of Thai
//! small/medium businesses. It locates bank statements, tax filing PDFs,
//! trial-balance (TB) and general-ledger (GL) exports in a shared drive,
//! extracts monetary amounts from the scanned documents via an OCR/LLM
//! service, cross-references them against the company's TB-code mapping,
//! and emits a multi-sheet Excel workbook with live cross-check formulas.
//!
//! ## Core Concepts
//!
//! - **TB code**: an opaque account-code string whose leading digit selects
//!   the sign convention (`1`/`2`/`3` balance sheet, `4`/`5` P&L)
//! - **Workflow run**: document discovery plus the comparison sheet
//! - **Reconcile run**: the comparison sheet plus independently toggleable
//!   TB, GL and PP30 reconciliation sheets
//! - **Capability traits**: the file store and the OCR service are traits,
//!   so the whole pipeline runs against in-memory fakes in tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use accounting_reconciler::*;
//!
//! let engine = ReconcileEngine::new(
//!     Box::new(remote::DriveClient::new(drive_token)),
//!     Box::new(remote::GeminiOcr::new(gemini_key)),
//! );
//!
//! let request = ReportRequest::new(company_config, Period::new(2025, 3));
//! let workbook_bytes = engine.build_reconcile_report(&request).await?;
//! ```

pub mod amount;
pub mod config;
pub mod error;
pub mod ledger;
pub mod locator;
pub mod monthly;
pub mod ocr;
pub mod pipeline;
pub mod report;
pub mod sheet;
pub mod store;
pub mod trial_balance;
pub mod vat;

#[cfg(feature = "remote")]
pub mod remote;

pub use amount::{normalize, Amount};
pub use config::{account_side, AccountSide, BankAccount, Category, CompanyConfig, FormType};
pub use error::{ReconcileError, Result};
pub use ledger::{segment, SegmentedLedger};
pub use locator::{DocumentLocator, LocatedDocuments, Period};
pub use monthly::MonthlyBucket;
pub use ocr::{OcrAdapter, OcrEngine};
pub use pipeline::{ReconcileEngine, ReportRequest};
pub use report::{ComparisonRow, ReportInputs, ReportParts};
pub use sheet::{Cell, LedgerRow, Row, SheetData};
pub use store::{DocumentKind, FileRef, FileStore, FolderRef};
pub use trial_balance::read_trial_balance;
pub use vat::read_vat_summaries;

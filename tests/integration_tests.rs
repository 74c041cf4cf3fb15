use accounting_reconciler::*;
use async_trait::async_trait;
use rust_xlsxwriter::Workbook;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// In-memory fakes
// ---------------------------------------------------------------------------

struct FakeFolder {
    id: String,
    parent: Option<String>,
    name: String,
}

struct FakeFile {
    id: String,
    parent: String,
    name: String,
    mime: String,
    bytes: Vec<u8>,
}

/// Substring-search file store mirroring the drive query semantics: a
/// `None` parent searches everywhere, an empty needle matches everything.
#[derive(Default)]
struct FakeStore {
    folders: Vec<FakeFolder>,
    files: Vec<FakeFile>,
}

impl FakeStore {
    fn folder(mut self, id: &str, parent: Option<&str>, name: &str) -> Self {
        self.folders.push(FakeFolder {
            id: id.to_string(),
            parent: parent.map(str::to_string),
            name: name.to_string(),
        });
        self
    }

    fn file(mut self, id: &str, parent: &str, name: &str, mime: &str, bytes: Vec<u8>) -> Self {
        self.files.push(FakeFile {
            id: id.to_string(),
            parent: parent.to_string(),
            name: name.to_string(),
            mime: mime.to_string(),
            bytes,
        });
        self
    }
}

#[async_trait]
impl FileStore for FakeStore {
    async fn find_folders(
        &self,
        parent_id: Option<&str>,
        name_contains: &str,
    ) -> Result<Vec<FolderRef>> {
        Ok(self
            .folders
            .iter()
            .filter(|f| parent_id.is_none() || f.parent.as_deref() == parent_id)
            .filter(|f| f.name.contains(name_contains))
            .map(|f| FolderRef {
                id: f.id.clone(),
                name: f.name.clone(),
            })
            .collect())
    }

    async fn find_files(
        &self,
        parent_id: &str,
        name_contains: &str,
        mime_type: Option<&str>,
    ) -> Result<Vec<FileRef>> {
        Ok(self
            .files
            .iter()
            .filter(|f| f.parent == parent_id)
            .filter(|f| f.name.contains(name_contains))
            .filter(|f| mime_type.map_or(true, |m| f.mime == m))
            .map(|f| FileRef {
                id: f.id.clone(),
                name: f.name.clone(),
            })
            .collect())
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        self.files
            .iter()
            .find(|f| f.id == file_id)
            .map(|f| f.bytes.clone())
            .ok_or_else(|| ReconcileError::NotFound(format!("no file '{}'", file_id)))
    }
}

/// OCR fake scripted by file name.
struct ScriptedOcr {
    responses: BTreeMap<String, String>,
}

impl ScriptedOcr {
    fn new(responses: &[(&str, &str)]) -> Self {
        Self {
            responses: responses
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl OcrEngine for ScriptedOcr {
    async fn extract_text(
        &self,
        _document: &[u8],
        file_name: &str,
        _prompt: &str,
    ) -> Result<String> {
        self.responses
            .get(file_name)
            .cloned()
            .ok_or_else(|| ReconcileError::OcrFailure(format!("unscripted file '{}'", file_name)))
    }
}

// ---------------------------------------------------------------------------
// Spreadsheet fixtures
// ---------------------------------------------------------------------------

fn tb_fixture() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let ws = workbook.add_worksheet();
    ws.write_string(0, 0, "Code").unwrap();
    ws.write_string(0, 1, "Account Name").unwrap();
    ws.write_string(0, 2, "Debit").unwrap();
    ws.write_string(0, 3, "Credit").unwrap();
    ws.write_string(1, 0, "1061").unwrap();
    ws.write_string(1, 1, "Cash at bank").unwrap();
    ws.write_number(1, 2, 12500.0).unwrap();
    ws.write_number(1, 3, 0.0).unwrap();
    ws.write_string(2, 0, "2045").unwrap();
    ws.write_string(2, 1, "Withholding tax payable").unwrap();
    ws.write_number(2, 2, 0.0).unwrap();
    ws.write_number(2, 3, 3200.0).unwrap();
    workbook.save_to_buffer().unwrap()
}

fn gl_fixture() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let ws = workbook.add_worksheet();
    ws.set_name("GL").unwrap();
    // Bank account block.
    ws.write_string(0, 0, "1061 เงินฝากธนาคาร กระแสรายวัน").unwrap();
    ws.write_string(1, 0, "ลำดับที่").unwrap();
    ws.write_string(1, 1, "เลขที่เอกสาร").unwrap();
    ws.write_string(2, 0, "1").unwrap();
    ws.write_string(2, 1, "JV001").unwrap();
    ws.write_string(2, 2, "15/03/2025").unwrap();
    ws.write_string(2, 3, "Deposit").unwrap();
    ws.write_number(2, 6, 0.0).unwrap();
    ws.write_number(2, 7, 12500.0).unwrap();
    // Row 3 left blank, terminating the block.
    ws.write_string(4, 0, "4001 รายได้จากการขาย").unwrap();
    ws.write_string(5, 0, "ลำดับที่").unwrap();
    ws.write_string(6, 0, "1").unwrap();
    ws.write_string(6, 1, "SV001").unwrap();
    ws.write_string(6, 2, "10/03/2025").unwrap();
    ws.write_string(6, 3, "Sales invoice").unwrap();
    ws.write_number(6, 6, 0.0).unwrap();
    ws.write_number(6, 7, 20000.0).unwrap();
    workbook.save_to_buffer().unwrap()
}

fn vat_fixture() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let ws = workbook.add_worksheet();
    // Anchor (0,0) so the absolute row/column positions survive the read.
    ws.write_string(0, 0, "สรุปการยื่นแบบ").unwrap();
    ws.write_string(1, 1, "ภ.ง.ด.1").unwrap();
    ws.write_number(1, 3, 1500.0).unwrap();
    ws.write_string(2, 1, "ภ.พ.30").unwrap();
    ws.write_number(2, 3, 4200.0).unwrap();
    ws.write_string(13, 1, "ประกันสังคม").unwrap();
    ws.write_number(13, 3, 2250.0).unwrap();
    workbook.save_to_buffer().unwrap()
}

// ---------------------------------------------------------------------------
// Scenario wiring
// ---------------------------------------------------------------------------

const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const PDF: &str = "application/pdf";

fn drive_tree(include_tb: bool, include_gl: bool) -> FakeStore {
    let mut store = FakeStore::default()
        .folder("root", None, "ACME Co., Ltd.")
        .folder("bank", Some("root"), "Bank_2025")
        .folder("pp30", Some("root"), "ภพ30 ACME")
        .folder("pnd", Some("root"), "ภงด")
        .folder("pnd1", Some("pnd"), "PND1")
        .file("f-kbank", "bank", "KBANK_202503.pdf", PDF, b"pdf".to_vec())
        .file("f-pp30", "pp30", "PP30_202503.pdf", PDF, b"pdf".to_vec())
        .file("f-pnd1", "pnd1", "PND1_202503.pdf", PDF, b"pdf".to_vec())
        .file("f-vat", "root", "ยื่นแบบ_202503.xlsx", XLSX, vat_fixture());
    if include_tb {
        store = store.file("f-tb", "root", "ACME_TB_202503.xlsx", XLSX, tb_fixture());
    }
    if include_gl {
        store = store.file("f-gl", "root", "ACME_GL_202503.xlsx", XLSX, gl_fixture());
    }
    store
}

fn scripted_ocr() -> ScriptedOcr {
    ScriptedOcr::new(&[
        ("KBANK_202503.pdf", "12,500.00"),
        ("PP30_202503.pdf", "4,200.00"),
        ("PND1_202503.pdf", "3,200.00"),
    ])
}

fn acme_config() -> CompanyConfig {
    let mut config = CompanyConfig {
        name: "ACME Co., Ltd.".to_string(),
        banks: vec![BankAccount {
            name: "KBank".to_string(),
            tb_code: "1061".to_string(),
        }],
        revenue_codes: vec!["4001".to_string()],
        ..Default::default()
    };
    config.forms.insert(FormType::Pnd1, "2045".to_string());
    config
}

fn engine(store: FakeStore) -> ReconcileEngine {
    ReconcileEngine::new(Box::new(store), Box::new(scripted_ocr()))
}

fn sheet<'a>(sheets: &'a [SheetData], name: &str) -> &'a SheetData {
    sheets
        .iter()
        .find(|s| s.name == name)
        .unwrap_or_else(|| panic!("missing sheet '{}'", name))
}

// ---------------------------------------------------------------------------
// End-to-end scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn workflow_report_compares_ocr_against_tb_and_filings() -> anyhow::Result<()> {
    let engine = engine(drive_tree(true, true));
    let request = ReportRequest::new(acme_config(), Period::new(2025, 3));
    assert_eq!(request.workflow_file_name(), "ACME Co., Ltd._202503_workflow.xlsx");

    let bytes = engine.build_workflow_report(&request).await?;
    let sheets = sheet::load_workbook(&bytes)?;

    // The workflow variant carries the comparison sheet only.
    assert_eq!(sheets.len(), 1);
    let result = sheet(&sheets, "Workflow Result");

    // Banks render before the fixed form categories.
    assert_eq!(result.rows[1][0], Cell::text("KBank"));
    assert_eq!(result.rows[1][2], Cell::text("KBANK_202503.pdf"));
    assert_eq!(result.rows[1][3], Cell::Number(12500.0));
    assert_eq!(result.rows[1][4], Cell::Number(12500.0));

    // PND1: OCR sum, TB credit balance carried negative, filing summary
    // amount cross-read from the ยื่นแบบ export.
    assert_eq!(result.rows[2][0], Cell::text("PND1"));
    assert_eq!(result.rows[2][3], Cell::Number(3200.0));
    assert_eq!(result.rows[2][4], Cell::Number(-3200.0));
    assert_eq!(result.rows[2][5], Cell::Number(1500.0));

    // Unconfigured forms still get a row, with placeholders throughout.
    assert_eq!(result.rows[3][0], Cell::text("PND3"));
    assert_eq!(result.rows[3][3], Cell::text("N/A"));
    assert_eq!(result.rows[3][4], Cell::text("-"));

    // SSO filing amount comes from the summary's fixed row.
    assert_eq!(result.rows[6][0], Cell::text("SSO"));
    assert_eq!(result.rows[6][5], Cell::Number(2250.0));
    Ok(())
}

#[tokio::test]
async fn reconcile_report_builds_all_requested_sheets() -> anyhow::Result<()> {
    let engine = engine(drive_tree(true, true));
    let request = ReportRequest::new(acme_config(), Period::new(2025, 3));
    assert_eq!(
        request.reconcile_file_name(),
        "ACME Co., Ltd._202503_reconcile.xlsx"
    );

    let bytes = engine.build_reconcile_report(&request).await?;
    let sheets = sheet::load_workbook(&bytes)?;
    let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();

    assert!(names.contains(&"Workflow Result"));
    assert!(names.contains(&"TB"));
    assert!(names.contains(&"GL"));
    assert!(names.contains(&"PP30"));
    // Per-account sheets exist for asset/liability ledger blocks only; the
    // revenue block (leading digit 4) is not segmented into its own sheet.
    assert!(names.contains(&"1061"));
    assert!(!names.contains(&"4001"));

    // The TB sheet carries the source rows below the subtotal band.
    let tb = sheet(&sheets, "TB");
    let codes: Vec<String> = tb
        .rows
        .iter()
        .filter_map(|r| r.first())
        .map(Cell::display)
        .collect();
    assert!(codes.iter().any(|c| c == "1061"));
    assert!(codes.iter().any(|c| c == "2045"));

    // The GL sheet is a verbatim copy of the ledger's first sheet.
    let gl = sheet(&sheets, "GL");
    assert_eq!(gl.rows[2][1], Cell::text("JV001"));
    assert_eq!(gl.rows[2][7], Cell::Number(12500.0));

    // PP30 sheet: the OCR'd filing lands on the requested month's row and
    // the revenue column carries the ledger's March total.
    let pp30 = sheet(&sheets, "PP30");
    assert_eq!(pp30.rows.len(), 13);
    assert_eq!(pp30.rows[3][1], Cell::Number(4200.0));
    assert_eq!(pp30.rows[3][2], Cell::Number(20000.0));
    assert_eq!(pp30.rows[4][1], Cell::text("-"));
    assert_eq!(pp30.rows[4][2], Cell::text("-"));
    Ok(())
}

#[tokio::test]
async fn reconcile_without_gl_omits_ledger_sheets_but_keeps_tb() -> anyhow::Result<()> {
    let engine = engine(drive_tree(true, false));
    let request = ReportRequest::new(acme_config(), Period::new(2025, 3));

    let bytes = engine.build_reconcile_report(&request).await?;
    let sheets = sheet::load_workbook(&bytes)?;
    let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();

    assert!(names.contains(&"Workflow Result"));
    assert!(names.contains(&"TB"));
    assert!(!names.contains(&"GL"));
    assert!(!names.contains(&"1061"));

    // The PP30 sheet still renders; its ledger-derived columns are absent
    // but the OCR'd filing amount survives.
    let pp30 = sheet(&sheets, "PP30");
    assert_eq!(pp30.rows[3][1], Cell::Number(4200.0));
    Ok(())
}

#[tokio::test]
async fn reconcile_without_tb_fails_when_tb_sheet_requested() {
    let engine = engine(drive_tree(false, true));
    let request = ReportRequest::new(acme_config(), Period::new(2025, 3));

    let err = engine.build_reconcile_report(&request).await.unwrap_err();
    assert!(matches!(err, ReconcileError::StageFailed { .. }));
}

#[tokio::test]
async fn workflow_without_tb_still_completes_with_placeholders() -> anyhow::Result<()> {
    let engine = engine(drive_tree(false, true));
    let request = ReportRequest::new(acme_config(), Period::new(2025, 3));

    let bytes = engine.build_workflow_report(&request).await?;
    let sheets = sheet::load_workbook(&bytes)?;
    let result = sheet(&sheets, "Workflow Result");

    // OCR amounts resolve without a TB; the TB column holds dashes.
    assert_eq!(result.rows[1][3], Cell::Number(12500.0));
    assert_eq!(result.rows[1][4], Cell::text("-"));
    Ok(())
}

#[tokio::test]
async fn identical_inputs_build_identical_reports() -> anyhow::Result<()> {
    let request = ReportRequest::new(acme_config(), Period::new(2025, 3));

    let first = engine(drive_tree(true, true))
        .build_reconcile_report(&request)
        .await?;
    let second = engine(drive_tree(true, true))
        .build_reconcile_report(&request)
        .await?;

    // Compare decoded cell values rather than raw bytes; the container
    // embeds metadata that may differ between writes.
    let first_sheets = sheet::load_workbook(&first)?;
    let second_sheets = sheet::load_workbook(&second)?;
    assert_eq!(first_sheets.len(), second_sheets.len());
    for (a, b) in first_sheets.iter().zip(&second_sheets) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.rows, b.rows);
    }
    Ok(())
}

#[tokio::test]
async fn missing_company_folder_is_a_not_found_error() {
    let engine = engine(FakeStore::default());
    let request = ReportRequest::new(acme_config(), Period::new(2025, 3));

    let err = engine.build_workflow_report(&request).await.unwrap_err();
    assert!(matches!(err, ReconcileError::NotFound(_)));
}

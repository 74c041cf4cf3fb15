//! Report synthesizer: assembles the output workbook sheet by sheet.
//!
//! Cross-checks are written as live formulas, not pre-computed values, so
//! the file recomputes when opened in a spreadsheet viewer. The workbook
//! bytes are only produced after every sheet is built; a missing optional
//! source omits its dependent sheets instead of aborting.

use crate::amount::Amount;
use crate::config::leading_digit;
use crate::error::Result;
use crate::ledger::SegmentedLedger;
use crate::locator::Period;
use crate::monthly::MonthlyBucket;
use crate::sheet::{Cell, SheetData};
use log::info;
use rust_xlsxwriter::{Formula, Workbook, Worksheet};

/// Sheet row (0-based) where the copied TB range begins; rows above hold
/// the title and the column-wide subtotal formulas.
pub const TB_COPY_START_ROW: u32 = 4;

/// One row of the workflow comparison sheet.
#[derive(Debug, Clone)]
pub struct ComparisonRow {
    pub name: String,
    pub tb_code: String,
    pub files_found: Vec<String>,
    pub ocr_amount: Amount,
    pub tb_amount: Option<f64>,
    pub filing_amount: Option<f64>,
}

/// Independently toggleable reconcile stages.
#[derive(Debug, Clone, Copy)]
pub struct ReportParts {
    pub tb_sheet: bool,
    pub gl_sheet: bool,
    pub pp30_sheet: bool,
}

impl Default for ReportParts {
    fn default() -> Self {
        Self {
            tb_sheet: true,
            gl_sheet: true,
            pp30_sheet: true,
        }
    }
}

/// Everything gathered by the pipeline that the synthesizer renders.
#[derive(Debug, Default)]
pub struct ReportInputs {
    pub comparison: Vec<ComparisonRow>,
    pub trial_balance: Option<SheetData>,
    pub ledger_sheets: Option<Vec<SheetData>>,
    pub segmented: Option<SegmentedLedger>,
    pub pp30_filing: Amount,
    /// Ledger-derived revenue totals, one column per configured code.
    pub revenue_monthly: Vec<(String, MonthlyBucket)>,
    pub credit_note_monthly: Option<(String, MonthlyBucket)>,
}

impl ReportInputs {
    pub fn with_comparison(comparison: Vec<ComparisonRow>) -> Self {
        Self {
            comparison,
            pp30_filing: Amount::NotFound,
            ..Default::default()
        }
    }
}

/// Builds the full report workbook and returns its bytes.
pub fn build_workbook(
    company: &str,
    period: Period,
    parts: ReportParts,
    inputs: &ReportInputs,
) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    write_comparison_sheet(&mut workbook, &inputs.comparison)?;

    if parts.tb_sheet {
        if let Some(tb) = &inputs.trial_balance {
            write_tb_sheet(&mut workbook, company, period, tb)?;
        }
    }

    if parts.gl_sheet {
        if let Some(sheets) = &inputs.ledger_sheets {
            if let Some(primary) = sheets.first() {
                write_gl_sheet(&mut workbook, primary)?;
            }
        }
        if let Some(segmented) = &inputs.segmented {
            write_account_sheets(&mut workbook, segmented)?;
        }
    }

    if parts.pp30_sheet {
        write_pp30_sheet(&mut workbook, period, inputs)?;
    }

    let bytes = workbook.save_to_buffer()?;
    info!(
        "Report workbook for '{}' {} built ({} bytes)",
        company,
        period.tag(),
        bytes.len()
    );
    Ok(bytes)
}

fn write_cell(ws: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<()> {
    match cell {
        Cell::Empty => {}
        Cell::Text(s) => {
            ws.write_string(row, col, s)?;
        }
        Cell::Number(v) => {
            ws.write_number(row, col, *v)?;
        }
        Cell::Date(_) => {
            ws.write_string(row, col, &cell.display())?;
        }
    }
    Ok(())
}

fn write_amount(ws: &mut Worksheet, row: u32, col: u16, amount: &Amount) -> Result<()> {
    match amount {
        Amount::Value(v) => {
            ws.write_number(row, col, *v)?;
        }
        other => {
            ws.write_string(row, col, other.placeholder().unwrap_or("N/A"))?;
        }
    }
    Ok(())
}

fn write_optional(ws: &mut Worksheet, row: u32, col: u16, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) => {
            ws.write_number(row, col, v)?;
        }
        None => {
            ws.write_string(row, col, "-")?;
        }
    }
    Ok(())
}

/// Zero month totals render as a dash by display convention.
fn write_month_total(ws: &mut Worksheet, row: u32, col: u16, value: f64) -> Result<()> {
    if value == 0.0 {
        ws.write_string(row, col, "-")?;
    } else {
        ws.write_number(row, col, value)?;
    }
    Ok(())
}

fn write_comparison_sheet(workbook: &mut Workbook, rows: &[ComparisonRow]) -> Result<()> {
    let ws = workbook.add_worksheet();
    ws.set_name("Workflow Result")?;

    let headers = [
        "Name",
        "TB Code",
        "File Found",
        "OCR Amount",
        "TB Amount",
        "Filing Amount",
        "Check TB",
        "Check Filing",
    ];
    for (col, header) in headers.iter().enumerate() {
        ws.write_string(0, col as u16, *header)?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let sheet_row = idx as u32 + 1;
        let excel_row = sheet_row + 1;

        ws.write_string(sheet_row, 0, &row.name)?;
        ws.write_string(sheet_row, 1, &row.tb_code)?;
        ws.write_string(sheet_row, 2, &row.files_found.join(", "))?;
        write_amount(ws, sheet_row, 3, &row.ocr_amount)?;
        write_optional(ws, sheet_row, 4, row.tb_amount)?;
        write_optional(ws, sheet_row, 5, row.filing_amount)?;

        let comparable = row.ocr_amount.is_resolved() && row.tb_amount.is_some();
        // Asset-side codes compare directly; liability-side codes carry
        // credit balances, so the TB amount is negated first.
        let check_tb = match leading_digit(&row.tb_code) {
            Some('1') if comparable => Some(format!(
                "=IF(ROUND(D{r}-E{r},2)=0,\"Correct\",\"Incorrect\")",
                r = excel_row
            )),
            Some('2') if comparable => Some(format!(
                "=IF(ROUND(D{r}+E{r},2)=0,\"Correct\",\"Incorrect\")",
                r = excel_row
            )),
            _ => None,
        };
        match check_tb {
            Some(formula) => {
                ws.write_formula(sheet_row, 6, Formula::new(formula))?;
            }
            None => {
                ws.write_string(sheet_row, 6, "-")?;
            }
        }

        let cross_checkable = row.filing_amount.is_some()
            && row.tb_amount.is_some()
            && leading_digit(&row.tb_code) == Some('2');
        if cross_checkable {
            ws.write_formula(
                sheet_row,
                7,
                Formula::new(format!(
                    "=IF(ROUND(-E{r}-F{r},2)=0,\"Correct\",\"Incorrect\")",
                    r = excel_row
                )),
            )?;
        } else {
            ws.write_string(sheet_row, 7, "-")?;
        }
    }

    Ok(())
}

fn write_tb_sheet(
    workbook: &mut Workbook,
    company: &str,
    period: Period,
    tb: &SheetData,
) -> Result<()> {
    let ws = workbook.add_worksheet();
    ws.set_name("TB")?;

    ws.write_string(0, 0, &format!("TB {} {}", company, period.tag()))?;

    let first_data = TB_COPY_START_ROW + 1;
    let last_row = TB_COPY_START_ROW + tb.rows.len() as u32;

    // Column-wide subtotals above the copied range.
    ws.write_string(2, 0, "Totals")?;
    ws.write_formula(
        2,
        2,
        Formula::new(format!("=SUM(C{}:C{})", first_data + 1, last_row)),
    )?;
    ws.write_formula(
        2,
        3,
        Formula::new(format!("=SUM(D{}:D{})", first_data + 1, last_row)),
    )?;

    for (idx, row) in tb.rows.iter().enumerate() {
        let sheet_row = TB_COPY_START_ROW + idx as u32;
        for (col, cell) in row.iter().enumerate() {
            write_cell(ws, sheet_row, col as u16, cell)?;
        }

        if idx == 0 {
            // Derived-column headers align with the TB's own header row.
            ws.write_string(sheet_row, 4, "BS")?;
            ws.write_string(sheet_row, 5, "P&L")?;
            continue;
        }

        let excel_row = sheet_row + 1;
        ws.write_formula(
            sheet_row,
            4,
            Formula::new(format!(
                "=IF(OR(LEFT(A{r},1)=\"1\",LEFT(A{r},1)=\"2\",LEFT(A{r},1)=\"3\"),C{r}-D{r},0)",
                r = excel_row
            )),
        )?;
        ws.write_formula(
            sheet_row,
            5,
            Formula::new(format!(
                "=IF(OR(LEFT(A{r},1)=\"4\",LEFT(A{r},1)=\"5\"),D{r}-C{r},0)",
                r = excel_row
            )),
        )?;
    }

    let summary_row = last_row + 1;
    ws.write_string(summary_row, 0, "Profit (Loss)")?;
    ws.write_formula(
        summary_row,
        5,
        Formula::new(format!("=SUM(F{}:F{})", first_data + 1, last_row)),
    )?;
    ws.write_string(summary_row + 1, 0, "Balance Sheet Net")?;
    ws.write_formula(
        summary_row + 1,
        4,
        Formula::new(format!("=SUM(E{}:E{})", first_data + 1, last_row)),
    )?;

    Ok(())
}

fn write_gl_sheet(workbook: &mut Workbook, source: &SheetData) -> Result<()> {
    let ws = workbook.add_worksheet();
    ws.set_name("GL")?;
    for (row_idx, row) in source.rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            write_cell(ws, row_idx as u32, col_idx as u16, cell)?;
        }
    }
    Ok(())
}

/// Worksheet names allow at most 31 characters and exclude `[ ] : * ? / \`.
fn sheet_name_for(code: &str) -> String {
    let cleaned: String = code
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '-',
            c => c,
        })
        .collect();
    cleaned.chars().take(31).collect()
}

fn write_account_sheets(workbook: &mut Workbook, segmented: &SegmentedLedger) -> Result<()> {
    let codes: Vec<String> = segmented.codes().map(str::to_string).collect();
    for code in codes {
        let ws = workbook.add_worksheet();
        ws.set_name(sheet_name_for(&code))?;
        for (row_idx, row) in segmented.materialize(&code).iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                write_cell(ws, row_idx as u32, col_idx as u16, cell)?;
            }
        }
    }
    Ok(())
}

fn write_pp30_sheet(
    workbook: &mut Workbook,
    period: Period,
    inputs: &ReportInputs,
) -> Result<()> {
    let ws = workbook.add_worksheet();
    ws.set_name("PP30")?;

    ws.write_string(0, 0, "Month")?;
    ws.write_string(0, 1, "PP30 Filing")?;
    let mut col: u16 = 2;
    for (code, _) in &inputs.revenue_monthly {
        ws.write_string(0, col, &format!("Revenue {}", code))?;
        col += 1;
    }
    if let Some((code, _)) = &inputs.credit_note_monthly {
        ws.write_string(0, col, &format!("Credit Note {}", code))?;
        col += 1;
    }
    let diff_col = col;
    ws.write_string(0, diff_col, "Diff")?;

    let last_amount_letter = column_letter(diff_col - 1);

    for month in 1..=12u32 {
        let sheet_row = month;
        let excel_row = sheet_row + 1;
        ws.write_number(sheet_row, 0, month as f64)?;

        let is_report_month = month == period.month;
        if is_report_month {
            write_amount(ws, sheet_row, 1, &inputs.pp30_filing)?;
        } else {
            ws.write_string(sheet_row, 1, "-")?;
        }

        let mut col: u16 = 2;
        for (_, bucket) in &inputs.revenue_monthly {
            write_month_total(ws, sheet_row, col, bucket.get(&month).copied().unwrap_or(0.0))?;
            col += 1;
        }
        if let Some((_, bucket)) = &inputs.credit_note_monthly {
            write_month_total(ws, sheet_row, col, bucket.get(&month).copied().unwrap_or(0.0))?;
        }

        // SUM skips the dash placeholders, so the formula stays valid even
        // when every category column is a dash.
        if is_report_month && inputs.pp30_filing.is_resolved() && diff_col > 2 {
            ws.write_formula(
                sheet_row,
                diff_col,
                Formula::new(format!(
                    "=B{r}-SUM(C{r}:{last}{r})",
                    r = excel_row,
                    last = last_amount_letter
                )),
            )?;
        } else {
            ws.write_string(sheet_row, diff_col, "-")?;
        }
    }

    Ok(())
}

fn column_letter(col: u16) -> String {
    rust_xlsxwriter::utility::column_number_to_name(col)
}

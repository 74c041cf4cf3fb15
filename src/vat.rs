//! VAT-filing cross-reader: a row-labeled filing-summary export that gives
//! an independent amount per tax-form type for the comparison column.

use crate::amount::normalize;
use crate::config::FormType;
use crate::sheet::{Cell, SheetData};
use log::debug;
use std::collections::BTreeMap;

/// 0-based layout: form labels in the second column, amounts in the fourth.
pub const COL_LABEL: usize = 1;
pub const COL_AMOUNT: usize = 3;

/// The social-security contribution sits at a fixed cell (row 14) rather
/// than under a scannable label.
pub const SSO_ROW: usize = 13;

/// Label substrings identifying each form row. PND53 is listed before PND3
/// so the longer label is tried first.
const FORM_LABELS: [(&str, FormType); 4] = [
    ("ภ.ง.ด.53", FormType::Pnd53),
    ("ภ.ง.ด.3", FormType::Pnd3),
    ("ภ.ง.ด.1", FormType::Pnd1),
    ("ภ.พ.30", FormType::Pp30),
];

fn amount_cell(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(v) => Some(*v),
        // A literal dash is the export's zero placeholder.
        Cell::Text(s) if s.trim() == "-" => Some(0.0),
        Cell::Text(s) => normalize(s).value(),
        _ => None,
    }
}

/// Scans one summary sheet into `totals`, overwriting earlier entries for
/// the same key. Per-row parse failures only skip that row.
pub fn read_vat_summary(sheet: &SheetData, totals: &mut BTreeMap<FormType, f64>) {
    for row in &sheet.rows {
        let Some(label) = row.get(COL_LABEL).and_then(Cell::as_text) else {
            continue;
        };
        let Some((_, form)) = FORM_LABELS
            .iter()
            .find(|(needle, _)| label.contains(needle))
        else {
            continue;
        };
        if let Some(value) = row.get(COL_AMOUNT).and_then(amount_cell) {
            debug!("Filing summary: {} = {}", form.label(), value);
            totals.insert(*form, value);
        }
    }

    if let Some(value) = sheet
        .rows
        .get(SSO_ROW)
        .and_then(|row| row.get(COL_AMOUNT))
        .and_then(amount_cell)
    {
        totals.insert(FormType::Sso, value);
    }
}

/// Reads a batch of summary files in source order; later files overwrite
/// earlier matches for the same form (last-write-wins, unlike the summed
/// OCR aggregation).
pub fn read_vat_summaries<'s>(
    sheets: impl IntoIterator<Item = &'s SheetData>,
) -> BTreeMap<FormType, f64> {
    let mut totals = BTreeMap::new();
    for sheet in sheets {
        read_vat_summary(sheet, &mut totals);
    }
    totals
}

//! Trial-balance reader: per-account-code signed balances under the
//! debit/credit sign convention.

use crate::sheet::{Cell, SheetData};
use std::collections::BTreeMap;

/// 0-based TB export columns: account code, account name, debit, credit.
pub const COL_CODE: usize = 0;
pub const COL_DEBIT: usize = 2;
pub const COL_CREDIT: usize = 3;

/// Reads the TB sheet into a code-to-balance mapping.
///
/// The first row is the header and is skipped. Sign rule per data row:
/// a positive debit is the balance; otherwise a present credit is negated;
/// otherwise zero. Non-numeric cell content counts as zero for that column
/// rather than erroring.
pub fn read_trial_balance(sheet: &SheetData) -> BTreeMap<String, f64> {
    let mut balances = BTreeMap::new();

    for row in sheet.rows.iter().skip(1) {
        let Some(code) = account_code(row) else {
            continue;
        };
        let debit = numeric(row, COL_DEBIT);
        let credit = numeric(row, COL_CREDIT);

        let balance = if debit > 0.0 {
            debit
        } else if credit != 0.0 {
            -credit
        } else {
            0.0
        };
        balances.insert(code, balance);
    }

    balances
}

fn account_code(row: &[Cell]) -> Option<String> {
    match row.get(COL_CODE) {
        Some(cell) if !cell.is_blank() => Some(cell.display().trim().to_string()),
        _ => None,
    }
}

fn numeric(row: &[Cell], col: usize) -> f64 {
    row.get(col).and_then(Cell::as_number).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::Row;

    fn tb_row(code: &str, debit: Cell, credit: Cell) -> Row {
        vec![Cell::text(code), Cell::text("Account"), debit, credit]
    }

    fn sheet(rows: Vec<Row>) -> SheetData {
        let mut all = vec![vec![
            Cell::text("Code"),
            Cell::text("Name"),
            Cell::text("Debit"),
            Cell::text("Credit"),
        ]];
        all.extend(rows);
        SheetData {
            name: "TB".to_string(),
            rows: all,
        }
    }

    #[test]
    fn test_debit_balance_is_positive() {
        let tb = sheet(vec![tb_row("1061", Cell::Number(500.0), Cell::Number(0.0))]);
        assert_eq!(read_trial_balance(&tb).get("1061"), Some(&500.0));
    }

    #[test]
    fn test_credit_balance_is_negated() {
        let tb = sheet(vec![tb_row("2045", Cell::Number(0.0), Cell::Number(300.0))]);
        assert_eq!(read_trial_balance(&tb).get("2045"), Some(&-300.0));
    }

    #[test]
    fn test_zero_both_sides_is_zero() {
        let tb = sheet(vec![tb_row("3000", Cell::Number(0.0), Cell::Number(0.0))]);
        assert_eq!(read_trial_balance(&tb).get("3000"), Some(&0.0));
    }

    #[test]
    fn test_non_numeric_debit_falls_back_to_credit() {
        let tb = sheet(vec![tb_row(
            "2100",
            Cell::text("n/a"),
            Cell::Number(100.0),
        )]);
        assert_eq!(read_trial_balance(&tb).get("2100"), Some(&-100.0));
    }

    #[test]
    fn test_rows_without_code_are_skipped() {
        let tb = sheet(vec![
            tb_row("", Cell::Number(1.0), Cell::Number(0.0)),
            vec![Cell::Empty],
            tb_row("1061", Cell::Number(10.0), Cell::Number(0.0)),
        ]);
        let balances = read_trial_balance(&tb);
        assert_eq!(balances.len(), 1);
        assert_eq!(balances.get("1061"), Some(&10.0));
    }

    #[test]
    fn test_numeric_code_cells_are_kept_as_text() {
        let tb = sheet(vec![vec![
            Cell::Number(1061.0),
            Cell::text("Bank"),
            Cell::Number(42.0),
            Cell::Number(0.0),
        ]]);
        assert_eq!(read_trial_balance(&tb).get("1061"), Some(&42.0));
    }
}

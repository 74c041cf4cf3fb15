//! Monthly aggregation of ledger movements.
//!
//! Both modes accumulate (credit − debit) into calendar-month buckets.
//! Rows without a parseable transaction date contribute nothing; they are
//! skipped outright rather than defaulted into a month.

use crate::sheet::{LedgerRow, Row, SheetData};
use chrono::Datelike;
use std::collections::BTreeMap;

/// Month number (1–12) to accumulated signed amount.
pub type MonthlyBucket = BTreeMap<u32, f64>;

pub fn empty_bucket() -> MonthlyBucket {
    (1..=12).map(|m| (m, 0.0)).collect()
}

/// Sums an already-segmented account block. A leading sub-header row needs
/// no special handling: it has no parseable date and falls out naturally.
pub fn aggregate_block<R: AsRef<[crate::sheet::Cell]>>(block: &[R]) -> MonthlyBucket {
    let mut bucket = empty_bucket();
    for row in block {
        let view = LedgerRow::new(row.as_ref());
        if let Some(date) = view.date() {
            *bucket.entry(date.month()).or_insert(0.0) += view.signed_amount();
        }
    }
    bucket
}

/// Scans raw rows for the first row whose leading cell contains `code`,
/// skips the column-header row that follows it, then sums until the block
/// ends at an empty leading cell.
pub fn aggregate_by_code(rows: &[Row], code: &str) -> MonthlyBucket {
    let mut bucket = empty_bucket();

    let Some(start) = rows.iter().position(|row| {
        LedgerRow::new(row)
            .leading_display()
            .is_some_and(|text| text.contains(code))
    }) else {
        return bucket;
    };

    for row in rows.iter().skip(start + 2) {
        if LedgerRow::new(row).leading_display().is_none() {
            break;
        }
        let view = LedgerRow::new(row);
        if let Some(date) = view.date() {
            *bucket.entry(date.month()).or_insert(0.0) += view.signed_amount();
        }
    }

    bucket
}

/// Category mode: scans every sheet of the GL workbook and, at each row
/// whose leading cell contains the category's account code, sums from two
/// rows below the match until an empty leading cell.
pub fn aggregate_by_category(sheets: &[SheetData], code: &str) -> MonthlyBucket {
    let mut bucket = empty_bucket();

    for sheet in sheets {
        let mut idx = 0;
        while idx < sheet.rows.len() {
            let matched = LedgerRow::new(&sheet.rows[idx])
                .leading_display()
                .is_some_and(|text| text.contains(code));
            if !matched {
                idx += 1;
                continue;
            }

            let mut cursor = idx + 2;
            while cursor < sheet.rows.len() {
                let row = &sheet.rows[cursor];
                if LedgerRow::new(row).leading_display().is_none() {
                    break;
                }
                let view = LedgerRow::new(row);
                if let Some(date) = view.date() {
                    *bucket.entry(date.month()).or_insert(0.0) += view.signed_amount();
                }
                cursor += 1;
            }
            idx = cursor + 1;
        }
    }

    bucket
}

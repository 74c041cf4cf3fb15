//! General-ledger block segmentation.
//!
//! A GL export is one flat sheet mixing account headers, column headers and
//! transaction rows. Account sections follow a fixed shape:
//!
//! ```text
//! 1061-01 เงินฝากธนาคาร          <- account header (code is the first token)
//! ลำดับที่  เลขที่  วันที่ ...      <- column-header sentinel row
//! 1   JV001  05/01/2025 ...      <- transaction rows
//! 2   JV002  12/01/2025 ...
//!                                <- blank leading cell ends the section
//! ```
//!
//! The segmenter is a row-level state machine keyed on the sentinel
//! substring. A non-empty input that produces zero blocks usually means a
//! changed export layout and is logged as a warning.

use crate::sheet::{LedgerRow, Row};
use log::warn;
use std::collections::BTreeMap;

/// Column-header marker ("running number"); its presence in a leading cell
/// identifies the row as the start of a data block.
pub const BLOCK_SENTINEL: &str = "ลำดับที่";

/// Leading digits of account codes that get their own collected block.
/// Only balance-sheet-side accounts get per-account sub-sheets; P&L-side
/// accounts are reached by the category-based monthly aggregation instead.
pub const COLLECTED_PREFIXES: [char; 2] = ['1', '2'];

#[derive(Debug, Default)]
pub struct SegmentedLedger {
    /// Account code to its block occurrences in encounter order.
    blocks: BTreeMap<String, Vec<Vec<Row>>>,
}

impl SegmentedLedger {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }

    /// All rows collected for a code, blocks concatenated in encounter
    /// order without separators.
    pub fn rows_for(&self, code: &str) -> Option<Vec<&Row>> {
        self.blocks
            .get(code)
            .map(|blocks| blocks.iter().flatten().collect())
    }

    /// Rows for a code as written to a sub-sheet: each block is followed by
    /// one blank separator row, so repeated blocks are spaced apart and the
    /// sheet ends on a blank row.
    pub fn materialize(&self, code: &str) -> Vec<Row> {
        let Some(blocks) = self.blocks.get(code) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for block in blocks {
            out.extend(block.iter().cloned());
            out.push(Vec::new());
        }
        out
    }

    fn push_block(&mut self, code: String, rows: Vec<Row>) {
        self.blocks.entry(code).or_default().push(rows);
    }
}

fn is_sentinel(row: &Row) -> bool {
    LedgerRow::new(row)
        .leading()
        .is_some_and(|text| text.contains(BLOCK_SENTINEL))
}

/// Account code from a header row: the first whitespace-delimited token of
/// the leading cell, accepted only when it starts with a collected prefix.
/// Single-character tokens are rejected; they are running-number cells of
/// transaction rows, not account codes.
fn header_code(row: &Row) -> Option<String> {
    let text = LedgerRow::new(row).leading_display()?;
    let token = text.split_whitespace().next()?;
    let first = token.chars().next()?;
    if COLLECTED_PREFIXES.contains(&first) && token.chars().count() > 1 {
        Some(token.to_string())
    } else {
        None
    }
}

enum State {
    Scanning,
    Collecting { code: String, rows: Vec<Row> },
}

/// Partitions a flat GL row sequence into per-account blocks.
pub fn segment(rows: &[Row]) -> SegmentedLedger {
    let mut ledger = SegmentedLedger::default();
    let mut state = State::Scanning;

    for (idx, row) in rows.iter().enumerate() {
        state = match state {
            State::Scanning => {
                if is_sentinel(row) {
                    match idx.checked_sub(1).and_then(|i| header_code(&rows[i])) {
                        Some(code) => State::Collecting {
                            code,
                            rows: Vec::new(),
                        },
                        None => State::Scanning,
                    }
                } else {
                    State::Scanning
                }
            }
            State::Collecting { code, mut rows } => {
                if is_sentinel(row) {
                    // When sections run back to back, the next section's
                    // header has already been collected as the last row of
                    // the open block; pull it back out. A last row that is
                    // not a header stays where it is.
                    match rows.last().and_then(header_code) {
                        Some(next_code) => {
                            rows.pop();
                            ledger.push_block(code, rows);
                            State::Collecting {
                                code: next_code,
                                rows: Vec::new(),
                            }
                        }
                        None => {
                            ledger.push_block(code, rows);
                            State::Scanning
                        }
                    }
                } else if LedgerRow::new(row).leading_display().is_none() {
                    ledger.push_block(code, rows);
                    State::Scanning
                } else {
                    rows.push(row.clone());
                    State::Collecting { code, rows }
                }
            }
        };
    }

    if let State::Collecting { code, rows } = state {
        ledger.push_block(code, rows);
    }

    if ledger.is_empty() && !rows.is_empty() {
        warn!(
            "GL input with {} rows produced zero account blocks; \
             the export layout may not match the '{}' sentinel convention",
            rows.len(),
            BLOCK_SENTINEL
        );
    }

    ledger
}

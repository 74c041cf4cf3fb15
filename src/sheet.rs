//! In-memory cell/row model decoded from `.xlsx` bytes.
//!
//! Ledger and tax exports arrive as whole workbooks downloaded from the file
//! store; everything downstream works on these owned rows so the parsing
//! modules stay independent of the reader crate and unit tests can build row
//! fixtures by hand.

use crate::error::Result;
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use chrono::NaiveDate;
use std::io::Cursor;

/// Date format used by the general-ledger export.
pub const LEDGER_DATE_FORMAT: &str = "%d/%m/%Y";

/// 0-based ledger row columns: transaction date, debit, credit.
pub const COL_DATE: usize = 2;
pub const COL_DEBIT: usize = 6;
pub const COL_CREDIT: usize = 7;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Empty cell or blank-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(v) => {
                if v.fract() == 0.0 {
                    format!("{}", *v as i64)
                } else {
                    format!("{}", v)
                }
            }
            Cell::Date(d) => d.format(LEDGER_DATE_FORMAT).to_string(),
        }
    }
}

pub type Row = Vec<Cell>;

#[derive(Debug, Clone)]
pub struct SheetData {
    pub name: String,
    pub rows: Vec<Row>,
}

fn decode_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(v) => Cell::Number(*v),
        Data::Int(v) => Cell::Number(*v as f64),
        Data::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => Cell::Date(naive.date()),
            None => Cell::Empty,
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}

/// Loads every sheet of an `.xlsx` workbook held in memory.
pub fn load_workbook(bytes: &[u8]) -> Result<Vec<SheetData>> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;
    let names: Vec<String> = workbook.sheet_names().to_vec();

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name)?;
        let rows = range
            .rows()
            .map(|row| row.iter().map(decode_cell).collect())
            .collect();
        sheets.push(SheetData { name, rows });
    }
    Ok(sheets)
}

/// Loads only the first sheet, used for single-sheet exports like the TB.
pub fn load_first_sheet(bytes: &[u8]) -> Result<Option<SheetData>> {
    Ok(load_workbook(bytes)?.into_iter().next())
}

/// Named-field view over a raw ledger row with explicit bounds checks.
pub struct LedgerRow<'a> {
    cells: &'a [Cell],
}

impl<'a> LedgerRow<'a> {
    pub fn new(cells: &'a [Cell]) -> Self {
        Self { cells }
    }

    fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// Text of the leading cell; `None` when the cell is absent or blank.
    pub fn leading(&self) -> Option<&str> {
        match self.cell(0) {
            Some(Cell::Text(s)) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// Leading cell rendered as text regardless of type (row indices are
    /// sometimes numeric cells).
    pub fn leading_display(&self) -> Option<String> {
        match self.cell(0) {
            None => None,
            Some(c) if c.is_blank() => None,
            Some(c) => Some(c.display()),
        }
    }

    /// Transaction date parsed from the date column; unparseable or absent
    /// dates come back as `None` and the row is skipped by aggregation.
    pub fn date(&self) -> Option<NaiveDate> {
        match self.cell(COL_DATE)? {
            Cell::Date(d) => Some(*d),
            Cell::Text(s) => NaiveDate::parse_from_str(s.trim(), LEDGER_DATE_FORMAT).ok(),
            _ => None,
        }
    }

    /// Debit column value; non-numeric content is treated as zero.
    pub fn debit(&self) -> f64 {
        self.cell(COL_DEBIT)
            .and_then(Cell::as_number)
            .unwrap_or(0.0)
    }

    /// Credit column value; non-numeric content is treated as zero.
    pub fn credit(&self) -> f64 {
        self.cell(COL_CREDIT)
            .and_then(Cell::as_number)
            .unwrap_or(0.0)
    }

    /// Net movement for the row under the credit-minus-debit convention.
    pub fn signed_amount(&self) -> f64 {
        self.credit() - self.debit()
    }
}

use serde::{Deserialize, Serialize};

/// A monetary value extracted from a document or spreadsheet cell.
///
/// Extraction sources are unreliable (OCR output, free-text cells), so a
/// failed parse keeps the raw text instead of collapsing to zero. Only the
/// ledger aggregation paths are allowed to treat missing cells as zero, and
/// they do so explicitly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Amount {
    Value(f64),
    /// Normalization failed; carries the original source text.
    Unresolved(String),
    /// No source document existed for this category.
    #[default]
    NotFound,
}

impl Amount {
    pub fn value(&self) -> Option<f64> {
        match self {
            Amount::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Amount::Value(_))
    }

    /// Rendering used in report cells for the non-numeric cases.
    pub fn placeholder(&self) -> Option<&str> {
        match self {
            Amount::Value(_) => None,
            Amount::Unresolved(raw) => Some(raw),
            Amount::NotFound => Some("N/A"),
        }
    }
}

/// Converts free-form amount text into a number.
///
/// Strips currency symbols, thousands separators and whitespace, keeping
/// digits, a single decimal point and a leading minus sign. Never panics;
/// anything that does not survive as a parseable decimal comes back as
/// [`Amount::Unresolved`] with the original text. Normalizing text that is
/// already a plain number returns it unchanged.
pub fn normalize(text: &str) -> Amount {
    let trimmed = text.trim();
    let mut cleaned = String::with_capacity(trimmed.len());

    for c in trimmed.chars() {
        match c {
            '0'..='9' | '.' => cleaned.push(c),
            '-' if cleaned.is_empty() => cleaned.push(c),
            _ => {}
        }
    }

    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return Amount::Unresolved(text.to_string());
    }

    match cleaned.parse::<f64>() {
        Ok(v) => Amount::Value(v),
        Err(_) => Amount::Unresolved(text.to_string()),
    }
}

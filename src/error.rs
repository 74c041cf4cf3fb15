use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Required document not found: {0}")]
    NotFound(String),

    #[error("Stage '{stage}' failed: {detail}")]
    StageFailed { stage: String, detail: String },

    #[error("File store error: {0}")]
    StoreFailure(String),

    #[error("OCR service error: {0}")]
    OcrFailure(String),

    #[error("Spreadsheet read error: {0}")]
    SheetRead(#[from] calamine::XlsxError),

    #[error("Spreadsheet write error: {0}")]
    SheetWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ReconcileError {
    /// Wraps a failure with the name of the pipeline stage it aborted.
    pub fn stage(stage: impl Into<String>, detail: impl ToString) -> Self {
        ReconcileError::StageFailed {
            stage: stage.into(),
            detail: detail.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;

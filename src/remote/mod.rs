//! Production capability implementations: Google Drive as the file store
//! and Gemini as the OCR engine. Only compiled with the `remote` feature;
//! the core pipeline depends solely on the capability traits.

pub mod drive;
pub mod gemini;

pub use drive::DriveClient;
pub use gemini::GeminiOcr;

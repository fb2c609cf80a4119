//! Data models: the extracted receipt record and pipeline configuration.

pub mod config;
pub mod record;

pub use config::{BatchConfig, ExtractionConfig, OcrConfig, OcrEngineKind, PdfConfig, RcptConfig};
pub use record::{Category, Currency, ExtractedRecord, UNKNOWN_VENDOR};

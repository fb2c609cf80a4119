//! Core library for receipt OCR and field extraction.
//!
//! This crate provides:
//! - Text acquisition from plain text, images and PDFs
//! - OCR backends (external tesseract, optional pure-Rust ONNX models)
//! - Receipt field extraction (vendor, date, amount, category, currency)
//! - Receipt record and configuration models

pub mod acquisition;
pub mod error;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod receipt;

pub use acquisition::{Acquisition, SourceKind, TextAcquirer, SUPPORTED_EXTENSIONS};
pub use error::{ExtractionError, OcrError, PdfError, RcptError, Result};
pub use models::config::RcptConfig;
pub use models::record::{Category, Currency, ExtractedRecord, UNKNOWN_VENDOR};
pub use ocr::{create_backend, OcrBackend, TesseractEngine};
#[cfg(feature = "onnx")]
pub use ocr::PureOcrEngine;
pub use pdf::{PageRenderer, PdfExtractor, PdfProcessor};
pub use receipt::{extract, ExtractionOutcome, ReceiptExtractor, ReceiptParser};
pub use receipt::rules::detect_currency;

//! Error types for the rcpt-core library.

use thiserror::Error;

/// Main error type for the rcpt library.
#[derive(Error, Debug)]
pub enum RcptError {
    /// The source file extension is not one the acquirer can read.
    #[error("unsupported file format: {0:?} (expected one of .txt, .jpg, .jpeg, .png, .pdf)")]
    UnsupportedFormat(String),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Receipt extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Image decoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract embedded text from the PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted with a non-empty password.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Pages could not be rasterised.
    #[error("failed to render PDF: {0}")]
    Render(String),

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The configured OCR executable could not be started.
    #[error("OCR engine not found at {0}")]
    EngineNotFound(String),

    /// The OCR engine ran but reported a failure.
    #[error("OCR engine failed: {0}")]
    EngineFailed(String),

    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Recognition did not finish within the configured bound.
    #[error("OCR timed out after {millis}ms")]
    Timeout { millis: u64 },

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Internal failures of receipt field extraction.
///
/// These never leave [`crate::receipt::ReceiptExtractor::extract`]; they are
/// only visible through `try_extract` and the extraction outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// A matched token could not be converted to its typed value.
    #[error("failed to parse {field}: {value}")]
    Parse { field: String, value: String },

    /// A heuristic panicked on malformed input.
    #[error("extraction panicked: {0}")]
    Panicked(String),
}

/// Result type for the rcpt library.
pub type Result<T> = std::result::Result<T, RcptError>;

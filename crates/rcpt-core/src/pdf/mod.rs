//! PDF processing module.

mod extractor;
mod render;

pub use extractor::PdfExtractor;
pub use render::PageRenderer;

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract the embedded text layer of the entire PDF.
    fn extract_text(&self) -> Result<String>;

    /// The loaded document bytes (decrypted if the PDF was encrypted).
    fn raw_data(&self) -> &[u8];

    /// Embedded text of each page, in page order.
    fn page_texts(&self) -> Result<Vec<String>>;

    /// Raster images placed on a page (1-indexed), in resource order.
    fn page_images(&self, page: u32) -> Result<Vec<DynamicImage>>;
}

//! Text acquisition: turns a receipt file into one raw text string.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::error::{OcrError, RcptError, Result};
use crate::models::config::{PdfConfig, RcptConfig};
use crate::ocr::{create_backend, recognize_with_timeout, ImagePreprocessor, OcrBackend};
use crate::pdf::{PageRenderer, PdfExtractor, PdfProcessor};

/// File extensions the acquirer accepts (lower-case, without the dot).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "jpg", "jpeg", "png", "pdf"];

/// How a source file is turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Plain text, read as-is.
    Text,
    /// Raster image, recognized with OCR.
    Image,
    /// PDF, each page rendered to images and recognized with OCR.
    Pdf,
}

impl SourceKind {
    /// Classify a file by its extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "txt" => Ok(Self::Text),
            "jpg" | "jpeg" | "png" => Ok(Self::Image),
            "pdf" => Ok(Self::Pdf),
            _ => Err(RcptError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Pdf => "pdf",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw text acquired from one source file.
#[derive(Debug, Clone)]
pub struct Acquisition {
    /// Raw text, including any recognition noise.
    pub text: String,
    /// How the text was obtained.
    pub source: SourceKind,
    /// Pages processed (1 for text and images).
    pub pages: u32,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Converts receipt files into raw text.
///
/// Holds no per-file state; one acquirer can serve many files from many
/// threads.
pub struct TextAcquirer {
    ocr: Arc<dyn OcrBackend>,
    timeout: Duration,
    pdf: PdfConfig,
    renderer: PageRenderer,
    preprocessor: ImagePreprocessor,
}

impl TextAcquirer {
    /// Create an acquirer around an OCR backend with default settings.
    pub fn new(ocr: Arc<dyn OcrBackend>) -> Self {
        Self {
            ocr,
            timeout: Duration::from_secs(120),
            pdf: PdfConfig::default(),
            renderer: PageRenderer::new(),
            preprocessor: ImagePreprocessor::new(),
        }
    }

    /// Bound every OCR call. Zero disables the bound.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set PDF handling options.
    pub fn with_pdf_config(mut self, pdf: PdfConfig) -> Self {
        self.renderer = PageRenderer::from_config(&pdf);
        self.pdf = pdf;
        self
    }

    /// Set the maximum image dimension handed to the OCR backend.
    pub fn with_max_image_size(mut self, size: u32) -> Self {
        self.preprocessor = ImagePreprocessor::new().with_max_size(size);
        self
    }

    /// Create an acquirer with the OCR backend selected in the configuration.
    pub fn from_config(config: &RcptConfig) -> Result<Self> {
        let ocr = create_backend(&config.ocr)?;
        Ok(Self::new(ocr)
            .with_timeout(Duration::from_secs(config.ocr.timeout_secs))
            .with_pdf_config(config.pdf.clone())
            .with_max_image_size(config.ocr.max_image_size))
    }

    /// Acquire the raw text of a receipt file.
    pub fn acquire(&self, path: &Path) -> Result<Acquisition> {
        let start = Instant::now();
        let source = SourceKind::from_path(path)?;

        info!("Acquiring text from {} ({})", path.display(), source);

        let (text, pages) = match source {
            SourceKind::Text => (read_text(path)?, 1),
            SourceKind::Image => (self.recognize_image_file(path)?, 1),
            SourceKind::Pdf => self.recognize_pdf(path)?,
        };

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Acquired {} characters from {} page(s) in {}ms",
            text.len(),
            pages,
            processing_time_ms
        );

        Ok(Acquisition {
            text,
            source,
            pages,
            processing_time_ms,
        })
    }

    /// Acquire only the raw text of a receipt file.
    pub fn acquire_text(&self, path: &Path) -> Result<String> {
        Ok(self.acquire(path)?.text)
    }

    fn recognize(&self, image: DynamicImage) -> std::result::Result<String, OcrError> {
        let image = self.preprocessor.prepare(image);
        recognize_with_timeout(&self.ocr, image, self.timeout)
    }

    fn recognize_image_file(&self, path: &Path) -> Result<String> {
        let image = image::open(path)?;
        debug!("Decoded image {}x{}", image.width(), image.height());
        Ok(self.recognize(image)?)
    }

    fn recognize_pdf(&self, path: &Path) -> Result<(String, u32)> {
        let data = std::fs::read(path)?;
        let pdf = PdfExtractor::from_bytes(&data)?;

        let mut page_count = pdf.page_count();
        if self.pdf.max_pages > 0 {
            page_count = page_count.min(self.pdf.max_pages as u32);
        }

        if self.pdf.prefer_embedded_text {
            match pdf.extract_text() {
                Ok(text) if text.trim().len() >= self.pdf.min_text_length => {
                    debug!("Using embedded PDF text ({} characters)", text.len());
                    return Ok((text, page_count));
                }
                Ok(_) => debug!("Embedded PDF text too short, falling back to OCR"),
                Err(e) => debug!("No usable embedded PDF text: {}", e),
            }
        }

        let page_images = self.page_images(&pdf, page_count)?;
        let mut page_texts: Option<Vec<String>> = None;

        let mut text = String::new();
        let mut first_error: Option<OcrError> = None;

        for (index, images) in page_images.into_iter().enumerate() {
            let page = index + 1;

            // Pages without raster content only carry their text layer
            if images.is_empty() {
                let texts = page_texts.get_or_insert_with(|| {
                    pdf.page_texts().unwrap_or_else(|e| {
                        debug!("No embedded page text: {}", e);
                        Vec::new()
                    })
                });
                if let Some(page_text) = texts.get(index) {
                    debug!("Page {} has no raster images, using its text layer", page);
                    text.push_str(page_text);
                }
                continue;
            }

            for image in images {
                match self.recognize(image) {
                    Ok(page_text) => text.push_str(&page_text),
                    Err(e) => {
                        warn!("OCR failed on page {}: {}", page, e);
                        first_error.get_or_insert(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) if text.is_empty() => Err(e.into()),
            _ => Ok((text, page_count)),
        }
    }

    /// Images to recognize for each page: the rendered page, or the raster
    /// images placed on it when pdfium is unavailable.
    fn page_images(&self, pdf: &PdfExtractor, page_count: u32) -> Result<Vec<Vec<DynamicImage>>> {
        match self.renderer.render_pages(pdf.raw_data(), page_count) {
            Ok(rendered) => Ok(rendered.into_iter().map(|image| vec![image]).collect()),
            Err(e) => {
                warn!("Falling back to embedded page images: {}", e);
                let pages = (1..=page_count)
                    .map(|page| pdf.page_images(page))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(pages)
            }
        }
    }
}

/// Read a plain-text receipt. Invalid UTF-8 is replaced, not rejected.
fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

//! Page rasterisation through the pdfium library.
//!
//! pdfium is loaded at runtime, so a missing library surfaces as
//! [`PdfError::Render`] and callers can fall back to the raster images
//! embedded in the page.

use std::path::PathBuf;

use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, info};

use super::Result;
use crate::error::PdfError;
use crate::models::config::PdfConfig;

/// Renders whole PDF pages to images.
#[derive(Debug, Clone)]
pub struct PageRenderer {
    library_path: Option<PathBuf>,
    max_pixels: u32,
}

impl PageRenderer {
    /// Renderer bound to the system pdfium library.
    pub fn new() -> Self {
        Self {
            library_path: None,
            max_pixels: 2048,
        }
    }

    /// Load pdfium from an explicit library file instead of the system one.
    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    /// Cap the longer edge of rendered pages.
    pub fn with_max_pixels(mut self, max_pixels: u32) -> Self {
        self.max_pixels = max_pixels.max(1);
        self
    }

    pub fn from_config(config: &PdfConfig) -> Self {
        let renderer = Self::new().with_max_pixels(config.render_size);
        match &config.pdfium_path {
            Some(path) => renderer.with_library_path(path),
            None => renderer,
        }
    }

    fn bind(&self) -> Result<Pdfium> {
        let bindings = match &self.library_path {
            Some(path) => Pdfium::bind_to_library(path),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| PdfError::Render(format!("pdfium unavailable: {:?}", e)))?;

        Ok(Pdfium::new(bindings))
    }

    /// Render the first `page_count` pages, in page order.
    pub fn render_pages(&self, data: &[u8], page_count: u32) -> Result<Vec<DynamicImage>> {
        let pdfium = self.bind()?;

        let document = pdfium
            .load_pdf_from_byte_slice(data, None)
            .map_err(|e| PdfError::Render(format!("{:?}", e)))?;

        let pages = document.pages();
        let total = (pages.len() as u32).min(page_count);
        info!("Rendering {} page(s) with pdfium", total);

        let render_config = PdfRenderConfig::new()
            .set_target_width(self.max_pixels as i32)
            .set_maximum_height(self.max_pixels as i32);

        let mut images = Vec::with_capacity(total as usize);
        for index in 0..total {
            let page = pages
                .get(index as u16)
                .map_err(|e| PdfError::Render(format!("page {}: {:?}", index + 1, e)))?;

            let bitmap = page
                .render_with_config(&render_config)
                .map_err(|e| PdfError::Render(format!("page {}: {:?}", index + 1, e)))?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} to {}x{}",
                index + 1,
                image.width(),
                image.height()
            );
            images.push(image);
        }

        Ok(images)
    }
}

impl Default for PageRenderer {
    fn default() -> Self {
        Self::new()
    }
}

//! Image preprocessing before OCR.

use image::{DynamicImage, GenericImageView};
use tracing::debug;

/// Normalizes images before they reach an OCR backend.
pub struct ImagePreprocessor {
    /// Maximum image dimension (longer side).
    max_size: u32,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self { max_size: 4096 }
    }

    /// Set maximum image dimension. Zero disables downscaling.
    pub fn with_max_size(mut self, size: u32) -> Self {
        self.max_size = size;
        self
    }

    /// Downscale oversized images, keeping the aspect ratio, and drop the
    /// alpha channel so transparent scans render on white.
    pub fn prepare(&self, image: DynamicImage) -> DynamicImage {
        let (width, height) = image.dimensions();
        let (new_width, new_height) = self.calculate_resize_dimensions(width, height);

        let image = if (new_width, new_height) != (width, height) {
            debug!(
                "Resizing image {}x{} -> {}x{}",
                width, height, new_width, new_height
            );
            image.resize_exact(new_width, new_height, image::imageops::FilterType::Lanczos3)
        } else {
            image
        };

        if image.color().has_alpha() {
            flatten_alpha(&image)
        } else {
            image
        }
    }

    fn calculate_resize_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let max_dim = width.max(height);

        if self.max_size == 0 || max_dim <= self.max_size {
            return (width, height);
        }

        let scale = self.max_size as f32 / max_dim as f32;
        let new_width = (width as f32 * scale) as u32;
        let new_height = (height as f32 * scale) as u32;

        (new_width.max(1), new_height.max(1))
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

fn flatten_alpha(image: &DynamicImage) -> DynamicImage {
    let rgba = image.to_rgba8();
    let mut rgb = image::RgbImage::new(rgba.width(), rgba.height());

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = pixel[3] as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        rgb.put_pixel(x, y, image::Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }

    DynamicImage::ImageRgb8(rgb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_resize_dimensions() {
        let preprocessor = ImagePreprocessor::new().with_max_size(960);

        // Image smaller than target
        let (w, h) = preprocessor.calculate_resize_dimensions(500, 300);
        assert_eq!((w, h), (500, 300));

        // Image larger than target
        let (w, h) = preprocessor.calculate_resize_dimensions(1920, 1080);
        assert_eq!(w, 960);
        assert!(h < 960);
    }

    #[test]
    fn test_zero_max_size_keeps_dimensions() {
        let preprocessor = ImagePreprocessor::new().with_max_size(0);
        assert_eq!(preprocessor.calculate_resize_dimensions(10_000, 20), (10_000, 20));
    }

    #[test]
    fn test_prepare_flattens_transparency() {
        let mut rgba = RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, Rgba([0, 0, 0, 255]));

        let prepared = ImagePreprocessor::new().prepare(DynamicImage::ImageRgba8(rgba));
        let rgb = prepared.to_rgb8();

        assert!(!prepared.color().has_alpha());
        assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(rgb.get_pixel(1, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_prepare_downscales() {
        let image = DynamicImage::ImageRgb8(image::RgbImage::new(400, 100));
        let prepared = ImagePreprocessor::new().with_max_size(200).prepare(image);
        assert_eq!(prepared.dimensions(), (200, 50));
    }
}

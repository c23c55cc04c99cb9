//! Thumbnail rendering

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use mailimage_core::AppError;
use std::io::Cursor;

use super::processor::ImageProcessor;

/// Renders a preview from source image bytes. Implementations are synchronous and
/// deterministic: the same input yields the same bytes.
pub trait ThumbnailRenderer: Send + Sync {
    fn render(&self, source: &[u8]) -> Result<Vec<u8>, AppError>;
}

/// Fills a fixed box (center crop, Lanczos resampling) and encodes JPEG.
#[derive(Debug, Clone, Copy)]
pub struct ImageThumbnailer {
    width: u32,
    height: u32,
}

impl ImageThumbnailer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl ThumbnailRenderer for ImageThumbnailer {
    fn render(&self, source: &[u8]) -> Result<Vec<u8>, AppError> {
        let img = ImageProcessor::decode(source)
            .map_err(|e| AppError::ImageProcessing(format!("Failed to decode image: {}", e)))?;

        let filled = img.resize_to_fill(self.width, self.height, FilterType::Lanczos3);
        let rgb = DynamicImage::ImageRgb8(filled.to_rgb8());

        let mut buffer = Vec::new();
        rgb.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
            .map_err(|e| AppError::ImageProcessing(format!("Failed to encode thumbnail: {}", e)))?;

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 90, 255])
        });
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn renders_fixed_dimensions() {
        let thumbnailer = ImageThumbnailer::new(250, 200);
        let thumb = thumbnailer.render(&png(640, 480)).unwrap();

        let decoded = image::load_from_memory_with_format(&thumb, ImageFormat::Jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (250, 200));
    }

    #[test]
    fn rendering_is_deterministic() {
        let thumbnailer = ImageThumbnailer::new(50, 40);
        let source = png(120, 300);
        assert_eq!(
            thumbnailer.render(&source).unwrap(),
            thumbnailer.render(&source).unwrap()
        );
    }

    #[test]
    fn undecodable_source_is_an_image_processing_error() {
        let err = ImageThumbnailer::new(10, 10).render(b"garbage").unwrap_err();
        assert!(matches!(err, AppError::ImageProcessing(_)));
    }
}

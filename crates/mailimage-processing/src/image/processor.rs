//! Image processor - decode validation

use image::ImageReader;
use std::io::Cursor;

pub struct ImageProcessor;

impl ImageProcessor {
    /// Check that `data` decodes as an image of a supported format.
    pub fn validate(data: &[u8]) -> Result<(), image::ImageError> {
        Self::decode(data).map(|_| ())
    }

    pub(crate) fn decode(data: &[u8]) -> Result<image::DynamicImage, image::ImageError> {
        ImageReader::new(Cursor::new(data))
            .with_guessed_format()?
            .decode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn create_test_image() -> Vec<u8> {
        let img = RgbaImage::from_pixel(100, 100, Rgba([255, 0, 0, 255]));
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        img.write_to(&mut cursor, ImageFormat::Png).unwrap();
        buffer
    }

    #[test]
    fn test_validate_valid_image() {
        assert!(ImageProcessor::validate(&create_test_image()).is_ok());
    }

    #[test]
    fn test_validate_invalid_image() {
        assert!(ImageProcessor::validate(b"not an image").is_err());
    }
}

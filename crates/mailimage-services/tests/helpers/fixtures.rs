use image::{ImageFormat, Rgb, RgbImage};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::Message;
use std::io::Cursor;

/// A JPEG with enough detail to weigh a few kilobytes
pub fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            ((x * 7 + y * 3) % 256) as u8,
            ((x * y) % 256) as u8,
            ((x ^ y) % 256) as u8,
        ])
    });
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
        .unwrap();
    buffer
}

pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([10, 200, 30]));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

pub struct Part {
    pub content_type: &'static str,
    pub filename: &'static str,
    pub data: Vec<u8>,
}

pub fn jpeg_part() -> Part {
    Part {
        content_type: "image/jpeg",
        filename: "sunset.jpg",
        data: create_test_jpeg(120, 90),
    }
}

/// Raw RFC 5322 bytes of a submission
pub fn build_submission(from: &str, subject: &str, text: &str, parts: Vec<Part>) -> Vec<u8> {
    let mut multipart = MultiPart::mixed().singlepart(SinglePart::plain(text.to_string()));
    for part in parts {
        multipart = multipart.singlepart(
            Attachment::new(part.filename.to_string())
                .body(part.data, ContentType::parse(part.content_type).unwrap()),
        );
    }

    Message::builder()
        .from(from.parse().unwrap())
        .to("gallery@example.com".parse().unwrap())
        .subject(subject)
        .multipart(multipart)
        .unwrap()
        .formatted()
}

pub fn valid_submission() -> Vec<u8> {
    build_submission(
        "Alice <a@example.com>",
        "Sunset",
        "Nice evening",
        vec![jpeg_part()],
    )
}

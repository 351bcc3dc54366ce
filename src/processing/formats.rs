//! Image format detection and JPEG output

use std::path::Path;

use image::RgbImage;
use jpeg_encoder::{ColorType, Encoder, SamplingFactor};
use serde::Serialize;

use crate::error::{CardFitError, Result};

/// Largest side a JPEG frame can have
pub const MAX_JPEG_DIMENSION: u32 = u16::MAX as u32;

/// Formats the scanner accepts, plus what files end up containing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
    WebP,
}

impl ImageFormat {
    /// Canonical file extension for this format
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::WebP => "webp",
        }
    }
}

/// Detect image format from file extension
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Option<ImageFormat> {
    let extension = path.as_ref().extension()?.to_str()?;

    match extension.to_lowercase().as_str() {
        "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
        "png" => Some(ImageFormat::Png),
        "gif" => Some(ImageFormat::Gif),
        "bmp" => Some(ImageFormat::Bmp),
        "webp" => Some(ImageFormat::WebP),
        _ => None,
    }
}

/// Detect image format from file header (magic bytes)
pub fn detect_format_from_header(data: &[u8]) -> Option<ImageFormat> {
    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(ImageFormat::Jpeg);
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some(ImageFormat::Png);
    }

    // GIF: GIF87a or GIF89a
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some(ImageFormat::Gif);
    }

    // WebP: RIFF....WEBP
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some(ImageFormat::WebP);
    }

    // BMP: BM
    if data.starts_with(b"BM") {
        return Some(ImageFormat::Bmp);
    }

    None
}

/// Encode an RGB canvas as JPEG into memory with optimised Huffman tables
pub fn encode_jpeg(canvas: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    encode_jpeg_with(canvas, quality, true)
}

fn encode_jpeg_with(canvas: &RgbImage, quality: u8, optimize: bool) -> Result<Vec<u8>> {
    let (width, height) = canvas.dimensions();
    let (Ok(frame_width), Ok(frame_height)) = (u16::try_from(width), u16::try_from(height)) else {
        return Err(CardFitError::invalid_parameters(format!(
            "{}x{} exceeds the JPEG limit of {} pixels per side",
            width, height, MAX_JPEG_DIMENSION
        )));
    };

    let mut buffer = Vec::new();
    let mut encoder = Encoder::new(&mut buffer, quality.clamp(1, 100));
    encoder.set_sampling_factor(SamplingFactor::R_4_2_0);
    encoder.set_optimized_huffman_tables(optimize);
    encoder.encode(canvas.as_raw(), frame_width, frame_height, ColorType::Rgb)?;

    Ok(buffer)
}

//! Utility functions for image loading and conversion.
//!
//! The pipeline works on RGBA buffers throughout so that transforms can
//! preserve the alpha channel; these helpers cover loading from files,
//! compressed bytes, and raw pixel data, plus the luma conversion the
//! decoders need.

use crate::core::errors::ScanError;
use image::{GrayImage, Luma, RgbaImage};
use std::path::Path;

/// Loads an image from a file path as RGBA.
///
/// # Errors
///
/// Returns `ScanError::ImageLoad` if the file cannot be read or decoded.
pub fn load_rgba(path: &Path) -> Result<RgbaImage, ScanError> {
    let img = image::open(path).map_err(ScanError::ImageLoad)?;
    Ok(img.to_rgba8())
}

/// Decodes compressed image bytes (PNG, JPEG, WebP, ...) into an RGBA
/// buffer.
///
/// # Errors
///
/// Returns `ScanError::ImageLoad` if the bytes are not a decodable image.
pub fn load_rgba_from_bytes(bytes: &[u8]) -> Result<RgbaImage, ScanError> {
    let img = image::load_from_memory(bytes).map_err(ScanError::ImageLoad)?;
    Ok(img.to_rgba8())
}

/// Creates an RGBA buffer from raw pixel data with explicit dimensions.
///
/// # Errors
///
/// Returns `ScanError::InvalidInput` if the data length does not match
/// `width * height * 4`.
pub fn rgba_from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<RgbaImage, ScanError> {
    let expected = width as usize * height as usize * 4;
    if data.len() != expected {
        return Err(ScanError::invalid_input(format!(
            "raw RGBA buffer for {width}x{height} must be {expected} bytes, got {}",
            data.len()
        )));
    }
    RgbaImage::from_raw(width, height, data)
        .ok_or_else(|| ScanError::invalid_input("failed to create image from raw data"))
}

/// Converts an RGBA buffer to 8-bit luma using the ITU-R BT.601 weights.
pub fn rgba_to_luma(image: &RgbaImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut gray = GrayImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b, _] = pixel.0;
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        gray.put_pixel(x, y, Luma([luma as u8]));
    }
    gray
}

//! Detector input preprocessing.
//!
//! The detector expects a fixed square input resolution. Preprocessing
//! resizes the source image to that square, converts it to a normalized
//! CHW float tensor, and records the per-axis scale factors needed to map
//! detections back into original-image coordinates.

use crate::core::errors::ScanError;
use image::{RgbaImage, imageops};
use ndarray::Array4;

/// A preprocessed detector input: the tensor plus the scale factors that
/// map model-input coordinates back to original-image coordinates.
#[derive(Debug)]
pub struct LetterboxInput {
    /// Input tensor of shape `[1, 3, size, size]`, RGB, scaled to `[0, 1]`.
    pub tensor: Array4<f32>,
    /// Multiply a model-space x-coordinate by this to get an image-space
    /// x-coordinate.
    pub scale_x: f32,
    /// Multiply a model-space y-coordinate by this to get an image-space
    /// y-coordinate.
    pub scale_y: f32,
}

/// Resizes an image to the detector's square input and converts it to a
/// normalized CHW tensor.
///
/// # Arguments
///
/// * `image` - The source image in original resolution.
/// * `input_size` - The detector's square input side length in pixels.
///
/// # Errors
///
/// Returns a `ScanError::InvalidInput` if the source image or the input
/// size is zero-sized.
pub fn letterbox_to_tensor(image: &RgbaImage, input_size: u32) -> Result<LetterboxInput, ScanError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ScanError::invalid_input("source image has zero area"));
    }
    if input_size == 0 {
        return Err(ScanError::invalid_input("detector input size is zero"));
    }

    let resized = imageops::resize(
        image,
        input_size,
        input_size,
        imageops::FilterType::Triangle,
    );

    let size = input_size as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
    for (x, y, pixel) in resized.enumerate_pixels() {
        let [r, g, b, _] = pixel.0;
        tensor[[0, 0, y as usize, x as usize]] = r as f32 / 255.0;
        tensor[[0, 1, y as usize, x as usize]] = g as f32 / 255.0;
        tensor[[0, 2, y as usize, x as usize]] = b as f32 / 255.0;
    }

    Ok(LetterboxInput {
        tensor,
        scale_x: width as f32 / input_size as f32,
        scale_y: height as f32 / input_size as f32,
    })
}

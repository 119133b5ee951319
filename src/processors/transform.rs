//! Per-region pixel-buffer transforms.
//!
//! For one candidate region the pipeline generates a fixed-priority
//! sequence of buffers: the padded crop, rotations of it at the configured
//! angles, and a binarized version of each rotation. Every transform is a
//! pure function with no shared mutable state, so regions (and files in a
//! batch) can be processed independently.
//!
//! Rotation fills the background with opaque white. The fill color is a
//! correctness requirement: a black or transparent background reads as
//! dark modules after luma conversion and destroys the quiet zone the
//! decoder needs around the symbol.

use crate::core::config::{BinarizeThreshold, TransformConfig};
use crate::core::errors::ScanError;
use crate::processors::types::{DetectionBox, RegionVariant, TransformKind};
use image::{GrayImage, Luma, Rgba, RgbaImage, imageops};
use rayon::prelude::*;

/// Background fill for rotation canvases: opaque white.
const ROTATION_FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Expands a detection box by `pad_fraction` of its larger side on every
/// side, clamps to the image bounds, and extracts the sub-rectangle.
///
/// # Arguments
///
/// * `image` - The source image in original resolution.
/// * `bbox` - The detection box in original-image coordinates.
/// * `pad_fraction` - Fraction of `max(width, height)` added per side.
///
/// # Returns
///
/// The cropped buffer together with its top-left origin in the source
/// image.
///
/// # Errors
///
/// Returns a transform `ScanError` if the clamped rectangle has zero
/// area, for example when the box lies entirely outside the image.
pub fn pad_crop(
    image: &RgbaImage,
    bbox: &DetectionBox,
    pad_fraction: f32,
) -> Result<(RgbaImage, u32, u32), ScanError> {
    let (img_w, img_h) = image.dimensions();
    let pad = pad_fraction * bbox.width.max(bbox.height);

    let x0 = (bbox.x - pad).floor().clamp(0.0, img_w as f32) as u32;
    let y0 = (bbox.y - pad).floor().clamp(0.0, img_h as f32) as u32;
    let x1 = (bbox.x2() + pad).ceil().clamp(0.0, img_w as f32) as u32;
    let y1 = (bbox.y2() + pad).ceil().clamp(0.0, img_h as f32) as u32;

    if x1 <= x0 || y1 <= y0 {
        return Err(ScanError::transform(format!(
            "padded crop of box at ({}, {}) has zero area",
            bbox.x, bbox.y
        )));
    }

    let crop = imageops::crop_imm(image, x0, y0, x1 - x0, y1 - y0).to_image();
    Ok((crop, x0, y0))
}

/// Rotates a buffer about its center into a canvas sized to bound the
/// rotated content without clipping, filling the background with opaque
/// white.
///
/// The canvas dimensions follow `w·|cos θ| + h·|sin θ|` (and the symmetric
/// expression for height). Sampling uses inverse mapping with
/// nearest-neighbor lookup; each output row is computed independently in
/// parallel.
pub fn rotate_about_center(image: &RgbaImage, angle_degrees: f32) -> RgbaImage {
    let (w, h) = image.dimensions();
    let rad = angle_degrees.to_radians();
    let cos_a = rad.cos();
    let sin_a = rad.sin();

    let new_w = (w as f32 * cos_a.abs() + h as f32 * sin_a.abs()).ceil() as u32;
    let new_h = (w as f32 * sin_a.abs() + h as f32 * cos_a.abs()).ceil() as u32;

    let cx = w as f32 / 2.0;
    let cy = h as f32 / 2.0;
    let new_cx = new_w as f32 / 2.0;
    let new_cy = new_h as f32 / 2.0;

    let mut rotated = RgbaImage::from_pixel(new_w, new_h, ROTATION_FILL);
    let buffer: &mut [u8] = rotated.as_mut();

    buffer
        .par_chunks_mut((new_w * 4) as usize)
        .enumerate()
        .for_each(|(dst_y, row)| {
            for dst_x in 0..new_w {
                let dx = dst_x as f32 - new_cx;
                let dy = dst_y as f32 - new_cy;

                // Inverse rotation back into source coordinates.
                let src_x = dx * cos_a + dy * sin_a + cx;
                let src_y = -dx * sin_a + dy * cos_a + cy;

                if src_x >= 0.0
                    && src_y >= 0.0
                    && src_x < (w as f32 - 0.5)
                    && src_y < (h as f32 - 0.5)
                {
                    let sx = src_x.round() as u32;
                    let sy = src_y.round() as u32;
                    if sx < w && sy < h {
                        let index = (dst_x * 4) as usize;
                        row[index..index + 4].copy_from_slice(&image.get_pixel(sx, sy).0);
                    }
                }
            }
        });

    rotated
}

/// Binarizes a buffer: luma below the threshold becomes pure black, at or
/// above becomes pure white. Luma is the unweighted mean of the red,
/// green, and blue channels; the alpha channel is preserved unchanged.
pub fn binarize(image: &RgbaImage, threshold: BinarizeThreshold) -> RgbaImage {
    let threshold = match threshold {
        BinarizeThreshold::Fixed(value) => value,
        BinarizeThreshold::Otsu => otsu_threshold(image),
    };

    let mut result = image.clone();
    for pixel in result.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let luma = ((r as u16 + g as u16 + b as u16) / 3) as u8;
        let value = if luma < threshold { 0 } else { 255 };
        *pixel = Rgba([value, value, value, a]);
    }
    result
}

/// Computes an Otsu threshold over the buffer's unweighted-mean luma.
fn otsu_threshold(image: &RgbaImage) -> u8 {
    let (w, h) = image.dimensions();
    let mut gray = GrayImage::new(w, h);
    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b, _] = pixel.0;
        gray.put_pixel(x, y, Luma([((r as u16 + g as u16 + b as u16) / 3) as u8]));
    }
    imageproc::contrast::otsu_level(&gray)
}

/// Generates the ordered variant sequence for one candidate region.
#[derive(Debug, Clone)]
pub struct RegionTransformer {
    config: TransformConfig,
}

impl RegionTransformer {
    /// Creates a transformer with the given configuration.
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    /// Produces the variant sequence for one detection box.
    ///
    /// The sequence starts with the padded crop, then for each configured
    /// angle yields the rotation and its binarized version. Generation is
    /// lazy: a variant's buffer is only computed when the sequence
    /// advances to it, and each rotation is computed once and reused for
    /// its binarized follow-up.
    ///
    /// # Errors
    ///
    /// Returns a transform `ScanError` if the padded crop has zero area.
    pub fn variants(
        &self,
        image: &RgbaImage,
        bbox: &DetectionBox,
    ) -> Result<RegionVariants, ScanError> {
        let (crop, origin_x, origin_y) = pad_crop(image, bbox, self.config.pad_fraction)?;
        Ok(RegionVariants {
            crop,
            origin_x,
            origin_y,
            angles: self.config.rotation_angles.clone(),
            threshold: self.config.binarize_threshold,
            cursor: 0,
            cached_rotation: None,
        })
    }
}

/// The lazy, restartable, finite variant sequence for one region.
pub struct RegionVariants {
    crop: RgbaImage,
    origin_x: u32,
    origin_y: u32,
    angles: Vec<f32>,
    threshold: BinarizeThreshold,
    cursor: usize,
    cached_rotation: Option<(usize, RgbaImage)>,
}

impl RegionVariants {
    /// Rewinds the sequence to the padded crop.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.cached_rotation = None;
    }

    /// Total number of variants this sequence will yield.
    pub fn len(&self) -> usize {
        1 + self.angles.len() * 2
    }

    /// Returns true when the sequence yields no variants. Never the case:
    /// the padded crop is always present.
    pub fn is_empty(&self) -> bool {
        false
    }

    fn rotation_for(&mut self, angle_index: usize) -> RgbaImage {
        match &self.cached_rotation {
            Some((cached_index, buffer)) if *cached_index == angle_index => buffer.clone(),
            _ => {
                let buffer = rotate_about_center(&self.crop, self.angles[angle_index]);
                self.cached_rotation = Some((angle_index, buffer.clone()));
                buffer
            }
        }
    }
}

impl Iterator for RegionVariants {
    type Item = RegionVariant;

    fn next(&mut self) -> Option<RegionVariant> {
        let step = self.cursor;
        self.cursor += 1;

        if step == 0 {
            return Some(RegionVariant {
                image: self.crop.clone(),
                origin_x: self.origin_x,
                origin_y: self.origin_y,
                transform: TransformKind::PaddedCrop,
            });
        }

        let rotation_step = step - 1;
        let angle_index = rotation_step / 2;
        if angle_index >= self.angles.len() {
            return None;
        }
        let angle = self.angles[angle_index];
        let rotated = self.rotation_for(angle_index);

        let (image, transform) = if rotation_step % 2 == 0 {
            (rotated, TransformKind::Rotated { angle })
        } else {
            (
                binarize(&rotated, self.threshold),
                TransformKind::RotatedBinarized { angle },
            )
        };

        Some(RegionVariant {
            image,
            origin_x: self.origin_x,
            origin_y: self.origin_y,
            transform,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A white crop with a centered black square, the worst case for
    /// background-fill mistakes.
    fn black_square_crop(side: u32, square: u32) -> RgbaImage {
        let mut image = RgbaImage::from_pixel(side, side, Rgba([255, 255, 255, 255]));
        let offset = (side - square) / 2;
        for y in offset..offset + square {
            for x in offset..offset + square {
                image.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        image
    }

    fn is_dark(pixel: &Rgba<u8>) -> bool {
        let [r, g, b, _] = pixel.0;
        (r as u16 + g as u16 + b as u16) / 3 < 128
    }

    #[test]
    fn test_pad_crop_expands_and_clamps() {
        let image = RgbaImage::from_pixel(500, 500, Rgba([200, 200, 200, 255]));
        let bbox = DetectionBox::new(100.0, 100.0, 100.0, 100.0, 0.9, 0);
        let (crop, x0, y0) = pad_crop(&image, &bbox, 0.1).unwrap();
        // 10% of 100px on each side.
        assert_eq!((x0, y0), (90, 90));
        assert_eq!(crop.dimensions(), (120, 120));

        // A box at the image corner clamps instead of going negative.
        let corner = DetectionBox::new(0.0, 0.0, 100.0, 100.0, 0.9, 0);
        let (crop, x0, y0) = pad_crop(&image, &corner, 0.1).unwrap();
        assert_eq!((x0, y0), (0, 0));
        assert_eq!(crop.dimensions(), (110, 110));
    }

    #[test]
    fn test_pad_crop_outside_image_is_error() {
        let image = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255]));
        let bbox = DetectionBox::new(500.0, 500.0, 50.0, 50.0, 0.9, 0);
        assert!(pad_crop(&image, &bbox, 0.1).is_err());
    }

    #[test]
    fn test_rotation_canvas_bounds_content() {
        let image = black_square_crop(100, 50);
        let rotated = rotate_about_center(&image, 45.0);
        // 100·cos45 + 100·sin45 ≈ 141.4, ceiled.
        assert_eq!(rotated.dimensions(), (142, 142));
    }

    #[test]
    fn test_rotation_border_is_opaque_white() {
        let image = black_square_crop(100, 50);
        for angle in [30.0, -30.0, 45.0, -45.0, 60.0, -60.0] {
            let rotated = rotate_about_center(&image, angle);
            let (w, h) = rotated.dimensions();
            for x in 0..w {
                assert_eq!(*rotated.get_pixel(x, 0), ROTATION_FILL, "angle {angle}");
                assert_eq!(*rotated.get_pixel(x, h - 1), ROTATION_FILL, "angle {angle}");
            }
            for y in 0..h {
                assert_eq!(*rotated.get_pixel(0, y), ROTATION_FILL, "angle {angle}");
                assert_eq!(*rotated.get_pixel(w - 1, y), ROTATION_FILL, "angle {angle}");
            }
        }
    }

    #[test]
    fn test_rotation_round_trip_preserves_foreground() {
        let original = black_square_crop(80, 40);
        let there = rotate_about_center(&original, 45.0);
        let back = rotate_about_center(&there, -45.0);

        // Crop the center back to the original bounds.
        let (bw, bh) = back.dimensions();
        let off_x = (bw - 80) / 2;
        let off_y = (bh - 80) / 2;
        let recovered = imageops::crop_imm(&back, off_x, off_y, 80, 80).to_image();

        let near_dark = |img: &RgbaImage, x: u32, y: u32| -> bool {
            let (w, h) = img.dimensions();
            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    if nx >= 0
                        && ny >= 0
                        && (nx as u32) < w
                        && (ny as u32) < h
                        && is_dark(img.get_pixel(nx as u32, ny as u32))
                    {
                        return true;
                    }
                }
            }
            false
        };

        // Every foreground pixel survives within ±1px, in both directions.
        for y in 0..80 {
            for x in 0..80 {
                if is_dark(original.get_pixel(x, y)) {
                    assert!(near_dark(&recovered, x, y), "lost foreground at ({x}, {y})");
                }
                if is_dark(recovered.get_pixel(x, y)) {
                    assert!(near_dark(&original, x, y), "spurious foreground at ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn test_binarize_two_levels_alpha_untouched() {
        let mut image = RgbaImage::new(4, 1);
        image.put_pixel(0, 0, Rgba([10, 20, 30, 200]));
        image.put_pixel(1, 0, Rgba([130, 130, 130, 128]));
        image.put_pixel(2, 0, Rgba([127, 127, 127, 0]));
        image.put_pixel(3, 0, Rgba([128, 128, 128, 255]));

        let result = binarize(&image, BinarizeThreshold::Fixed(128));
        for (source, pixel) in image.pixels().zip(result.pixels()) {
            let [r, g, b, a] = pixel.0;
            assert!(r == 0 || r == 255);
            assert_eq!(r, g);
            assert_eq!(g, b);
            assert_eq!(a, source.0[3]);
        }
        // Below the midpoint goes black; at the midpoint goes white.
        assert_eq!(result.get_pixel(2, 0).0[0], 0);
        assert_eq!(result.get_pixel(3, 0).0[0], 255);
    }

    #[test]
    fn test_binarize_otsu_separates_bimodal_buffer() {
        let mut image = RgbaImage::from_pixel(10, 10, Rgba([40, 40, 40, 255]));
        for y in 0..10 {
            for x in 5..10 {
                image.put_pixel(x, y, Rgba([210, 210, 210, 255]));
            }
        }
        let result = binarize(&image, BinarizeThreshold::Otsu);
        assert_eq!(result.get_pixel(0, 0).0[0], 0);
        assert_eq!(result.get_pixel(9, 0).0[0], 255);
    }

    #[test]
    fn test_variant_sequence_order() {
        let image = black_square_crop(200, 100);
        let bbox = DetectionBox::new(50.0, 50.0, 100.0, 100.0, 0.9, 0);
        let transformer = RegionTransformer::new(TransformConfig::default());
        let variants = transformer.variants(&image, &bbox).unwrap();

        let kinds: Vec<TransformKind> = variants.map(|v| v.transform).collect();
        assert_eq!(kinds.len(), 13);
        assert_eq!(kinds[0], TransformKind::PaddedCrop);
        assert_eq!(kinds[1], TransformKind::Rotated { angle: 30.0 });
        assert_eq!(kinds[2], TransformKind::RotatedBinarized { angle: 30.0 });
        assert_eq!(kinds[3], TransformKind::Rotated { angle: -30.0 });
        assert_eq!(kinds[12], TransformKind::RotatedBinarized { angle: -60.0 });
    }

    #[test]
    fn test_variant_sequence_is_restartable() {
        let image = black_square_crop(200, 100);
        let bbox = DetectionBox::new(50.0, 50.0, 100.0, 100.0, 0.9, 0);
        let transformer = RegionTransformer::new(TransformConfig::default());
        let mut variants = transformer.variants(&image, &bbox).unwrap();

        let first: Vec<TransformKind> = variants.by_ref().take(3).map(|v| v.transform).collect();
        variants.reset();
        let again: Vec<TransformKind> = variants.take(3).map(|v| v.transform).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn test_variant_origin_maps_back_to_source() {
        let image = black_square_crop(500, 100);
        let bbox = DetectionBox::new(200.0, 200.0, 100.0, 100.0, 0.9, 0);
        let transformer = RegionTransformer::new(TransformConfig::default());
        let variants = transformer.variants(&image, &bbox).unwrap();
        for variant in variants {
            assert_eq!(variant.origin_x, 190);
            assert_eq!(variant.origin_y, 190);
        }
    }
}

//! Symbol decoding through the rqrr engine.

use crate::core::traits::SymbolDecoder;
use crate::domain::DecodedSymbol;
use crate::utils::rgba_to_luma;
use image::RgbaImage;
use tracing::debug;

/// Decoder backed by rqrr's grid detection.
///
/// rqrr finds every grid candidate in the buffer, so a single call can
/// return multiple symbols.
#[derive(Debug, Clone, Default)]
pub struct RqrrDecoder;

impl RqrrDecoder {
    /// Creates the decoder.
    pub fn new() -> Self {
        Self
    }
}

impl SymbolDecoder for RqrrDecoder {
    fn decode(&self, image: &RgbaImage) -> Vec<DecodedSymbol> {
        let gray = rgba_to_luma(image);
        let (width, height) = gray.dimensions();
        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
                gray.get_pixel(x as u32, y as u32).0[0]
            });
        let grids = prepared.detect_grids();
        if grids.is_empty() {
            return Vec::new();
        }

        grids
            .iter()
            .filter_map(|grid| match grid.decode() {
                Ok((_meta, content)) => {
                    let xs = grid.bounds.iter().map(|p| p.x);
                    let ys = grid.bounds.iter().map(|p| p.y);
                    let min_x = xs.clone().min().unwrap_or(0) as f32;
                    let max_x = xs.max().unwrap_or(0) as f32;
                    let min_y = ys.clone().min().unwrap_or(0) as f32;
                    let max_y = ys.max().unwrap_or(0) as f32;

                    Some(DecodedSymbol::new(content).with_bounding_box([
                        min_x,
                        min_y,
                        max_x - min_x,
                        max_y - min_y,
                    ]))
                }
                Err(e) => {
                    debug!("rqrr grid decode failed: {e:?}");
                    None
                }
            })
            .collect()
    }

    fn name(&self) -> &str {
        "rqrr"
    }
}

//! Default implementations of the primary symbol decoder.
//!
//! The orchestrator only depends on the [`SymbolDecoder`] trait; these
//! adapters provide the stock engines. [`DecoderStack`] is the default:
//! rqrr first (it finds multiple grids per buffer), then rxing, and
//! optionally a luma-inverted retry of both for light-on-dark symbols.

mod rqrr;
mod rxing;

pub use rqrr::RqrrDecoder;
pub use rxing::RxingDecoder;

use crate::core::config::DecoderConfig;
use crate::core::traits::SymbolDecoder;
use crate::domain::DecodedSymbol;
use image::{Rgba, RgbaImage};
use tracing::debug;

/// The default decoding stack.
#[derive(Debug, Clone)]
pub struct DecoderStack {
    rqrr: RqrrDecoder,
    rxing: RxingDecoder,
    try_inverted: bool,
}

impl Default for DecoderStack {
    fn default() -> Self {
        Self::new(&DecoderConfig::default())
    }
}

impl DecoderStack {
    /// Creates the stack from decoder configuration.
    pub fn new(config: &DecoderConfig) -> Self {
        Self {
            rqrr: RqrrDecoder::new(),
            rxing: RxingDecoder::new(),
            try_inverted: config.try_inverted,
        }
    }

    fn decode_engines(&self, image: &RgbaImage) -> Vec<DecodedSymbol> {
        let symbols = self.rqrr.decode(image);
        if !symbols.is_empty() {
            return symbols;
        }
        self.rxing.decode(image)
    }
}

/// Inverts the color channels of a buffer, leaving alpha unchanged.
fn invert(image: &RgbaImage) -> RgbaImage {
    let mut inverted = image.clone();
    for pixel in inverted.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        *pixel = Rgba([255 - r, 255 - g, 255 - b, a]);
    }
    inverted
}

impl SymbolDecoder for DecoderStack {
    fn decode(&self, image: &RgbaImage) -> Vec<DecodedSymbol> {
        let symbols = self.decode_engines(image);
        if !symbols.is_empty() || !self.try_inverted {
            return symbols;
        }

        debug!("decoder stack found nothing, retrying on inverted buffer");
        self.decode_engines(&invert(image))
    }

    fn name(&self) -> &str {
        "rqrr+rxing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invert_preserves_alpha() {
        let image = RgbaImage::from_pixel(2, 2, Rgba([10, 200, 100, 77]));
        let inverted = invert(&image);
        assert_eq!(*inverted.get_pixel(0, 0), Rgba([245, 55, 155, 77]));
    }

    #[test]
    fn test_stack_returns_empty_on_blank_buffer() {
        let stack = DecoderStack::new(&DecoderConfig::default());
        let blank = RgbaImage::from_pixel(64, 64, Rgba([255, 255, 255, 255]));
        assert!(stack.decode(&blank).is_empty());
    }
}

//! Symbol decoding through the rxing engine.

use crate::core::traits::SymbolDecoder;
use crate::domain::DecodedSymbol;
use crate::utils::rgba_to_luma;
use image::RgbaImage;
use rxing::qrcode::QRCodeReader;
use rxing::{BarcodeFormat, DecodingHintDictionary, Reader};
use std::collections::HashSet;
use tracing::debug;

/// Decoder backed by rxing's QR reader.
///
/// The first pass uses the hybrid binarizer; when that finds nothing the
/// global-histogram binarizer gets a second pass on the same luminance
/// data, which recovers low-contrast symbols the hybrid pass misses.
#[derive(Debug, Clone, Default)]
pub struct RxingDecoder;

impl RxingDecoder {
    /// Creates the decoder.
    pub fn new() -> Self {
        Self
    }

    fn hints() -> DecodingHintDictionary {
        let mut hints = DecodingHintDictionary::new();
        hints.insert(
            rxing::DecodeHintType::POSSIBLE_FORMATS,
            rxing::DecodeHintValue::PossibleFormats(HashSet::from([BarcodeFormat::QR_CODE])),
        );
        hints.insert(
            rxing::DecodeHintType::TRY_HARDER,
            rxing::DecodeHintValue::TryHarder(true),
        );
        hints
    }

    /// Packs luma into the 0xAARRGGBB pixel format rxing expects.
    fn packed_pixels(image: &RgbaImage) -> (usize, usize, Vec<u32>) {
        let gray = rgba_to_luma(image);
        let (width, height) = gray.dimensions();
        let pixels = gray
            .as_raw()
            .iter()
            .map(|&luma| {
                let l = luma as u32;
                0xFF00_0000 | (l << 16) | (l << 8) | l
            })
            .collect();
        (width as usize, height as usize, pixels)
    }
}

impl SymbolDecoder for RxingDecoder {
    fn decode(&self, image: &RgbaImage) -> Vec<DecodedSymbol> {
        let (width, height, pixels) = Self::packed_pixels(image);
        let hints = Self::hints();
        let mut reader = QRCodeReader::new();

        let source = rxing::RGBLuminanceSource::new_with_width_height_pixels(width, height, &pixels);
        let mut bitmap = rxing::BinaryBitmap::new(rxing::common::HybridBinarizer::new(source));
        if let Ok(result) = reader.decode_with_hints(&mut bitmap, &hints) {
            return vec![DecodedSymbol::new(result.getText().to_string())];
        }

        debug!("rxing hybrid binarizer found nothing, trying global histogram");
        let source = rxing::RGBLuminanceSource::new_with_width_height_pixels(width, height, &pixels);
        let mut bitmap =
            rxing::BinaryBitmap::new(rxing::common::GlobalHistogramBinarizer::new(source));
        match reader.decode_with_hints(&mut bitmap, &hints) {
            Ok(result) => vec![DecodedSymbol::new(result.getText().to_string())],
            Err(_) => Vec::new(),
        }
    }

    fn name(&self) -> &str {
        "rxing"
    }
}

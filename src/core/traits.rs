//! Trait seams for the pipeline's external collaborators.
//!
//! The primary symbol decoder is consumed at an interface boundary: the
//! orchestrator only ever sees this trait, so any decoding engine (or a
//! test stub) can stand behind it.

use crate::core::errors::ScanError;
use crate::domain::DecodedSymbol;
use image::RgbaImage;
use ndarray::{Array3, Array4};

/// A symbol decoder that accepts a pixel buffer and returns every payload
/// it can read.
///
/// An empty vector means "no symbol found". That is the expected,
/// non-exceptional outcome that tells the orchestrator to try the next
/// strategy. Decoders
/// must return in bounded time; the orchestrator never cancels a decode
/// mid-flight.
pub trait SymbolDecoder: Send + Sync {
    /// Decodes every readable symbol in the buffer.
    fn decode(&self, image: &RgbaImage) -> Vec<DecodedSymbol>;

    /// A short name for attempt traces and logs.
    fn name(&self) -> &str;
}

/// A detection inference engine.
///
/// One forward pass over a preprocessed `[1, 3, size, size]` tensor
/// returns the raw `[1, 4 + num_classes, anchors]` detection tensor. The
/// loaded engine is read-only after construction and safe to share across
/// concurrent scan calls.
pub trait RegionDetector: Send + Sync {
    /// The square input side length this engine expects, in pixels.
    fn input_size(&self) -> u32;

    /// Runs one forward pass.
    ///
    /// # Errors
    ///
    /// Returns an inference `ScanError` when the engine rejects the input
    /// or the forward pass fails.
    fn run(&self, input: &Array4<f32>) -> Result<Array3<f32>, ScanError>;
}

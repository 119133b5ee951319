//! Decoded symbol payloads.

use crate::domain::ContentType;
use serde::{Deserialize, Serialize};

/// One decoded symbol returned by a decoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedSymbol {
    /// The decoded text payload.
    pub text: String,
    /// Classification of the payload.
    pub content_type: ContentType,
    /// Bounding box `[x, y, width, height]` in the coordinates of the
    /// buffer the decode ran on, when the decoder reports one.
    pub bounding_box: Option<[f32; 4]>,
}

impl DecodedSymbol {
    /// Creates a symbol from decoded text, classifying its content.
    pub fn new(text: String) -> Self {
        let content_type = ContentType::classify(&text);
        Self {
            text,
            content_type,
            bounding_box: None,
        }
    }

    /// Attaches a bounding box in the decoded buffer's coordinates.
    pub fn with_bounding_box(mut self, bbox: [f32; 4]) -> Self {
        self.bounding_box = Some(bbox);
        self
    }
}

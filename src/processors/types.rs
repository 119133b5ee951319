//! Data types produced and consumed by the processing stages.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// One validated detection in original-image pixel coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionBox {
    /// X-coordinate of the top-left corner.
    pub x: f32,
    /// Y-coordinate of the top-left corner.
    pub y: f32,
    /// Box width. Always positive for boxes emitted by the postprocessor.
    pub width: f32,
    /// Box height. Always positive for boxes emitted by the postprocessor.
    pub height: f32,
    /// Detection confidence in `[0, 1]`.
    pub confidence: f32,
    /// Index of the winning class channel.
    pub class_id: usize,
}

impl DetectionBox {
    /// Creates a new detection box.
    pub fn new(x: f32, y: f32, width: f32, height: f32, confidence: f32, class_id: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            confidence,
            class_id,
        }
    }

    /// X-coordinate of the bottom-right corner.
    #[inline]
    pub fn x2(&self) -> f32 {
        self.x + self.width
    }

    /// Y-coordinate of the bottom-right corner.
    #[inline]
    pub fn y2(&self) -> f32 {
        self.y + self.height
    }

    /// Box area in pixels.
    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Intersection-over-Union with another box.
    ///
    /// Computed as `intersection / (area_a + area_b - intersection + ε)`
    /// with a small epsilon so two degenerate zero-area boxes divide
    /// cleanly instead of producing NaN.
    pub fn iou(&self, other: &DetectionBox) -> f32 {
        const EPSILON: f32 = 1e-6;

        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = self.x2().min(other.x2());
        let iy2 = self.y2().min(other.y2());

        let iw = (ix2 - ix1).max(0.0);
        let ih = (iy2 - iy1).max(0.0);
        let intersection = iw * ih;

        intersection / (self.area() + other.area() - intersection + EPSILON)
    }
}

/// Names the transform that produced a region variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TransformKind {
    /// The padded crop of a detection box, no further transform.
    PaddedCrop,
    /// The padded crop rotated about its center by the given angle in
    /// degrees.
    Rotated {
        /// Rotation angle in degrees, positive counter-clockwise.
        angle: f32,
    },
    /// A rotated buffer binarized to pure black and white.
    RotatedBinarized {
        /// Rotation angle in degrees of the underlying buffer.
        angle: f32,
    },
}

impl std::fmt::Display for TransformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformKind::PaddedCrop => write!(f, "crop"),
            TransformKind::Rotated { angle } => write!(f, "rotate{angle:+}"),
            TransformKind::RotatedBinarized { angle } => write!(f, "rotate{angle:+}:binarized"),
        }
    }
}

/// A pixel buffer derived from the source image through a named transform.
///
/// Carries the origin of the underlying crop in original-image coordinates
/// so a decode hit can be mapped back if a caller needs it. Variants are
/// created per scan call and dropped when the call completes.
#[derive(Debug, Clone)]
pub struct RegionVariant {
    /// The transformed pixel buffer.
    pub image: RgbaImage,
    /// X origin of the underlying crop in the source image.
    pub origin_x: u32,
    /// Y origin of the underlying crop in the source image.
    pub origin_y: u32,
    /// The transform that produced this buffer.
    pub transform: TransformKind,
}

impl RegionVariant {
    /// Buffer width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Buffer height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

//! Detector output post-processing.
//!
//! Converts the raw detection tensor into validated bounding boxes in
//! original-image coordinates. The expected layout is
//! `[batch=1, 4 + num_classes, anchors]`: channels 0–3 carry center-x,
//! center-y, width, and height in model-input pixel space, the remaining
//! channels carry per-class confidence scores.

use crate::core::config::DetectionConfig;
use crate::core::errors::{ScanError, SimpleError};
use crate::processors::types::DetectionBox;
use ndarray::ArrayView3;

/// Post-processor for raw detection model output.
///
/// Parsing is a pure function over the tensor and its arguments: no side
/// effects, and boxes are emitted in anchor-scan order. Sorting by
/// confidence is the suppression stage's job.
#[derive(Debug, Clone)]
pub struct DetectionPostProcess {
    /// Minimum width and height, in original-image pixels, for a box to
    /// survive.
    min_box_size: f32,
    /// Accepted `width / height` band.
    aspect_ratio_band: (f32, f32),
}

impl DetectionPostProcess {
    /// Creates a post-processor from detection configuration.
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            min_box_size: config.min_box_size,
            aspect_ratio_band: config.aspect_ratio_band,
        }
    }

    /// Parses a raw detection tensor into validated boxes.
    ///
    /// # Arguments
    ///
    /// * `output` - Raw tensor of shape `[1, 4 + num_classes, anchors]`.
    /// * `confidence_threshold` - Minimum class score; the comparison is
    ///   strict, so a score exactly equal to the threshold is rejected.
    /// * `scale_x` - Model-space to image-space scale factor for x.
    /// * `scale_y` - Model-space to image-space scale factor for y.
    ///
    /// # Returns
    ///
    /// Surviving boxes in anchor-scan order, in original-image pixel
    /// coordinates.
    ///
    /// # Errors
    ///
    /// Returns a post-processing `ScanError` if the tensor does not have
    /// at least one batch entry and five channels.
    pub fn parse(
        &self,
        output: ArrayView3<'_, f32>,
        confidence_threshold: f32,
        scale_x: f32,
        scale_y: f32,
    ) -> Result<Vec<DetectionBox>, ScanError> {
        let shape = output.shape();
        let (batch, channels, anchors) = (shape[0], shape[1], shape[2]);
        if batch == 0 || channels < 5 {
            return Err(ScanError::post_processing(
                &format!(
                    "detection tensor must be [1, 4+classes, anchors], got {shape:?}"
                ),
                SimpleError::new("unexpected output tensor shape"),
            ));
        }

        let num_classes = channels - 4;
        let mut boxes = Vec::new();

        for anchor in 0..anchors {
            // Scan all class channels for the best score; ties keep the
            // lowest class id so the result is deterministic.
            let mut class_id = 0usize;
            let mut score = f32::NEG_INFINITY;
            for cls in 0..num_classes {
                let s = output[[0, 4 + cls, anchor]];
                if s > score {
                    score = s;
                    class_id = cls;
                }
            }

            if !score.is_finite() || score <= confidence_threshold {
                continue;
            }

            let cx = output[[0, 0, anchor]];
            let cy = output[[0, 1, anchor]];
            let w = output[[0, 2, anchor]];
            let h = output[[0, 3, anchor]];

            let x1 = (cx - w / 2.0) * scale_x;
            let y1 = (cy - h / 2.0) * scale_y;
            let x2 = (cx + w / 2.0) * scale_x;
            let y2 = (cy + h / 2.0) * scale_y;

            if !Self::is_valid_box(x1, y1, x2, y2) {
                continue;
            }

            let width = x2 - x1;
            let height = y2 - y1;

            if width < self.min_box_size || height < self.min_box_size {
                continue;
            }

            let aspect = width / height;
            let (lo, hi) = self.aspect_ratio_band;
            if aspect < lo || aspect > hi {
                continue;
            }

            boxes.push(DetectionBox::new(x1, y1, width, height, score, class_id));
        }

        Ok(boxes)
    }

    fn is_valid_box(x1: f32, y1: f32, x2: f32, y2: f32) -> bool {
        x2 > x1 && y2 > y1 && x1.is_finite() && y1.is_finite() && x2.is_finite() && y2.is_finite()
    }
}

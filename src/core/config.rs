//! Configuration for the scan pipeline.
//!
//! This module holds the tunable parameters of every pipeline stage:
//! detection thresholds and filters, region transform parameters, and the
//! orchestrator's bounded waits. All constants carried over from the tuned
//! production values (angle set, size and aspect filters, thresholds) are
//! defaults here, not invariants; callers may override any of them.

use crate::core::errors::ScanError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the binarization step picks its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BinarizeThreshold {
    /// A fixed luma threshold; values below become black, at or above
    /// become white.
    Fixed(u8),
    /// Compute the threshold per buffer with Otsu's method.
    Otsu,
}

impl Default for BinarizeThreshold {
    fn default() -> Self {
        BinarizeThreshold::Fixed(128)
    }
}

/// Configuration for detector output parsing and duplicate suppression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Minimum class score for an anchor to produce a box. The comparison
    /// is strict: a score exactly equal to the threshold is rejected.
    pub confidence_threshold: f32,
    /// Intersection-over-Union threshold for non-maximum suppression.
    pub iou_threshold: f32,
    /// Maximum number of boxes kept after suppression.
    pub max_detections: usize,
    /// Minimum width and height, in original-image pixels, for a box to
    /// be considered large enough to contain a readable symbol.
    pub min_box_size: f32,
    /// Accepted `width / height` band. QR symbols are near-square; the
    /// asymmetry tolerates perspective skew.
    pub aspect_ratio_band: (f32, f32),
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            iou_threshold: 0.45,
            max_detections: 5,
            min_box_size: 45.0,
            aspect_ratio_band: (0.5, 2.0),
        }
    }
}

impl DetectionConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ScanError::ConfigError` if any threshold is outside its
    /// valid range or the aspect band is empty.
    pub fn validate(&self) -> Result<(), ScanError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ScanError::config_error(format!(
                "confidence_threshold must be in [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(ScanError::config_error(format!(
                "iou_threshold must be in [0, 1], got {}",
                self.iou_threshold
            )));
        }
        if self.max_detections == 0 {
            return Err(ScanError::config_error(
                "max_detections must be greater than 0",
            ));
        }
        if self.min_box_size <= 0.0 || !self.min_box_size.is_finite() {
            return Err(ScanError::config_error(format!(
                "min_box_size must be a positive finite value, got {}",
                self.min_box_size
            )));
        }
        let (lo, hi) = self.aspect_ratio_band;
        if !(lo > 0.0 && hi >= lo) {
            return Err(ScanError::config_error(format!(
                "aspect_ratio_band must satisfy 0 < low <= high, got ({lo}, {hi})"
            )));
        }
        Ok(())
    }
}

/// Configuration for per-region variant generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Fraction of `max(width, height)` added as padding on every side of
    /// a detection box before cropping. Restores context (and quiet zone)
    /// lost to a tight box.
    pub pad_fraction: f32,
    /// Rotation angles, in degrees, tried in order for each region.
    pub rotation_angles: Vec<f32>,
    /// Threshold source for the binarized variants.
    pub binarize_threshold: BinarizeThreshold,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            pad_fraction: 0.1,
            rotation_angles: vec![30.0, -30.0, 45.0, -45.0, 60.0, -60.0],
            binarize_threshold: BinarizeThreshold::default(),
        }
    }
}

impl TransformConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ScanError::ConfigError` if the pad fraction is negative
    /// or any angle is not finite.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.pad_fraction < 0.0 || !self.pad_fraction.is_finite() {
            return Err(ScanError::config_error(format!(
                "pad_fraction must be non-negative and finite, got {}",
                self.pad_fraction
            )));
        }
        for (i, angle) in self.rotation_angles.iter().enumerate() {
            if !angle.is_finite() {
                return Err(ScanError::config_error(format!(
                    "rotation angle at index {i} is not finite: {angle}"
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for the default primary decoder stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Also attempt a luma-inverted copy of each buffer, recovering
    /// light-on-dark symbols.
    pub try_inverted: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self { try_inverted: true }
    }
}

/// Top-level configuration for the scan pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Detector output parsing and suppression parameters.
    #[serde(default)]
    pub detection: DetectionConfig,
    /// Region variant generation parameters.
    #[serde(default)]
    pub transforms: TransformConfig,
    /// Primary decoder stack options.
    #[serde(default)]
    pub decoder: DecoderConfig,
    /// Ceiling, in milliseconds, for the blocking wait on a detector
    /// model that is still loading.
    #[serde(default = "PipelineConfig::default_model_wait_ms")]
    pub model_wait_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detection: DetectionConfig::default(),
            transforms: TransformConfig::default(),
            decoder: DecoderConfig::default(),
            model_wait_ms: Self::default_model_wait_ms(),
        }
    }
}

impl PipelineConfig {
    fn default_model_wait_ms() -> u64 {
        10_000
    }

    /// Returns the model wait ceiling as a `Duration`.
    pub fn model_wait(&self) -> Duration {
        Duration::from_millis(self.model_wait_ms)
    }

    /// Parses a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns a `ScanError::ConfigError` if the JSON is malformed or the
    /// parsed values fail validation.
    pub fn from_json(json: &str) -> Result<Self, ScanError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ScanError::config_error(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section of the configuration.
    pub fn validate(&self) -> Result<(), ScanError> {
        self.detection.validate()?;
        self.transforms.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model_wait(), Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_confidence_threshold() {
        let config = DetectionConfig {
            confidence_threshold: 1.5,
            ..DetectionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_aspect_band_rejected() {
        let config = DetectionConfig {
            aspect_ratio_band: (2.0, 0.5),
            ..DetectionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_roundtrip() {
        let json = r#"{
            "detection": { "confidence_threshold": 0.6,
                           "iou_threshold": 0.45,
                           "max_detections": 3,
                           "min_box_size": 45.0,
                           "aspect_ratio_band": [0.5, 2.0] },
            "model_wait_ms": 5000
        }"#;
        let config = PipelineConfig::from_json(json).unwrap();
        assert_eq!(config.detection.confidence_threshold, 0.6);
        assert_eq!(config.detection.max_detections, 3);
        assert_eq!(config.model_wait(), Duration::from_millis(5000));
        // Omitted sections fall back to defaults.
        assert_eq!(config.transforms.pad_fraction, 0.1);
        assert!(config.decoder.try_inverted);
    }

    #[test]
    fn test_nonfinite_angle_rejected() {
        let config = TransformConfig {
            rotation_angles: vec![30.0, f32::NAN],
            ..TransformConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

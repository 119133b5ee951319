//! The fallback scan orchestrator.
//!
//! One scan call walks a deterministic strategy ladder: the primary
//! whole-image decode, then (only when that finds nothing) neural
//! detection, then per candidate region a padded-crop redecode followed
//! by rotated and binarized variants. The first success stops the ladder
//! immediately; there are no retries and no search for a "better" match.
//! Every rung appends to the attempts trace, so the full search is
//! observable even when everything fails.
//!
//! A scan call owns all of its buffers and its trace. The only shared
//! resource is the loaded detector session, which is read-only after
//! load, so independent scan calls can run concurrently without locks.

use crate::core::config::PipelineConfig;
use crate::core::errors::ScanError;
use crate::core::traits::{RegionDetector, SymbolDecoder};
use crate::decoders::DecoderStack;
use crate::domain::DecodedSymbol;
use crate::inference::{CancelToken, DetectorHandle};
use crate::pipeline::attempt::{ScanAttempt, ScanReport, Strategy};
use crate::processors::postprocess::DetectionPostProcess;
use crate::processors::preprocess::letterbox_to_tensor;
use crate::processors::suppression::non_max_suppression;
use crate::processors::transform::RegionTransformer;
use crate::processors::types::DetectionBox;
use crate::utils::{load_rgba_from_bytes, rgba_from_raw};
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The QR scanner: primary decode with a neural detection fallback.
pub struct QrScanner {
    config: PipelineConfig,
    decoder: Arc<dyn SymbolDecoder>,
    detector: Arc<DetectorHandle>,
    postprocess: DetectionPostProcess,
    transformer: RegionTransformer,
}

impl std::fmt::Debug for QrScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrScanner")
            .field("config", &self.config)
            .field("decoder", &self.decoder.name())
            .finish()
    }
}

impl Default for QrScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl QrScanner {
    /// Creates a scanner with default configuration, the stock decoder
    /// stack, and no detector model configured.
    pub fn new() -> Self {
        let config = PipelineConfig::default();
        let decoder = Arc::new(DecoderStack::new(&config.decoder));
        Self::assemble(config, decoder)
    }

    /// Creates a scanner with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ScanError::ConfigError` if the configuration fails
    /// validation.
    pub fn with_config(config: PipelineConfig) -> Result<Self, ScanError> {
        config.validate()?;
        let decoder = Arc::new(DecoderStack::new(&config.decoder));
        Ok(Self::assemble(config, decoder))
    }

    fn assemble(config: PipelineConfig, decoder: Arc<dyn SymbolDecoder>) -> Self {
        let postprocess = DetectionPostProcess::new(&config.detection);
        let transformer = RegionTransformer::new(config.transforms.clone());
        Self {
            config,
            decoder,
            detector: Arc::new(DetectorHandle::new()),
            postprocess,
            transformer,
        }
    }

    /// Replaces the primary decoder.
    pub fn with_decoder(mut self, decoder: impl SymbolDecoder + 'static) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    /// Replaces the detector handle, e.g. to share one loaded model
    /// across several scanners.
    pub fn with_detector(mut self, detector: Arc<DetectorHandle>) -> Self {
        self.detector = detector;
        self
    }

    /// Installs an already-constructed detection engine.
    pub fn with_detector_engine(self, engine: impl RegionDetector + 'static) -> Self {
        self.with_detector(Arc::new(DetectorHandle::ready(engine)))
    }

    /// Starts loading a detector model file in the background. Scans
    /// issued before the load finishes wait up to the configured ceiling.
    pub fn load_detector_model(&self, model_path: impl Into<PathBuf>) {
        self.detector.load_in_background(model_path.into());
    }

    /// The detector handle, for callers that manage loading themselves.
    pub fn detector_handle(&self) -> Arc<DetectorHandle> {
        Arc::clone(&self.detector)
    }

    /// Decodes compressed image bytes and scans them.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::ImageLoad` if the bytes are not a decodable
    /// image. Pipeline failures past that point degrade to a failure
    /// report instead of an error.
    pub fn scan_bytes(&self, bytes: &[u8]) -> Result<ScanReport, ScanError> {
        let image = load_rgba_from_bytes(bytes)?;
        Ok(self.scan(&image))
    }

    /// Scans a raw RGBA buffer with explicit dimensions.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::InvalidInput` if the buffer length does not
    /// match the dimensions.
    pub fn scan_raw(&self, width: u32, height: u32, data: Vec<u8>) -> Result<ScanReport, ScanError> {
        let image = rgba_from_raw(width, height, data)?;
        Ok(self.scan(&image))
    }

    /// Scans a decoded image.
    pub fn scan(&self, image: &RgbaImage) -> ScanReport {
        self.scan_with_cancel(image, &CancelToken::new())
    }

    /// Scans a decoded image with a cancellation token.
    ///
    /// Cancellation is observed at the bounded wait for a loading
    /// detector model; a cancelled scan resolves to a failure report.
    pub fn scan_with_cancel(&self, image: &RgbaImage, cancel: &CancelToken) -> ScanReport {
        let start = Instant::now();
        let mut attempts = Vec::new();

        // Fast path: the primary decoder on the whole image.
        let primary = self.try_decode(Strategy::Primary, image);
        let success = primary.success;
        let symbols = primary.symbols.clone();
        attempts.push(primary);
        if success {
            info!("primary decode succeeded, skipping detection");
            return Self::report(symbols, attempts, start);
        }

        debug!("primary decode found nothing, escalating to detection");

        let detection_start = Instant::now();
        let regions = match self.detect_regions(image, cancel) {
            Ok(regions) => regions,
            Err(e) => {
                warn!("detection unavailable, degrading to failure: {e}");
                attempts.push(ScanAttempt {
                    strategy: Strategy::Detection,
                    elapsed_ms: detection_start.elapsed().as_millis() as u64,
                    success: false,
                    symbols: Vec::new(),
                });
                return Self::report(Vec::new(), attempts, start);
            }
        };

        if regions.is_empty() {
            info!("detector proposed no candidate regions");
            return Self::report(Vec::new(), attempts, start);
        }
        debug!("detector proposed {} candidate region(s)", regions.len());

        // Walk each candidate region's variant ladder in confidence order.
        for (index, bbox) in regions.iter().enumerate() {
            let variants = match self.transformer.variants(image, bbox) {
                Ok(variants) => variants,
                Err(e) => {
                    debug!("skipping region {index}: {e}");
                    continue;
                }
            };

            for variant in variants {
                let strategy = Strategy::Region {
                    index,
                    transform: variant.transform,
                };
                let attempt = self.try_decode(strategy, &variant.image);
                let success = attempt.success;
                let symbols = attempt.symbols.clone();
                attempts.push(attempt);

                if success {
                    info!("decoded via {strategy}");
                    return Self::report(symbols, attempts, start);
                }
            }
        }

        info!("all strategies exhausted without a decode");
        Self::report(Vec::new(), attempts, start)
    }

    /// Runs one decode attempt and records its outcome.
    fn try_decode(&self, strategy: Strategy, image: &RgbaImage) -> ScanAttempt {
        let attempt_start = Instant::now();
        let symbols = self.decoder.decode(image);
        let elapsed_ms = attempt_start.elapsed().as_millis() as u64;
        debug!(
            "attempt {strategy}: {} ({elapsed_ms} ms)",
            if symbols.is_empty() { "miss" } else { "hit" }
        );
        ScanAttempt {
            strategy,
            elapsed_ms,
            success: !symbols.is_empty(),
            symbols,
        }
    }

    /// Waits for the detector, runs inference once, and returns the
    /// suppressed candidate boxes in confidence order.
    fn detect_regions(
        &self,
        image: &RgbaImage,
        cancel: &CancelToken,
    ) -> Result<Vec<DetectionBox>, ScanError> {
        let detector = self.detector.wait_ready(self.config.model_wait(), cancel)?;
        let input = letterbox_to_tensor(image, detector.input_size())?;
        let raw = detector.run(&input.tensor)?;
        let boxes = self.postprocess.parse(
            raw.view(),
            self.config.detection.confidence_threshold,
            input.scale_x,
            input.scale_y,
        )?;
        Ok(non_max_suppression(
            &boxes,
            self.config.detection.iou_threshold,
            self.config.detection.max_detections,
        ))
    }

    fn report(symbols: Vec<DecodedSymbol>, attempts: Vec<ScanAttempt>, start: Instant) -> ScanReport {
        ScanReport {
            symbols,
            attempts,
            elapsed_ms: start.elapsed().as_millis() as u64,
        }
    }
}

//! # QR Rescue
//!
//! A Rust library that recovers QR codes a fast primary decoder could not
//! read, using an ONNX detection model and an escalating ladder of
//! geometric and photometric transforms.
//!
//! ## Features
//!
//! - Primary whole-image decode first; detection work only on a miss
//! - Neural region proposals parsed from a raw detection tensor
//! - Greedy non-maximum suppression of duplicate proposals
//! - Per-region padded crops, white-backed rotations, and binarization
//! - A deterministic strategy ladder with a full attempts trace
//! - Batch processing, sequential or parallel
//!
//! ## Components
//!
//! * [`core`] - Errors, configuration, and collaborator traits
//! * [`decoders`] - Stock symbol decoder implementations
//! * [`domain`] - Decoded symbol and content classification types
//! * [`inference`] - ONNX Runtime detector integration
//! * [`pipeline`] - The fallback orchestrator, traces, and batch mode
//! * [`processors`] - Tensor and image processing stages
//! * [`utils`] - Image loading and conversion helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use qr_rescue::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let scanner = QrScanner::new();
//! scanner.load_detector_model("models/qr-detector.onnx");
//!
//! let bytes = std::fs::read("photo.jpg")?;
//! let report = scanner.scan_bytes(&bytes)?;
//!
//! for symbol in &report.symbols {
//!     println!("{:?}: {}", symbol.content_type, symbol.text);
//! }
//! for attempt in &report.attempts {
//!     println!("{} -> {} ({} ms)", attempt.strategy, attempt.success, attempt.elapsed_ms);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Configuration
//!
//! ```rust
//! use qr_rescue::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config: PipelineConfig = PipelineConfig::from_json(r#"
//! {
//!   "detection": {
//!     "confidence_threshold": 0.5,
//!     "iou_threshold": 0.45,
//!     "max_detections": 5,
//!     "min_box_size": 45.0,
//!     "aspect_ratio_band": [0.5, 2.0]
//!   },
//!   "model_wait_ms": 10000
//! }
//! "#)?;
//!
//! let scanner = QrScanner::with_config(config)?;
//! # let _ = scanner;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod decoders;
pub mod domain;
pub mod inference;
pub mod pipeline;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// Bring the essentials into scope with a single use statement:
///
/// ```rust
/// use qr_rescue::prelude::*;
/// ```
///
/// Included items focus on the most common tasks:
/// - The scanner and its reports (`QrScanner`, `ScanReport`, `ScanAttempt`)
/// - Configuration (`PipelineConfig`)
/// - Essential error and result types (`ScanError`, `ScanPipelineResult`)
/// - Basic image loading (`load_rgba`, `load_rgba_from_bytes`)
///
/// For advanced customization (custom decoders, detection engines,
/// processing stages), import directly from the respective modules
/// (e.g. `qr_rescue::decoders`, `qr_rescue::core::traits`).
pub mod prelude {
    pub use crate::core::{PipelineConfig, ScanError, ScanPipelineResult};
    pub use crate::domain::{ContentType, DecodedSymbol};
    pub use crate::inference::CancelToken;
    pub use crate::pipeline::{QrScanner, ScanAttempt, ScanReport, Strategy};
    pub use crate::utils::{load_rgba, load_rgba_from_bytes};
}

//! Core error handling, configuration, and collaborator traits.

pub mod config;
pub mod errors;
pub mod traits;

pub use config::{
    BinarizeThreshold, DecoderConfig, DetectionConfig, PipelineConfig, TransformConfig,
};
pub use errors::{ProcessingStage, ScanError, ScanPipelineResult, SimpleError};
pub use traits::{RegionDetector, SymbolDecoder};

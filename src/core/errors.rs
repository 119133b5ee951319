//! Error types for the scan pipeline.
//!
//! This module defines the errors that can occur while running the fallback
//! scan pipeline: image loading errors, tensor and transform processing
//! errors, inference errors, and configuration errors. A failed decode
//! attempt is not an error, just the signal to try the next strategy, so
//! no variant exists for it.

use std::time::Duration;
use thiserror::Error;

/// Enum representing different stages of processing in the scan pipeline.
///
/// This enum is used to identify which stage of the pipeline an error
/// occurred in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcessingStage {
    /// Error occurred while preparing the detector input tensor.
    Preprocessing,
    /// Error occurred while parsing the detector output tensor.
    PostProcessing,
    /// Error occurred while generating a region variant.
    Transform,
    /// Error occurred during batch processing.
    BatchProcessing,
    /// Generic processing error.
    Generic,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::Preprocessing => write!(f, "preprocessing"),
            ProcessingStage::PostProcessing => write!(f, "post-processing"),
            ProcessingStage::Transform => write!(f, "transform"),
            ProcessingStage::BatchProcessing => write!(f, "batch processing"),
            ProcessingStage::Generic => write!(f, "processing"),
        }
    }
}

/// Enum representing the errors that can occur in the scan pipeline.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Error occurred while loading an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// The detector model did not become ready within the allowed wait.
    ///
    /// The orchestrator degrades to a failure report when it sees this;
    /// it never propagates as a panic.
    #[error("detector model unavailable after waiting {waited:?}")]
    ModelUnavailable {
        /// How long the caller waited before giving up.
        waited: Duration,
    },

    /// Error occurred during processing.
    #[error("{stage} failed: {context}")]
    Processing {
        /// The stage of processing where the error occurred.
        stage: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error occurred during inference.
    #[error("inference")]
    Inference(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from tensor operations.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

/// Convenient result alias for scan pipeline operations.
pub type ScanPipelineResult<T> = Result<T, ScanError>;

/// A minimal error wrapper for cases where only a message is available.
#[derive(Debug)]
pub struct SimpleError {
    message: String,
}

impl SimpleError {
    /// Creates a new SimpleError with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SimpleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SimpleError {}

impl ScanError {
    /// Creates a ScanError for input-tensor preparation failures.
    pub fn preprocessing(
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            stage: ProcessingStage::Preprocessing,
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates a ScanError for output-tensor parsing failures.
    pub fn post_processing(
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            stage: ProcessingStage::PostProcessing,
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates a ScanError for a region transform that produced an
    /// unusable buffer. The orchestrator treats this as recoverable and
    /// skips the variant.
    pub fn transform(context: impl Into<String>) -> Self {
        Self::Processing {
            stage: ProcessingStage::Transform,
            context: context.into(),
            source: Box::new(SimpleError::new("invalid transform output")),
        }
    }

    /// Creates a ScanError for batch processing failures.
    pub fn batch_processing(
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            stage: ProcessingStage::BatchProcessing,
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates a ScanError for inference failures with context.
    pub fn inference(
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference(Box::new(SimpleError::new(format!("{context}: {error}"))))
    }

    /// Creates a ScanError for invalid input.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a ScanError for configuration problems.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Returns true when the orchestrator can recover from this error by
    /// advancing the strategy ladder within the same scan call.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScanError::ModelUnavailable { .. }
                | ScanError::Processing {
                    stage: ProcessingStage::Transform,
                    ..
                }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_error_is_recoverable() {
        let err = ScanError::transform("zero-area crop");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_inference_error_is_not_recoverable() {
        let err = ScanError::inference("forward pass", SimpleError::new("engine fault"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_model_unavailable_display() {
        let err = ScanError::ModelUnavailable {
            waited: Duration::from_secs(10),
        };
        assert!(err.to_string().contains("unavailable"));
    }
}

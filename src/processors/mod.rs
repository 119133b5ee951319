//! Image and tensor processing stages of the scan pipeline.
//!
//! The stages are pure functions over their inputs: letterbox preprocessing
//! into the detector's input tensor, parsing the detector's raw output into
//! validated boxes, suppressing duplicate detections, and generating the
//! per-region pixel-buffer variants the orchestrator feeds back into the
//! decoder.

pub mod postprocess;
pub mod preprocess;
pub mod suppression;
pub mod transform;
pub mod types;

pub use postprocess::DetectionPostProcess;
pub use preprocess::{LetterboxInput, letterbox_to_tensor};
pub use suppression::non_max_suppression;
pub use transform::{RegionTransformer, binarize, pad_crop, rotate_about_center};
pub use types::{DetectionBox, RegionVariant, TransformKind};

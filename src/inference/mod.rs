//! ONNX Runtime integration for the neural region detector.

pub mod detector;
pub mod handle;
pub mod session;

pub use detector::QrDetector;
pub use handle::{CancelToken, DetectorHandle};
pub use session::{load_session, load_session_from_bytes};

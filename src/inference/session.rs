//! Helpers for working directly with ONNX Runtime sessions.

use crate::core::errors::ScanError;
use ort::session::Session;
use std::path::Path;

/// Creates an ONNX session from a model file on disk.
///
/// # Errors
///
/// Returns the underlying `ort::Error` wrapped in `ScanError::Session`
/// when the file is missing, unreadable, or not a valid model.
pub fn load_session(model_path: impl AsRef<Path>) -> Result<Session, ScanError> {
    let session = Session::builder().and_then(|b| b.commit_from_file(model_path.as_ref()))?;
    Ok(session)
}

/// Creates an ONNX session from model bytes already in memory.
///
/// # Errors
///
/// Returns the underlying `ort::Error` wrapped in `ScanError::Session`
/// when the bytes are not a valid model.
pub fn load_session_from_bytes(model_bytes: &[u8]) -> Result<Session, ScanError> {
    let session = Session::builder().and_then(|b| b.commit_from_memory(model_bytes))?;
    Ok(session)
}

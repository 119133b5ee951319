//! The neural region detector.
//!
//! Wraps an ONNX Runtime session and exposes one forward pass: a
//! preprocessed input tensor goes in, the raw detection tensor comes out.
//! Tensor names and the input resolution are discovered from the session
//! metadata instead of being assumed, so models exported at different
//! resolutions work without constants changing.

use crate::core::errors::ScanError;
use crate::core::traits::RegionDetector;
use crate::inference::session::{load_session, load_session_from_bytes};
use ndarray::{Array3, Array4};
use ort::session::Session;
use ort::value::{TensorRef, ValueType};
use std::path::Path;
use std::sync::Mutex;

/// Fallback input resolution when the model declares a dynamic spatial
/// shape.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// A loaded detection model.
///
/// The session is guarded by a mutex; after loading it is never mutated
/// structurally, so any number of concurrent scan calls may share one
/// detector behind an `Arc`.
pub struct QrDetector {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    input_size: u32,
}

impl std::fmt::Debug for QrDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrDetector")
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("input_size", &self.input_size)
            .finish()
    }
}

impl QrDetector {
    /// Loads a detector from a model file on disk.
    pub fn from_file(model_path: impl AsRef<Path>) -> Result<Self, ScanError> {
        Self::from_session(load_session(model_path)?)
    }

    /// Loads a detector from model bytes already in memory.
    pub fn from_bytes(model_bytes: &[u8]) -> Result<Self, ScanError> {
        Self::from_session(load_session_from_bytes(model_bytes)?)
    }

    /// Wraps an existing session, discovering tensor names and the input
    /// resolution from its metadata.
    pub fn from_session(session: Session) -> Result<Self, ScanError> {
        let input = session
            .inputs
            .first()
            .ok_or_else(|| ScanError::invalid_input("model declares no input tensors"))?;
        let input_name = input.name.clone();

        let input_size = match &input.input_type {
            ValueType::Tensor { shape, .. } => {
                // NCHW: take the height dimension when it is static.
                shape
                    .iter()
                    .copied()
                    .nth(2)
                    .filter(|&dim| dim > 0)
                    .map(|dim| dim as u32)
                    .unwrap_or(DEFAULT_INPUT_SIZE)
            }
            _ => DEFAULT_INPUT_SIZE,
        };

        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| ScanError::invalid_input("model declares no output tensors"))?;

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            input_size,
        })
    }
}

impl RegionDetector for QrDetector {
    fn input_size(&self) -> u32 {
        self.input_size
    }

    /// Runs one forward pass.
    ///
    /// # Arguments
    ///
    /// * `input` - Tensor of shape `[1, 3, input_size, input_size]`.
    ///
    /// # Returns
    ///
    /// The raw detection tensor, shape `[1, 4 + num_classes, anchors]`.
    ///
    /// # Errors
    ///
    /// Returns an inference `ScanError` if the engine rejects the input,
    /// the forward pass fails, or the output is not a 3-dimensional f32
    /// tensor.
    fn run(&self, input: &Array4<f32>) -> Result<Array3<f32>, ScanError> {
        let input_tensor = TensorRef::from_array_view(input.view())
            .map_err(|e| ScanError::inference("input tensor conversion", e))?;
        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        let mut session = self
            .session
            .lock()
            .map_err(|_| ScanError::invalid_input("detector session lock poisoned"))?;

        let outputs = session
            .run(inputs)
            .map_err(|e| ScanError::inference("forward pass", e))?;

        let (shape, data) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| ScanError::inference("output tensor extraction", e))?;

        if shape.len() != 3 {
            return Err(ScanError::invalid_input(format!(
                "expected a 3D detection tensor, got {}D with shape {shape:?}",
                shape.len()
            )));
        }

        let dims = (shape[0] as usize, shape[1] as usize, shape[2] as usize);
        let tensor = Array3::from_shape_vec(dims, data.to_vec())?;
        Ok(tensor)
    }
}

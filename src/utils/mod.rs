//! Utility functions for images and buffers.

pub mod image;

pub use image::{load_rgba, load_rgba_from_bytes, rgba_from_raw, rgba_to_luma};

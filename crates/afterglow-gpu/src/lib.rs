//! Afterglow GPU — wgpu-backed resources for the post-processing stage.
//!
//! Implements the LUT texture-upload collaborator from `afterglow-core` on a
//! plain wgpu device, so a host renderer can plug it into its own
//! `RenderBackend`.

pub mod error;
pub mod lut_texture;

pub use error::GpuError;
pub use lut_texture::{GpuLutTexture, WgpuLutUploader};

//! Afterglow Core — screen-space post-processing for a deferred renderer.
//!
//! This crate selects and parameterizes the tone-mapping, color-grading and
//! sharpening passes, ingests color-grade LUTs, and drives the passes
//! through a [`render::RenderBackend`]. No GPU API dependencies.

pub mod error;
pub mod lut;
pub mod pipeline;
pub mod render;
pub mod settings;
pub mod sharpen;
pub mod tonemap;

// Re-exports for convenience.
pub use error::{LutError, RenderError, SettingsError};
pub use lut::ColorGradeLut;
pub use lut::loader::{ColorGradeLutLoader, LutSearchPaths};
pub use pipeline::PostProcessPipeline;
pub use render::{Capabilities, FrameContext, LutTextureUploader, RenderBackend, RenderTarget};
pub use settings::{PostFxSettings, SettingKey, SettingValue, SettingsStore};
pub use sharpen::SharpenSelection;
pub use tonemap::{ToneMapCurve, ToneMapSelection};

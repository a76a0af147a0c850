use std::path::PathBuf;

/// Failures while parsing, resolving, decoding, or validating a color-grade LUT.
#[derive(Debug, thiserror::Error)]
pub enum LutError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("line {line}: LUT_3D_SIZE {size} is outside 1..={max}")]
    InvalidSize { line: usize, size: i64, max: u32 },
    #[error("line {line}: data row before LUT_3D_SIZE")]
    DataBeforeSize { line: usize },
    #[error("cube file declares no LUT_3D_SIZE")]
    EmptyCube,
    #[error("LUT name {0:?} must be a bare file name")]
    InvalidName(String),
    #[error("LUT file {0:?} not found in any search directory")]
    NotFound(String),
    #[error("unsupported LUT file extension: {0:?}")]
    UnsupportedExtension(String),
    #[error("failed to decode color grading LUT {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("color LUT has invalid number of color components: {0}")]
    InvalidComponents(u8),
    #[error("color LUT is invalid width or height: {height} x {width} (max {max})")]
    InvalidGeometry { width: u32, height: u32, max: u32 },
    #[error("LUT tensor holds {actual} bytes, expected {expected}")]
    TensorLength { expected: usize, actual: usize },
}

/// Failures reading or writing post-processing settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("unknown setting: {0}")]
    UnknownKey(String),
    #[error("setting {key} expects a {expected} value")]
    TypeMismatch {
        key: &'static str,
        expected: &'static str,
    },
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures reported by a render collaborator.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("LUT upload failed: {0}")]
    Upload(String),
}

use afterglow_core::RenderError;

/// Failures creating or reading back device-side LUT textures.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("LUT size {size} exceeds the device 3D texture limit {max}")]
    TooLarge { size: u32, max: u32 },
    #[error("cannot upload an empty LUT")]
    EmptyLut,
    #[error("device poll failed: {0}")]
    Poll(#[from] wgpu::PollError),
    #[error("buffer map failed: {0}")]
    Map(#[from] wgpu::BufferAsyncError),
    #[error("readback callback never fired")]
    ReadbackIncomplete,
}

impl From<GpuError> for RenderError {
    fn from(err: GpuError) -> Self {
        RenderError::Upload(err.to_string())
    }
}

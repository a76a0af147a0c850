//! Device-side 3D texture for color-grade LUTs.

use std::sync::Arc;

use afterglow_core::lut::{ColorGradeLut, LUT_CHANNELS};
use afterglow_core::{LutTextureUploader, RenderError};

use crate::error::GpuError;

/// A color-grade LUT uploaded as an `Rgba8Unorm` 3D texture.
///
/// Sampled bilinearly with clamp-to-edge addressing. The texture is released
/// when this handle is dropped.
pub struct GpuLutTexture {
    pub texture: wgpu::Texture,
    pub texture_view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub size: u32,
}

impl GpuLutTexture {
    /// Create the texture and upload `lut` into it.
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        lut: &ColorGradeLut,
    ) -> Result<Self, GpuError> {
        let size = lut.size();
        if lut.is_empty() {
            return Err(GpuError::EmptyLut);
        }
        let max = device.limits().max_texture_dimension_3d;
        if size > max {
            return Err(GpuError::TooLarge { size, max });
        }

        let extent = lut_extent(size);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("afterglow_colorgrade_lut"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D3,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            lut.data(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(size * LUT_CHANNELS as u32),
                rows_per_image: Some(size),
            },
            extent,
        );

        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("afterglow_colorgrade_lut_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        tracing::debug!(size, "uploaded color grade LUT texture");

        Ok(Self {
            texture,
            texture_view,
            sampler,
            size,
        })
    }

    /// Copy the texture back to the CPU as a tightly packed RGBA8 tensor.
    /// Blocks until the copy completes.
    pub fn read_back(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Vec<u8>, GpuError> {
        let size = self.size;
        let row_bytes = size * LUT_CHANNELS as u32;
        let padded_row = row_bytes.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let rows = u64::from(size) * u64::from(size);

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("afterglow_lut_staging"),
            size: u64::from(padded_row) * rows,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("afterglow_lut_readback_encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(size),
                },
            },
            lut_extent(size),
        );
        queue.submit(std::iter::once(encoder.finish()));

        let (tx, rx) = std::sync::mpsc::channel();
        staging
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                let _ = tx.send(result);
            });
        device.poll(wgpu::PollType::wait_indefinitely())?;
        rx.try_recv().map_err(|_| GpuError::ReadbackIncomplete)??;

        let data = staging.slice(..).get_mapped_range();
        let mut texels = Vec::with_capacity(rows as usize * row_bytes as usize);
        for row in data.chunks_exact(padded_row as usize) {
            texels.extend_from_slice(&row[..row_bytes as usize]);
        }
        drop(data);
        staging.unmap();
        Ok(texels)
    }
}

fn lut_extent(size: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size,
        height: size,
        depth_or_array_layers: size,
    }
}

/// [`LutTextureUploader`] backed by a wgpu device.
#[derive(Clone)]
pub struct WgpuLutUploader {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
}

impl WgpuLutUploader {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        Self { device, queue }
    }

    /// Largest LUT edge this device accepts; feeds `Capabilities::max_texture_size`.
    pub fn max_lut_size(&self) -> u32 {
        self.device.limits().max_texture_dimension_3d
    }

    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }
}

impl LutTextureUploader for WgpuLutUploader {
    type Texture = GpuLutTexture;

    fn upload_lut(&mut self, lut: &ColorGradeLut) -> Result<GpuLutTexture, RenderError> {
        Ok(GpuLutTexture::upload(&self.device, &self.queue, lut)?)
    }
}

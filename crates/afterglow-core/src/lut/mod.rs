//! Color-grade lookup tables — `.cube` parsing, file resolution, and the
//! upload-ready [`ColorGradeLut`] tensor.

pub mod cube;
pub mod loader;

use crate::error::LutError;

/// Bytes per LUT cell (RGBA8).
pub const LUT_CHANNELS: usize = 4;

/// A dense RGBA8 3D lookup table ready for upload as a 3D texture.
///
/// Cells are stored red-fastest, then green, then blue: cell `(x, y, z)`
/// starts at byte `(((z * size) + y) * size + x) * 4`.
///
/// Image-sourced tables are baked as an `h × h²` atlas, which the shader can
/// only address after flipping green and swapping blue/red. Text-sourced
/// tables need neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorGradeLut {
    size: u32,
    data: Vec<u8>,
    flip_green: bool,
    swap_blue_red: bool,
}

impl ColorGradeLut {
    /// Wrap an RGBA8 tensor. Fails unless `data.len() == size³ × 4`.
    pub fn new(
        size: u32,
        data: Vec<u8>,
        flip_green: bool,
        swap_blue_red: bool,
    ) -> Result<Self, LutError> {
        let expected = tensor_len(size);
        if data.len() != expected {
            return Err(LutError::TensorLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            size,
            data,
            flip_green,
            swap_blue_red,
        })
    }

    /// A table of `size³` opaque white cells.
    pub(crate) fn white(size: u32) -> Self {
        Self {
            size,
            data: vec![u8::MAX; tensor_len(size)],
            flip_green: false,
            swap_blue_red: false,
        }
    }

    /// Grid size per axis. Zero for an empty table.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Raw RGBA8 tensor.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether the shader must flip the green axis when sampling.
    pub fn flip_green(&self) -> bool {
        self.flip_green
    }

    /// Whether the shader must swap the blue and red axes when sampling.
    pub fn swap_blue_red(&self) -> bool {
        self.swap_blue_red
    }

    /// True when no `LUT_3D_SIZE` was ever declared.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The `(size, flip_green, swap_blue_red, 0)` vector the color-grade
    /// shader reads alongside the 3D texture.
    pub fn size_uniform(&self) -> [f32; 4] {
        [
            self.size as f32,
            f32::from(u8::from(self.flip_green)),
            f32::from(u8::from(self.swap_blue_red)),
            0.0,
        ]
    }

    /// RGBA of cell `(x, y, z)`, or `None` outside the grid.
    pub fn cell(&self, x: u32, y: u32, z: u32) -> Option<[u8; 4]> {
        if x >= self.size || y >= self.size || z >= self.size {
            return None;
        }
        let offset = cell_offset(self.size, x, y, z);
        let px = &self.data[offset..offset + LUT_CHANNELS];
        Some([px[0], px[1], px[2], px[3]])
    }

    pub(crate) fn write_rgb(&mut self, x: u32, y: u32, z: u32, rgb: [u8; 3]) {
        let offset = cell_offset(self.size, x, y, z);
        self.data[offset..offset + 3].copy_from_slice(&rgb);
    }
}

/// Byte offset of cell `(x, y, z)` in a table of the given size.
pub fn cell_offset(size: u32, x: u32, y: u32, z: u32) -> usize {
    let size = size as usize;
    (((z as usize * size) + y as usize) * size + x as usize) * LUT_CHANNELS
}

fn tensor_len(size: u32) -> usize {
    let size = size as usize;
    size * size * size * LUT_CHANNELS
}

//! Lottes' Parametric Mapper (LPM) control-block setup.
//!
//! Produces the 24 × `uvec4` constant block the LPM shader consumes, for the
//! Rec. 709 in / Rec. 709 out configuration with clipping, no soft gap and no
//! gamut conversion. Words 0..=9 hold the 32-bit constants, words 16..=20 the
//! same constants packed as half-float pairs; the rest stay zero.

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Vec2, Vec3};
use half::f16;

/// Number of `uvec4` rows in the control block.
pub const LPM_CONTROL_ROWS: usize = 24;

/// Opaque 96-word LPM constant block, laid out for a `uvec4[24]` uniform.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct LpmControlBlock(pub [[u32; 4]; LPM_CONTROL_ROWS]);

impl LpmControlBlock {
    /// Flat view of all 96 words.
    pub fn words(&self) -> &[u32; LPM_CONTROL_ROWS * 4] {
        bytemuck::cast_ref(&self.0)
    }

    /// Row `i` as four 32-bit floats, for inspection.
    pub fn row_f32(&self, i: usize) -> [f32; 4] {
        self.0[i].map(f32::from_bits)
    }
}

impl Default for LpmControlBlock {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Inputs to [`lpm_setup`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LpmInputs {
    /// Enables the extended shoulder path in the shader.
    pub shoulder: bool,
    pub hdr_max: f32,
    /// Stops between `hdr_max` and mid grey.
    pub exposure: f32,
    pub contrast: f32,
    pub shoulder_contrast: f32,
    pub saturation: Vec3,
    pub crosstalk: Vec3,
}

/// Rec. 709 primaries and D65 white, CIE xy.
const REC709_RED: Vec2 = Vec2::new(0.64, 0.33);
const REC709_GREEN: Vec2 = Vec2::new(0.30, 0.60);
const REC709_BLUE: Vec2 = Vec2::new(0.15, 0.06);
const D65_WHITE: Vec2 = Vec2::new(0.3127, 0.3290);

const MID_GREY: f32 = 0.18;

/// Derive the control block. Pure function of its inputs.
pub fn lpm_setup(inputs: &LpmInputs) -> LpmControlBlock {
    let contrast = inputs.contrast + 1.0;
    let saturation = inputs.saturation + Vec3::splat(contrast);

    let hdr_max = inputs.hdr_max;
    let mid_in = hdr_max * MID_GREY * (-inputs.exposure).exp2();
    let mid_out = MID_GREY;
    let cs = contrast * inputs.shoulder_contrast;

    let z0 = -mid_in.powf(contrast);
    let z1 = hdr_max.powf(cs) * mid_in.powf(contrast);
    let z2 = hdr_max.powf(contrast) * mid_in.powf(cs) * mid_out;
    let z3 = hdr_max.powf(cs) * mid_out;
    let z4 = mid_in.powf(cs) * mid_out;
    let tone_scale = -((z0 + (mid_out * (z1 - z2)) / (z3 - z4)) / z4);
    let tone_bias = (z1 - z2) / (z3 - z4);

    let luma_w = luma_weights(REC709_RED, REC709_GREEN, REC709_BLUE, D65_WHITE);
    let luma_t = luma_w;
    let rcp_luma_t = luma_t.recip();
    let soft_gap2 = Vec2::ZERO;

    // Gamut conversion is disabled for 709 -> 709.
    let con_r = Vec3::ZERO;
    let con_g = Vec3::ZERO;
    let con_b = Vec3::ZERO;
    let con2_r = Vec3::ZERO;
    let con2_g = Vec3::ZERO;
    let con2_b = Vec3::ZERO;

    // Constants in shader read order; 4 per row, last row padded with zero.
    let constants: [f32; 40] = [
        saturation.x,
        saturation.y,
        saturation.z,
        contrast,
        tone_scale,
        tone_bias,
        luma_t.x,
        luma_t.y,
        luma_t.z,
        inputs.crosstalk.x,
        inputs.crosstalk.y,
        inputs.crosstalk.z,
        rcp_luma_t.x,
        rcp_luma_t.y,
        rcp_luma_t.z,
        con2_r.x,
        con2_r.y,
        con2_r.z,
        con2_g.x,
        con2_g.y,
        con2_g.z,
        con2_b.x,
        con2_b.y,
        con2_b.z,
        inputs.shoulder_contrast,
        luma_w.x,
        luma_w.y,
        luma_w.z,
        soft_gap2.x,
        soft_gap2.y,
        con_r.x,
        con_r.y,
        con_r.z,
        con_g.x,
        con_g.y,
        con_g.z,
        con_b.x,
        con_b.y,
        con_b.z,
        0.0,
    ];

    let mut block = LpmControlBlock::zeroed();
    for (row, chunk) in constants.chunks_exact(4).enumerate() {
        block.0[row] = [
            chunk[0].to_bits(),
            chunk[1].to_bits(),
            chunk[2].to_bits(),
            chunk[3].to_bits(),
        ];
    }
    for (row, chunk) in constants.chunks_exact(8).enumerate() {
        block.0[16 + row] = [
            pack_half2(chunk[0], chunk[1]),
            pack_half2(chunk[2], chunk[3]),
            pack_half2(chunk[4], chunk[5]),
            pack_half2(chunk[6], chunk[7]),
        ];
    }

    tracing::trace!(
        tone_scale,
        tone_bias,
        shoulder = inputs.shoulder,
        "LPM control block derived"
    );
    block
}

/// Low half = `lo`, high half = `hi`, matching GLSL `packHalf2x16`.
pub(crate) fn pack_half2(lo: f32, hi: f32) -> u32 {
    u32::from(f16::from_f32(lo).to_bits()) | (u32::from(f16::from_f32(hi).to_bits()) << 16)
}

/// Y row of the RGB -> XYZ matrix for the given primaries, normalized to sum 1.
fn luma_weights(red: Vec2, green: Vec2, blue: Vec2, white: Vec2) -> Vec3 {
    let xyz = |xy: Vec2| Vec3::new(xy.x / xy.y, 1.0, (1.0 - xy.x - xy.y) / xy.y);
    let primaries = Mat3::from_cols(xyz(red), xyz(green), xyz(blue));
    let scale = primaries.inverse() * xyz(white);
    // Every primary has Y = 1, so the Y row is the per-primary scale.
    scale / (scale.x + scale.y + scale.z)
}

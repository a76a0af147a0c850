//! Contrast Adaptive Sharpening constant setup.

use crate::tonemap::lpm::pack_half2;

/// The two `uvec4` constant blocks the CAS shader reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CasConstants {
    pub const0: [u32; 4],
    pub const1: [u32; 4],
}

/// Derive CAS constants for scaling `input` to `output` pixels.
///
/// `sharpness` is saturated to `[0, 1]`; 0 is the softest setting, 1 the
/// sharpest. Sizes must be non-zero.
pub fn cas_setup(sharpness: f32, input: (u32, u32), output: (u32, u32)) -> CasConstants {
    let scale_x = input.0 as f32 / output.0 as f32;
    let scale_y = input.1 as f32 / output.1 as f32;

    let sharp = -(lerp(8.0, 5.0, sharpness.clamp(0.0, 1.0))).recip();

    CasConstants {
        const0: [
            scale_x.to_bits(),
            scale_y.to_bits(),
            (0.5 * scale_x - 0.5).to_bits(),
            (0.5 * scale_y - 0.5).to_bits(),
        ],
        const1: [
            sharp.to_bits(),
            pack_half2(sharp, 0.0),
            (8.0 * scale_x).to_bits(),
            0,
        ],
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use half::f16;

    #[test]
    fn test_same_size_scaling_terms() {
        let c = cas_setup(0.6, (1920, 1080), (1920, 1080));
        assert_eq!(f32::from_bits(c.const0[0]), 1.0);
        assert_eq!(f32::from_bits(c.const0[1]), 1.0);
        assert_eq!(f32::from_bits(c.const0[2]), 0.0);
        assert_eq!(f32::from_bits(c.const0[3]), 0.0);
        assert_eq!(f32::from_bits(c.const1[2]), 8.0);
        assert_eq!(c.const1[3], 0);
    }

    #[test]
    fn test_upscale_scaling_terms() {
        let c = cas_setup(0.0, (960, 540), (1920, 1080));
        assert_eq!(f32::from_bits(c.const0[0]), 0.5);
        assert_eq!(f32::from_bits(c.const0[2]), -0.25);
        assert_eq!(f32::from_bits(c.const1[2]), 4.0);
    }

    #[test]
    fn test_sharpness_endpoints() {
        let soft = cas_setup(0.0, (4, 4), (4, 4));
        assert_eq!(f32::from_bits(soft.const1[0]), -1.0 / 8.0);
        let sharp = cas_setup(1.0, (4, 4), (4, 4));
        assert_eq!(f32::from_bits(sharp.const1[0]), -1.0 / 5.0);
    }

    #[test]
    fn test_sharpness_saturates() {
        assert_eq!(
            cas_setup(-3.0, (8, 8), (8, 8)),
            cas_setup(0.0, (8, 8), (8, 8))
        );
        assert_eq!(
            cas_setup(7.0, (8, 8), (8, 8)),
            cas_setup(1.0, (8, 8), (8, 8))
        );
    }

    #[test]
    fn test_half_sharpness_word() {
        let c = cas_setup(0.0, (4, 4), (4, 4));
        assert_eq!(f16::from_bits(c.const1[1] as u16).to_f32(), -0.125);
        assert_eq!(c.const1[1] >> 16, 0);
    }
}

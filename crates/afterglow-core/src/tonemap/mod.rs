//! Tone-map curve selection and coefficient derivation.
//!
//! [`select_tonemap`] resolves the configured curve against the available
//! programs and computes the coefficients that curve's shader expects. The
//! result is recomputed only when a tone-map setting changes; render passes
//! read it as-is.

pub mod lpm;

use glam::Vec3;

use crate::render::{Capabilities, Program, Uniform, UniformValue};
use crate::settings::{FilmicSettings, HableSettings, ToneMapSettings};

pub use lpm::{LpmControlBlock, LpmInputs, lpm_setup};

/// Exposure bounds applied to every curve.
pub const EXPOSURE_RANGE: (f32, f32) = (0.5, 4.0);

/// Curve tags as stored in settings and passed to `uToneMapType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ToneMapKind {
    Disabled = 0,
    AcesHill = 1,
    Uchimura = 2,
    AmdLpm = 3,
    Uncharted = 4,
    Filmic = 5,
    Pbr = 6,
}

impl ToneMapKind {
    pub const COUNT: u32 = 7;

    pub fn from_index(index: u32) -> Option<Self> {
        Some(match index {
            0 => Self::Disabled,
            1 => Self::AcesHill,
            2 => Self::Uchimura,
            3 => Self::AmdLpm,
            4 => Self::Uncharted,
            5 => Self::Filmic,
            6 => Self::Pbr,
            _ => return None,
        })
    }

    pub fn index(self) -> u32 {
        self as u32
    }
}

/// Hable curve coefficients, `tone_uncharted_{a,b,c}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HableCoefficients {
    /// (toe strength, toe length, shoulder strength)
    pub a: Vec3,
    /// (shoulder length, shoulder angle, gamma)
    pub b: Vec3,
    /// (white point, 2.0, 0)
    pub c: Vec3,
}

impl HableCoefficients {
    pub fn from_settings(s: &HableSettings) -> Self {
        Self {
            a: Vec3::new(s.toe_strength, s.toe_length, s.shoulder_strength),
            b: Vec3::new(s.shoulder_length, s.shoulder_angle, s.gamma),
            c: Vec3::new(s.white_point, 2.0, 0.0),
        }
    }
}

/// Filmic look scalars, clamped to their working ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilmicParams {
    pub exposure_ev: f32,
    pub temperature_k: f32,
    pub tint: f32,
    pub contrast: f32,
    pub saturation: f32,
}

impl FilmicParams {
    pub fn from_settings(s: &FilmicSettings) -> Self {
        let d = FilmicSettings::default();
        Self {
            exposure_ev: clamp_or(s.exposure_ev, d.exposure_ev, -5.0, 5.0),
            temperature_k: clamp_or(s.temperature_k, d.temperature_k, 2500.0, 15000.0),
            tint: clamp_or(s.tint, d.tint, -1.0, 1.0),
            contrast: clamp_or(s.contrast, d.contrast, 0.8, 1.2),
            saturation: clamp_or(s.saturation, d.saturation, 0.8, 2.0),
        }
    }
}

/// Clamp `value` to `[min, max]`; NaN takes `fallback` instead.
fn clamp_or(value: f32, fallback: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

impl Default for FilmicParams {
    fn default() -> Self {
        Self::from_settings(&FilmicSettings::default())
    }
}

/// The active curve and only the coefficients it needs.
#[derive(Debug, Clone, PartialEq)]
pub enum ToneMapCurve {
    Disabled,
    AcesHill,
    Uchimura {
        /// (max brightness, contrast, linear start)
        a: Vec3,
        /// (linear length, black level, 0)
        b: Vec3,
    },
    AmdLpm {
        control: Box<LpmControlBlock>,
        extended_shoulder: bool,
    },
    Uncharted(HableCoefficients),
    /// Renders through the Hable program; the look in
    /// [`ToneMapSelection::filmic`] is applied in-shader ahead of the curve.
    Filmic(HableCoefficients),
    Pbr,
}

impl ToneMapCurve {
    pub fn kind(&self) -> ToneMapKind {
        match self {
            Self::Disabled => ToneMapKind::Disabled,
            Self::AcesHill => ToneMapKind::AcesHill,
            Self::Uchimura { .. } => ToneMapKind::Uchimura,
            Self::AmdLpm { .. } => ToneMapKind::AmdLpm,
            Self::Uncharted(_) => ToneMapKind::Uncharted,
            Self::Filmic(_) => ToneMapKind::Filmic,
            Self::Pbr => ToneMapKind::Pbr,
        }
    }

    /// Program this curve renders with.
    pub fn program(&self) -> Program {
        match self {
            Self::Disabled => Program::TonemapDebug,
            Self::AcesHill | Self::Pbr => Program::TonemapAces,
            Self::Uchimura { .. } => Program::TonemapUchimura,
            Self::AmdLpm { .. } => Program::TonemapLpm,
            Self::Uncharted(_) | Self::Filmic(_) => Program::TonemapHable,
        }
    }

    /// Upload this curve's coefficients. Curves without any upload nothing.
    pub fn upload(&self, mut set: impl FnMut(Uniform, UniformValue<'_>)) {
        match self {
            Self::Disabled | Self::AcesHill | Self::Pbr => {}
            Self::Uchimura { a, b } => {
                set(Uniform::ToneUchimuraA, UniformValue::Vec3(*a));
                set(Uniform::ToneUchimuraB, UniformValue::Vec3(*b));
            }
            Self::AmdLpm {
                control,
                extended_shoulder,
            } => {
                set(Uniform::TonemapAmd, UniformValue::UVec4Array(&control.0));
                set(
                    Uniform::TonemapAmdShoulder,
                    UniformValue::I32(i32::from(*extended_shoulder)),
                );
            }
            Self::Uncharted(curve) | Self::Filmic(curve) => {
                set(Uniform::ToneUnchartedA, UniformValue::Vec3(curve.a));
                set(Uniform::ToneUnchartedB, UniformValue::Vec3(curve.b));
                set(Uniform::ToneUnchartedC, UniformValue::Vec3(curve.c));
            }
        }
    }
}

/// The resolved tone map: clamped exposure, the active curve and the Filmic
/// look scalars. The look is uploaded whatever the curve; only the Filmic
/// shader path reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneMapSelection {
    pub exposure: f32,
    pub curve: ToneMapCurve,
    pub filmic: FilmicParams,
}

impl ToneMapSelection {
    pub fn kind(&self) -> ToneMapKind {
        self.curve.kind()
    }

    /// True exactly when Filmic is selected; drives the Filmic UI controls.
    pub fn filmic_ui_enabled(&self) -> bool {
        self.kind() == ToneMapKind::Filmic
    }

    /// Upload the Filmic look uniforms.
    pub fn upload_filmic(&self, mut set: impl FnMut(Uniform, UniformValue<'_>)) {
        let f = &self.filmic;
        set(Uniform::ExposureEv, UniformValue::F32(f.exposure_ev));
        set(Uniform::WbTempK, UniformValue::F32(f.temperature_k));
        set(Uniform::WbTint, UniformValue::F32(f.tint));
        set(Uniform::FilmicContrast, UniformValue::F32(f.contrast));
        set(Uniform::FilmicSaturation, UniformValue::F32(f.saturation));
    }
}

impl Default for ToneMapSelection {
    fn default() -> Self {
        Self {
            exposure: 1.0,
            curve: ToneMapCurve::AcesHill,
            filmic: FilmicParams::default(),
        }
    }
}

/// Resolve the requested curve type against `caps`.
///
/// Unknown tags and LPM without its program fall back to ACES (Hill).
pub fn resolve_kind(requested: u32, caps: &Capabilities) -> ToneMapKind {
    match ToneMapKind::from_index(requested) {
        Some(ToneMapKind::AmdLpm) if !caps.lpm_program => {
            tracing::debug!("LPM program unavailable, falling back to ACES");
            ToneMapKind::AcesHill
        }
        Some(kind) => kind,
        None => {
            tracing::debug!(requested, "unknown tone map type, falling back to ACES");
            ToneMapKind::AcesHill
        }
    }
}

/// Build the selection for the current settings and capabilities.
///
/// Exposure always lands in [`EXPOSURE_RANGE`]: infinities clamp to the
/// nearest bound and NaN falls back to 1.0.
pub fn select_tonemap(settings: &ToneMapSettings, caps: &Capabilities) -> ToneMapSelection {
    let kind = resolve_kind(settings.tone_map_type, caps);
    let exposure = clamp_or(settings.exposure, 1.0, EXPOSURE_RANGE.0, EXPOSURE_RANGE.1);

    let curve = match kind {
        ToneMapKind::Disabled => ToneMapCurve::Disabled,
        ToneMapKind::AcesHill => ToneMapCurve::AcesHill,
        ToneMapKind::Pbr => ToneMapCurve::Pbr,
        ToneMapKind::Uchimura => {
            let u = &settings.uchimura;
            ToneMapCurve::Uchimura {
                a: Vec3::new(u.max_brightness, u.contrast, u.linear_start),
                b: Vec3::new(u.linear_length, u.black_level, 0.0),
            }
        }
        ToneMapKind::AmdLpm => {
            let l = &settings.lpm;
            let extended_shoulder = l.shoulder_contrast_range != 1.0;
            let control = lpm_setup(&LpmInputs {
                shoulder: extended_shoulder,
                hdr_max: l.hdr_max,
                exposure: l.exposure,
                contrast: l.contrast,
                shoulder_contrast: l.shoulder_contrast_range,
                saturation: Vec3::from_array(l.saturation),
                crosstalk: Vec3::from_array(l.crosstalk),
            });
            ToneMapCurve::AmdLpm {
                control: Box::new(control),
                extended_shoulder,
            }
        }
        ToneMapKind::Uncharted => {
            ToneMapCurve::Uncharted(HableCoefficients::from_settings(&settings.hable))
        }
        ToneMapKind::Filmic => {
            ToneMapCurve::Filmic(HableCoefficients::from_settings(&settings.hable))
        }
    };

    tracing::debug!(kind = ?kind, exposure, "tone map selected");
    ToneMapSelection {
        exposure,
        curve,
        filmic: FilmicParams::from_settings(&settings.filmic),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps() -> Capabilities {
        Capabilities::default()
    }

    #[test]
    fn test_out_of_range_falls_back_to_aces() {
        for requested in [7, 8, 100, u32::MAX] {
            let settings = ToneMapSettings {
                tone_map_type: requested,
                ..ToneMapSettings::default()
            };
            assert_eq!(
                select_tonemap(&settings, &caps()).kind(),
                ToneMapKind::AcesHill
            );
        }
    }

    #[test]
    fn test_lpm_without_program_falls_back_to_aces() {
        let settings = ToneMapSettings {
            tone_map_type: 3,
            ..ToneMapSettings::default()
        };
        let no_lpm = Capabilities {
            lpm_program: false,
            ..caps()
        };
        assert_eq!(
            select_tonemap(&settings, &no_lpm).kind(),
            ToneMapKind::AcesHill
        );
        assert_eq!(
            select_tonemap(&settings, &caps()).kind(),
            ToneMapKind::AmdLpm
        );
    }

    #[test]
    fn test_every_valid_tag_resolves_to_itself() {
        for index in 0..ToneMapKind::COUNT {
            let kind = resolve_kind(index, &caps());
            assert_eq!(kind.index(), index);
        }
    }

    #[test]
    fn test_exposure_clamped() {
        for (input, expected) in [(-1.0, 0.5), (100.0, 4.0), (2.0, 2.0), (0.5, 0.5)] {
            let settings = ToneMapSettings {
                exposure: input,
                ..ToneMapSettings::default()
            };
            assert_eq!(select_tonemap(&settings, &caps()).exposure, expected);
        }
    }

    #[test]
    fn test_non_finite_exposure_stays_in_range() {
        for (input, expected) in [
            (f32::NAN, 1.0),
            (f32::INFINITY, 4.0),
            (f32::NEG_INFINITY, 0.5),
        ] {
            let settings = ToneMapSettings {
                exposure: input,
                ..ToneMapSettings::default()
            };
            let exposure = select_tonemap(&settings, &caps()).exposure;
            assert_eq!(exposure, expected);
            assert!((EXPOSURE_RANGE.0..=EXPOSURE_RANGE.1).contains(&exposure));
        }
    }

    #[test]
    fn test_nan_filmic_scalar_uses_default() {
        let mut settings = ToneMapSettings {
            tone_map_type: 5,
            ..ToneMapSettings::default()
        };
        settings.filmic.contrast = f32::NAN;
        let look = select_tonemap(&settings, &caps()).filmic;
        assert_eq!(look.contrast, FilmicSettings::default().contrast.clamp(0.8, 1.2));
    }

    #[test]
    fn test_filmic_look_carried_for_every_curve() {
        let mut settings = ToneMapSettings::default();
        settings.filmic.tint = 0.25;
        let selection = select_tonemap(&settings, &caps());
        assert_eq!(selection.kind(), ToneMapKind::AcesHill);
        let mut seen = Vec::new();
        selection.upload_filmic(|uniform, value| {
            if let UniformValue::F32(v) = value {
                seen.push((uniform, v));
            }
        });
        assert_eq!(seen.len(), 5);
        assert!(seen.contains(&(Uniform::WbTint, 0.25)));
    }

    #[test]
    fn test_uchimura_coefficients() {
        let settings = ToneMapSettings {
            tone_map_type: 2,
            ..ToneMapSettings::default()
        };
        let selection = select_tonemap(&settings, &caps());
        assert_eq!(
            selection.curve,
            ToneMapCurve::Uchimura {
                a: Vec3::new(1.0, 1.0, 0.22),
                b: Vec3::new(0.4, 1.33, 0.0),
            }
        );
        assert_eq!(selection.curve.program(), Program::TonemapUchimura);
    }

    #[test]
    fn test_hable_coefficients() {
        let mut settings = ToneMapSettings {
            tone_map_type: 4,
            ..ToneMapSettings::default()
        };
        settings.hable.toe_strength = 0.3;
        settings.hable.white_point = 6.0;
        let ToneMapCurve::Uncharted(curve) = select_tonemap(&settings, &caps()).curve else {
            panic!("expected Uncharted");
        };
        assert_eq!(curve.a, Vec3::new(0.3, 0.5, 0.0));
        assert_eq!(curve.b, Vec3::new(0.5, 0.0, 1.0));
        assert_eq!(curve.c, Vec3::new(6.0, 2.0, 0.0));
    }

    #[test]
    fn test_lpm_extended_shoulder_flag() {
        let mut settings = ToneMapSettings {
            tone_map_type: 3,
            ..ToneMapSettings::default()
        };
        let ToneMapCurve::AmdLpm {
            extended_shoulder, ..
        } = select_tonemap(&settings, &caps()).curve
        else {
            panic!("expected LPM");
        };
        assert!(!extended_shoulder);

        settings.lpm.shoulder_contrast_range = 1.2;
        let ToneMapCurve::AmdLpm {
            extended_shoulder,
            control,
        } = select_tonemap(&settings, &caps()).curve
        else {
            panic!("expected LPM");
        };
        assert!(extended_shoulder);
        assert_eq!(control.row_f32(6)[0], 1.2);
    }

    #[test]
    fn test_lpm_ignores_host_shoulder_contrast() {
        let mut settings = ToneMapSettings {
            tone_map_type: 3,
            ..ToneMapSettings::default()
        };
        let before = select_tonemap(&settings, &caps());
        settings.lpm.shoulder_contrast = 5.0;
        assert_eq!(select_tonemap(&settings, &caps()), before);
    }

    #[test]
    fn test_filmic_clamps_and_enables_ui() {
        let mut settings = ToneMapSettings {
            tone_map_type: 5,
            ..ToneMapSettings::default()
        };
        settings.filmic.exposure_ev = 9.0;
        settings.filmic.temperature_k = 1000.0;
        settings.filmic.saturation = 1.8;
        let selection = select_tonemap(&settings, &caps());
        assert!(selection.filmic_ui_enabled());
        assert_eq!(selection.curve.program(), Program::TonemapHable);
        assert!(matches!(selection.curve, ToneMapCurve::Filmic(_)));
        let look = selection.filmic;
        assert_eq!(look.exposure_ev, 5.0);
        assert_eq!(look.temperature_k, 2500.0);
        assert_eq!(look.saturation, 1.8);

        let aces = select_tonemap(&ToneMapSettings::default(), &caps());
        assert!(!aces.filmic_ui_enabled());
    }

    #[test]
    fn test_pbr_renders_through_aces() {
        let settings = ToneMapSettings {
            tone_map_type: 6,
            ..ToneMapSettings::default()
        };
        let selection = select_tonemap(&settings, &caps());
        assert_eq!(selection.kind(), ToneMapKind::Pbr);
        assert_eq!(selection.curve.program(), Program::TonemapAces);
    }

    #[test]
    fn test_upload_lpm_block() {
        let settings = ToneMapSettings {
            tone_map_type: 3,
            ..ToneMapSettings::default()
        };
        let selection = select_tonemap(&settings, &caps());
        let mut seen = Vec::new();
        selection.curve.upload(|uniform, value| {
            if let UniformValue::UVec4Array(rows) = value {
                assert_eq!(rows.len(), 24);
            }
            seen.push(uniform);
        });
        assert_eq!(seen, vec![Uniform::TonemapAmd, Uniform::TonemapAmdShoulder]);
    }
}

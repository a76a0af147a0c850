//! Post-processing configuration snapshot and its named keys.
//!
//! `PostFxSettings` is the single source of truth the selectors read. Hosts
//! that keep settings in a named key/value system map their keys through
//! [`SettingKey`]; everything else can load the snapshot from JSON.

pub mod store;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

pub use store::{ChangeQueue, SettingsStore, Subscription};

/// Everything the post-processing stage is configured by.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostFxSettings {
    pub tonemap: ToneMapSettings,
    pub color_grade: ColorGradeSettings,
    pub sharpen: SharpenSettings,
    /// Derived: true exactly when Filmic is the selected tone map.
    /// Written by the pipeline, read by UI.
    pub filmic_ui_enabled: bool,
}

impl PostFxSettings {
    /// Parse a JSON snapshot. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON snapshot from disk.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Write this snapshot as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Current value of a named setting.
    pub fn get(&self, key: SettingKey) -> SettingValue {
        use SettingKey as K;
        use SettingValue as V;
        let t = &self.tonemap;
        let s = &self.sharpen;
        match key {
            K::ColorGrade => V::Bool(self.color_grade.enabled),
            K::ColorGradeLut => V::Str(self.color_grade.lut_name.clone()),
            K::ToneMapType => V::U32(t.tone_map_type),
            K::Exposure => V::F32(t.exposure),
            K::AmdHdrMax => V::F32(t.lpm.hdr_max),
            K::AmdExposure => V::F32(t.lpm.exposure),
            K::AmdContrast => V::F32(t.lpm.contrast),
            K::AmdSaturationR => V::F32(t.lpm.saturation[0]),
            K::AmdSaturationG => V::F32(t.lpm.saturation[1]),
            K::AmdSaturationB => V::F32(t.lpm.saturation[2]),
            K::AmdCrosstalkR => V::F32(t.lpm.crosstalk[0]),
            K::AmdCrosstalkG => V::F32(t.lpm.crosstalk[1]),
            K::AmdCrosstalkB => V::F32(t.lpm.crosstalk[2]),
            K::AmdShoulderContrast => V::F32(t.lpm.shoulder_contrast),
            K::AmdShoulderContrastRange => V::F32(t.lpm.shoulder_contrast_range),
            K::UchimuraMaxBrightness => V::F32(t.uchimura.max_brightness),
            K::UchimuraContrast => V::F32(t.uchimura.contrast),
            K::UchimuraLinearStart => V::F32(t.uchimura.linear_start),
            K::UchimuraLinearLength => V::F32(t.uchimura.linear_length),
            K::UchimuraBlackLevel => V::F32(t.uchimura.black_level),
            K::HableToeStrength => V::F32(t.hable.toe_strength),
            K::HableToeLength => V::F32(t.hable.toe_length),
            K::HableShoulderStrength => V::F32(t.hable.shoulder_strength),
            K::HableShoulderLength => V::F32(t.hable.shoulder_length),
            K::HableShoulderAngle => V::F32(t.hable.shoulder_angle),
            K::HableGamma => V::F32(t.hable.gamma),
            K::HableWhitePoint => V::F32(t.hable.white_point),
            K::FilmicExposureEv => V::F32(t.filmic.exposure_ev),
            K::FilmicTemperature => V::F32(t.filmic.temperature_k),
            K::FilmicTint => V::F32(t.filmic.tint),
            K::FilmicContrast => V::F32(t.filmic.contrast),
            K::FilmicSaturation => V::F32(t.filmic.saturation),
            K::SharpenMethod => V::U32(s.method),
            K::DlsSharpness => V::F32(s.dls_sharpness),
            K::DlsDenoise => V::F32(s.dls_denoise),
            K::CasSharpness => V::F32(s.cas_sharpness),
            K::FilmicUiEnabled => V::Bool(self.filmic_ui_enabled),
        }
    }

    /// Assign a named setting. The value's type must match the key's.
    pub fn set(&mut self, key: SettingKey, value: SettingValue) -> Result<(), SettingsError> {
        use SettingKey as K;
        match key {
            K::ColorGrade => self.color_grade.enabled = value.as_bool(key)?,
            K::FilmicUiEnabled => self.filmic_ui_enabled = value.as_bool(key)?,
            K::ColorGradeLut => self.color_grade.lut_name = value.into_string(key)?,
            K::ToneMapType => self.tonemap.tone_map_type = value.as_u32(key)?,
            K::SharpenMethod => self.sharpen.method = value.as_u32(key)?,
            _ => {
                let v = value.as_f32(key)?;
                if let Some(slot) = self.f32_slot(key) {
                    *slot = v;
                }
            }
        }
        Ok(())
    }

    fn f32_slot(&mut self, key: SettingKey) -> Option<&mut f32> {
        use SettingKey as K;
        let t = &mut self.tonemap;
        let slot = match key {
            K::Exposure => &mut t.exposure,
            K::AmdHdrMax => &mut t.lpm.hdr_max,
            K::AmdExposure => &mut t.lpm.exposure,
            K::AmdContrast => &mut t.lpm.contrast,
            K::AmdSaturationR => &mut t.lpm.saturation[0],
            K::AmdSaturationG => &mut t.lpm.saturation[1],
            K::AmdSaturationB => &mut t.lpm.saturation[2],
            K::AmdCrosstalkR => &mut t.lpm.crosstalk[0],
            K::AmdCrosstalkG => &mut t.lpm.crosstalk[1],
            K::AmdCrosstalkB => &mut t.lpm.crosstalk[2],
            K::AmdShoulderContrast => &mut t.lpm.shoulder_contrast,
            K::AmdShoulderContrastRange => &mut t.lpm.shoulder_contrast_range,
            K::UchimuraMaxBrightness => &mut t.uchimura.max_brightness,
            K::UchimuraContrast => &mut t.uchimura.contrast,
            K::UchimuraLinearStart => &mut t.uchimura.linear_start,
            K::UchimuraLinearLength => &mut t.uchimura.linear_length,
            K::UchimuraBlackLevel => &mut t.uchimura.black_level,
            K::HableToeStrength => &mut t.hable.toe_strength,
            K::HableToeLength => &mut t.hable.toe_length,
            K::HableShoulderStrength => &mut t.hable.shoulder_strength,
            K::HableShoulderLength => &mut t.hable.shoulder_length,
            K::HableShoulderAngle => &mut t.hable.shoulder_angle,
            K::HableGamma => &mut t.hable.gamma,
            K::HableWhitePoint => &mut t.hable.white_point,
            K::FilmicExposureEv => &mut t.filmic.exposure_ev,
            K::FilmicTemperature => &mut t.filmic.temperature_k,
            K::FilmicTint => &mut t.filmic.tint,
            K::FilmicContrast => &mut t.filmic.contrast,
            K::FilmicSaturation => &mut t.filmic.saturation,
            K::DlsSharpness => &mut self.sharpen.dls_sharpness,
            K::DlsDenoise => &mut self.sharpen.dls_denoise,
            K::CasSharpness => &mut self.sharpen.cas_sharpness,
            K::ColorGrade
            | K::ColorGradeLut
            | K::ToneMapType
            | K::SharpenMethod
            | K::FilmicUiEnabled => return None,
        };
        Some(slot)
    }
}

/// Tone-map selection and per-curve tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneMapSettings {
    /// Requested curve tag (see `ToneMapKind`). Out-of-range values fall back.
    pub tone_map_type: u32,
    /// Linear exposure multiplier, clamped to `[0.5, 4.0]` on use.
    pub exposure: f32,
    pub uchimura: UchimuraSettings,
    pub lpm: LpmSettings,
    pub hable: HableSettings,
    pub filmic: FilmicSettings,
}

impl Default for ToneMapSettings {
    fn default() -> Self {
        Self {
            tone_map_type: 1,
            exposure: 1.0,
            uchimura: UchimuraSettings::default(),
            lpm: LpmSettings::default(),
            hable: HableSettings::default(),
            filmic: FilmicSettings::default(),
        }
    }
}

/// Uchimura ("GT") curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UchimuraSettings {
    pub max_brightness: f32,
    pub contrast: f32,
    pub linear_start: f32,
    pub linear_length: f32,
    pub black_level: f32,
}

impl Default for UchimuraSettings {
    fn default() -> Self {
        Self {
            max_brightness: 1.0,
            contrast: 1.0,
            linear_start: 0.22,
            linear_length: 0.4,
            black_level: 1.33,
        }
    }
}

/// Inputs to Lottes' parametric mapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LpmSettings {
    /// Maximum scene value mapped to display white.
    pub hdr_max: f32,
    /// Stops between `hdr_max` and 18% mid grey on input.
    pub exposure: f32,
    /// 0 = no extra contrast, 1 = maximum.
    pub contrast: f32,
    /// Host-side shoulder knob. Triggers a re-derive but the mapper's
    /// shoulder shaping is driven by `shoulder_contrast_range`.
    pub shoulder_contrast: f32,
    /// Shoulder shaping; 1.0 takes the fast path without the extended shoulder.
    pub shoulder_contrast_range: f32,
    /// Per-channel saturation, <0 decreases, 0 = unchanged, >0 increases.
    pub saturation: [f32; 3],
    /// Per-channel crosstalk; one channel should be 1.0, none zero.
    pub crosstalk: [f32; 3],
}

impl Default for LpmSettings {
    fn default() -> Self {
        Self {
            hdr_max: 8.0,
            exposure: 3.0,
            contrast: 0.0,
            shoulder_contrast: 1.0,
            shoulder_contrast_range: 1.0,
            saturation: [0.0, 0.0, 0.0],
            crosstalk: [1.0, 0.5, 1.0 / 32.0],
        }
    }
}

/// Hable piecewise power curve ("Uncharted").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HableSettings {
    pub toe_strength: f32,
    pub toe_length: f32,
    pub shoulder_strength: f32,
    pub shoulder_length: f32,
    pub shoulder_angle: f32,
    pub gamma: f32,
    pub white_point: f32,
}

impl Default for HableSettings {
    fn default() -> Self {
        Self {
            toe_strength: 0.0,
            toe_length: 0.5,
            shoulder_strength: 0.0,
            shoulder_length: 0.5,
            shoulder_angle: 0.0,
            gamma: 1.0,
            white_point: 4.0,
        }
    }
}

/// Filmic look controls, applied in-shader ahead of the Hable curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilmicSettings {
    /// Exposure in EV, `-5..=5`.
    pub exposure_ev: f32,
    /// White-balance temperature in kelvin, `2500..=15000`.
    pub temperature_k: f32,
    /// White-balance tint, `-1..=1`.
    pub tint: f32,
    /// Nominal `0.8..=1.2`.
    pub contrast: f32,
    /// Nominal `0.8..=1.2`, UI allows up to 2.0.
    pub saturation: f32,
}

impl Default for FilmicSettings {
    fn default() -> Self {
        Self {
            exposure_ev: 0.0,
            temperature_k: 6500.0,
            tint: 0.0,
            contrast: 1.0,
            saturation: 1.0,
        }
    }
}

/// Color grading via a 3D LUT file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorGradeSettings {
    pub enabled: bool,
    /// Bare file name looked up in the LUT search directories.
    pub lut_name: String,
}

/// Sharpening method and per-method strength.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharpenSettings {
    /// Requested method tag (see `SharpenKind`). Out-of-range values fall back to CAS.
    pub method: u32,
    pub cas_sharpness: f32,
    pub dls_sharpness: f32,
    pub dls_denoise: f32,
}

impl Default for SharpenSettings {
    fn default() -> Self {
        Self {
            method: 0,
            cas_sharpness: 0.6,
            dls_sharpness: 0.5,
            dls_denoise: 0.17,
        }
    }
}

/// Which selector a key feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingGroup {
    ToneMap,
    ColorGrade,
    Sharpen,
    /// Written by the pipeline; changing it recomputes nothing.
    Derived,
}

/// A typed setting value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SettingValue {
    Bool(bool),
    U32(u32),
    F32(f32),
    Str(String),
}

impl SettingValue {
    fn as_bool(&self, key: SettingKey) -> Result<bool, SettingsError> {
        match self {
            Self::Bool(v) => Ok(*v),
            _ => Err(key.mismatch("bool")),
        }
    }

    fn as_u32(&self, key: SettingKey) -> Result<u32, SettingsError> {
        match self {
            Self::U32(v) => Ok(*v),
            _ => Err(key.mismatch("u32")),
        }
    }

    fn as_f32(&self, key: SettingKey) -> Result<f32, SettingsError> {
        match self {
            Self::F32(v) => Ok(*v),
            _ => Err(key.mismatch("f32")),
        }
    }

    fn into_string(self, key: SettingKey) -> Result<String, SettingsError> {
        match self {
            Self::Str(v) => Ok(v),
            _ => Err(key.mismatch("string")),
        }
    }
}

macro_rules! setting_keys {
    ($($variant:ident => $name:literal, $group:ident;)*) => {
        /// Named post-processing settings, as known to the host settings system.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum SettingKey {
            $($variant,)*
        }

        impl SettingKey {
            /// Every key, in declaration order.
            pub const ALL: &'static [SettingKey] = &[$(SettingKey::$variant,)*];

            /// Host-visible setting name.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }

            /// Selector this key feeds.
            pub const fn group(self) -> SettingGroup {
                match self {
                    $(Self::$variant => SettingGroup::$group,)*
                }
            }
        }
    };
}

setting_keys! {
    ColorGrade => "RenderColorGrade", ColorGrade;
    ColorGradeLut => "RenderColorGradeLUT", ColorGrade;
    ToneMapType => "RenderToneMapType", ToneMap;
    Exposure => "RenderExposure", ToneMap;
    AmdHdrMax => "AlchemyToneMapAMDHDRMax", ToneMap;
    AmdExposure => "AlchemyToneMapAMDExposure", ToneMap;
    AmdContrast => "AlchemyToneMapAMDContrast", ToneMap;
    AmdSaturationR => "AlchemyToneMapAMDSaturationR", ToneMap;
    AmdSaturationG => "AlchemyToneMapAMDSaturationG", ToneMap;
    AmdSaturationB => "AlchemyToneMapAMDSaturationB", ToneMap;
    AmdCrosstalkR => "AlchemyToneMapAMDCrosstalkR", ToneMap;
    AmdCrosstalkG => "AlchemyToneMapAMDCrosstalkG", ToneMap;
    AmdCrosstalkB => "AlchemyToneMapAMDCrosstalkB", ToneMap;
    AmdShoulderContrast => "AlchemyToneMapAMDShoulderContrast", ToneMap;
    AmdShoulderContrastRange => "AlchemyToneMapAMDShoulderContrastRange", ToneMap;
    UchimuraMaxBrightness => "AlchemyToneMapUchimuraMaxBrightness", ToneMap;
    UchimuraContrast => "AlchemyToneMapUchimuraContrast", ToneMap;
    UchimuraLinearStart => "AlchemyToneMapUchimuraLinearStart", ToneMap;
    UchimuraLinearLength => "AlchemyToneMapUchimuraLinearLength", ToneMap;
    UchimuraBlackLevel => "AlchemyToneMapUchimuraBlackLevel", ToneMap;
    HableToeStrength => "AlchemyToneMapFilmicToeStr", ToneMap;
    HableToeLength => "AlchemyToneMapFilmicToeLen", ToneMap;
    HableShoulderStrength => "AlchemyToneMapFilmicShoulderStr", ToneMap;
    HableShoulderLength => "AlchemyToneMapFilmicShoulderLen", ToneMap;
    HableShoulderAngle => "AlchemyToneMapFilmicShoulderAngle", ToneMap;
    HableGamma => "AlchemyToneMapFilmicGamma", ToneMap;
    HableWhitePoint => "AlchemyToneMapFilmicWhitePoint", ToneMap;
    FilmicExposureEv => "RenderExposureEV", ToneMap;
    FilmicTemperature => "RenderWBTempK", ToneMap;
    FilmicTint => "RenderWBTint", ToneMap;
    FilmicContrast => "RenderFilmicContrast", ToneMap;
    FilmicSaturation => "RenderFilmicSaturation", ToneMap;
    SharpenMethod => "RenderSharpenMethod", Sharpen;
    DlsSharpness => "RenderSharpenDLSSharpness", Sharpen;
    DlsDenoise => "RenderSharpenDLSDenoise", Sharpen;
    CasSharpness => "RenderSharpenCASSharpness", Sharpen;
    FilmicUiEnabled => "RenderFilmicUIEnabled", Derived;
}

impl SettingKey {
    /// Look a key up by its host-visible name.
    pub fn from_name(name: &str) -> Result<Self, SettingsError> {
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.name() == name)
            .ok_or_else(|| SettingsError::UnknownKey(name.to_string()))
    }

    fn mismatch(self, expected: &'static str) -> SettingsError {
        SettingsError::TypeMismatch {
            key: self.name(),
            expected,
        }
    }
}

impl std::fmt::Display for SettingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

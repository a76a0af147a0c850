//! Render collaborator interfaces.
//!
//! The pipeline never talks to a graphics API directly. It binds programs,
//! uploads uniforms and issues draws through [`RenderBackend`], identifying
//! programs, uniforms and texture slots with the constant enums below.

use glam::{Vec2, Vec3, Vec4};

use crate::error::RenderError;
use crate::lut::ColorGradeLut;

/// Which optional programs compiled this session, plus device limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Deferred shading is active. Grading and sharpening require it.
    pub deferred_rendering: bool,
    pub lpm_program: bool,
    pub cas_program: bool,
    pub dls_program: bool,
    /// Largest LUT edge the device accepts for a 3D texture.
    pub max_texture_size: u32,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            deferred_rendering: true,
            lpm_program: true,
            cas_program: true,
            dls_program: true,
            max_texture_size: 2048,
        }
    }
}

/// Color-correct program variant, picked per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GradeVariant {
    Normal,
    ZeroAmbiance,
    NoPost,
}

/// Every shader program the post-processing stage binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Program {
    /// Neutral HDR pass-through used for debugging and forced overrides.
    TonemapDebug,
    TonemapAces,
    TonemapUchimura,
    TonemapLpm,
    TonemapHable,
    ColorCorrect(GradeVariant),
    ColorCorrectLut(GradeVariant),
    Cas,
    Dls,
}

impl Program {
    pub fn name(self) -> &'static str {
        match self {
            Self::TonemapDebug => "tonemap_debug",
            Self::TonemapAces => "tonemap_aces",
            Self::TonemapUchimura => "tonemap_uchimura",
            Self::TonemapLpm => "tonemap_lpm",
            Self::TonemapHable => "tonemap_hable",
            Self::ColorCorrect(GradeVariant::Normal) => "color_correct",
            Self::ColorCorrect(GradeVariant::ZeroAmbiance) => "color_correct_zero_ambiance",
            Self::ColorCorrect(GradeVariant::NoPost) => "color_correct_no_post",
            Self::ColorCorrectLut(GradeVariant::Normal) => "color_correct_lut",
            Self::ColorCorrectLut(GradeVariant::ZeroAmbiance) => "color_correct_lut_zero_ambiance",
            Self::ColorCorrectLut(GradeVariant::NoPost) => "color_correct_lut_no_post",
            Self::Cas => "sharpen_cas",
            Self::Dls => "sharpen_dls",
        }
    }
}

/// Shader uniforms, by their shader-visible names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uniform {
    Exposure,
    ToneUchimuraA,
    ToneUchimuraB,
    TonemapAmd,
    TonemapAmdShoulder,
    ToneUnchartedA,
    ToneUnchartedB,
    ToneUnchartedC,
    SharpenParams,
    CasParam0,
    CasParam1,
    OutScreenRes,
    ScreenRes,
    AcesMix,
    ToneMapType,
    ExposureEv,
    WbTempK,
    WbTint,
    FilmicContrast,
    FilmicSaturation,
    ColorGradeLutSize,
}

impl Uniform {
    pub fn name(self) -> &'static str {
        match self {
            Self::Exposure => "exposure",
            Self::ToneUchimuraA => "tone_uchimura_a",
            Self::ToneUchimuraB => "tone_uchimura_b",
            Self::TonemapAmd => "tonemap_amd",
            Self::TonemapAmdShoulder => "tonemap_amd_shoulder",
            Self::ToneUnchartedA => "tone_uncharted_a",
            Self::ToneUnchartedB => "tone_uncharted_b",
            Self::ToneUnchartedC => "tone_uncharted_c",
            Self::SharpenParams => "sharpen_params",
            Self::CasParam0 => "cas_param_0",
            Self::CasParam1 => "cas_param_1",
            Self::OutScreenRes => "out_screen_res",
            Self::ScreenRes => "screen_res",
            Self::AcesMix => "aces_mix",
            Self::ToneMapType => "uToneMapType",
            Self::ExposureEv => "uExposureEV",
            Self::WbTempK => "uWB_TempK",
            Self::WbTint => "uWB_Tint",
            Self::FilmicContrast => "uFilmicContrast",
            Self::FilmicSaturation => "uFilmicSaturation",
            Self::ColorGradeLutSize => "colorgrade_lut_size",
        }
    }
}

/// A uniform payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue<'a> {
    F32(f32),
    I32(i32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    /// `uvec4[n]`.
    UVec4Array(&'a [[u32; 4]]),
}

/// Named texture units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Diffuse,
    ExposureMap,
    ColorGradeLut,
}

impl TextureSlot {
    pub fn name(self) -> &'static str {
        match self {
            Self::Diffuse => "diffuseRect",
            Self::ExposureMap => "exposureMap",
            Self::ColorGradeLut => "colorgrade_lut",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    Point,
    Bilinear,
}

/// A color buffer that can be drawn into.
pub trait RenderTarget {
    /// Begin writing into this target.
    fn bind_target(&mut self);
    /// Finish writing into this target.
    fn flush(&mut self);
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}

/// Creates the device-side 3D texture for a color-grade LUT.
///
/// Implementations must upload `size³` RGBA8 texels with bilinear filtering
/// and clamp-to-edge addressing. Dropping the texture releases it.
pub trait LutTextureUploader {
    type Texture;

    fn upload_lut(&mut self, lut: &ColorGradeLut) -> Result<Self::Texture, RenderError>;
}

/// Program binding, uniform upload and draw submission.
pub trait RenderBackend: LutTextureUploader {
    type Target: RenderTarget;

    fn capabilities(&self) -> Capabilities;

    fn bind_program(&mut self, program: Program);
    fn unbind_program(&mut self, program: Program);
    fn set_uniform(&mut self, uniform: Uniform, value: UniformValue<'_>);

    fn bind_texture(&mut self, slot: TextureSlot, target: &Self::Target, filter: TextureFilter);
    fn unbind_texture(&mut self, slot: TextureSlot);
    /// Bind a LUT texture with bilinear filtering and clamp addressing.
    fn bind_lut(&mut self, slot: TextureSlot, lut: &Self::Texture);

    /// Draw one triangle covering every pixel of `dst`.
    fn draw_fullscreen_triangle(&mut self, dst: &mut Self::Target);
    /// Overwrite `dst` with the contents of `src`.
    fn copy_target(&mut self, src: &Self::Target, dst: &mut Self::Target);
}

/// Per-frame state that steers render-time overrides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    /// Global "disable post-processing" switch.
    pub post_processing_disabled: bool,
    /// A build/edit tool surface is open.
    pub tool_surface_active: bool,
    /// A snapshot without post-processing is being captured.
    pub snapshot_no_post: bool,
    /// Reflection-probe ambiance of the current sky.
    pub reflection_probe_ambiance: f32,
    /// An EXR image is being previewed.
    pub exr_preview_active: bool,
}

impl Default for FrameContext {
    fn default() -> Self {
        Self {
            post_processing_disabled: false,
            tool_surface_active: false,
            snapshot_no_post: false,
            reflection_probe_ambiance: 1.0,
            exr_preview_active: false,
        }
    }
}

impl FrameContext {
    /// Whether the tonemap pass must use the neutral debug program.
    pub fn forces_neutral_tonemap(&self) -> bool {
        (self.post_processing_disabled && self.tool_surface_active)
            || self.reflection_probe_ambiance == 0.0
    }

    pub fn grade_variant(&self) -> GradeVariant {
        let no_post =
            self.snapshot_no_post || (self.post_processing_disabled && self.tool_surface_active);
        if no_post && self.tool_surface_active {
            GradeVariant::NoPost
        } else if self.reflection_probe_ambiance == 0.0 {
            GradeVariant::ZeroAmbiance
        } else {
            GradeVariant::Normal
        }
    }

    /// Blend between the ACES fit and a plain curve; EXR previews skip it.
    pub fn aces_mix(&self) -> f32 {
        if self.exr_preview_active { 0.0 } else { 0.3 }
    }
}

//! Post-processing orchestration: tonemap, then color grade, then sharpen.
//!
//! [`PostProcessPipeline`] owns the current selections and the uploaded LUT.
//! Setup runs when settings change; the three render passes only read what
//! setup produced (the CAS constants excepted, which follow the target sizes).

use glam::{Vec2, Vec4};

use crate::lut::ColorGradeLut;
use crate::lut::loader::ColorGradeLutLoader;
use crate::render::{
    Capabilities, FrameContext, LutTextureUploader, Program, RenderBackend, RenderTarget,
    TextureFilter, TextureSlot, Uniform, UniformValue,
};
use crate::settings::{
    ChangeQueue, PostFxSettings, SettingGroup, SettingKey, SettingValue, SettingsStore,
};
use crate::sharpen::{CasConstants, SharpenSelection, cas_setup, select_sharpen};
use crate::tonemap::{ToneMapSelection, select_tonemap};

/// A LUT together with its device texture. Dropping it releases the texture.
struct LoadedLut<T> {
    lut: ColorGradeLut,
    texture: T,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CasCacheEntry {
    sharpness: f32,
    input: (u32, u32),
    output: (u32, u32),
    constants: CasConstants,
}

/// Screen-space post-processing stage.
pub struct PostProcessPipeline<B: RenderBackend> {
    loader: ColorGradeLutLoader,
    caps: Capabilities,
    tonemap: ToneMapSelection,
    sharpen: SharpenSelection,
    lut: Option<LoadedLut<B::Texture>>,
    cas_cache: Option<CasCacheEntry>,
}

impl<B: RenderBackend> PostProcessPipeline<B> {
    /// A pipeline with ACES tone mapping, no grading and no sharpening.
    /// Call [`refresh`](Self::refresh) before the first frame.
    pub fn new(loader: ColorGradeLutLoader) -> Self {
        Self {
            loader,
            caps: Capabilities::default(),
            tonemap: ToneMapSelection::default(),
            sharpen: SharpenSelection::Disabled,
            lut: None,
            cas_cache: None,
        }
    }

    /// Re-query capabilities and recompute every selection and the LUT.
    pub fn refresh(&mut self, backend: &mut B, settings: &PostFxSettings) {
        self.caps = backend.capabilities();
        tracing::debug!(caps = ?self.caps, "refreshing post-processing state");
        self.setup_tonemap(settings);
        self.setup_color_grade(backend, settings);
        self.setup_sharpen(settings);
    }

    /// Recompute only what `key` feeds.
    pub fn on_config_changed(&mut self, key: SettingKey, backend: &mut B, settings: &PostFxSettings) {
        self.apply_group(key.group(), backend, settings);
    }

    /// Apply every change recorded in `queue` and publish the derived Filmic
    /// UI flag back to `store`. Returns how many keys were applied.
    ///
    /// Derived keys are dropped from the queue: they are outputs of this
    /// pipeline, including the flag it publishes itself.
    pub fn sync(&mut self, backend: &mut B, store: &SettingsStore, queue: &ChangeQueue) -> usize {
        let keys: Vec<SettingKey> = queue
            .drain()
            .into_iter()
            .filter(|key| key.group() != SettingGroup::Derived)
            .collect();
        if keys.is_empty() {
            return 0;
        }
        let settings = store.snapshot();
        let mut done: Vec<SettingGroup> = Vec::with_capacity(3);
        for key in &keys {
            let group = key.group();
            if !done.contains(&group) {
                self.apply_group(group, backend, &settings);
                done.push(group);
            }
        }
        self.publish_filmic_ui(store);
        keys.len()
    }

    /// Write the derived Filmic UI flag to `store`.
    pub fn publish_filmic_ui(&self, store: &SettingsStore) {
        let value = SettingValue::Bool(self.filmic_ui_enabled());
        if let Err(err) = store.set(SettingKey::FilmicUiEnabled, value) {
            tracing::warn!("failed to publish Filmic UI flag: {err}");
        }
    }

    fn apply_group(&mut self, group: SettingGroup, backend: &mut B, settings: &PostFxSettings) {
        match group {
            SettingGroup::ToneMap => self.setup_tonemap(settings),
            SettingGroup::ColorGrade => self.setup_color_grade(backend, settings),
            SettingGroup::Sharpen => self.setup_sharpen(settings),
            SettingGroup::Derived => {}
        }
    }

    fn setup_tonemap(&mut self, settings: &PostFxSettings) {
        self.tonemap = select_tonemap(&settings.tonemap, &self.caps);
    }

    fn setup_sharpen(&mut self, settings: &PostFxSettings) {
        self.sharpen = select_sharpen(&settings.sharpen, &self.caps);
        self.cas_cache = None;
    }

    fn setup_color_grade(&mut self, uploader: &mut B, settings: &PostFxSettings) {
        self.release_resources();
        if !self.caps.deferred_rendering {
            return;
        }
        let Some(lut) = self
            .loader
            .load(&settings.color_grade, self.caps.max_texture_size)
        else {
            return;
        };
        match uploader.upload_lut(&lut) {
            Ok(texture) => self.lut = Some(LoadedLut { lut, texture }),
            Err(err) => tracing::warn!(size = lut.size(), "color grade LUT upload failed: {err}"),
        }
    }

    /// Drop the device LUT texture, if any. Safe to call repeatedly.
    pub fn release_resources(&mut self) {
        if let Some(loaded) = self.lut.take() {
            tracing::debug!(size = loaded.lut.size(), "releasing color grade LUT");
        }
    }

    /// Tone-map `src` into `dst`, reading scene exposure from `exposure`.
    pub fn render_tonemap(
        &self,
        backend: &mut B,
        src: &B::Target,
        exposure: &B::Target,
        dst: &mut B::Target,
        frame: &FrameContext,
    ) {
        dst.bind_target();

        let selected = self.tonemap.curve.program();
        let program = if frame.forces_neutral_tonemap() {
            Program::TonemapDebug
        } else {
            selected
        };

        backend.bind_program(program);
        backend.bind_texture(TextureSlot::Diffuse, src, TextureFilter::Point);
        backend.bind_texture(TextureSlot::ExposureMap, exposure, TextureFilter::Bilinear);
        backend.set_uniform(Uniform::ScreenRes, UniformValue::Vec2(target_size(src)));
        backend.set_uniform(Uniform::AcesMix, UniformValue::F32(frame.aces_mix()));
        backend.set_uniform(Uniform::Exposure, UniformValue::F32(self.tonemap.exposure));
        backend.set_uniform(
            Uniform::ToneMapType,
            UniformValue::I32(self.tonemap.kind().index() as i32),
        );

        self.tonemap
            .upload_filmic(|uniform, value| backend.set_uniform(uniform, value));

        if program == selected {
            self.tonemap
                .curve
                .upload(|uniform, value| backend.set_uniform(uniform, value));
        }

        backend.draw_fullscreen_triangle(dst);

        backend.unbind_texture(TextureSlot::Diffuse);
        backend.unbind_texture(TextureSlot::ExposureMap);
        backend.unbind_program(program);

        dst.flush();
    }

    /// Color-correct `src` into `dst`, through the LUT when one is loaded.
    pub fn render_color_grade(
        &self,
        backend: &mut B,
        src: &B::Target,
        dst: &mut B::Target,
        frame: &FrameContext,
    ) {
        dst.bind_target();

        let variant = frame.grade_variant();
        let program = match self.lut {
            Some(_) => Program::ColorCorrectLut(variant),
            None => Program::ColorCorrect(variant),
        };

        backend.bind_program(program);
        backend.bind_texture(TextureSlot::Diffuse, src, TextureFilter::Point);
        backend.set_uniform(Uniform::ScreenRes, UniformValue::Vec2(target_size(src)));

        if let Some(loaded) = &self.lut {
            backend.bind_lut(TextureSlot::ColorGradeLut, &loaded.texture);
            backend.set_uniform(
                Uniform::ColorGradeLutSize,
                UniformValue::Vec4(Vec4::from_array(loaded.lut.size_uniform())),
            );
        }

        backend.draw_fullscreen_triangle(dst);

        if self.lut.is_some() {
            backend.unbind_texture(TextureSlot::ColorGradeLut);
        }
        backend.unbind_texture(TextureSlot::Diffuse);
        backend.unbind_program(program);

        dst.flush();
    }

    /// Sharpen `src` into `dst`, or copy it when sharpening is disabled.
    pub fn render_sharpen(&mut self, backend: &mut B, src: &B::Target, dst: &mut B::Target) {
        let Some(program) = self.sharpen.program() else {
            backend.copy_target(src, dst);
            return;
        };

        dst.bind_target();
        backend.bind_program(program);

        match self.sharpen {
            SharpenSelection::Cas { sharpness } => {
                let input = (src.width(), src.height());
                let output = (dst.width(), dst.height());
                let constants = self.cas_constants(sharpness, input, output);
                backend.set_uniform(
                    Uniform::CasParam0,
                    UniformValue::UVec4Array(std::slice::from_ref(&constants.const0)),
                );
                backend.set_uniform(
                    Uniform::CasParam1,
                    UniformValue::UVec4Array(std::slice::from_ref(&constants.const1)),
                );
                backend.set_uniform(Uniform::OutScreenRes, UniformValue::Vec2(target_size(dst)));
            }
            SharpenSelection::Dls { params } => {
                backend.set_uniform(Uniform::SharpenParams, UniformValue::Vec3(params));
            }
            SharpenSelection::Disabled => {}
        }

        backend.bind_texture(TextureSlot::Diffuse, src, TextureFilter::Point);
        backend.draw_fullscreen_triangle(dst);
        backend.unbind_texture(TextureSlot::Diffuse);
        backend.unbind_program(program);

        dst.flush();
    }

    fn cas_constants(&mut self, sharpness: f32, input: (u32, u32), output: (u32, u32)) -> CasConstants {
        match self.cas_cache {
            Some(entry)
                if entry.sharpness == sharpness && entry.input == input && entry.output == output =>
            {
                return entry.constants;
            }
            _ => {}
        }
        let constants = cas_setup(sharpness, input, output);
        tracing::trace!(?input, ?output, sharpness, "CAS constants derived");
        self.cas_cache = Some(CasCacheEntry {
            sharpness,
            input,
            output,
            constants,
        });
        constants
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    pub fn tonemap(&self) -> &ToneMapSelection {
        &self.tonemap
    }

    pub fn sharpen(&self) -> &SharpenSelection {
        &self.sharpen
    }

    /// The loaded LUT, if grading is active.
    pub fn color_grade_lut(&self) -> Option<&ColorGradeLut> {
        self.lut.as_ref().map(|loaded| &loaded.lut)
    }

    pub fn lut_texture(&self) -> Option<&B::Texture> {
        self.lut.as_ref().map(|loaded| &loaded.texture)
    }

    pub fn filmic_ui_enabled(&self) -> bool {
        self.tonemap.filmic_ui_enabled()
    }

    pub fn loader(&self) -> &ColorGradeLutLoader {
        &self.loader
    }
}

fn target_size<T: RenderTarget>(target: &T) -> Vec2 {
    Vec2::new(target.width() as f32, target.height() as f32)
}

impl<B: RenderBackend> std::fmt::Debug for PostProcessPipeline<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostProcessPipeline")
            .field("caps", &self.caps)
            .field("tonemap", &self.tonemap.kind())
            .field("sharpen", &self.sharpen)
            .field("lut_size", &self.lut.as_ref().map(|l| l.lut.size()))
            .finish()
    }
}

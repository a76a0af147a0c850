//! Resolve, decode, and validate a user-selected color-grade LUT.
//!
//! A LUT name is looked up in each search directory in order (user-writable
//! first, then the built-in set). `.cube` files go through the text parser;
//! common image formats go through a [`LutImageDecoder`] and must hold an
//! `h × h²` atlas of `h` slices.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::error::LutError;
use crate::lut::cube::parse_cube;
use crate::lut::{ColorGradeLut, LUT_CHANNELS};
use crate::settings::ColorGradeSettings;

/// Subdirectory holding LUTs inside each settings root.
pub const LUT_SUBDIR: &str = "colorlut";

/// On-disk LUT encodings understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LutFormat {
    /// Plain-text `.cube`.
    Cube,
    /// Baked 2D atlas image.
    Image(ImageLutFormat),
}

/// Image codecs a baked LUT atlas may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLutFormat {
    Tga,
    Png,
    Jpeg,
    Bmp,
    WebP,
}

impl LutFormat {
    /// Classify by file extension, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let format = match ext.to_ascii_lowercase().as_str() {
            "cube" => Self::Cube,
            "tga" => Self::Image(ImageLutFormat::Tga),
            "png" => Self::Image(ImageLutFormat::Png),
            "jpg" | "jpeg" => Self::Image(ImageLutFormat::Jpeg),
            "bmp" => Self::Image(ImageLutFormat::Bmp),
            "webp" => Self::Image(ImageLutFormat::WebP),
            _ => return None,
        };
        Some(format)
    }

    /// Classify a path by its extension.
    pub fn from_path(path: &Path) -> Result<Self, LutError> {
        let ext = path.extension().and_then(OsStr::to_str).unwrap_or_default();
        Self::from_extension(ext).ok_or_else(|| LutError::UnsupportedExtension(ext.to_string()))
    }
}

impl From<ImageLutFormat> for image::ImageFormat {
    fn from(format: ImageLutFormat) -> Self {
        match format {
            ImageLutFormat::Tga => Self::Tga,
            ImageLutFormat::Png => Self::Png,
            ImageLutFormat::Jpeg => Self::Jpeg,
            ImageLutFormat::Bmp => Self::Bmp,
            ImageLutFormat::WebP => Self::WebP,
        }
    }
}

/// 8-bit interleaved pixels produced by an image decoder.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Channels per pixel as stored in `pixels`.
    pub components: u8,
    pub pixels: Vec<u8>,
}

/// Decodes a LUT atlas image. The loader treats decoders as black boxes.
pub trait LutImageDecoder: Send + Sync {
    fn decode(&self, path: &Path, format: ImageLutFormat) -> Result<DecodedImage, LutError>;
}

/// Decoder backed by the `image` crate.
///
/// RGB and RGBA sources keep their channel count (at 8 bits per channel);
/// other layouts are passed through untouched so the loader can reject them.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateDecoder;

impl LutImageDecoder for ImageCrateDecoder {
    fn decode(&self, path: &Path, format: ImageLutFormat) -> Result<DecodedImage, LutError> {
        let mut reader = image::ImageReader::open(path).map_err(|source| LutError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        reader.set_format(format.into());
        let img = reader.decode().map_err(|source| LutError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        let (width, height) = (img.width(), img.height());
        let components = img.color().channel_count();
        let pixels = match components {
            3 => img.into_rgb8().into_raw(),
            4 => img.into_rgba8().into_raw(),
            _ => img.into_bytes(),
        };

        Ok(DecodedImage {
            width,
            height,
            components,
            pixels,
        })
    }
}

/// Ordered list of directories a LUT name is resolved against.
#[derive(Debug, Clone, Default)]
pub struct LutSearchPaths {
    dirs: Vec<PathBuf>,
}

impl LutSearchPaths {
    /// Search `<user_root>/colorlut` before `<app_root>/colorlut`.
    pub fn new(user_root: impl AsRef<Path>, app_root: impl AsRef<Path>) -> Self {
        Self {
            dirs: vec![
                user_root.as_ref().join(LUT_SUBDIR),
                app_root.as_ref().join(LUT_SUBDIR),
            ],
        }
    }

    /// Search exactly these directories, in order.
    pub fn from_dirs(dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            dirs: dirs.into_iter().collect(),
        }
    }

    /// First existing regular file named `name`.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, LutError> {
        if Path::new(name).file_name() != Some(OsStr::new(name)) {
            return Err(LutError::InvalidName(name.to_string()));
        }
        self.dirs
            .iter()
            .map(|dir| dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| LutError::NotFound(name.to_string()))
    }
}

/// Builds a validated [`ColorGradeLut`] from the color-grade settings.
pub struct ColorGradeLutLoader {
    paths: LutSearchPaths,
    decoder: Box<dyn LutImageDecoder>,
}

impl ColorGradeLutLoader {
    /// Loader using the `image` crate for atlas formats.
    pub fn new(paths: LutSearchPaths) -> Self {
        Self::with_decoder(paths, ImageCrateDecoder)
    }

    pub fn with_decoder(paths: LutSearchPaths, decoder: impl LutImageDecoder + 'static) -> Self {
        Self {
            paths,
            decoder: Box::new(decoder),
        }
    }

    pub fn search_paths(&self) -> &LutSearchPaths {
        &self.paths
    }

    /// Load the configured LUT, or `None` when grading is off or anything
    /// about the file is unusable. Failures are logged, never returned.
    pub fn load(&self, settings: &ColorGradeSettings, max_texture_size: u32) -> Option<ColorGradeLut> {
        match self.try_load(settings, max_texture_size) {
            Ok(lut) => lut,
            Err(err) => {
                tracing::warn!("color grade LUT {:?} not loaded: {err}", settings.lut_name);
                None
            }
        }
    }

    /// Like [`load`](Self::load) but surfaces the reason a LUT was rejected.
    ///
    /// `Ok(None)` means grading is disabled or no LUT is configured.
    pub fn try_load(
        &self,
        settings: &ColorGradeSettings,
        max_texture_size: u32,
    ) -> Result<Option<ColorGradeLut>, LutError> {
        if !settings.enabled || settings.lut_name.is_empty() {
            return Ok(None);
        }

        let path = self.paths.resolve(&settings.lut_name)?;
        let source = match LutFormat::from_path(&path)? {
            LutFormat::Cube => {
                let bytes = std::fs::read(&path).map_err(|source| LutError::Io {
                    path: path.clone(),
                    source,
                })?;
                // Comments and titles are often Latin-1; only the numeric rows matter.
                let cube = parse_cube(&String::from_utf8_lossy(&bytes))?;
                if cube.lut.is_empty() {
                    return Err(LutError::EmptyCube);
                }
                let size = cube.lut.size();
                DecodedLut {
                    image: DecodedImage {
                        width: size * size,
                        height: size,
                        components: LUT_CHANNELS as u8,
                        pixels: cube.lut.data,
                    },
                    flip_green: false,
                    swap_blue_red: false,
                }
            }
            LutFormat::Image(format) => DecodedLut {
                image: self.decoder.decode(&path, format)?,
                flip_green: true,
                swap_blue_red: true,
            },
        };

        let lut = source.validate(max_texture_size)?;
        tracing::info!(
            size = lut.size(),
            path = %path.display(),
            "loaded color grade LUT"
        );
        Ok(Some(lut))
    }
}

/// Decoded pixels plus the channel-order flags of their source format.
struct DecodedLut {
    image: DecodedImage,
    flip_green: bool,
    swap_blue_red: bool,
}

impl DecodedLut {
    fn validate(self, max_texture_size: u32) -> Result<ColorGradeLut, LutError> {
        let DecodedImage {
            width,
            height,
            components,
            pixels,
        } = self.image;

        if !matches!(components, 3 | 4) {
            return Err(LutError::InvalidComponents(components));
        }

        let square = u64::from(height) * u64::from(height);
        if height == 0 || height > max_texture_size || square != u64::from(width) {
            return Err(LutError::InvalidGeometry {
                width,
                height,
                max: max_texture_size,
            });
        }

        let expected = square as usize * height as usize * usize::from(components);
        if pixels.len() != expected {
            return Err(LutError::TensorLength {
                expected,
                actual: pixels.len(),
            });
        }

        let rgba = if components == 4 {
            pixels
        } else {
            expand_rgb(&pixels)
        };
        ColorGradeLut::new(height, rgba, self.flip_green, self.swap_blue_red)
    }
}

fn expand_rgb(rgb: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgb.len() / 3 * LUT_CHANNELS);
    for px in rgb.chunks_exact(3) {
        out.extend_from_slice(&[px[0], px[1], px[2], u8::MAX]);
    }
    out
}

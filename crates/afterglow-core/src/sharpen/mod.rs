//! Sharpening method selection.

pub mod cas;

use glam::Vec3;

use crate::render::{Capabilities, Program};
use crate::settings::SharpenSettings;

pub use cas::{CasConstants, cas_setup};

/// Method tags as stored in settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SharpenKind {
    Disabled = 0,
    Cas = 1,
    Dls = 2,
}

impl SharpenKind {
    pub const COUNT: u32 = 3;

    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::Disabled),
            1 => Some(Self::Cas),
            2 => Some(Self::Dls),
            _ => None,
        }
    }
}

/// The active sharpening method with its coefficients.
///
/// CAS constants depend on the source and destination sizes, so only the
/// sharpness is held here; the pipeline derives and caches the constants at
/// render time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SharpenSelection {
    /// Render is a straight copy.
    #[default]
    Disabled,
    Cas { sharpness: f32 },
    /// `(sharpness, denoise, 0)`, each in `[0, 1]`.
    Dls { params: Vec3 },
}

impl SharpenSelection {
    pub fn kind(&self) -> SharpenKind {
        match self {
            Self::Disabled => SharpenKind::Disabled,
            Self::Cas { .. } => SharpenKind::Cas,
            Self::Dls { .. } => SharpenKind::Dls,
        }
    }

    pub fn program(&self) -> Option<Program> {
        match self {
            Self::Disabled => None,
            Self::Cas { .. } => Some(Program::Cas),
            Self::Dls { .. } => Some(Program::Dls),
        }
    }
}

/// Resolve the requested method against `caps`.
///
/// Unknown tags become CAS; CAS without its program becomes DLS; DLS without
/// its program becomes Disabled. Without deferred rendering nothing sharpens.
pub fn resolve_kind(requested: u32, caps: &Capabilities) -> SharpenKind {
    if !caps.deferred_rendering {
        return SharpenKind::Disabled;
    }
    let mut kind = SharpenKind::from_index(requested).unwrap_or_else(|| {
        tracing::debug!(requested, "unknown sharpen method, falling back to CAS");
        SharpenKind::Cas
    });
    if kind == SharpenKind::Cas && !caps.cas_program {
        tracing::debug!("CAS program unavailable, trying DLS");
        kind = SharpenKind::Dls;
    }
    if kind == SharpenKind::Dls && !caps.dls_program {
        tracing::debug!("DLS program unavailable, sharpening disabled");
        kind = SharpenKind::Disabled;
    }
    kind
}

pub fn select_sharpen(settings: &SharpenSettings, caps: &Capabilities) -> SharpenSelection {
    let selection = match resolve_kind(settings.method, caps) {
        SharpenKind::Disabled => SharpenSelection::Disabled,
        SharpenKind::Cas => SharpenSelection::Cas {
            sharpness: settings.cas_sharpness,
        },
        SharpenKind::Dls => SharpenSelection::Dls {
            params: Vec3::new(settings.dls_sharpness, settings.dls_denoise, 0.0)
                .clamp(Vec3::ZERO, Vec3::ONE),
        },
    };
    tracing::debug!(kind = ?selection.kind(), "sharpen method selected");
    selection
}

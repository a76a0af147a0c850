//! Recording render backend for pipeline tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use afterglow_core::render::{
    Capabilities, LutTextureUploader, Program, RenderBackend, RenderTarget, TextureFilter,
    TextureSlot, Uniform, UniformValue,
};
use afterglow_core::{ColorGradeLut, RenderError};

/// Owned copy of a uniform payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    F32(f32),
    I32(i32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    UVec4s(Vec<[u32; 4]>),
}

impl From<UniformValue<'_>> for Recorded {
    fn from(value: UniformValue<'_>) -> Self {
        match value {
            UniformValue::F32(v) => Self::F32(v),
            UniformValue::I32(v) => Self::I32(v),
            UniformValue::Vec2(v) => Self::Vec2(v.to_array()),
            UniformValue::Vec3(v) => Self::Vec3(v.to_array()),
            UniformValue::Vec4(v) => Self::Vec4(v.to_array()),
            UniformValue::UVec4Array(rows) => Self::UVec4s(rows.to_vec()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    BindProgram(Program),
    UnbindProgram(Program),
    Uniform(Uniform, Recorded),
    BindTexture(TextureSlot, TextureFilter),
    UnbindTexture(TextureSlot),
    BindLut(TextureSlot, u64),
    UploadLut { id: u64, size: u32 },
    ReleaseLut(u64),
    Draw,
    Copy,
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

/// CPU-side render target. Draws fill it with the bound program's marker.
#[derive(Debug, Clone)]
pub struct MockTarget {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub binds: usize,
    pub flushes: usize,
    pub writes: usize,
}

impl MockTarget {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
            binds: 0,
            flushes: 0,
            writes: 0,
        }
    }

    /// A target filled with a position-dependent pattern.
    pub fn patterned(width: u32, height: u32) -> Self {
        let mut target = Self::new(width, height);
        for (i, byte) in target.pixels.iter_mut().enumerate() {
            *byte = (i * 31 % 251) as u8;
        }
        target
    }
}

impl RenderTarget for MockTarget {
    fn bind_target(&mut self) {
        self.binds += 1;
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

/// Device texture stand-in that logs its own release.
#[derive(Debug)]
pub struct MockTexture {
    pub id: u64,
    pub size: u32,
    log: CallLog,
}

impl Drop for MockTexture {
    fn drop(&mut self) {
        self.log.borrow_mut().push(Call::ReleaseLut(self.id));
    }
}

pub struct MockBackend {
    pub caps: Capabilities,
    pub log: CallLog,
    pub fail_uploads: bool,
    next_id: u64,
    bound: Option<Program>,
}

impl MockBackend {
    pub fn new(caps: Capabilities) -> Self {
        Self {
            caps,
            log: Rc::new(RefCell::new(Vec::new())),
            fail_uploads: false,
            next_id: 1,
            bound: None,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }

    pub fn programs(&self) -> Vec<Program> {
        self.log
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::BindProgram(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn uniform(&self, uniform: Uniform) -> Option<Recorded> {
        self.log.borrow().iter().rev().find_map(|call| match call {
            Call::Uniform(u, value) if *u == uniform => Some(value.clone()),
            _ => None,
        })
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.log.borrow().iter().filter(|call| pred(call)).count()
    }

    fn push(&self, call: Call) {
        self.log.borrow_mut().push(call);
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new(Capabilities::default())
    }
}

impl LutTextureUploader for MockBackend {
    type Texture = MockTexture;

    fn upload_lut(&mut self, lut: &ColorGradeLut) -> Result<MockTexture, RenderError> {
        if self.fail_uploads {
            return Err(RenderError::Upload("device lost".into()));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.push(Call::UploadLut {
            id,
            size: lut.size(),
        });
        Ok(MockTexture {
            id,
            size: lut.size(),
            log: Rc::clone(&self.log),
        })
    }
}

impl RenderBackend for MockBackend {
    type Target = MockTarget;

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn bind_program(&mut self, program: Program) {
        self.bound = Some(program);
        self.push(Call::BindProgram(program));
    }

    fn unbind_program(&mut self, program: Program) {
        assert_eq!(self.bound, Some(program), "unbinding a program that is not bound");
        self.bound = None;
        self.push(Call::UnbindProgram(program));
    }

    fn set_uniform(&mut self, uniform: Uniform, value: UniformValue<'_>) {
        assert!(self.bound.is_some(), "uniform {uniform:?} set with no program bound");
        self.push(Call::Uniform(uniform, value.into()));
    }

    fn bind_texture(&mut self, slot: TextureSlot, _target: &MockTarget, filter: TextureFilter) {
        self.push(Call::BindTexture(slot, filter));
    }

    fn unbind_texture(&mut self, slot: TextureSlot) {
        self.push(Call::UnbindTexture(slot));
    }

    fn bind_lut(&mut self, slot: TextureSlot, lut: &MockTexture) {
        self.push(Call::BindLut(slot, lut.id));
    }

    fn draw_fullscreen_triangle(&mut self, dst: &mut MockTarget) {
        let marker = self.bound.map_or(0, |p| p.name().len() as u8);
        dst.pixels.fill(marker);
        dst.writes += 1;
        self.push(Call::Draw);
    }

    fn copy_target(&mut self, src: &MockTarget, dst: &mut MockTarget) {
        dst.pixels.clone_from(&src.pixels);
        dst.writes += 1;
        self.push(Call::Copy);
    }
}

/// Write `contents` as `<root>/colorlut/<name>`.
pub fn write_lut(root: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let dir = root.join("colorlut");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// A `.cube` of the given size with every row set to `rgb`.
pub fn flat_cube(size: u32, rgb: [f32; 3]) -> String {
    let mut text = format!("TITLE \"flat\"\nLUT_3D_SIZE {size}\n");
    for _ in 0..size * size * size {
        text.push_str(&format!("{} {} {}\n", rgb[0], rgb[1], rgb[2]));
    }
    text
}

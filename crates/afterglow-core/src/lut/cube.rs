//! Streaming parser for Adobe/Resolve style `.cube` 3D LUT text.
//!
//! Only the subset a color-grade LUT needs is understood:
//!
//! ```text
//! TITLE "name"            recorded, optional
//! LUT_3D_SIZE n           allocates n³ opaque white cells
//! DOMAIN_MIN r g b        recorded, never applied
//! DOMAIN_MAX r g b        recorded, never applied
//! 0.0 0.5 1.0             data row, red index fastest
//! ```
//!
//! Values are mapped from a fixed `[0, 1]` domain to 8 bits. The declared
//! domain is kept on [`CubeFile`] for callers that care, but the tensor does
//! not consult it.

use crate::error::LutError;
use crate::lut::ColorGradeLut;

/// Largest `LUT_3D_SIZE` accepted.
pub const MAX_CUBE_SIZE: u32 = 256;

const SIZE_TOKEN: &str = "LUT_3D_SIZE";
const DOMAIN_MIN_TOKEN: &str = "DOMAIN_MIN";
const DOMAIN_MAX_TOKEN: &str = "DOMAIN_MAX";
const TITLE_TOKEN: &str = "TITLE";

/// Result of parsing a `.cube` document.
#[derive(Debug, Clone)]
pub struct CubeFile {
    /// The RGBA8 tensor. Empty (size 0) when no size line was present.
    pub lut: ColorGradeLut,
    /// `TITLE` value with surrounding quotes removed.
    pub title: Option<String>,
    /// Declared input domain minimum. Default `[0, 0, 0]`.
    pub domain_min: [f32; 3],
    /// Declared input domain maximum. Default `[1, 1, 1]`.
    pub domain_max: [f32; 3],
    /// Data rows dropped because the grid was already full.
    pub excess_rows: usize,
}

/// Write cursor over the cube grid, red fastest.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct LutParseState {
    x: u32,
    y: u32,
    z: u32,
    written: usize,
}

impl LutParseState {
    fn advance(&mut self, size: u32) {
        self.written += 1;
        if self.x != size - 1 {
            self.x += 1;
        } else if self.y != size - 1 {
            self.x = 0;
            self.y += 1;
        } else if self.z != size - 1 {
            self.x = 0;
            self.y = 0;
            self.z += 1;
        }
    }
}

/// Parse the full text of a `.cube` file.
///
/// Blank lines and `#` comments are skipped. Any malformed number aborts the
/// whole parse. A document without `LUT_3D_SIZE` yields an empty table, not
/// an error; the loader decides what that means.
pub fn parse_cube(text: &str) -> Result<CubeFile, LutError> {
    let mut out = CubeFile {
        lut: ColorGradeLut::white(0),
        title: None,
        domain_min: [0.0; 3],
        domain_max: [1.0; 3],
        excess_rows: 0,
    };
    let mut cursor = LutParseState::default();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = skip_whitespace(raw);
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix(TITLE_TOKEN) {
            out.title = Some(rest.trim().trim_matches('"').to_string());
            continue;
        }

        if let Some(rest) = after_token(line, SIZE_TOKEN) {
            let size = parse_size(rest, line_no)?;
            out.lut = ColorGradeLut::white(size);
            cursor = LutParseState::default();
            continue;
        }
        if let Some(rest) = after_token(line, DOMAIN_MIN_TOKEN) {
            out.domain_min = split_triple(rest, line_no)?;
            continue;
        }
        if let Some(rest) = after_token(line, DOMAIN_MAX_TOKEN) {
            out.domain_max = split_triple(rest, line_no)?;
            continue;
        }

        if line.starts_with(|c: char| c.is_ascii_digit()) {
            let size = out.lut.size();
            if size == 0 {
                return Err(LutError::DataBeforeSize { line: line_no });
            }
            let rgb = split_triple(line, line_no)?;
            let capacity = (size as usize).pow(3);
            if cursor.written >= capacity {
                out.excess_rows += 1;
                continue;
            }
            out.lut
                .write_rgb(cursor.x, cursor.y, cursor.z, rgb.map(unit_to_u8));
            cursor.advance(size);
        }
        // Anything else (LUT_1D_SIZE, vendor keywords, negative rows) is ignored.
    }

    if out.excess_rows > 0 {
        tracing::warn!(
            excess_rows = out.excess_rows,
            size = out.lut.size(),
            "cube LUT has more data rows than LUT_3D_SIZE allows; extra rows ignored"
        );
    } else if !out.lut.is_empty() && cursor.written < (out.lut.size() as usize).pow(3) {
        tracing::debug!(
            rows = cursor.written,
            size = out.lut.size(),
            "cube LUT is short; remaining cells stay white"
        );
    }

    Ok(out)
}

/// Map a `[0, 1]` channel value to 8 bits, clamping out-of-domain input.
pub fn unit_to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn skip_whitespace(text: &str) -> &str {
    text.trim_start_matches([' ', '\t'])
}

fn after_token<'a>(line: &'a str, token: &str) -> Option<&'a str> {
    line.find(token).map(|at| &line[at + token.len()..])
}

fn parse_size(rest: &str, line: usize) -> Result<u32, LutError> {
    let rest = skip_whitespace(rest);
    let digits_end = rest
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map_or(rest.len(), |(i, _)| i);
    let token = &rest[..digits_end];
    let size: i64 = token.parse().map_err(|_| LutError::Parse {
        line,
        message: format!("LUT_3D_SIZE expects an integer, found {:?}", rest.trim()),
    })?;
    if size < 1 || size > i64::from(MAX_CUBE_SIZE) {
        return Err(LutError::InvalidSize {
            line,
            size,
            max: MAX_CUBE_SIZE,
        });
    }
    Ok(size as u32)
}

fn split_triple(text: &str, line: usize) -> Result<[f32; 3], LutError> {
    let mut tokens = text.split_whitespace();
    let mut out = [0.0f32; 3];
    for slot in &mut out {
        let token = tokens.next().ok_or_else(|| LutError::Parse {
            line,
            message: "expected three values".to_string(),
        })?;
        *slot = token.parse().map_err(|_| LutError::Parse {
            line,
            message: format!("invalid number {token:?}"),
        })?;
    }
    Ok(out)
}

//! TrueType/OpenType font parsing for PDF embedding.
//!
//! Wraps `ttf-parser` to pull out what a CIDFontType2 needs: metrics for
//! the FontDescriptor, a Unicode to glyph map and per-glyph advances. The
//! raw program is kept so it can be embedded as FontFile2 and handed to the
//! shaper.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use ttf_parser::{Face, GlyphId};

/// Error types for TrueType font parsing.
#[derive(Debug, thiserror::Error)]
pub enum TrueTypeError {
    /// Failed to parse font file
    #[error("Failed to parse font file: {0}")]
    ParseError(String),

    /// Font file is empty
    #[error("Font file is empty")]
    EmptyFont,

    /// IO error while reading the font file
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Result type for TrueType operations.
pub type TrueTypeResult<T> = Result<T, TrueTypeError>;

/// Font metrics extracted for the PDF FontDescriptor.
#[derive(Debug, Clone)]
pub struct FontMetrics {
    /// PostScript name
    pub name: String,
    /// Units per em
    pub units_per_em: u16,
    /// Ascender (positive)
    pub ascender: i16,
    /// Descender (negative)
    pub descender: i16,
    /// Cap height
    pub cap_height: i16,
    /// Italic angle
    pub italic_angle: f32,
    /// Bounding box (llx, lly, urx, ury)
    pub bbox: (i16, i16, i16, i16),
    /// Stem V (vertical stem width), estimated from weight
    pub stem_v: i16,
    /// Font flags (PDF Table 123)
    pub flags: u32,
}

impl FontMetrics {
    fn from_face(face: &Face<'_>) -> Self {
        let name = face
            .names()
            .into_iter()
            .find(|name| name.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .and_then(|name| name.to_string())
            .map(|name| sanitize_postscript_name(&name))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "EmbeddedFont".to_string());

        let bbox = face.global_bounding_box();

        let mut flags = 0u32;
        // Bit 1: FixedPitch
        if face.is_monospaced() {
            flags |= 1 << 0;
        }
        // Bit 6: Nonsymbolic
        flags |= 1 << 5;
        // Bit 7: Italic
        if face.is_italic() {
            flags |= 1 << 6;
        }

        Self {
            name,
            units_per_em: face.units_per_em(),
            ascender: face.ascender(),
            descender: face.descender(),
            cap_height: face.capital_height().unwrap_or(face.ascender()),
            italic_angle: face.italic_angle().unwrap_or(0.0),
            bbox: (bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max),
            stem_v: if face.is_bold() { 140 } else { 80 },
            flags,
        }
    }

    /// Convert a value from font units to PDF units (1/1000 em).
    pub fn to_pdf_units(&self, value: i16) -> i32 {
        (value as i32 * 1000) / self.units_per_em.max(1) as i32
    }

    /// Bounding box in PDF units.
    pub fn pdf_bbox(&self) -> (i32, i32, i32, i32) {
        (
            self.to_pdf_units(self.bbox.0),
            self.to_pdf_units(self.bbox.1),
            self.to_pdf_units(self.bbox.2),
            self.to_pdf_units(self.bbox.3),
        )
    }
}

/// PostScript names may only hold printable ASCII minus delimiters.
fn sanitize_postscript_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_graphic() && !"[](){}<>/%".contains(*c))
        .collect()
}

/// An owned, parsed TrueType program.
#[derive(Debug)]
pub struct FontProgram {
    data: Vec<u8>,
    metrics: FontMetrics,
    /// BMP code point -> glyph ID
    cmap: HashMap<char, u16>,
    /// Horizontal advance per glyph, in font units
    advances: Vec<u16>,
}

impl FontProgram {
    /// Parse a TrueType/OpenType font from raw data.
    pub fn parse(data: Vec<u8>) -> TrueTypeResult<Self> {
        if data.is_empty() {
            return Err(TrueTypeError::EmptyFont);
        }

        let face = Face::parse(&data, 0).map_err(|e| TrueTypeError::ParseError(e.to_string()))?;
        let metrics = FontMetrics::from_face(&face);

        let mut cmap = HashMap::new();
        for codepoint in 0..=0xFFFF_u32 {
            if let Some(ch) = char::from_u32(codepoint) {
                if let Some(glyph) = face.glyph_index(ch) {
                    cmap.insert(ch, glyph.0);
                }
            }
        }

        let advances = (0..face.number_of_glyphs())
            .map(|gid| face.glyph_hor_advance(GlyphId(gid)).unwrap_or(0))
            .collect();

        drop(face);
        Ok(Self {
            data,
            metrics,
            cmap,
            advances,
        })
    }

    /// Read and parse a font file.
    pub fn from_file(path: impl AsRef<Path>) -> TrueTypeResult<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::parse(data)
    }

    /// Raw font program bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// FontDescriptor metrics.
    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    /// Units per em.
    pub fn units_per_em(&self) -> u16 {
        self.metrics.units_per_em
    }

    /// Glyph for a character, if the font covers it.
    pub fn glyph_id(&self, ch: char) -> Option<u16> {
        self.cmap.get(&ch).copied()
    }

    /// Glyph advance in 1/1000 em.
    pub fn advance(&self, gid: u16) -> f32 {
        let units = self.advances.get(gid as usize).copied().unwrap_or(0);
        units as f32 * 1000.0 / self.units_per_em().max(1) as f32
    }

    /// Convert a shaper advance (font units) to 1/1000 em.
    pub fn units_to_thousandths(&self, units: i32) -> f32 {
        units as f32 * 1000.0 / self.units_per_em().max(1) as f32
    }
}

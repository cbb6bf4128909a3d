//! Font management for PDF generation.
//!
//! A document uses exactly one font resource, either Base-14 Helvetica
//! (WinAnsi single-byte codes) or an embedded TrueType program drawn as a
//! Type0/CIDFontType2 font with Identity-H encoding. The embedded variant
//! tracks which glyphs were drawn so it can emit the `W` array and a
//! ToUnicode CMap when the document is finished.

use super::content_stream::TextArrayItem;
use crate::fonts::{FontResource, FontProgram, ShapedLine, TextShaper};
use crate::object::Object;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Widths of WinAnsi codes 32..=126 in Helvetica, 1/1000 em.
const HELVETICA_ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Width used for Latin-1 supplement characters.
const HELVETICA_DEFAULT_WIDTH: u16 = 556;

/// Text ready to be placed on a page.
#[derive(Debug, Clone)]
pub enum PreparedText {
    /// WinAnsi codes for the builtin font
    Codes(Vec<u8>),
    /// Shaped glyphs for the embedded font
    Glyphs(ShapedLine),
}

impl PreparedText {
    /// True when nothing would be drawn.
    pub fn is_empty(&self) -> bool {
        match self {
            PreparedText::Codes(codes) => codes.is_empty(),
            PreparedText::Glyphs(line) => line.is_empty(),
        }
    }
}

/// The single font resource of a document.
#[derive(Debug)]
pub enum PdfFont {
    /// Base-14 Helvetica
    Helvetica,
    /// Embedded TrueType program
    Embedded(EmbeddedFont),
}

impl PdfFont {
    /// Build the document font for a resolved resource.
    pub fn for_resource(resource: &FontResource, shaping: bool) -> Self {
        match resource {
            FontResource::Builtin => PdfFont::Helvetica,
            FontResource::Embedded(program) => {
                PdfFont::Embedded(EmbeddedFont::new(Arc::clone(program), shaping))
            },
        }
    }

    /// Encode or shape a string.
    pub fn prepare(&self, text: &str) -> PreparedText {
        match self {
            PdfFont::Helvetica => PreparedText::Codes(text.chars().map(win_ansi_code).collect()),
            PdfFont::Embedded(font) => PreparedText::Glyphs(font.shaper.shape(text)),
        }
    }

    /// Width of prepared text in points.
    pub fn width(&self, text: &PreparedText, font_size: f32) -> f32 {
        let thousandths: f32 = match text {
            PreparedText::Codes(codes) => codes.iter().map(|&c| helvetica_width(c) as f32).sum(),
            PreparedText::Glyphs(line) => line.advance(),
        };
        thousandths * font_size / 1000.0
    }

    /// Width of a string in points.
    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        self.width(&self.prepare(text), font_size)
    }
}

/// Map a character to its WinAnsi code; unsupported characters become `?`.
fn win_ansi_code(ch: char) -> u8 {
    match ch as u32 {
        code @ 0x20..=0x7E => code as u8,
        code @ 0xA0..=0xFF => code as u8,
        _ => b'?',
    }
}

fn helvetica_width(code: u8) -> u16 {
    match code {
        0x20..=0x7E => HELVETICA_ASCII_WIDTHS[(code - 0x20) as usize],
        _ => HELVETICA_DEFAULT_WIDTH,
    }
}

/// Embedded TrueType font with glyph usage tracking.
#[derive(Debug)]
pub struct EmbeddedFont {
    shaper: TextShaper,
    /// GID -> source text, for ToUnicode
    used: BTreeMap<u16, String>,
}

impl EmbeddedFont {
    /// Wrap a font program.
    pub fn new(program: Arc<FontProgram>, shaping: bool) -> Self {
        Self {
            shaper: TextShaper::new(program, shaping),
            used: BTreeMap::new(),
        }
    }

    /// The underlying font program.
    pub fn program(&self) -> &FontProgram {
        self.shaper.program()
    }

    /// Check if any glyph has been drawn.
    pub fn is_used(&self) -> bool {
        !self.used.is_empty()
    }

    /// Width the viewer assumes for a glyph (the `W` entry), 1/1000 em.
    fn declared_width(&self, gid: u16) -> f32 {
        self.program().advance(gid).round()
    }

    /// Record a shaped line and turn it into a TJ array.
    ///
    /// Glyphs are grouped into hex strings; where the shaped advance differs
    /// from the declared width an adjustment is inserted.
    pub fn encode(&mut self, line: &ShapedLine) -> Vec<TextArrayItem> {
        let mut items = Vec::new();
        let mut hex = String::new();

        for glyph in &line.glyphs {
            let entry = self.used.entry(glyph.gid).or_default();
            if entry.is_empty() && !glyph.text.is_empty() {
                *entry = glyph.text.clone();
            }

            hex.push_str(&format!("{:04X}", glyph.gid));
            let adjustment = self.declared_width(glyph.gid) - glyph.advance;
            if adjustment.abs() >= 0.5 {
                items.push(TextArrayItem::HexText(format!("<{}>", hex)));
                items.push(TextArrayItem::Adjustment(adjustment.round()));
                hex.clear();
            }
        }

        if !hex.is_empty() {
            items.push(TextArrayItem::HexText(format!("<{}>", hex)));
        }
        items
    }

    /// CID widths array for the `W` entry: `[start [w1 w2 ...] ...]`.
    pub fn widths_array(&self) -> Object {
        let glyphs: Vec<u16> = self.used.keys().copied().collect();
        let mut result = Vec::new();

        let mut i = 0;
        while i < glyphs.len() {
            let start = glyphs[i];
            let mut widths = vec![Object::Integer(self.declared_width(start) as i64)];

            while i + 1 < glyphs.len() && glyphs[i + 1] == glyphs[i] + 1 {
                i += 1;
                widths.push(Object::Integer(self.declared_width(glyphs[i]) as i64));
            }

            result.push(Object::Integer(start as i64));
            result.push(Object::Array(widths));
            i += 1;
        }

        Object::Array(result)
    }

    /// ToUnicode CMap mapping drawn glyphs back to their source text.
    pub fn tounicode_cmap(&self) -> String {
        let mut cmap = String::new();

        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo <<\n");
        cmap.push_str("  /Registry (Adobe)\n");
        cmap.push_str("  /Ordering (UCS)\n");
        cmap.push_str("  /Supplement 0\n");
        cmap.push_str(">> def\n");
        cmap.push_str("/CMapName /Adobe-Identity-UCS def\n");
        cmap.push_str("/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n");
        cmap.push_str("<0000> <FFFF>\n");
        cmap.push_str("endcodespacerange\n");

        let mappings: Vec<(u16, &str)> = self
            .used
            .iter()
            .filter(|(_, text)| !text.is_empty())
            .map(|(&gid, text)| (gid, text.as_str()))
            .collect();

        // At most 100 entries per bfchar section
        for chunk in mappings.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for &(gid, text) in chunk {
                let utf16: String = text.encode_utf16().map(|u| format!("{:04X}", u)).collect();
                cmap.push_str(&format!("<{:04X}> <{}>\n", gid, utf16));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\n");
        cmap.push_str("end\n");

        cmap
    }
}

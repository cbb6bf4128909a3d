//! Text shaping for right-to-left scripts.
//!
//! Persian needs contextual letter forms and visual reordering before it can
//! be drawn with a plain `Tj`. With the `shaping` feature the text is split
//! into bidi runs (unicode-bidi) and each run is shaped with rustybuzz;
//! glyphs come out in visual order, left to right. Without it, characters
//! map one-to-one to glyphs in logical order.

use super::truetype_parser::FontProgram;
use std::sync::Arc;

/// One positioned glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedGlyph {
    /// Glyph ID (equals CID under Identity-H)
    pub gid: u16,
    /// Advance in 1/1000 em
    pub advance: f32,
    /// Source text this glyph stands for, used for ToUnicode
    pub text: String,
}

/// A shaped line, glyphs in visual order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapedLine {
    /// Glyphs left to right
    pub glyphs: Vec<ShapedGlyph>,
}

impl ShapedLine {
    /// Total advance in 1/1000 em.
    pub fn advance(&self) -> f32 {
        self.glyphs.iter().map(|g| g.advance).sum()
    }

    /// Width in points at `font_size`.
    pub fn width(&self, font_size: f32) -> f32 {
        self.advance() * font_size / 1000.0
    }

    /// True when nothing would be drawn.
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// Turns strings into glyph runs for one embedded font.
#[derive(Debug, Clone)]
pub struct TextShaper {
    program: Arc<FontProgram>,
    complex: bool,
}

impl TextShaper {
    /// Create a shaper. `complex` requests bidi + OpenType shaping; it is
    /// ignored when the crate is built without the `shaping` feature.
    pub fn new(program: Arc<FontProgram>, complex: bool) -> Self {
        if complex && !cfg!(feature = "shaping") {
            log::warn!("Shaping requested but not compiled in; text will be drawn unshaped");
        }
        Self {
            program,
            complex: complex && cfg!(feature = "shaping"),
        }
    }

    /// The font glyphs are produced for.
    pub fn program(&self) -> &Arc<FontProgram> {
        &self.program
    }

    /// Shape a single line of text.
    pub fn shape(&self, text: &str) -> ShapedLine {
        #[cfg(feature = "shaping")]
        if self.complex {
            if let Some(line) = complex::shape(&self.program, text) {
                return line;
            }
            log::debug!("Shaper rejected the font program; drawing unshaped");
        }
        self.shape_simple(text)
    }

    /// Cmap lookup in logical order. Unmapped characters use glyph 0.
    fn shape_simple(&self, text: &str) -> ShapedLine {
        let glyphs = text
            .chars()
            .map(|ch| {
                let gid = self.program.glyph_id(ch).unwrap_or(0);
                ShapedGlyph {
                    gid,
                    advance: self.program.advance(gid),
                    text: ch.to_string(),
                }
            })
            .collect();
        ShapedLine { glyphs }
    }
}

/// Visual runs of a single line as `(byte range, is_rtl)`, left to right.
#[cfg(feature = "shaping")]
pub fn visual_runs(text: &str) -> Vec<(std::ops::Range<usize>, bool)> {
    use unicode_bidi::BidiInfo;

    let bidi = BidiInfo::new(text, None);
    let mut out = Vec::new();
    for para in &bidi.paragraphs {
        let (levels, runs) = bidi.visual_runs(para, para.range.clone());
        for run in runs {
            let rtl = levels[run.start].is_rtl();
            out.push((run, rtl));
        }
    }
    out
}

#[cfg(feature = "shaping")]
mod complex {
    use super::{visual_runs, ShapedGlyph, ShapedLine};
    use crate::fonts::truetype_parser::FontProgram;
    use rustybuzz::{Direction, Face, UnicodeBuffer};

    pub(super) fn shape(program: &FontProgram, text: &str) -> Option<ShapedLine> {
        let face = Face::from_slice(program.data(), 0)?;
        let mut glyphs = Vec::new();

        for (range, rtl) in visual_runs(text) {
            let run = &text[range];
            if run.is_empty() {
                continue;
            }

            let mut buffer = UnicodeBuffer::new();
            buffer.push_str(run);
            buffer.guess_segment_properties();
            buffer.set_direction(if rtl {
                Direction::RightToLeft
            } else {
                Direction::LeftToRight
            });

            let output = rustybuzz::shape(&face, &[], buffer);
            let clusters = cluster_texts(run, output.glyph_infos().iter().map(|i| i.cluster));

            for ((info, pos), text) in output
                .glyph_infos()
                .iter()
                .zip(output.glyph_positions())
                .zip(clusters)
            {
                glyphs.push(ShapedGlyph {
                    gid: u16::try_from(info.glyph_id).unwrap_or(0),
                    advance: program.units_to_thousandths(pos.x_advance),
                    text,
                });
            }
        }

        Some(ShapedLine { glyphs })
    }

    /// Source text for each glyph. A cluster spans from its start byte to the
    /// next larger cluster start; only the first glyph of a cluster carries it.
    pub(super) fn cluster_texts(run: &str, clusters: impl Iterator<Item = u32>) -> Vec<String> {
        let clusters: Vec<usize> = clusters.map(|c| c as usize).collect();
        let mut starts = clusters.clone();
        starts.sort_unstable();
        starts.dedup();

        let mut seen = std::collections::HashSet::new();
        clusters
            .iter()
            .map(|&start| {
                if !seen.insert(start) {
                    return String::new();
                }
                let end = starts
                    .iter()
                    .copied()
                    .find(|&s| s > start)
                    .unwrap_or(run.len());
                run.get(start..end).unwrap_or_default().to_string()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    #[cfg(feature = "shaping")]
    use super::*;

    #[cfg(feature = "shaping")]
    #[test]
    fn test_visual_runs_pure_rtl() {
        let runs = visual_runs("سلام");
        assert_eq!(runs.len(), 1);
        assert!(runs[0].1);
    }

    #[cfg(feature = "shaping")]
    #[test]
    fn test_visual_runs_digits_after_persian() {
        // "ساعت 8:30" laid out visually: the digits sit to the left
        let text = "ساعت 8:30";
        let runs = visual_runs(text);
        assert!(runs.len() >= 2);
        let first = &text[runs[0].0.clone()];
        assert!(first.contains("8:30"));
        assert!(!runs[0].1);
        assert!(runs.last().unwrap().1);
    }

    #[cfg(feature = "shaping")]
    #[test]
    fn test_visual_runs_ltr_only() {
        let runs = visual_runs("1,234,567");
        assert_eq!(runs, vec![(0..9, false)]);
    }

    #[cfg(feature = "shaping")]
    #[test]
    fn test_cluster_texts_rtl_order() {
        // RTL output lists clusters in descending order
        let texts = complex::cluster_texts("abc", [2u32, 1, 0].into_iter());
        assert_eq!(texts, vec!["c", "b", "a"]);
    }

    #[cfg(feature = "shaping")]
    #[test]
    fn test_cluster_texts_ligature() {
        // Two glyphs for one cluster, then a two-char ligature
        let texts = complex::cluster_texts("abcd", [0u32, 0, 2].into_iter());
        assert_eq!(texts, vec!["ab".to_string(), String::new(), "cd".to_string()]);
    }
}

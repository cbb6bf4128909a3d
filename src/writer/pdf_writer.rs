//! PDF document writer.
//!
//! Assembles complete PDF documents with proper structure:
//! header, body, xref table, and trailer.

use super::content_stream::{Color, ContentStreamBuilder};
use super::font_manager::{EmbeddedFont, PdfFont, PreparedText};
use super::object_serializer::ObjectSerializer;
use crate::object::{Object, ObjectRef};
use chrono::{DateTime, Local, Offset};
use std::io::{self, Write};

/// Resource name the document font is registered under.
pub const FONT_RESOURCE: &str = "F1";

/// Configuration for PDF generation.
#[derive(Debug, Clone)]
pub struct PdfWriterConfig {
    /// PDF version (e.g., "1.7")
    pub version: String,
    /// Document title
    pub title: Option<String>,
    /// Document subject
    pub subject: Option<String>,
    /// Creator application
    pub creator: Option<String>,
    /// Creation timestamp
    pub creation_date: Option<DateTime<Local>>,
    /// Whether to compress streams
    pub compress: bool,
}

impl Default for PdfWriterConfig {
    fn default() -> Self {
        Self {
            version: "1.7".to_string(),
            title: None,
            subject: None,
            creator: Some(concat!("payslip_oxide ", env!("CARGO_PKG_VERSION")).to_string()),
            creation_date: None,
            compress: false,
        }
    }
}

impl PdfWriterConfig {
    /// Set document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set document subject.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the creation timestamp.
    pub fn with_creation_date(mut self, date: DateTime<Local>) -> Self {
        self.creation_date = Some(date);
        self
    }

    /// Enable or disable stream compression.
    ///
    /// When enabled, content streams and embedded font data are compressed
    /// using FlateDecode.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

/// Compress data using Flate/Deflate compression.
fn compress_data(data: &[u8]) -> io::Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// PDF date string, e.g. `D:20240321143000+03'30'`.
fn pdf_date(date: &DateTime<Local>) -> String {
    let offset = date.offset().fix().local_minus_utc();
    let sign = if offset < 0 { '-' } else { '+' };
    let minutes = offset.abs() / 60;
    format!(
        "D:{}{}{:02}'{:02}'",
        date.format("%Y%m%d%H%M%S"),
        sign,
        minutes / 60,
        minutes % 60
    )
}

/// Horizontal anchoring of drawn text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    /// `x` is the left edge
    Left,
    /// `x` is the center
    #[default]
    Center,
    /// `x` is the right edge
    Right,
}

/// A page being built.
pub struct PageBuilder<'a> {
    writer: &'a mut PdfWriter,
    page_index: usize,
}

impl<'a> PageBuilder<'a> {
    fn content(&mut self) -> &mut ContentStreamBuilder {
        &mut self.writer.pages[self.page_index].content_builder
    }

    /// Width of `text` in points at `font_size`.
    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        self.writer.font.text_width(text, font_size)
    }

    /// Draw a single line of text anchored at `x` with baseline `y`.
    ///
    /// Returns the drawn width. Empty strings draw nothing.
    pub fn draw_text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        font_size: f32,
        align: TextAlign,
        color: Color,
    ) -> f32 {
        let prepared = self.writer.font.prepare(text);
        if prepared.is_empty() {
            return 0.0;
        }
        let width = self.writer.font.width(&prepared, font_size);
        let left = match align {
            TextAlign::Left => x,
            TextAlign::Center => x - width / 2.0,
            TextAlign::Right => x - width,
        };

        let content = &mut self.writer.pages[self.page_index].content_builder;
        content.fill_color(color).set_font(FONT_RESOURCE, font_size);
        match (prepared, &mut self.writer.font) {
            (PreparedText::Codes(codes), _) => {
                content.text(codes, left, y);
            },
            (PreparedText::Glyphs(line), PdfFont::Embedded(font)) => {
                let items = font.encode(&line);
                content.text_array(items, left, y);
            },
            (PreparedText::Glyphs(_), PdfFont::Helvetica) => {},
        }
        width
    }

    /// Fill a rectangle.
    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) -> &mut Self {
        self.content().fill_color(color).rect(x, y, width, height).fill();
        self
    }

    /// Stroke a rectangle outline.
    pub fn stroke_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
        line_width: f32,
    ) -> &mut Self {
        self.content()
            .stroke_color(color)
            .set_line_width(line_width)
            .rect(x, y, width, height)
            .stroke();
        self
    }

    /// Whether anything has been drawn on this page.
    pub fn is_blank(&self) -> bool {
        self.writer.pages[self.page_index].content_builder.is_empty()
    }

    /// Finish building this page and return to the writer.
    pub fn finish(self) -> &'a mut PdfWriter {
        self.writer.pages[self.page_index].content_builder.end_text();
        self.writer
    }
}

/// Internal page data.
struct PageData {
    width: f32,
    height: f32,
    content_builder: ContentStreamBuilder,
}

/// PDF document writer.
///
/// Builds a complete PDF document with pages drawn in a single font.
pub struct PdfWriter {
    config: PdfWriterConfig,
    pages: Vec<PageData>,
    font: PdfFont,
    /// Object ID counter
    next_obj_id: u32,
}

impl PdfWriter {
    /// Create a PDF writer drawing with `font`.
    pub fn new(config: PdfWriterConfig, font: PdfFont) -> Self {
        Self {
            config,
            pages: Vec::new(),
            font,
            next_obj_id: 1,
        }
    }

    /// Allocate a new object ID.
    fn alloc_ref(&mut self) -> ObjectRef {
        let id = self.next_obj_id;
        self.next_obj_id += 1;
        ObjectRef::new(id)
    }

    /// Add a page with the given dimensions.
    pub fn add_page(&mut self, width: f32, height: f32) -> PageBuilder<'_> {
        let page_index = self.pages.len();
        self.pages.push(PageData {
            width,
            height,
            content_builder: ContentStreamBuilder::new(),
        });
        PageBuilder {
            writer: self,
            page_index,
        }
    }

    /// Add a landscape A4 page (297mm x 210mm).
    pub fn add_a4_landscape_page(&mut self) -> PageBuilder<'_> {
        self.add_page(842.0, 595.0)
    }

    /// Build a stream object, compressing it when configured.
    fn stream(&self, mut entries: Vec<(&str, Object)>, data: Vec<u8>) -> Object {
        let data = if self.config.compress {
            match compress_data(&data) {
                Ok(compressed) => {
                    entries.push(("Filter", ObjectSerializer::name("FlateDecode")));
                    compressed
                },
                Err(e) => {
                    log::warn!("Stream compression failed, writing uncompressed: {}", e);
                    data
                },
            }
        } else {
            data
        };
        Object::Stream {
            dict: ObjectSerializer::dict_entries(entries),
            data: bytes::Bytes::from(data),
        }
    }

    /// Create the font objects; returns the reference to put in page resources.
    fn font_objects(&mut self, objects: &mut Vec<(ObjectRef, Object)>) -> ObjectRef {
        let font_ref = self.alloc_ref();
        let embedded = match &self.font {
            PdfFont::Helvetica => None,
            PdfFont::Embedded(font) => Some(font),
        };

        let Some(font) = embedded else {
            objects.push((
                font_ref,
                ObjectSerializer::dict(vec![
                    ("Type", ObjectSerializer::name("Font")),
                    ("Subtype", ObjectSerializer::name("Type1")),
                    ("BaseFont", ObjectSerializer::name("Helvetica")),
                    ("Encoding", ObjectSerializer::name("WinAnsiEncoding")),
                ]),
            ));
            return font_ref;
        };

        let cid_ref = ObjectRef::new(self.next_obj_id);
        let descriptor_ref = ObjectRef::new(self.next_obj_id + 1);
        let file_ref = ObjectRef::new(self.next_obj_id + 2);
        let tounicode_ref = ObjectRef::new(self.next_obj_id + 3);
        self.next_obj_id += 4;

        let font_objects = self.embedded_font_objects(
            font,
            [font_ref, cid_ref, descriptor_ref, file_ref, tounicode_ref],
        );
        objects.extend(font_objects);
        font_ref
    }

    fn embedded_font_objects(&self, font: &EmbeddedFont, refs: [ObjectRef; 5]) -> Vec<(ObjectRef, Object)> {
        let [font_ref, cid_ref, descriptor_ref, file_ref, tounicode_ref] = refs;
        let program = font.program();
        let metrics = program.metrics();
        let base_font = ObjectSerializer::name(&metrics.name);
        let (llx, lly, urx, ury) = metrics.pdf_bbox();

        log::debug!(
            "Embedding font {} ({} bytes, used: {})",
            metrics.name,
            program.data().len(),
            font.is_used()
        );

        let type0 = ObjectSerializer::dict(vec![
            ("Type", ObjectSerializer::name("Font")),
            ("Subtype", ObjectSerializer::name("Type0")),
            ("BaseFont", base_font.clone()),
            ("Encoding", ObjectSerializer::name("Identity-H")),
            ("DescendantFonts", Object::Array(vec![cid_ref.into()])),
            ("ToUnicode", tounicode_ref.into()),
        ]);

        let cid_font = ObjectSerializer::dict(vec![
            ("Type", ObjectSerializer::name("Font")),
            ("Subtype", ObjectSerializer::name("CIDFontType2")),
            ("BaseFont", base_font.clone()),
            (
                "CIDSystemInfo",
                ObjectSerializer::dict(vec![
                    ("Registry", ObjectSerializer::string("Adobe")),
                    ("Ordering", ObjectSerializer::string("Identity")),
                    ("Supplement", ObjectSerializer::integer(0)),
                ]),
            ),
            ("FontDescriptor", descriptor_ref.into()),
            ("CIDToGIDMap", ObjectSerializer::name("Identity")),
            ("W", font.widths_array()),
        ]);

        let descriptor = ObjectSerializer::dict(vec![
            ("Type", ObjectSerializer::name("FontDescriptor")),
            ("FontName", base_font),
            ("Flags", ObjectSerializer::integer(metrics.flags as i64)),
            (
                "FontBBox",
                Object::Array(vec![
                    Object::Integer(llx as i64),
                    Object::Integer(lly as i64),
                    Object::Integer(urx as i64),
                    Object::Integer(ury as i64),
                ]),
            ),
            ("ItalicAngle", ObjectSerializer::real(metrics.italic_angle as f64)),
            ("Ascent", ObjectSerializer::integer(metrics.to_pdf_units(metrics.ascender) as i64)),
            ("Descent", ObjectSerializer::integer(metrics.to_pdf_units(metrics.descender) as i64)),
            ("CapHeight", ObjectSerializer::integer(metrics.to_pdf_units(metrics.cap_height) as i64)),
            ("StemV", ObjectSerializer::integer(metrics.stem_v as i64)),
            ("FontFile2", file_ref.into()),
        ]);

        let font_file = self.stream(
            vec![("Length1", ObjectSerializer::integer(program.data().len() as i64))],
            program.data().to_vec(),
        );
        let tounicode = self.stream(Vec::new(), font.tounicode_cmap().into_bytes());

        vec![
            (font_ref, type0),
            (cid_ref, cid_font),
            (descriptor_ref, descriptor),
            (file_ref, font_file),
            (tounicode_ref, tounicode),
        ]
    }

    fn info_object(&self) -> Object {
        let mut info_entries = Vec::new();
        if let Some(title) = &self.config.title {
            info_entries.push(("Title", ObjectSerializer::text_string(title)));
        }
        if let Some(subject) = &self.config.subject {
            info_entries.push(("Subject", ObjectSerializer::text_string(subject)));
        }
        if let Some(creator) = &self.config.creator {
            info_entries.push(("Creator", ObjectSerializer::text_string(creator)));
            info_entries.push(("Producer", ObjectSerializer::text_string(creator)));
        }
        if let Some(date) = &self.config.creation_date {
            info_entries.push(("CreationDate", ObjectSerializer::string(&pdf_date(date))));
        }
        ObjectSerializer::dict(info_entries)
    }

    /// Build the complete PDF document.
    pub fn finish(mut self) -> io::Result<Vec<u8>> {
        let serializer = ObjectSerializer::compact();
        let mut objects: Vec<(ObjectRef, Object)> = Vec::new();

        let catalog_ref = self.alloc_ref();
        let pages_ref = self.alloc_ref();
        let font_ref = self.font_objects(&mut objects);

        let resources = ObjectSerializer::dict(vec![(
            "Font",
            ObjectSerializer::dict(vec![(FONT_RESOURCE, font_ref.into())]),
        )]);

        let mut page_refs = Vec::with_capacity(self.pages.len());
        let mut pages = std::mem::take(&mut self.pages);
        for page in &mut pages {
            let page_ref = self.alloc_ref();
            let content_ref = self.alloc_ref();

            let content = self.stream(Vec::new(), page.content_builder.build()?);
            let page_obj = ObjectSerializer::dict(vec![
                ("Type", ObjectSerializer::name("Page")),
                ("Parent", pages_ref.into()),
                (
                    "MediaBox",
                    ObjectSerializer::rect(0.0, 0.0, page.width as f64, page.height as f64),
                ),
                ("Contents", content_ref.into()),
                ("Resources", resources.clone()),
            ]);

            page_refs.push(Object::from(page_ref));
            objects.push((page_ref, page_obj));
            objects.push((content_ref, content));
        }

        objects.push((
            pages_ref,
            ObjectSerializer::dict(vec![
                ("Type", ObjectSerializer::name("Pages")),
                ("Count", ObjectSerializer::integer(page_refs.len() as i64)),
                ("Kids", Object::Array(page_refs)),
            ]),
        ));
        objects.push((
            catalog_ref,
            ObjectSerializer::dict(vec![
                ("Type", ObjectSerializer::name("Catalog")),
                ("Pages", pages_ref.into()),
            ]),
        ));

        let info_ref = self.alloc_ref();
        objects.push((info_ref, self.info_object()));
        objects.sort_by_key(|(r, _)| *r);

        let mut output = Vec::new();
        writeln!(output, "%PDF-{}", self.config.version)?;
        // Binary marker
        output.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

        let mut offsets = Vec::with_capacity(objects.len());
        for (obj_ref, obj) in &objects {
            offsets.push(output.len());
            serializer.write_indirect(&mut output, *obj_ref, obj)?;
        }

        let xref_start = output.len();
        writeln!(output, "xref")?;
        writeln!(output, "0 {}", self.next_obj_id)?;
        // Object 0 is always free
        writeln!(output, "0000000000 65535 f ")?;
        for offset in &offsets {
            writeln!(output, "{:010} 00000 n ", offset)?;
        }

        let trailer = ObjectSerializer::dict(vec![
            ("Size", ObjectSerializer::integer(self.next_obj_id as i64)),
            ("Root", catalog_ref.into()),
            ("Info", info_ref.into()),
        ]);

        writeln!(output, "trailer")?;
        serializer.write_object(&mut output, &trailer)?;
        writeln!(output)?;
        writeln!(output, "startxref")?;
        writeln!(output, "{}", xref_start)?;
        write!(output, "%%EOF")?;

        log::debug!("Serialized PDF: {} objects, {} bytes", objects.len(), output.len());
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Read;

    fn helvetica_writer() -> PdfWriter {
        PdfWriter::new(PdfWriterConfig::default(), PdfFont::Helvetica)
    }

    #[test]
    fn test_create_empty_pdf() {
        let mut writer = helvetica_writer();
        writer.add_a4_landscape_page().finish();
        let bytes = writer.finish().unwrap();

        let content = String::from_utf8_lossy(&bytes);
        assert!(content.starts_with("%PDF-1.7"));
        assert!(content.contains("/Type /Catalog"));
        assert!(content.contains("/Type /Pages"));
        assert!(content.contains("/MediaBox [0 0 842 595]"));
        assert!(content.ends_with("%%EOF"));
    }

    #[test]
    fn test_pdf_with_text() {
        let mut writer = helvetica_writer();
        {
            let mut page = writer.add_a4_landscape_page();
            page.draw_text("Net pay", 100.0, 500.0, 9.0, TextAlign::Left, Color::BLACK);
            page.finish();
        }

        let bytes = writer.finish().unwrap();
        let content = String::from_utf8_lossy(&bytes);

        assert!(content.contains("/BaseFont /Helvetica"));
        assert!(content.contains("/F1 9 Tf"));
        assert!(content.contains("1 0 0 1 100 500 Tm"));
        assert!(content.contains("(Net pay) Tj"));
    }

    #[test]
    fn test_right_aligned_text() {
        let mut writer = helvetica_writer();
        let mut page = writer.add_a4_landscape_page();
        // "00" is 2 * 556 / 1000 * 10 = 11.12 pt wide
        let width = page.draw_text("00", 100.0, 50.0, 10.0, TextAlign::Right, Color::BLACK);
        assert!((width - 11.12).abs() < 1e-3);
        page.finish();
        let content = String::from_utf8_lossy(&writer.finish().unwrap()).to_string();
        assert!(content.contains("1 0 0 1 88.88 50 Tm"));
    }

    #[test]
    fn test_empty_text_draws_nothing() {
        let mut writer = helvetica_writer();
        let mut page = writer.add_a4_landscape_page();
        assert_eq!(page.draw_text("", 0.0, 0.0, 9.0, TextAlign::Center, Color::BLACK), 0.0);
        assert!(page.is_blank());
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let mut writer = helvetica_writer();
        writer.add_a4_landscape_page().finish();
        let bytes = writer.finish().unwrap();

        // Offsets are byte positions; the binary marker is not UTF-8
        let xref = bytes.windows(6).position(|w| w == b"\nxref\n").unwrap() + 1;
        let tail = std::str::from_utf8(&bytes[xref..]).unwrap();
        let entries: Vec<&str> = tail.lines().skip(3).take(3).collect();
        for (i, entry) in entries.iter().enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            let expected = format!("{} 0 obj", i + 1);
            assert!(bytes[offset..].starts_with(expected.as_bytes()), "entry {}", i + 1);
        }
    }

    #[test]
    fn test_pdf_with_metadata() {
        let date = Local.with_ymd_and_hms(2024, 3, 21, 14, 30, 0).unwrap();
        let config = PdfWriterConfig::default()
            .with_title("فیش حقوقی")
            .with_subject("May")
            .with_creation_date(date);

        let mut writer = PdfWriter::new(config, PdfFont::Helvetica);
        writer.add_a4_landscape_page().finish();

        let content = String::from_utf8_lossy(&writer.finish().unwrap()).to_string();
        assert!(content.contains("/Title <FEFF"));
        assert!(content.contains("/Subject (May)"));
        assert!(content.contains("/CreationDate (D:20240321143000"));
    }

    fn find(haystack: &[u8], needle: &[u8], from: usize) -> usize {
        from + haystack[from..]
            .windows(needle.len())
            .position(|w| w == needle)
            .unwrap()
    }

    #[test]
    fn test_compressed_content() {
        let config = PdfWriterConfig::default().with_compress(true);
        let mut writer = PdfWriter::new(config, PdfFont::Helvetica);
        {
            let mut page = writer.add_a4_landscape_page();
            for row in 0..20 {
                let y = 500.0 - row as f32 * 17.0;
                page.draw_text("compressed", 10.0, y, 9.0, TextAlign::Left, Color::BLACK);
            }
            page.finish();
        }
        let bytes = writer.finish().unwrap();

        let filter = find(&bytes, b"/Filter /FlateDecode", 0);
        let start = find(&bytes, b"\nstream\n", filter) + b"\nstream\n".len();
        let end = find(&bytes, b"\nendstream", start);
        let raw = &bytes[start..end];

        let mut inflated = String::new();
        flate2::read::ZlibDecoder::new(raw)
            .read_to_string(&mut inflated)
            .unwrap();
        assert_eq!(inflated.matches("(compressed) Tj").count(), 20);
        assert!(raw.len() < inflated.len());
    }

    #[test]
    fn test_pdf_date_offset() {
        let date = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let formatted = pdf_date(&date);
        assert!(formatted.starts_with("D:20240102030405"));
        assert!(formatted.ends_with('\''));
    }
}

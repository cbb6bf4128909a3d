//! PDF writing module.
//!
//! ## Architecture
//!
//! ```text
//! GridTable / draw_text
//!     ↓
//! [PageBuilder] (text placement through the document font)
//!     ↓
//! [ContentStreamBuilder] (operators → content stream bytes)
//!     ↓
//! [PdfWriter] (catalog, pages, font objects, xref, trailer)
//!     ↓
//! [ObjectSerializer] (serializes PDF objects)
//!     ↓
//! PDF bytes
//! ```
//!
//! ```ignore
//! use payslip_oxide::writer::{PdfFont, PdfWriter, PdfWriterConfig, TextAlign, Color};
//!
//! let mut writer = PdfWriter::new(PdfWriterConfig::default(), PdfFont::Helvetica);
//! let mut page = writer.add_a4_landscape_page();
//! page.draw_text("Hello", 421.0, 500.0, 16.0, TextAlign::Center, Color::BLACK);
//! page.finish();
//! let bytes = writer.finish()?;
//! ```

mod content_stream;
mod font_manager;
mod object_serializer;
mod pdf_writer;
mod table_renderer;

pub use content_stream::{Color, ContentStreamBuilder, ContentStreamOp, TextArrayItem};
pub use font_manager::{EmbeddedFont, PdfFont, PreparedText};
pub use object_serializer::ObjectSerializer;
pub use pdf_writer::{PageBuilder, PdfWriter, PdfWriterConfig, TextAlign, FONT_RESOURCE};
pub use table_renderer::{CellAlign, GridLines, GridStyle, GridTable, TableBorderStyle};

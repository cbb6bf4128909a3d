//! Font loading, discovery and shaping.
//!
//! A TrueType program is parsed once at start-up ([`FontResource::resolve`])
//! and shared between documents; each document shapes its own text with a
//! [`TextShaper`].

pub mod discovery;
pub mod shaping;
pub mod truetype_parser;

pub use discovery::{FontResource, FONT_CANDIDATES};
pub use shaping::{ShapedGlyph, ShapedLine, TextShaper};
pub use truetype_parser::{FontMetrics, FontProgram, TrueTypeError, TrueTypeResult};

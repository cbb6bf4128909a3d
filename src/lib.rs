// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # Payslip Oxide
//!
//! Payslip generation from Excel payroll sheets: one right-to-left PDF per
//! employee.
//!
//! ## Pipeline
//!
//! ```text
//! .xls / .xlsx / .xlsm / .xlsb / .ods
//!     ↓ loader::load_table
//! RowTable ──group_by(name column)──→ EmployeeGroup*
//!     ↓ FieldSet::resolve (first row of each group)
//! FieldSet
//!     ↓ PayslipRenderer::render (format, shape, lay out)
//! PDF bytes ──→ <output_dir>/<name>-<hex>.pdf
//! ```
//!
//! [`batch::Batch`] drives the loop, counts failures and appends them to
//! `converter_error.log`; [`batch::spawn_batch`] runs it on a worker thread
//! with progress events and a cancel flag.
//!
//! ## Features
//!
//! - **Complex text**: with the `shaping` feature (default), text is
//!   reordered with the Unicode bidi algorithm and shaped with rustybuzz so
//!   Persian renders with joined letter forms.
//! - **Font embedding**: a TrueType font is embedded as a CID font with a
//!   ToUnicode map, so text stays extractable.
//! - **Workbook formats**: every calamine backend; `.xlsb` sits behind the
//!   `xlsb` feature (default).
//!
//! ## Quick Start
//!
//! ```ignore
//! use payslip_oxide::{load_table, BatchOptions, ConvertConfig, convert_all};
//!
//! # fn main() -> payslip_oxide::Result<()> {
//! let table = load_table("payroll.xlsx")?;
//! let config = ConvertConfig::new()
//!     .with_output_dir("payslips")
//!     .with_options(BatchOptions::new("Acme", "1403-02", ""));
//! let summary = convert_all(&table, &config)?;
//! println!("{}", summary);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Spreadsheet input
pub mod loader;
pub mod table;

// Payroll fields and their presentation
pub mod fields;
pub mod format;

// PDF output
pub mod fonts;
pub mod object;
pub mod writer;

// Payslips and batches
pub mod batch;
pub mod config;
pub mod payslip;

pub use batch::{
    convert_all, sanitize_filename, spawn_batch, Batch, BatchHandle, BatchSummary, CancelFlag,
    Outcome, ProgressEvent,
};
pub use config::{BatchOptions, ConvertConfig, LayoutOptions, OptionsFile};
pub use error::{Error, LoadError, RenderError, Result};
pub use fields::{lookup, Field, FieldSet};
pub use fonts::FontResource;
pub use format::{format_amount, format_duration};
pub use loader::load_table;
pub use payslip::PayslipRenderer;
pub use table::{Cell, EmployeeGroup, Row, RowTable};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

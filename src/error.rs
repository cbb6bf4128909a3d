//! Error types for the payslip pipeline.
//!
//! Three layers fail in different ways:
//! - [`LoadError`]: the spreadsheet cannot be turned into a row table (fatal).
//! - [`Error::Schema`]: the table lacks the name column (fatal).
//! - [`RenderError`]: one employee's payslip could not be produced (non-fatal,
//!   the batch driver logs it and moves on).

use std::path::PathBuf;

/// Result type alias for payslip operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Spreadsheet could not be loaded
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Required name column is missing from the loaded table
    #[error("Column «{column}» not found")]
    Schema {
        /// Name of the missing column
        column: String,
    },

    /// A single payslip failed to render
    #[error(transparent)]
    Render(#[from] RenderError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Batch options file could not be parsed
    #[error("Invalid options file: {0}")]
    Options(#[from] serde_json::Error),

    /// Background worker panicked before reporting a result
    #[error("Batch worker terminated unexpectedly")]
    WorkerPanicked,
}

/// Errors raised while loading a spreadsheet.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Input file does not exist
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Extension is not one of the supported workbook formats
    #[error("Unsupported file format: '{0}' (expected .xls, .xlsx, .xlsm, .xlsb or .ods)")]
    UnsupportedFormat(String),

    /// Format is recognised but its backend was not compiled in
    #[error("No backend for {format} workbooks: {hint}")]
    MissingBackend {
        /// Human-readable format name
        format: &'static str,
        /// What to do about it
        hint: &'static str,
    },

    /// Backend failed to parse the workbook
    #[error("Failed to read {}: {reason}", path.display())]
    Corrupt {
        /// Workbook path
        path: PathBuf,
        /// Backend error message
        reason: String,
    },

    /// Workbook has no sheets or no header row
    #[error("Workbook {} contains no data", .0.display())]
    Empty(PathBuf),
}

/// Errors raised while rendering one payslip.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A field that must be numeric holds something else
    #[error("Field «{field}» has unparseable value '{value}'")]
    UnparseableField {
        /// Source column name
        field: &'static str,
        /// Offending cell content
        value: String,
    },

    /// Font could not be used for this document
    #[error("Font error: {0}")]
    Font(String),

    /// Layout produced nothing drawable
    #[error("Layout error: {0}")]
    Layout(String),

    /// IO error while serializing or writing the document
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//! Configuration for a payslip run.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Placeholder printed for blank company or period.
const BLANK: &str = "-";

/// Default name of the per-run failure log.
pub const ERROR_LOG_NAME: &str = "converter_error.log";

/// Default name column.
pub const DEFAULT_NAME_COLUMN: &str = "نام";

/// Texts printed on every payslip of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    /// Company name (title line)
    pub company: String,
    /// Pay period (second title line)
    pub period: String,
    /// Footnote; omitted when blank
    pub disclaimer: String,
}

impl BatchOptions {
    /// Create options from the three texts.
    pub fn new(
        company: impl Into<String>,
        period: impl Into<String>,
        disclaimer: impl Into<String>,
    ) -> Self {
        Self {
            company: company.into(),
            period: period.into(),
            disclaimer: disclaimer.into(),
        }
    }

    /// Company line, or `-` when blank.
    pub fn company_line(&self) -> &str {
        non_blank(&self.company).unwrap_or(BLANK)
    }

    /// Period line, or `-` when blank.
    pub fn period_line(&self) -> &str {
        non_blank(&self.period).unwrap_or(BLANK)
    }

    /// Disclaimer line, if one should be printed.
    pub fn disclaimer_line(&self) -> Option<&str> {
        non_blank(&self.disclaimer)
    }
}

fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Optional parts of the page layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Show the personnel code in the mini header
    pub employee_code: bool,
    /// Show the bank account next to the net pay
    pub bank_account: bool,
}

/// Options file contents: batch texts and layout switches side by side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsFile {
    /// Batch texts
    #[serde(flatten)]
    pub batch: BatchOptions,
    /// Layout switches
    pub layout: LayoutOptions,
}

impl OptionsFile {
    /// Read options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Settings for a conversion run.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Directory payslips and the error log are written to
    pub output_dir: PathBuf,
    /// Column employees are grouped by
    pub name_column: String,
    /// File name of the failure log inside `output_dir`
    pub error_log_name: String,
    /// Batch texts
    pub options: BatchOptions,
    /// Layout switches
    pub layout: LayoutOptions,
    /// Explicit font file; discovery runs when unset
    pub font_path: Option<PathBuf>,
    /// Apply bidi reordering and contextual shaping
    pub shaping: bool,
    /// Flate-compress PDF streams
    pub compress: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ConvertConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            output_dir: PathBuf::from("payslips"),
            name_column: DEFAULT_NAME_COLUMN.to_string(),
            error_log_name: ERROR_LOG_NAME.to_string(),
            options: BatchOptions::default(),
            layout: LayoutOptions::default(),
            font_path: None,
            shaping: true,
            compress: false,
        }
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the name column.
    pub fn with_name_column(mut self, column: impl Into<String>) -> Self {
        self.name_column = column.into();
        self
    }

    /// Set the batch texts.
    pub fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the layout switches.
    pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.layout = layout;
        self
    }

    /// Use a specific font file.
    pub fn with_font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = Some(path.into());
        self
    }

    /// Enable or disable shaping.
    pub fn with_shaping(mut self, enable: bool) -> Self {
        self.shaping = enable;
        self
    }

    /// Enable or disable stream compression.
    pub fn with_compress(mut self, enable: bool) -> Self {
        self.compress = enable;
        self
    }

    /// Full path of the failure log.
    pub fn error_log_path(&self) -> PathBuf {
        self.output_dir.join(&self.error_log_name)
    }
}

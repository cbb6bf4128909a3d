//! Batch driver: one payslip per employee, with progress and cancellation.
//!
//! A [`Batch`] walks the employee groups of a loaded table in first-seen
//! order. Failures of a single employee are appended to the error log and
//! counted; they never stop the batch. [`spawn_batch`] runs the same loop on
//! a worker thread and streams [`ProgressEvent`]s over a channel.

use crate::config::ConvertConfig;
use crate::error::{Error, RenderError, Result};
use crate::fields::FieldSet;
use crate::fonts::FontResource;
use crate::loader::load_table;
use crate::payslip::PayslipRenderer;
use crate::table::{EmployeeGroup, RowTable};
use chrono::Local;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Cooperative cancellation shared between the caller and the worker.
///
/// Checked once before each employee; a payslip being rendered is finished.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of one employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Payslip written to this path
    Written(PathBuf),
    /// Rendering failed; details are in the error log
    Failed(String),
}

/// Progress notification. `index` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Work on an employee began
    Started {
        /// Position in the batch
        index: usize,
        /// Number of employees
        total: usize,
        /// Employee name
        name: String,
    },
    /// Work on an employee ended
    Finished {
        /// Position in the batch
        index: usize,
        /// Number of employees
        total: usize,
        /// Employee name
        name: String,
        /// What happened
        outcome: Outcome,
    },
}

/// Aggregate result of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Employees found in the table
    pub total: usize,
    /// Payslips written
    pub succeeded: usize,
    /// Employees whose payslip failed
    pub failed: usize,
    /// Whether the batch stopped early on request
    pub cancelled: bool,
    /// Where payslips were written
    pub output_dir: PathBuf,
    /// Written files, in batch order
    pub written: Vec<PathBuf>,
}

impl BatchSummary {
    /// Employees never attempted because of cancellation.
    pub fn skipped(&self) -> usize {
        self.total - self.succeeded - self.failed
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} payslips written to {}",
            self.succeeded,
            self.total,
            self.output_dir.display()
        )?;
        if self.failed > 0 {
            write!(f, ", {} failed (see log)", self.failed)?;
        }
        if self.cancelled {
            write!(f, ", cancelled with {} remaining", self.skipped())?;
        }
        Ok(())
    }
}

/// Drives the renderer over every employee of a table.
#[derive(Debug, Clone)]
pub struct Batch {
    config: ConvertConfig,
    renderer: PayslipRenderer,
}

impl Batch {
    /// Create a batch with an explicit renderer.
    pub fn new(config: ConvertConfig, renderer: PayslipRenderer) -> Self {
        Self { config, renderer }
    }

    /// Create a batch, resolving the font and building the renderer from
    /// `config`.
    pub fn from_config(config: ConvertConfig) -> Self {
        let renderer = renderer_for(&config);
        Self::new(config, renderer)
    }

    /// Configuration of this batch.
    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Render every employee of `table`.
    ///
    /// Fails before writing anything when the name column is missing.
    pub fn run(
        &self,
        table: &RowTable,
        cancel: &CancelFlag,
        observer: &mut dyn FnMut(ProgressEvent),
    ) -> Result<BatchSummary> {
        let column = &self.config.name_column;
        let groups = table.group_by(column).ok_or_else(|| Error::Schema {
            column: column.clone(),
        })?;

        let output_dir = self.config.output_dir.clone();
        fs::create_dir_all(&output_dir)?;
        let log_path = self.config.error_log_path();

        let total = groups.len();
        log::info!("Generating {} payslips into {}", total, output_dir.display());

        let mut summary = BatchSummary {
            total,
            output_dir,
            ..BatchSummary::default()
        };

        for (i, group) in groups.iter().enumerate() {
            if cancel.is_cancelled() {
                log::info!("Cancelled after {} of {} employees", i, total);
                summary.cancelled = true;
                break;
            }

            let index = i + 1;
            let name = group.name().to_string();
            observer(ProgressEvent::Started {
                index,
                total,
                name: name.clone(),
            });

            let outcome = match self.render_group(group) {
                Ok(path) => {
                    log::debug!("Wrote {}", path.display());
                    summary.succeeded += 1;
                    summary.written.push(path.clone());
                    Outcome::Written(path)
                },
                Err(e) => {
                    log::warn!("Payslip for {} failed: {}", name, e);
                    summary.failed += 1;
                    if let Err(log_err) = append_error_log(&log_path, &name, &e) {
                        log::error!("Cannot write {}: {}", log_path.display(), log_err);
                    }
                    Outcome::Failed(e.to_string())
                },
            };

            observer(ProgressEvent::Finished {
                index,
                total,
                name,
                outcome,
            });
        }

        log::info!("{}", summary);
        Ok(summary)
    }

    fn render_group(&self, group: &EmployeeGroup<'_>) -> std::result::Result<PathBuf, RenderError> {
        let fields = FieldSet::resolve(&group.first_row());
        let bytes = self
            .renderer
            .render(&fields, group.name(), &self.config.options, Local::now())?;
        let path = output_path(&self.config.output_dir, group.name());
        fs::write(&path, bytes)?;
        Ok(path)
    }
}

fn renderer_for(config: &ConvertConfig) -> PayslipRenderer {
    let font = FontResource::resolve(config.font_path.as_deref());
    PayslipRenderer::new(font, config.shaping, config.layout).with_compress(config.compress)
}

/// Reduce a name to characters safe in a file name.
///
/// Keeps letters and digits of any script, space, `_` and `-`, then trims.
/// An empty result becomes `payslip`.
pub fn sanitize_filename(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|&c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    let trimmed = kept.trim();
    if trimmed.is_empty() {
        "payslip".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `<dir>/<sanitized name>-<4 hex>.pdf`, avoiding existing files.
fn output_path(dir: &Path, name: &str) -> PathBuf {
    let stem = sanitize_filename(name);
    loop {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let path = dir.join(format!("{}-{}.pdf", stem, &suffix[..4]));
        if !path.exists() {
            return path;
        }
    }
}

/// Append one failure entry, opening and closing the log each time.
fn append_error_log(path: &Path, name: &str, error: &RenderError) -> std::io::Result<()> {
    let mut entry = format!(
        "\n\n[{}] {} ➜ {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        name,
        error
    );
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        entry.push_str(&format!("    caused by: {}\n", cause));
        source = cause.source();
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(entry.as_bytes())
}

/// Render every employee of `table` with the settings in `config`.
pub fn convert_all(table: &RowTable, config: &ConvertConfig) -> Result<BatchSummary> {
    Batch::from_config(config.clone()).run(table, &CancelFlag::new(), &mut |_| {})
}

/// A batch running on a worker thread.
pub struct BatchHandle {
    events: Receiver<ProgressEvent>,
    cancel: CancelFlag,
    worker: JoinHandle<Result<BatchSummary>>,
}

impl BatchHandle {
    /// Progress events; the channel closes when the worker ends.
    pub fn events(&self) -> &Receiver<ProgressEvent> {
        &self.events
    }

    /// Flag that stops the batch before its next employee.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the worker. Load and schema errors are returned here.
    pub fn join(self) -> Result<BatchSummary> {
        self.worker.join().map_err(|_| Error::WorkerPanicked)?
    }
}

/// Load `input` and run the batch on a background thread.
pub fn spawn_batch(
    config: ConvertConfig,
    input: impl Into<PathBuf>,
    renderer: PayslipRenderer,
) -> BatchHandle {
    let input = input.into();
    let (tx, events) = mpsc::channel();
    let cancel = CancelFlag::new();
    let worker_cancel = cancel.clone();

    let worker = thread::spawn(move || {
        let table = load_table(&input)?;
        log::info!("Loaded {} rows from {}", table.len(), input.display());
        Batch::new(config, renderer).run(&table, &worker_cancel, &mut |event| {
            // Receiver may already be gone; the batch carries on regardless
            let _ = tx.send(event);
        })
    });

    BatchHandle {
        events,
        cancel,
        worker,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutOptions;
    use crate::table::Cell;

    fn table(names: &[&str]) -> RowTable {
        RowTable::new(
            vec!["نام".to_string(), "پرداختی".to_string()],
            names
                .iter()
                .map(|n| vec![Cell::text(*n), Cell::Number(1000.0)])
                .collect(),
        )
    }

    fn batch(dir: &Path) -> Batch {
        let config = ConvertConfig::new().with_output_dir(dir);
        let renderer = PayslipRenderer::new(FontResource::Builtin, false, LayoutOptions::default());
        Batch::new(config, renderer)
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("علی/رضایی"), "علیرضایی");
        assert_eq!(sanitize_filename("  a:b*c?  "), "abc");
        assert_eq!(sanitize_filename("Jane_Doe-2"), "Jane_Doe-2");
        assert_eq!(sanitize_filename("../.."), "payslip");
        assert_eq!(sanitize_filename(""), "payslip");
    }

    #[test]
    fn test_output_path_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = output_path(dir.path(), "Jane Doe");
        let file = path.file_name().unwrap().to_str().unwrap();
        assert!(file.starts_with("Jane Doe-"));
        assert!(file.ends_with(".pdf"));
        let suffix = &file["Jane Doe-".len()..file.len() - 4];
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_one_file_per_distinct_name() {
        let dir = tempfile::tempdir().unwrap();
        let summary = batch(dir.path())
            .run(&table(&["A", "B", "A", "C"]), &CancelFlag::new(), &mut |_| {})
            .unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.failed, 0);
        assert!(!summary.cancelled);
        assert_eq!(summary.written.len(), 3);
        for path in &summary.written {
            assert!(fs::read(path).unwrap().starts_with(b"%PDF-"));
        }
    }

    #[test]
    fn test_missing_name_column_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let config = ConvertConfig::new()
            .with_output_dir(&out)
            .with_name_column("Employee");
        let renderer = PayslipRenderer::new(FontResource::Builtin, false, LayoutOptions::default());
        let err = Batch::new(config, renderer)
            .run(&table(&["A"]), &CancelFlag::new(), &mut |_| {})
            .unwrap_err();
        assert!(matches!(err, Error::Schema { column } if column == "Employee"));
        assert!(!out.exists());
    }

    #[test]
    fn test_events_are_paired_and_ordered() {
        let dir = tempfile::tempdir().unwrap();
        let mut events = Vec::new();
        batch(dir.path())
            .run(&table(&["A", "B"]), &CancelFlag::new(), &mut |e| events.push(e))
            .unwrap();
        assert_eq!(events.len(), 4);
        assert!(matches!(&events[0], ProgressEvent::Started { index: 1, total: 2, name } if name == "A"));
        assert!(matches!(
            &events[1],
            ProgressEvent::Finished { index: 1, outcome: Outcome::Written(_), .. }
        ));
        assert!(matches!(&events[2], ProgressEvent::Started { index: 2, name, .. } if name == "B"));
    }

    #[test]
    fn test_cancel_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let summary = batch(dir.path())
            .run(&table(&["A", "B"]), &cancel, &mut |_| {})
            .unwrap();
        assert!(summary.cancelled);
        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.skipped(), 2);
    }

    #[test]
    fn test_error_log_entry_format() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("converter_error.log");
        let err = RenderError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        append_error_log(&log, "Jane", &err).unwrap();
        append_error_log(&log, "John", &err).unwrap();
        let text = fs::read_to_string(&log).unwrap();
        assert!(text.starts_with("\n\n["));
        assert!(text.contains("] Jane ➜ IO error: disk full\n"));
        assert_eq!(text.matches(" ➜ ").count(), 2);
    }

    #[test]
    fn test_summary_display() {
        let summary = BatchSummary {
            total: 5,
            succeeded: 2,
            failed: 1,
            cancelled: true,
            output_dir: PathBuf::from("out"),
            written: Vec::new(),
        };
        assert_eq!(
            summary.to_string(),
            "2 of 5 payslips written to out, 1 failed (see log), cancelled with 2 remaining"
        );
    }
}

//! Spreadsheet loading.
//!
//! Picks a calamine backend from the file extension and flattens the first
//! worksheet into a [`RowTable`]. The first non-blank row is the header.

use crate::error::LoadError;
use crate::table::{Cell, RowTable};
use calamine::{open_workbook, Data, Ods, Range, Reader, Xls, Xlsx};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::fmt::Display;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// Workbook container formats understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookFormat {
    /// Legacy BIFF8 workbook (.xls)
    Xls,
    /// Office Open XML workbook (.xlsx, .xlsm)
    Xlsx,
    /// Binary Office workbook (.xlsb)
    Xlsb,
    /// OpenDocument spreadsheet (.ods)
    Ods,
}

impl WorkbookFormat {
    /// Detect the format from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "xls" => Ok(Self::Xls),
            "xlsx" | "xlsm" => Ok(Self::Xlsx),
            "xlsb" => Ok(Self::Xlsb),
            "ods" => Ok(Self::Ods),
            _ => Err(LoadError::UnsupportedFormat(extension)),
        }
    }

    /// Short display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Xls => "xls",
            Self::Xlsx => "xlsx",
            Self::Xlsb => "xlsb",
            Self::Ods => "ods",
        }
    }

    /// Whether this build can read the format.
    pub fn is_available(&self) -> bool {
        match self {
            Self::Xlsb => cfg!(feature = "xlsb"),
            _ => true,
        }
    }
}

/// Load the first worksheet of a workbook into a row table.
pub fn load_table(path: impl AsRef<Path>) -> Result<RowTable, LoadError> {
    let path = path.as_ref();
    let format = WorkbookFormat::from_path(path)?;
    if !path.is_file() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    log::info!("Loading {} workbook {}", format.name(), path.display());

    let range = match format {
        WorkbookFormat::Xls => {
            let workbook: Xls<BufReader<File>> =
                open_workbook(path).map_err(|e| corrupt(path, e))?;
            first_sheet(workbook, path)?
        },
        WorkbookFormat::Xlsx => {
            let workbook: Xlsx<BufReader<File>> =
                open_workbook(path).map_err(|e| corrupt(path, e))?;
            first_sheet(workbook, path)?
        },
        WorkbookFormat::Ods => {
            let workbook: Ods<BufReader<File>> =
                open_workbook(path).map_err(|e| corrupt(path, e))?;
            first_sheet(workbook, path)?
        },
        WorkbookFormat::Xlsb => open_xlsb(path)?,
    };

    let table = range_to_table(&range, path)?;
    log::info!("Loaded {} rows x {} columns", table.len(), table.columns().len());
    Ok(table)
}

#[cfg(feature = "xlsb")]
fn open_xlsb(path: &Path) -> Result<Range<Data>, LoadError> {
    let workbook: calamine::Xlsb<BufReader<File>> =
        open_workbook(path).map_err(|e| corrupt(path, e))?;
    first_sheet(workbook, path)
}

#[cfg(not(feature = "xlsb"))]
fn open_xlsb(_path: &Path) -> Result<Range<Data>, LoadError> {
    Err(LoadError::MissingBackend {
        format: "xlsb",
        hint: "rebuild with `--features xlsb` or save the workbook as .xlsx",
    })
}

fn corrupt(path: &Path, err: impl Display) -> LoadError {
    LoadError::Corrupt {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

fn first_sheet<RS, R>(mut workbook: R, path: &Path) -> Result<Range<Data>, LoadError>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: Display,
{
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| LoadError::Empty(path.to_path_buf()))?;
    log::debug!("Reading worksheet '{}'", sheet);
    workbook
        .worksheet_range(&sheet)
        .map_err(|e| corrupt(path, e))
}

/// Flatten a worksheet range: header from the first non-blank row, blank
/// data rows dropped.
fn range_to_table(range: &Range<Data>, path: &Path) -> Result<RowTable, LoadError> {
    let mut rows = range
        .rows()
        .map(|row| row.iter().map(data_to_cell).collect::<Vec<_>>())
        .skip_while(|row| row.iter().all(Cell::is_empty));

    let header = rows
        .next()
        .ok_or_else(|| LoadError::Empty(path.to_path_buf()))?;

    let columns = header
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let name = cell.to_string();
            let name = name.trim();
            if name.is_empty() {
                format!("column_{}", i + 1)
            } else {
                name.to_string()
            }
        })
        .collect();

    let data = rows
        .filter(|row| !row.iter().all(Cell::is_empty))
        .collect();

    Ok(RowTable::new(columns, data))
}

/// Convert a calamine cell into a [`Cell`].
pub(crate) fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::text(s.as_str()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            if dt.is_duration() || (0.0..1.0).contains(&serial) {
                Cell::Duration(days_to_duration(serial))
            } else {
                excel_serial_to_datetime(serial)
                    .map(Cell::DateTime)
                    .unwrap_or(Cell::Number(serial))
            }
        },
        Data::DateTimeIso(s) => Cell::text(s.as_str()),
        Data::DurationIso(s) => parse_iso_duration(s)
            .map(Cell::Duration)
            .unwrap_or_else(|| Cell::text(s.as_str())),
        Data::Error(e) => {
            log::debug!("Treating error cell {:?} as empty", e);
            Cell::Empty
        },
    }
}

fn days_to_duration(days: f64) -> Duration {
    Duration::milliseconds((days * 86_400_000.0).round() as i64)
}

/// Excel's 1900 date system, counted from 1899-12-30.
fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    epoch.checked_add_signed(days_to_duration(serial))
}

/// Parse the subset of ISO 8601 durations spreadsheets emit
/// (`PnDTnHnMnS`, fractional seconds allowed).
pub(crate) fn parse_iso_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let body = s.strip_prefix('P')?;

    let mut millis: f64 = 0.0;
    let mut in_time = false;
    let mut number = String::new();
    let mut seen_component = false;

    for ch in body.chars() {
        match ch {
            'T' => {
                if !number.is_empty() {
                    return None;
                }
                in_time = true;
            },
            '0'..='9' | '.' | ',' => number.push(if ch == ',' { '.' } else { ch }),
            unit => {
                let value: f64 = number.parse().ok()?;
                number.clear();
                let factor = match (unit, in_time) {
                    ('W', false) => 7.0 * 86_400_000.0,
                    ('D', false) => 86_400_000.0,
                    ('H', true) => 3_600_000.0,
                    ('M', true) => 60_000.0,
                    ('S', true) => 1_000.0,
                    _ => return None,
                };
                millis += value * factor;
                seen_component = true;
            },
        }
    }

    if !number.is_empty() || !seen_component {
        return None;
    }

    let millis = millis.round() as i64;
    Some(Duration::milliseconds(if negative { -millis } else { millis }))
}

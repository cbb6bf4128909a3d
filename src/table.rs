//! In-memory row table and grouping by employee name.

use chrono::{Duration, NaiveDateTime};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Empty / null cell
    Empty,
    /// Text cell
    Text(String),
    /// Numeric cell (integers are widened)
    Number(f64),
    /// Boolean cell
    Bool(bool),
    /// Time-of-day or elapsed-time cell
    Duration(Duration),
    /// Calendar date/time cell
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Build a text cell, collapsing blank strings to [`Cell::Empty`].
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s)
        }
    }

    /// True for empty cells and blank text.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    /// Numeric value of the cell, parsing text when it looks like a number.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            Cell::Number(n) => *n,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
            Cell::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            },
            _ => return None,
        };
        n.is_finite().then_some(n)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            },
            Cell::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Cell::Duration(d) => {
                let secs = d.num_seconds();
                write!(f, "{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
            },
            Cell::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Ordered rows keyed by column name. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct RowTable {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Cell>>,
}

impl RowTable {
    /// Build a table from a header and data rows.
    ///
    /// Short rows are padded with [`Cell::Empty`]; when a header repeats, the
    /// first occurrence wins for lookups.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }

        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();

        Self {
            columns,
            index,
            rows,
        }
    }

    /// Column names in sheet order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether a column with this exact name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Borrow a row by position.
    pub fn row(&self, idx: usize) -> Option<Row<'_>> {
        self.rows.get(idx).map(|cells| Row { table: self, cells })
    }

    /// Iterate all rows in order.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |cells| Row { table: self, cells })
    }

    /// Partition rows by the value of `column`, preserving first-seen order.
    ///
    /// Rows whose name cell is empty are dropped. Returns `None` when the
    /// column does not exist.
    pub fn group_by(&self, column: &str) -> Option<Vec<EmployeeGroup<'_>>> {
        let col = *self.index.get(column)?;
        let mut groups: IndexMap<String, Vec<usize>> = IndexMap::new();

        for (i, row) in self.rows.iter().enumerate() {
            let cell = &row[col];
            if cell.is_empty() {
                continue;
            }
            groups.entry(cell.to_string()).or_default().push(i);
        }

        Some(
            groups
                .into_iter()
                .map(|(name, rows)| EmployeeGroup {
                    table: self,
                    name,
                    rows,
                })
                .collect(),
        )
    }
}

/// Borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a RowTable,
    cells: &'a [Cell],
}

impl<'a> Row<'a> {
    /// Cell under `column`, or `None` if the column is unknown.
    pub fn get(&self, column: &str) -> Option<&'a Cell> {
        self.table
            .index
            .get(column)
            .and_then(|&i| self.cells.get(i))
    }

    /// Raw cells in column order.
    pub fn cells(&self) -> &'a [Cell] {
        self.cells
    }
}

/// All rows sharing one employee name.
#[derive(Debug, Clone)]
pub struct EmployeeGroup<'a> {
    table: &'a RowTable,
    name: String,
    rows: Vec<usize>,
}

impl<'a> EmployeeGroup<'a> {
    /// Group identity: the name cell rendered as text.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows carrying this name.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Groups are never empty; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row payslip fields are read from.
    pub fn first_row(&self) -> Row<'a> {
        let cells = &self.table.rows[self.rows[0]];
        Row {
            table: self.table,
            cells,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RowTable {
        RowTable::new(
            vec!["name".into(), "pay".into()],
            vec![
                vec![Cell::text("Sara"), Cell::Number(100.0)],
                vec![Cell::text("Omid"), Cell::Number(200.0)],
                vec![Cell::text("Sara"), Cell::Number(300.0)],
                vec![Cell::Empty, Cell::Number(400.0)],
                vec![Cell::text("Ali")],
            ],
        )
    }

    #[test]
    fn test_group_by_first_seen_order() {
        let t = table();
        let groups = t.group_by("name").unwrap();
        let names: Vec<&str> = groups.iter().map(|g| g.name()).collect();
        assert_eq!(names, vec!["Sara", "Omid", "Ali"]);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn test_group_uses_first_row() {
        let t = table();
        let groups = t.group_by("name").unwrap();
        assert_eq!(groups[0].first_row().get("pay"), Some(&Cell::Number(100.0)));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let t = table();
        let groups = t.group_by("name").unwrap();
        assert_eq!(groups[2].first_row().get("pay"), Some(&Cell::Empty));
    }

    #[test]
    fn test_group_by_missing_column() {
        assert!(table().group_by("نام").is_none());
    }

    #[test]
    fn test_numeric_names_group_as_integers() {
        let t = RowTable::new(
            vec!["id".into()],
            vec![vec![Cell::Number(7.0)], vec![Cell::Number(7.0)]],
        );
        let groups = t.group_by("id").unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name(), "7");
    }

    #[test]
    fn test_cell_as_number() {
        assert_eq!(Cell::text(" 12.5 ").as_number(), Some(12.5));
        assert_eq!(Cell::text("abc").as_number(), None);
        assert_eq!(Cell::Number(f64::NAN).as_number(), None);
        assert_eq!(Cell::Empty.as_number(), None);
    }

    #[test]
    fn test_blank_text_is_empty() {
        assert_eq!(Cell::text("   "), Cell::Empty);
        assert!(Cell::Text("  ".into()).is_empty());
    }

    #[test]
    fn test_duration_display() {
        let d = Cell::Duration(Duration::seconds(8 * 3600 + 5 * 60 + 9));
        assert_eq!(d.to_string(), "8:05:09");
    }
}

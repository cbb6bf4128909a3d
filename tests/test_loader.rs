//! Integration tests for workbook loading and grouping.

mod common;

use common::{payroll_workbook, write_xlsx, Value};
use payslip_oxide::{load_table, Cell, FieldSet, LoadError};

#[test]
fn test_load_xlsx_header_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = payroll_workbook(
        dir.path(),
        &[("Ali", Value::Number(9121234567.0)), ("Sara", Value::Number(9357654321.0))],
    );

    let table = load_table(&path).expect("Failed to load workbook");
    assert_eq!(table.len(), 2);
    assert_eq!(table.columns()[0], "نام");
    assert!(table.has_column("پرداختی"));

    let row = table.row(0).unwrap();
    assert_eq!(row.get("نام"), Some(&Cell::Text("Ali".to_string())));
    assert_eq!(row.get("بیمه"), Some(&Cell::Number(1250000.0)));
}

#[test]
fn test_header_trimmed_and_blank_rows_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sheet.xlsx");
    write_xlsx(
        &path,
        &[
            vec![Value::from("  نام "), Value::Blank, Value::from("پرداختی")],
            vec![Value::from("Ali"), Value::from("x"), Value::Number(10.0)],
            vec![Value::from("   ")],
            vec![Value::from("Sara"), Value::Blank, Value::Number(20.0)],
        ],
    );

    let table = load_table(&path).unwrap();
    assert_eq!(table.columns(), &["نام", "column_2", "پرداختی"]);
    assert_eq!(table.len(), 2);
    assert_eq!(table.row(1).unwrap().get("پرداختی"), Some(&Cell::Number(20.0)));
}

#[test]
fn test_groups_first_seen_order_first_row_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sheet.xlsx");
    write_xlsx(
        &path,
        &[
            vec![Value::from("نام"), Value::from("پرداختی")],
            vec![Value::from("Sara"), Value::Number(1.0)],
            vec![Value::from("Ali"), Value::Number(2.0)],
            vec![Value::from("Sara"), Value::Number(3.0)],
            vec![Value::Blank, Value::Number(4.0)],
        ],
    );

    let table = load_table(&path).unwrap();
    let groups = table.group_by("نام").unwrap();
    let names: Vec<&str> = groups.iter().map(|g| g.name()).collect();
    assert_eq!(names, vec!["Sara", "Ali"]);
    assert_eq!(groups[0].len(), 2);

    let fields = FieldSet::resolve(&groups[0].first_row());
    assert_eq!(fields.get(payslip_oxide::Field::NetPay), &Cell::Number(1.0));
}

#[test]
fn test_missing_group_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = payroll_workbook(dir.path(), &[("Ali", Value::Blank)]);
    let table = load_table(&path).unwrap();
    assert!(table.group_by("Employee").is_none());
}

#[test]
fn test_unsupported_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("payroll.csv");
    std::fs::write(&path, "نام\nAli\n").unwrap();
    let err = load_table(&path).unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "csv"));
}

#[test]
fn test_corrupt_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.xlsx");
    std::fs::write(&path, b"definitely not a zip archive").unwrap();
    let err = load_table(&path).unwrap_err();
    assert!(matches!(err, LoadError::Corrupt { .. }));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_table(dir.path().join("absent.xlsx")).unwrap_err();
    assert!(matches!(err, LoadError::NotFound(_)));
}

#[test]
fn test_empty_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.xlsx");
    write_xlsx(&path, &[]);
    let err = load_table(&path).unwrap_err();
    assert!(matches!(err, LoadError::Empty(_)));
}

#[test]
fn test_elapsed_time_cell_is_duration() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hours.xlsx");
    write_xlsx(
        &path,
        &[
            vec![Value::from("نام"), Value::from("مجموع ساعت کاری")],
            vec![Value::from("Ali"), Value::Hours(1.5)],
            vec![Value::from("Sara"), Value::Hours(0.25)],
        ],
    );

    let table = load_table(&path).unwrap();
    let hours = |i: usize| table.row(i).unwrap().get("مجموع ساعت کاری").cloned();
    assert_eq!(hours(0), Some(Cell::Duration(chrono::Duration::hours(36))));
    assert_eq!(hours(1), Some(Cell::Duration(chrono::Duration::hours(6))));
    assert_eq!(payslip_oxide::format_duration(&hours(0).unwrap()), "36:00");
}

//! Typed payroll field set.
//!
//! Every quantity a payslip shows is a [`Field`] with a source column, a
//! value kind and a default. Lookup is total: a missing column or an empty
//! cell yields the default instead of an error.

use crate::error::RenderError;
use crate::table::{Cell, Row};

/// How a field's value is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, shown verbatim
    Text,
    /// Phone number, shown as an integer without separators
    Phone,
    /// Money or count, shown with thousands separators
    Amount,
    /// Elapsed time, shown as H:MM
    Duration,
}

/// Value used when a column is missing or its cell is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Placeholder dash
    Dash,
    /// Numeric zero
    Zero,
    /// Nothing (rendered blank, or computed later)
    Empty,
}

impl Fallback {
    /// The cell this fallback stands for.
    pub fn cell(self) -> Cell {
        match self {
            Fallback::Dash => Cell::Text("-".to_string()),
            Fallback::Zero => Cell::Number(0.0),
            Fallback::Empty => Cell::Empty,
        }
    }
}

/// Payroll quantities read from an employee's row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Contact number
    Phone,
    /// Personnel code
    EmployeeCode,
    /// Base hourly pay
    BaseHourlyPay,
    /// Total hours worked in the period
    HoursWorked,
    /// Days worked in the period
    DaysWorked,
    /// Unauthorized delay
    UnauthorizedDelay,
    /// Grocery voucher
    GroceryVoucher,
    /// Punctuality bonus
    PunctualityBonus,
    /// Performance bonus
    PerformanceBonus,
    /// Mission allowance
    Mission,
    /// Sum of benefits
    TotalBenefits,
    /// Gross salary
    TotalSalary,
    /// Insurance contribution
    Insurance,
    /// Salary advance
    SalaryAdvance,
    /// Voucher wastage
    VoucherLoss,
    /// Monthly consumption
    MonthlyConsumption,
    /// Late-arrival penalty
    LatePenalty,
    /// Interest-free loan repayment
    LoanRepayment,
    /// Sum of deductions
    TotalDeductions,
    /// Net pay
    NetPay,
    /// Bank account number
    BankAccount,
}

impl Field {
    /// Every field, in resolution order.
    pub const ALL: [Field; 21] = [
        Field::Phone,
        Field::EmployeeCode,
        Field::BaseHourlyPay,
        Field::HoursWorked,
        Field::DaysWorked,
        Field::UnauthorizedDelay,
        Field::GroceryVoucher,
        Field::PunctualityBonus,
        Field::PerformanceBonus,
        Field::Mission,
        Field::TotalBenefits,
        Field::TotalSalary,
        Field::Insurance,
        Field::SalaryAdvance,
        Field::VoucherLoss,
        Field::MonthlyConsumption,
        Field::LatePenalty,
        Field::LoanRepayment,
        Field::TotalDeductions,
        Field::NetPay,
        Field::BankAccount,
    ];

    /// Spreadsheet header this field is read from.
    pub fn column(self) -> &'static str {
        match self {
            Field::Phone => "شماره تماس",
            Field::EmployeeCode => "کد پرسنلی",
            Field::BaseHourlyPay => "حقوق پایه",
            Field::HoursWorked => "مجموع ساعت کاری",
            Field::DaysWorked => "روز کارکرد",
            Field::UnauthorizedDelay => "تاخیر غیر مجاز",
            Field::GroceryVoucher => "بن مصرفی",
            Field::PunctualityBonus => "پاداش وقت شناسی",
            Field::PerformanceBonus => "پاداش",
            Field::Mission => "مازاد مسکن",
            Field::TotalBenefits => "جمع مزایا",
            Field::TotalSalary => "جمع حقوق",
            Field::Insurance => "بیمه",
            Field::SalaryAdvance => "مساعده",
            Field::VoucherLoss => "اتلاف بن مصرفی",
            Field::MonthlyConsumption => "مصرف ماه",
            Field::LatePenalty => "جریمه تاخیر",
            Field::LoanRepayment => "وام",
            Field::TotalDeductions => "جمع کسور",
            Field::NetPay => "پرداختی",
            Field::BankAccount => "شماره حساب",
        }
    }

    /// Label printed next to the value on the payslip.
    pub fn label(self) -> &'static str {
        match self {
            Field::BaseHourlyPay => "حقوق ساعتی پایه",
            Field::HoursWorked => "کارکرد ساعتی",
            Field::DaysWorked => "تعداد روز کارکرد",
            Field::GroceryVoucher => "بن مصرفی خواربار",
            Field::PerformanceBonus => "پاداش عملکرد",
            Field::Mission => "ماموریت",
            Field::LoanRepayment => "بازپرداخت وام قرض الحسنه",
            Field::NetPay => "جمع پرداختی:",
            other => other.column(),
        }
    }

    /// Presentation kind.
    pub fn kind(self) -> FieldKind {
        match self {
            Field::Phone => FieldKind::Phone,
            Field::EmployeeCode | Field::BankAccount => FieldKind::Text,
            Field::HoursWorked | Field::UnauthorizedDelay => FieldKind::Duration,
            _ => FieldKind::Amount,
        }
    }

    /// Fallback for a missing or empty cell.
    pub fn fallback(self) -> Fallback {
        match self {
            Field::Phone | Field::TotalBenefits | Field::TotalDeductions => Fallback::Empty,
            Field::HoursWorked
            | Field::UnauthorizedDelay
            | Field::TotalSalary
            | Field::MonthlyConsumption
            | Field::NetPay => Fallback::Zero,
            _ => Fallback::Dash,
        }
    }

    fn position(self) -> usize {
        Field::ALL
            .iter()
            .position(|&f| f == self)
            .unwrap_or_default()
    }
}

/// Look up `column` in `row`, returning `default` when the column is absent
/// or the cell is empty. The cell is returned unmodified otherwise.
pub fn lookup(row: &Row<'_>, column: &str, default: Cell) -> Cell {
    match row.get(column) {
        Some(cell) if !cell.is_empty() => cell.clone(),
        _ => default,
    }
}

/// Resolved field values for one employee.
#[derive(Debug, Clone)]
pub struct FieldSet {
    values: Vec<Cell>,
}

impl FieldSet {
    /// Resolve every [`Field`] from a row.
    pub fn resolve(row: &Row<'_>) -> Self {
        let values = Field::ALL
            .iter()
            .map(|&field| lookup(row, field.column(), field.fallback().cell()))
            .collect();
        Self { values }
    }

    /// Value of a field (the fallback if it was missing).
    pub fn get(&self, field: Field) -> &Cell {
        &self.values[field.position()]
    }

    /// Whether the source cell held a real value rather than the fallback.
    pub fn is_present(&self, field: Field) -> bool {
        !self.get(field).is_empty()
    }

    /// Phone number as digits.
    ///
    /// Numeric cells are truncated to an integer. Text must parse as a
    /// number; anything else is an error since the number cannot be shown.
    pub fn phone(&self) -> Result<String, RenderError> {
        let cell = self.get(Field::Phone);
        match cell {
            Cell::Empty => Ok(String::new()),
            Cell::Text(s) if s.trim() == "-" => Ok(s.trim().to_string()),
            _ => cell
                .as_number()
                .map(|n| format!("{}", n.trunc() as i64))
                .ok_or_else(|| RenderError::UnparseableField {
                    field: Field::Phone.column(),
                    value: cell.to_string(),
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::RowTable;

    fn single_row(columns: &[&str], cells: Vec<Cell>) -> RowTable {
        RowTable::new(columns.iter().map(|c| c.to_string()).collect(), vec![cells])
    }

    #[test]
    fn test_lookup_missing_column_returns_default() {
        let t = single_row(&["نام"], vec![Cell::text("Sara")]);
        let row = t.row(0).unwrap();
        assert_eq!(lookup(&row, "بیمه", Cell::text("-")), Cell::text("-"));
    }

    #[test]
    fn test_lookup_empty_cell_returns_default() {
        let t = single_row(&["بیمه"], vec![Cell::Empty]);
        let row = t.row(0).unwrap();
        assert_eq!(lookup(&row, "بیمه", Cell::Number(0.0)), Cell::Number(0.0));
    }

    #[test]
    fn test_lookup_returns_raw_value() {
        let t = single_row(&["بیمه"], vec![Cell::text("n/a")]);
        let row = t.row(0).unwrap();
        assert_eq!(lookup(&row, "بیمه", Cell::Empty), Cell::text("n/a"));
    }

    #[test]
    fn test_resolve_applies_fallbacks() {
        let t = single_row(&["نام", "پرداختی"], vec![Cell::text("Sara"), Cell::Number(5e6)]);
        let fields = FieldSet::resolve(&t.row(0).unwrap());
        assert_eq!(fields.get(Field::NetPay), &Cell::Number(5e6));
        assert_eq!(fields.get(Field::Insurance), &Cell::text("-"));
        assert_eq!(fields.get(Field::HoursWorked), &Cell::Number(0.0));
        assert_eq!(fields.get(Field::TotalBenefits), &Cell::Empty);
        assert!(!fields.is_present(Field::TotalBenefits));
    }

    #[test]
    fn test_every_field_has_distinct_column() {
        let mut columns: Vec<&str> = Field::ALL.iter().map(|f| f.column()).collect();
        columns.sort();
        columns.dedup();
        assert_eq!(columns.len(), Field::ALL.len());
    }

    #[test]
    fn test_phone_numeric() {
        let t = single_row(&["شماره تماس"], vec![Cell::Number(9121234567.0)]);
        let fields = FieldSet::resolve(&t.row(0).unwrap());
        assert_eq!(fields.phone().unwrap(), "9121234567");
    }

    #[test]
    fn test_phone_numeric_text() {
        let t = single_row(&["شماره تماس"], vec![Cell::text("9121234567.0")]);
        let fields = FieldSet::resolve(&t.row(0).unwrap());
        assert_eq!(fields.phone().unwrap(), "9121234567");
    }

    #[test]
    fn test_phone_missing_is_blank() {
        let t = single_row(&["نام"], vec![Cell::text("Sara")]);
        let fields = FieldSet::resolve(&t.row(0).unwrap());
        assert_eq!(fields.phone().unwrap(), "");
    }

    #[test]
    fn test_phone_unparseable() {
        let t = single_row(&["شماره تماس"], vec![Cell::text("call reception")]);
        let fields = FieldSet::resolve(&t.row(0).unwrap());
        let err = fields.phone().unwrap_err();
        assert!(matches!(err, RenderError::UnparseableField { value, .. } if value == "call reception"));
    }
}

//! Display formatting for amounts and durations.
//!
//! Amounts always render with zero decimals and `,` thousands separators.
//! Durations render as `H:MM`.

use crate::table::Cell;

/// Placeholder for values that cannot be shown.
pub const PLACEHOLDER: &str = "-";

/// Format a numeric cell with thousands separators and no decimals.
///
/// Numeric text is parsed first. Anything non-numeric passes through as its
/// display string.
pub fn format_amount(value: &Cell) -> String {
    match value.as_number() {
        Some(n) => group_thousands(n),
        None => value.to_string(),
    }
}

/// Format a duration, or a number of decimal hours, as `H:MM`.
///
/// The value is rounded to whole seconds; minutes are zero-padded, hours are
/// not. Negative values are unsupported and yield [`PLACEHOLDER`].
/// Non-numeric text falls back to [`format_amount`].
pub fn format_duration(value: &Cell) -> String {
    let seconds = match value {
        Cell::Duration(d) => d.num_milliseconds() as f64 / 1000.0,
        other => match other.as_number() {
            Some(hours) => hours * 3600.0,
            None => return format_amount(other),
        },
    };

    if seconds < 0.0 {
        return PLACEHOLDER.to_string();
    }

    let total = seconds.round() as i64;
    format!("{}:{:02}", total / 3600, (total % 3600) / 60)
}

/// Round to an integer and insert `,` every three digits.
fn group_thousands(n: f64) -> String {
    let rounded = format!("{:.0}", n);
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(d) if d.bytes().any(|b| b != b'0') => ("-", d),
        Some(d) => ("", d),
        None => ("", rounded.as_str()),
    };

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push_str(sign);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

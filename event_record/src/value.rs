use chrono::{DateTime, FixedOffset, NaiveDateTime};

use crate::datetime::format_naive;

/// A single source value, before coercion into a canonical field.
///
/// Spreadsheet cells and labels extracted from text documents are both
/// brought to this representation, so that the coercion rules are shared.
#[derive(PartialEq, Debug, Clone)]
pub enum RawValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// A value that the source already typed as a point in time.
    Timestamp(NaiveDateTime),
    ZonedTimestamp(DateTime<FixedOffset>),
}

impl RawValue {
    /// Empty cells and blank strings carry no information.
    pub fn is_empty(&self) -> bool {
        match self {
            RawValue::Empty => true,
            RawValue::Text(s) => s.trim().is_empty(),
            RawValue::Number(f) => f.is_nan(),
            _ => false,
        }
    }
}

/// Integer coercion: parse as a non-negative integer, 0 on absence or failure.
pub fn coerce_int(value: Option<&RawValue>) -> u64 {
    match value {
        Some(RawValue::Number(f)) => float_to_count(*f),
        Some(RawValue::Text(s)) => {
            let s = s.trim();
            match s.parse::<u64>() {
                Ok(x) => x,
                // Spreadsheets exported as text sometimes keep a float notation ("1500.0")
                Err(_) => s.parse::<f64>().map(float_to_count).unwrap_or(0),
            }
        }
        _ => 0,
    }
}

fn float_to_count(f: f64) -> u64 {
    if f.is_finite() && f >= 0.0 {
        f.trunc() as u64
    } else {
        0
    }
}

/// String coercion: stringify and trim, empty string on absence.
pub fn coerce_string(value: Option<&RawValue>) -> String {
    match value {
        None | Some(RawValue::Empty) => String::new(),
        Some(RawValue::Text(s)) => s.trim().to_string(),
        Some(RawValue::Number(f)) if f.is_nan() => String::new(),
        Some(RawValue::Number(f)) if f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", *f as i64)
        }
        Some(RawValue::Number(f)) => f.to_string(),
        Some(RawValue::Bool(b)) => b.to_string(),
        Some(RawValue::Timestamp(dt)) => format_naive(dt),
        Some(RawValue::ZonedTimestamp(dt)) => dt.to_rfc3339(),
    }
}

/// Like [coerce_string], but absent and blank values are reported as `None`.
pub fn coerce_optional_string(value: Option<&RawValue>) -> Option<String> {
    let s = coerce_string(value);
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

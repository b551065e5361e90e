use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime};
use log::debug;

use crate::value::RawValue;

/// Layouts tried by the generic parser, after RFC 3339 and RFC 2822.
/// Ambiguous slash dates are read month first.
const DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M",
    "%d %B %Y %H:%M",
    "%d %b %Y %H:%M",
    "%B %d, %Y %H:%M",
    "%b %d, %Y %H:%M",
    "%B %d %Y %H:%M",
    "%B %d, %Y %I:%M %p",
];

const DATE_LAYOUTS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
];

// Day 0 of the spreadsheet date encoding (accounts for the 1900 leap year quirk).
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);
// 9999-12-31
const MAX_SERIAL: f64 = 2_958_465.0;

/// Canonical ISO-8601 rendering of a naive timestamp.
///
/// Fractional seconds only appear when they are not zero.
pub fn format_naive(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

fn format_zoned(dt: &DateTime<FixedOffset>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.f%:z").to_string()
}

/// Converts a spreadsheet serial date (days since 1899-12-30, fraction = time of day).
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial <= 0.0 || serial > MAX_SERIAL {
        return None;
    }
    let (y, m, d) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc() as i64;
    let seconds = ((serial - serial.trunc()) * 86_400.0).round() as i64;
    epoch
        .checked_add_signed(Duration::days(days))?
        .checked_add_signed(Duration::seconds(seconds))
}

/// Reconciles any source value into an ISO-8601 string.
///
/// Attempts, in order: passthrough of values already typed as timestamps
/// (including spreadsheet serial numbers), generic parsing of the common
/// human layouts, strict ISO-8601. The empty string means "unknown"; this
/// function never fails.
pub fn parse_datetime(value: &RawValue) -> String {
    match value {
        RawValue::Timestamp(dt) => format_naive(dt),
        RawValue::ZonedTimestamp(dt) => format_zoned(dt),
        RawValue::Number(f) => excel_serial_to_datetime(*f)
            .map(|dt| format_naive(&dt))
            .unwrap_or_default(),
        RawValue::Text(s) => parse_datetime_str(s),
        RawValue::Empty | RawValue::Bool(_) => String::new(),
    }
}

/// Free-text variant of [parse_datetime].
pub fn parse_datetime_str(s: &str) -> String {
    let s = s.trim();
    if s.is_empty() {
        return String::new();
    }
    if let Some(res) = parse_generic(s) {
        return res;
    }
    if let Some(res) = parse_strict_iso(s) {
        return res;
    }
    debug!("parse_datetime_str: could not understand {:?}", s);
    String::new()
}

fn parse_generic(s: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(format_zoned(&dt));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(format_zoned(&dt));
    }
    for layout in DATETIME_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(format_naive(&dt));
        }
    }
    for layout in DATE_LAYOUTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, layout) {
            return d.and_hms_opt(0, 0, 0).map(|dt| format_naive(&dt));
        }
    }
    None
}

fn parse_strict_iso(s: &str) -> Option<String> {
    if let Ok(dt) = s.parse::<DateTime<FixedOffset>>() {
        return Some(format_zoned(&dt));
    }
    if let Ok(dt) = s.parse::<NaiveDateTime>() {
        return Some(format_naive(&dt));
    }
    s.parse::<NaiveDate>()
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| format_naive(&dt))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RawValue {
        RawValue::Text(s.to_string())
    }

    #[test]
    fn unknown_values_are_empty() {
        assert_eq!(parse_datetime(&RawValue::Empty), "");
        assert_eq!(parse_datetime(&text("")), "");
        assert_eq!(parse_datetime(&text("   ")), "");
        assert_eq!(parse_datetime(&text("after the show")), "");
        assert_eq!(parse_datetime(&text("2025-13-45 99:99")), "");
        assert_eq!(parse_datetime(&RawValue::Bool(true)), "");
        assert_eq!(parse_datetime(&RawValue::Number(-3.0)), "");
        assert_eq!(parse_datetime(&RawValue::Number(f64::INFINITY)), "");
    }

    #[test]
    fn timestamps_pass_through() {
        let dt = NaiveDate::from_ymd_opt(2025, 10, 10)
            .unwrap()
            .and_hms_opt(19, 30, 0)
            .unwrap();
        assert_eq!(parse_datetime(&RawValue::Timestamp(dt)), "2025-10-10T19:30:00");
    }

    #[test]
    fn spreadsheet_serial_dates() {
        // 45940 is 2025-10-10, 0.8125 of a day is 19:30
        assert_eq!(
            parse_datetime(&RawValue::Number(45940.8125)),
            "2025-10-10T19:30:00"
        );
        assert_eq!(parse_datetime(&RawValue::Number(45940.0)), "2025-10-10T00:00:00");
    }

    #[test]
    fn common_layouts() {
        assert_eq!(parse_datetime(&text("2025-10-10 19:30")), "2025-10-10T19:30:00");
        assert_eq!(parse_datetime(&text("2025-10-10T19:30:00")), "2025-10-10T19:30:00");
        assert_eq!(parse_datetime(&text("10/10/2025 7:30 PM")), "2025-10-10T19:30:00");
        assert_eq!(parse_datetime(&text("10 October 2025 19:30")), "2025-10-10T19:30:00");
        assert_eq!(parse_datetime(&text("October 10, 2025")), "2025-10-10T00:00:00");
        assert_eq!(parse_datetime(&text("25/10/2025 08:00")), "2025-10-25T08:00:00");
        assert_eq!(
            parse_datetime(&text("2025-10-10T19:30:00.250")),
            "2025-10-10T19:30:00.250"
        );
    }

    #[test]
    fn offsets_are_kept() {
        assert_eq!(
            parse_datetime(&text("2025-10-10T19:30:00+08:00")),
            "2025-10-10T19:30:00+08:00"
        );
        assert_eq!(
            parse_datetime(&text("2025-10-10T11:30:00Z")),
            "2025-10-10T11:30:00+00:00"
        );
    }
}

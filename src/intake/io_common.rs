use std::path::Path;

use calamine::{DataType, Range};

use crate::intake::*;

/// The bare file name of a path, without directories.
pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("upload")
        .to_string()
}

/// `Gate ID ` -> `gate_id`
pub fn normalize_header(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

pub fn cell_value(cell: &DataType) -> RawValue {
    match cell {
        DataType::String(s) => RawValue::Text(s.clone()),
        DataType::Float(f) => RawValue::Number(*f),
        DataType::Int(i) => RawValue::Number(*i as f64),
        DataType::Bool(b) => RawValue::Bool(*b),
        // Numbers formatted as dates in the workbook.
        DataType::DateTime(serial) => match excel_serial_to_datetime(*serial) {
            Some(dt) => RawValue::Timestamp(dt),
            None => RawValue::Number(*serial),
        },
        DataType::Empty => RawValue::Empty,
        _ => RawValue::Empty,
    }
}

fn is_empty_row(row: &[DataType]) -> bool {
    row.iter().all(|c| cell_value(c).is_empty())
}

/// Number of non-empty rows after the header.
pub fn count_data_rows(range: &Range<DataType>) -> usize {
    range.rows().skip(1).filter(|row| !is_empty_row(row)).count()
}

/// Reads a sheet into records keyed by normalized column name.
///
/// The first row is the header. Rows with only empty cells are skipped. When
/// two columns normalize to the same name, the first one is kept.
pub fn sheet_records(range: &Range<DataType>) -> Vec<RowRecord> {
    let mut rows = range.rows();
    let header: Vec<String> = match rows.next() {
        Some(h) => h
            .iter()
            .map(|c| normalize_header(&coerce_string(Some(&cell_value(c)))))
            .collect(),
        None => return Vec::new(),
    };
    debug!("sheet_records: header: {:?}", header);

    let mut res: Vec<RowRecord> = Vec::new();
    for (idx, row) in rows.enumerate() {
        if is_empty_row(row) {
            debug!("sheet_records: skipping empty row {}", idx + 2);
            continue;
        }
        let mut record = RowRecord::new();
        for (col, name) in header.iter().enumerate() {
            if name.is_empty() || record.contains_key(name) {
                continue;
            }
            let value = row.get(col).map(cell_value).unwrap_or(RawValue::Empty);
            record.insert(name.clone(), value);
        }
        res.push(record);
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers() {
        assert_eq!(normalize_header(" Gate ID "), "gate_id");
        assert_eq!(normalize_header("Capacity Per Hour"), "capacity_per_hour");
        assert_eq!(normalize_header("gps"), "gps");
    }

    #[test]
    fn file_names() {
        assert_eq!(simplify_file_name("/tmp/uploads/plan.xlsx"), "plan.xlsx");
        assert_eq!(simplify_file_name("plan.pdf"), "plan.pdf");
        assert_eq!(simplify_file_name("/"), "upload");
    }

    #[test]
    fn cells() {
        assert_eq!(cell_value(&DataType::Int(3)), RawValue::Number(3.0));
        assert_eq!(
            cell_value(&DataType::String("x".to_string())),
            RawValue::Text("x".to_string())
        );
        assert_eq!(
            parse_datetime(&cell_value(&DataType::DateTime(45940.8125))),
            "2025-10-10T19:30:00"
        );
    }

    #[test]
    fn records_from_range() {
        let mut range: Range<DataType> = Range::new((0, 0), (3, 2));
        range.set_value((0, 0), DataType::String("Gate ID".to_string()));
        range.set_value((0, 1), DataType::String("Capacity".to_string()));
        range.set_value((0, 2), DataType::String("gate id".to_string()));
        range.set_value((1, 0), DataType::String("A".to_string()));
        range.set_value((1, 1), DataType::Float(2000.0));
        range.set_value((1, 2), DataType::String("shadowed".to_string()));
        // row 2 left empty
        range.set_value((3, 0), DataType::String("B".to_string()));

        assert_eq!(count_data_rows(&range), 2);
        let records = sheet_records(&range);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["gate_id"], RawValue::Text("A".to_string()));
        assert_eq!(records[0]["capacity"], RawValue::Number(2000.0));
        assert_eq!(records[1]["capacity"], RawValue::Empty);
    }
}

use std::io::Cursor;

use calamine::{DataType, Range, Reader, Xls, Xlsx};
use event_record::builder::EventBuilder;

use crate::intake::io_common::{count_data_rows, sheet_records};
use crate::intake::*;

pub const ATTENDEES_SHEET: &str = "Attendees";
pub const GATES_SHEET: &str = "Gate_Capacity";
pub const TIMELINE_SHEET: &str = "Event_Timeline";
pub const TRANSPORT_SHEET: &str = "Transport_Schedule";
pub const FACILITIES_SHEET: &str = "Facilities";

// OOXML workbooks are zip archives; everything else is tried as a legacy BIFF workbook.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

enum Workbook {
    Xlsx(Xlsx<Cursor<Vec<u8>>>),
    Xls(Xls<Cursor<Vec<u8>>>),
}

impl Workbook {
    fn open(bytes: &[u8]) -> IntakeResult<Workbook> {
        let cursor = Cursor::new(bytes.to_vec());
        if bytes.starts_with(ZIP_MAGIC) {
            let wb: Xlsx<_> = Xlsx::new(cursor).context(OpeningXlsxSnafu {})?;
            Ok(Workbook::Xlsx(wb))
        } else {
            let wb: Xls<_> = Xls::new(cursor).context(OpeningXlsSnafu {})?;
            Ok(Workbook::Xls(wb))
        }
    }

    fn sheet_names(&self) -> Vec<String> {
        match self {
            Workbook::Xlsx(wb) => wb.sheet_names().to_vec(),
            Workbook::Xls(wb) => wb.sheet_names().to_vec(),
        }
    }

    /// The sheet with this name (case-insensitive). Missing or unreadable
    /// sheets are reported as `None`.
    fn range(&mut self, name: &str) -> Option<Range<DataType>> {
        let actual = self
            .sheet_names()
            .into_iter()
            .find(|n| n.trim().eq_ignore_ascii_case(name))?;
        let res = match self {
            Workbook::Xlsx(wb) => wb
                .worksheet_range(&actual)
                .map(|r| r.map_err(|e| e.to_string())),
            Workbook::Xls(wb) => wb
                .worksheet_range(&actual)
                .map(|r| r.map_err(|e| e.to_string())),
        };
        match res {
            Some(Ok(range)) => Some(range),
            Some(Err(msg)) => {
                warn!("read_workbook: sheet {:?} is unreadable, ignoring it: {}", actual, msg);
                None
            }
            None => None,
        }
    }

    fn records(&mut self, name: &str) -> Vec<RowRecord> {
        match self.range(name) {
            Some(range) => sheet_records(&range),
            None => {
                debug!("read_workbook: no sheet {:?}", name);
                Vec::new()
            }
        }
    }
}

/// Builds the event record from a workbook.
///
/// Fails only if the bytes cannot be opened as a workbook at all; missing
/// sheets and columns fall back to the defaults.
pub fn normalize_workbook(bytes: &[u8]) -> IntakeResult<CanonicalEventRecord> {
    let mut workbook = Workbook::open(bytes)?;
    debug!("normalize_workbook: sheets: {:?}", workbook.sheet_names());

    let mut builder = EventBuilder::new();

    // Only the number of attendees is kept.
    let attendance = workbook
        .range(ATTENDEES_SHEET)
        .map(|r| count_data_rows(&r))
        .unwrap_or(0);
    builder.expected_attendance(attendance as u64);

    read_timeline(&workbook.records(TIMELINE_SHEET), &mut builder);

    for row in workbook.records(GATES_SHEET).iter() {
        builder.add_gate(read_gate(row));
    }
    for row in workbook.records(TRANSPORT_SHEET).iter() {
        builder.add_transport(read_transport(row));
    }
    for row in workbook.records(FACILITIES_SHEET).iter() {
        builder.add_facility(read_facility(row));
    }

    let record = builder.build();
    info!(
        "normalize_workbook: {:?}: {} attendees, {} gates, {} transport entries, {} facilities",
        record.event_name,
        record.expected_attendance,
        record.gates.len(),
        record.transport_schedule.len(),
        record.facilities.len()
    );
    Ok(record)
}

fn first_datetime(aliases: &[&str], row: &RowRecord) -> Option<String> {
    aliases
        .iter()
        .filter_map(|alias| row.get(*alias))
        .map(parse_datetime)
        .find(|s| !s.is_empty())
}

// Timeline rows may be phases of the same event: the event window covers all of them.
fn read_timeline(rows: &[RowRecord], builder: &mut EventBuilder) {
    if let Some(first) = rows.first() {
        builder.event_name(&coerce_string(TIMELINE_ALIASES.resolve("event_name", first)));
        builder.location_name(&coerce_string(
            TIMELINE_ALIASES.resolve("location_name", first),
        ));
    }
    for field in ["start", "end"] {
        if !rows.is_empty() && !TIMELINE_ALIASES.has_column(field, rows[0].keys()) {
            warn!(
                "read_timeline: no {} column for the {}, tried {:?}",
                field,
                TIMELINE_ALIASES.entity,
                TIMELINE_ALIASES.aliases(field)
            );
        }
    }
    let starts = TIMELINE_ALIASES.aliases("start");
    let ends = TIMELINE_ALIASES.aliases("end");
    for (idx, row) in rows.iter().enumerate() {
        let start = first_datetime(starts, row);
        let end = first_datetime(ends, row);
        debug!("read_timeline: row {}: start {:?} end {:?}", idx, start, end);
        if let Some(s) = start {
            builder.observe_start(&s);
        }
        if let Some(e) = end {
            builder.observe_end(&e);
        }
    }
}

fn read_gate(row: &RowRecord) -> Gate {
    let field = |name: &str| GATE_ALIASES.resolve(name, row);
    Gate::new(
        coerce_string(field("gate_id")),
        coerce_optional_string(field("gate_name")),
        coerce_int(field("capacity_per_hour")),
        coerce_optional_string(field("gps")),
    )
}

fn read_transport(row: &RowRecord) -> TransportEntry {
    let field = |name: &str| TRANSPORT_ALIASES.resolve(name, row);
    TransportEntry {
        transport_type: coerce_string(field("transport_type")),
        stop_name: coerce_string(field("stop_name")),
        arrival_datetime: field("arrival_datetime")
            .map(parse_datetime)
            .unwrap_or_default(),
        est_capacity: coerce_int(field("est_capacity")),
    }
}

fn read_facility(row: &RowRecord) -> FacilityEntry {
    let field = |name: &str| FACILITY_ALIASES.resolve(name, row);
    FacilityEntry {
        kind: coerce_string(field("type")).to_lowercase(),
        name: coerce_string(field("name")),
        capacity: coerce_int(field("capacity")),
        location: coerce_string(field("location")),
    }
}

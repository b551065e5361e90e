use std::cmp::Ordering;

use chrono::DateTime;

pub use crate::record::*;

// Timestamps that both carry an offset are compared as instants, the others
// by their ISO text.
fn compare_iso(a: &str, b: &str) -> Ordering {
    match (DateTime::parse_from_rfc3339(a), DateTime::parse_from_rfc3339(b)) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

/// Accumulates the pieces of an event as a document is read, and produces
/// a complete [CanonicalEventRecord].
///
/// The builder takes care of the defaults: a missing name or venue gets the
/// placeholder label, missing timestamps stay empty.
///
/// ```
/// use event_record::builder::EventBuilder;
///
/// let mut builder = EventBuilder::new();
/// builder.event_name("Harbour Lights");
/// builder.observe_start("2025-10-10T20:00:00");
/// builder.observe_start("2025-10-10T18:00:00");
/// let record = builder.build();
///
/// assert_eq!(record.event_start_datetime, "2025-10-10T18:00:00");
/// assert_eq!(record.location_name, "Unknown Venue");
/// ```
#[derive(Debug, Default)]
pub struct EventBuilder {
    event_name: Option<String>,
    location_name: Option<String>,
    expected_attendance: u64,
    earliest_start: Option<String>,
    latest_end: Option<String>,
    gates: Vec<Gate>,
    transport_schedule: Vec<TransportEntry>,
    facilities: Vec<FacilityEntry>,
}

impl EventBuilder {
    pub fn new() -> EventBuilder {
        EventBuilder::default()
    }

    /// Blank names are ignored.
    pub fn event_name(&mut self, name: &str) {
        if !name.trim().is_empty() {
            self.event_name = Some(name.trim().to_string());
        }
    }

    pub fn location_name(&mut self, name: &str) {
        if !name.trim().is_empty() {
            self.location_name = Some(name.trim().to_string());
        }
    }

    pub fn expected_attendance(&mut self, count: u64) {
        self.expected_attendance = count;
    }

    /// Records a start time (ISO-8601). Only the earliest one is kept.
    pub fn observe_start(&mut self, iso: &str) {
        if iso.is_empty() {
            return;
        }
        match &self.earliest_start {
            Some(cur) if compare_iso(cur, iso) != Ordering::Greater => {}
            _ => self.earliest_start = Some(iso.to_string()),
        }
    }

    /// Records an end time (ISO-8601). Only the latest one is kept.
    pub fn observe_end(&mut self, iso: &str) {
        if iso.is_empty() {
            return;
        }
        match &self.latest_end {
            Some(cur) if compare_iso(cur, iso) != Ordering::Less => {}
            _ => self.latest_end = Some(iso.to_string()),
        }
    }

    pub fn add_gate(&mut self, gate: Gate) {
        self.gates.push(gate);
    }

    pub fn add_transport(&mut self, entry: TransportEntry) {
        self.transport_schedule.push(entry);
    }

    pub fn add_facility(&mut self, entry: FacilityEntry) {
        self.facilities.push(entry);
    }

    pub fn build(self) -> CanonicalEventRecord {
        CanonicalEventRecord {
            event_name: self
                .event_name
                .unwrap_or_else(|| DEFAULT_EVENT_NAME.to_string()),
            location_name: self
                .location_name
                .unwrap_or_else(|| DEFAULT_LOCATION_NAME.to_string()),
            expected_attendance: self.expected_attendance,
            event_start_datetime: self.earliest_start.unwrap_or_default(),
            event_end_datetime: self.latest_end.unwrap_or_default(),
            gates: self.gates,
            transport_schedule: self.transport_schedule,
            facilities: self.facilities,
        }
    }
}

use std::collections::HashMap;

use crate::value::RawValue;

/// One source row, keyed by normalized column name.
pub type RowRecord = HashMap<String, RawValue>;

/// Accepted source spellings for the canonical fields of one entity type.
///
/// Each canonical field lists its aliases in order of preference. Adding a
/// new spelling is a change to the table only.
#[derive(Debug)]
pub struct AliasTable {
    pub entity: &'static str,
    pub fields: &'static [(&'static str, &'static [&'static str])],
}

impl AliasTable {
    /// The accepted spellings for a canonical field (empty if the field is unknown).
    pub fn aliases(&self, field: &str) -> &'static [&'static str] {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, aliases)| *aliases)
            .unwrap_or(&[])
    }

    /// Returns the value of the first alias present (non-empty) in the row.
    pub fn resolve<'r>(&self, field: &str, row: &'r RowRecord) -> Option<&'r RawValue> {
        resolve_first(self.aliases(field), row)
    }

    /// True if at least one column of the header is an alias of the field.
    pub fn has_column<'h>(
        &self,
        field: &str,
        mut header: impl Iterator<Item = &'h String>,
    ) -> bool {
        let aliases = self.aliases(field);
        header.any(|col| aliases.contains(&col.as_str()))
    }
}

/// The lookup shared by all the entity types.
fn resolve_first<'r>(aliases: &[&str], row: &'r RowRecord) -> Option<&'r RawValue> {
    aliases
        .iter()
        .filter_map(|alias| row.get(*alias))
        .find(|v| !v.is_empty())
}

pub const GATE_ALIASES: AliasTable = AliasTable {
    entity: "gate",
    fields: &[
        ("gate_id", &["gate_id", "id", "gate"]),
        ("gate_name", &["gate_name", "name"]),
        ("capacity_per_hour", &["capacity_per_hour", "capacity", "throughput"]),
        ("gps", &["gps", "coordinates"]),
    ],
};

pub const TRANSPORT_ALIASES: AliasTable = AliasTable {
    entity: "transport",
    fields: &[
        ("transport_type", &["transport", "transport_type", "type", "mode"]),
        ("stop_name", &["stop_name", "stop", "station"]),
        ("arrival_datetime", &["arrival", "arrival_time", "arrival_datetime"]),
        ("est_capacity", &["capacity", "est_capacity"]),
    ],
};

pub const FACILITY_ALIASES: AliasTable = AliasTable {
    entity: "facility",
    fields: &[
        ("type", &["type", "category"]),
        ("name", &["name", "facility_name"]),
        ("capacity", &["capacity"]),
        ("location", &["location", "area"]),
    ],
};

pub const TIMELINE_ALIASES: AliasTable = AliasTable {
    entity: "timeline",
    fields: &[
        ("start", &["start", "start_datetime", "start_time", "starttime"]),
        ("end", &["end", "end_datetime", "end_time", "endtime"]),
        ("event_name", &["event_name", "name"]),
        ("location_name", &["venue", "location", "location_name"]),
    ],
};

// ********* Canonical output structures ***********

use serde::{Deserialize, Serialize};

pub const DEFAULT_EVENT_NAME: &str = "Unnamed Event";
pub const DEFAULT_LOCATION_NAME: &str = "Unknown Venue";

/// An entry point into the venue.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Gate {
    pub gate_id: String,
    pub gate_name: String,
    pub capacity_per_hour: u64,
    /// "lat,lng" when the source provides a position.
    pub gps: Option<String>,
}

impl Gate {
    /// Builds a gate, naming it after its identifier when no name is given.
    pub fn new(
        gate_id: String,
        gate_name: Option<String>,
        capacity_per_hour: u64,
        gps: Option<String>,
    ) -> Gate {
        let gate_name = match gate_name {
            Some(name) if !name.is_empty() => name,
            _ => format!("Gate {}", gate_id).trim_end().to_string(),
        };
        Gate {
            gate_id,
            gate_name,
            capacity_per_hour,
            gps,
        }
    }
}

/// A scheduled arrival of public or shuttle transport near the venue.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TransportEntry {
    pub transport_type: String,
    pub stop_name: String,
    /// ISO-8601, or empty when unknown.
    pub arrival_datetime: String,
    pub est_capacity: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FacilityEntry {
    /// Lower-cased category (restroom, stall, shade, ...)
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub capacity: u64,
    pub location: String,
}

/// The single normalized shape every uploaded document converges to.
///
/// All the fields are always present. Unknown timestamps are represented by
/// an empty string, never by a missing value. Records are built once, through
/// [crate::builder::EventBuilder] or [crate::sample::sample_event], and are
/// not modified afterwards.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalEventRecord {
    pub event_name: String,
    pub location_name: String,
    pub expected_attendance: u64,
    pub event_start_datetime: String,
    pub event_end_datetime: String,
    pub gates: Vec<Gate>,
    pub transport_schedule: Vec<TransportEntry>,
    pub facilities: Vec<FacilityEntry>,
}

impl CanonicalEventRecord {
    /// Sum of the hourly throughput of all the gates.
    pub fn total_gate_capacity(&self) -> u64 {
        self.gates.iter().map(|g| g.capacity_per_hour).sum()
    }
}

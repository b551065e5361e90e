use crate::record::*;

/// Hourly throughput of all the gates of the sample event.
pub const SAMPLE_TOTAL_GATE_CAPACITY: u64 = 10_000;

fn gate(id: &str, capacity_per_hour: u64, gps: &str) -> Gate {
    Gate::new(id.to_string(), None, capacity_per_hour, Some(gps.to_string()))
}

fn transport(kind: &str, stop: &str, arrival: &str, est_capacity: u64) -> TransportEntry {
    TransportEntry {
        transport_type: kind.to_string(),
        stop_name: stop.to_string(),
        arrival_datetime: arrival.to_string(),
        est_capacity,
    }
}

fn facility(kind: &str, name: &str, capacity: u64, location: &str) -> FacilityEntry {
    FacilityEntry {
        kind: kind.to_string(),
        name: name.to_string(),
        capacity,
        location: location.to_string(),
    }
}

/// The event used whenever nothing can be recovered from an upload.
///
/// A new value is built on every call: callers own their copy.
pub fn sample_event() -> CanonicalEventRecord {
    CanonicalEventRecord {
        event_name: "Bukit Jalil Concert".to_string(),
        location_name: "Bukit Jalil National Stadium".to_string(),
        expected_attendance: 50_000,
        event_start_datetime: "2025-10-10T19:30:00".to_string(),
        event_end_datetime: "2025-10-10T23:30:00".to_string(),
        gates: vec![
            gate("A", 2000, "3.0485,101.6795"),
            gate("B", 3000, "3.0480,101.6805"),
            gate("C", 2500, "3.0475,101.6795"),
            gate("D", 2500, "3.0485,101.6800"),
        ],
        transport_schedule: vec![
            transport("LRT", "Bukit Jalil Station", "2025-10-10T19:10:00", 1500),
            transport("LRT", "Bukit Jalil Station", "2025-10-10T19:25:00", 1800),
            transport("Bus Shuttle", "Main Parking", "2025-10-10T19:15:00", 800),
        ],
        facilities: vec![
            facility("restroom", "North Restrooms", 50, "North Wing"),
            facility("stall", "Food Court A", 200, "East Plaza"),
            facility("shade", "Covered Concourse", 1500, "South Concourse"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_is_consistent() {
        let s = sample_event();
        assert_eq!(s.total_gate_capacity(), SAMPLE_TOTAL_GATE_CAPACITY);
        assert!(!s.event_name.is_empty());
        assert!(!s.location_name.is_empty());
        assert!(s.event_start_datetime < s.event_end_datetime);
        assert!(s.gates.iter().all(|g| g.gate_name == format!("Gate {}", g.gate_id)));
        assert!(s
            .transport_schedule
            .iter()
            .all(|t| t.arrival_datetime.as_str() < s.event_start_datetime.as_str()));
        assert!(s.facilities.iter().all(|f| f.kind == f.kind.to_lowercase()));
    }

    #[test]
    fn sample_is_stable() {
        assert_eq!(sample_event(), sample_event());
    }

    #[test]
    fn sample_serializes_all_fields() {
        let js = serde_json::to_value(sample_event()).unwrap();
        let obj = js.as_object().unwrap();
        for k in [
            "event_name",
            "location_name",
            "expected_attendance",
            "event_start_datetime",
            "event_end_datetime",
            "gates",
            "transport_schedule",
            "facilities",
        ] {
            assert!(obj.contains_key(k), "missing {}", k);
        }
        assert_eq!(js["facilities"][0]["type"], "restroom");
        assert_eq!(js["gates"][0]["gps"], "3.0485,101.6795");
    }
}

//! Change detection between the persisted flight row and a fresh snapshot.

use serde_json::json;

use crate::models::{ChangeKind, ChangeRecord, Flight, FlightSnapshot, FlightStatus};

/// Minimum delay delta, in minutes, that produces a DELAY_UPDATE record.
/// Smaller fluctuations are suppressed to avoid notification spam.
const DELAY_NOISE_MINUTES: i32 = 5;

/// Diffs the persisted row against a fresh provider snapshot.
///
/// Pure and deterministic: gate changes (departure, then arrival), time
/// changes (scheduled departure, then arrival), status change, delay update,
/// cancellation. Identical inputs yield an empty list. A cancellation is
/// emitted as an additional record beside the status change; consumers treat
/// it as the higher-priority signal.
pub fn detect_changes(old: &Flight, new: &FlightSnapshot) -> Vec<ChangeRecord> {
    let mut changes = Vec::new();

    if old.departure_gate != new.origin.gate {
        changes.push(ChangeRecord {
            kind: ChangeKind::GateChange,
            old_value: json!({ "gate": old.departure_gate }),
            new_value: json!({ "gate": new.origin.gate }),
            description: format!(
                "Departure gate changed from {} to {}",
                old.departure_gate.as_deref().unwrap_or("none"),
                new.origin.gate.as_deref().unwrap_or("none"),
            ),
        });
    }

    if old.arrival_gate != new.destination.gate {
        changes.push(ChangeRecord {
            kind: ChangeKind::GateChange,
            old_value: json!({ "gate": old.arrival_gate }),
            new_value: json!({ "gate": new.destination.gate }),
            description: format!(
                "Arrival gate changed from {} to {}",
                old.arrival_gate.as_deref().unwrap_or("none"),
                new.destination.gate.as_deref().unwrap_or("none"),
            ),
        });
    }

    if old.scheduled_departure != new.times.scheduled_departure {
        changes.push(ChangeRecord {
            kind: ChangeKind::TimeChange,
            old_value: json!({ "scheduled_departure": old.scheduled_departure }),
            new_value: json!({ "scheduled_departure": new.times.scheduled_departure }),
            description: "Scheduled departure time changed".to_string(),
        });
    }

    if old.scheduled_arrival != new.times.scheduled_arrival {
        changes.push(ChangeRecord {
            kind: ChangeKind::TimeChange,
            old_value: json!({ "scheduled_arrival": old.scheduled_arrival }),
            new_value: json!({ "scheduled_arrival": new.times.scheduled_arrival }),
            description: "Scheduled arrival time changed".to_string(),
        });
    }

    if old.status != new.status {
        changes.push(ChangeRecord {
            kind: ChangeKind::StatusChange,
            old_value: json!({ "status": old.status }),
            new_value: json!({ "status": new.status }),
            description: format!("Flight status changed from {} to {}", old.status, new.status),
        });
    }

    if (old.delay_minutes - new.delay_minutes).abs() >= DELAY_NOISE_MINUTES {
        changes.push(ChangeRecord {
            kind: ChangeKind::DelayUpdate,
            old_value: json!({ "delay_minutes": old.delay_minutes }),
            new_value: json!({ "delay_minutes": new.delay_minutes }),
            description: format!(
                "Delay changed from {} to {} minutes",
                old.delay_minutes, new.delay_minutes
            ),
        });
    }

    if new.status == FlightStatus::Canceled && old.status != FlightStatus::Canceled {
        changes.push(ChangeRecord {
            kind: ChangeKind::Cancellation,
            old_value: json!({ "status": old.status }),
            new_value: json!({ "status": FlightStatus::Canceled }),
            description: "Flight has been canceled".to_string(),
        });
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AirportStop, FlightTimes};
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;
    use uuid::Uuid;

    fn ts(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, hour, min, 0).unwrap()
    }

    fn base_flight() -> Flight {
        Flight {
            id: Uuid::new_v4(),
            airline_code: "AA".to_string(),
            airline_name: "American Airlines".to_string(),
            flight_number: "1234".to_string(),
            origin_code: "LAX".to_string(),
            origin_terminal: Some("T4".to_string()),
            destination_code: "JFK".to_string(),
            destination_terminal: Some("T8".to_string()),
            departure_gate: Some("A12".to_string()),
            arrival_gate: Some("B24".to_string()),
            scheduled_departure: ts(10, 0),
            scheduled_arrival: ts(18, 0),
            estimated_departure: None,
            estimated_arrival: None,
            actual_departure: None,
            actual_arrival: None,
            status: FlightStatus::Scheduled,
            delay_minutes: 0,
            aircraft_type: Some("B738".to_string()),
            last_fetched_at: ts(9, 0),
            created_at: ts(8, 0),
            updated_at: ts(9, 0),
        }
    }

    /// Snapshot that mirrors the persisted row exactly
    fn matching_snapshot(flight: &Flight) -> FlightSnapshot {
        FlightSnapshot {
            airline_code: flight.airline_code.clone(),
            airline_name: flight.airline_name.clone(),
            flight_number: flight.flight_number.clone(),
            origin: AirportStop {
                code: flight.origin_code.clone(),
                terminal: flight.origin_terminal.clone(),
                gate: flight.departure_gate.clone(),
            },
            destination: AirportStop {
                code: flight.destination_code.clone(),
                terminal: flight.destination_terminal.clone(),
                gate: flight.arrival_gate.clone(),
            },
            times: FlightTimes {
                scheduled_departure: flight.scheduled_departure,
                scheduled_arrival: flight.scheduled_arrival,
                estimated_departure: flight.estimated_departure,
                estimated_arrival: flight.estimated_arrival,
                actual_departure: flight.actual_departure,
                actual_arrival: flight.actual_arrival,
            },
            status: flight.status,
            delay_minutes: flight.delay_minutes,
            aircraft_type: flight.aircraft_type.clone(),
        }
    }

    #[test]
    fn test_identical_snapshots_yield_no_changes() {
        let flight = base_flight();
        let snapshot = matching_snapshot(&flight);
        assert!(detect_changes(&flight, &snapshot).is_empty());
    }

    #[test]
    fn test_departure_gate_change_yields_exactly_one_record() {
        let flight = base_flight();
        let mut snapshot = matching_snapshot(&flight);
        snapshot.origin.gate = Some("C7".to_string());

        let changes = detect_changes(&flight, &snapshot);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::GateChange);
        assert!(changes[0].description.contains("Departure gate"));
        assert!(changes[0].description.contains("A12"));
        assert!(changes[0].description.contains("C7"));
    }

    #[test]
    fn test_gate_cleared_by_provider_is_a_change() {
        let flight = base_flight();
        let mut snapshot = matching_snapshot(&flight);
        snapshot.destination.gate = None;

        let changes = detect_changes(&flight, &snapshot);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::GateChange);
        assert!(changes[0].description.contains("to none"));
    }

    #[test]
    fn test_delay_below_noise_threshold_is_suppressed() {
        let flight = base_flight();
        let mut snapshot = matching_snapshot(&flight);
        snapshot.delay_minutes = 4;

        assert!(detect_changes(&flight, &snapshot).is_empty());
    }

    #[test]
    fn test_delay_at_noise_threshold_is_emitted() {
        let flight = base_flight();
        let mut snapshot = matching_snapshot(&flight);
        snapshot.delay_minutes = 5;

        let changes = detect_changes(&flight, &snapshot);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::DelayUpdate);
    }

    #[test]
    fn test_cancellation_emits_status_change_and_cancellation() {
        let flight = base_flight();
        let mut snapshot = matching_snapshot(&flight);
        snapshot.status = FlightStatus::Canceled;

        let changes = detect_changes(&flight, &snapshot);
        let kinds: Vec<ChangeKind> = changes.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ChangeKind::StatusChange, ChangeKind::Cancellation]);
    }

    #[test]
    fn test_already_canceled_flight_emits_no_cancellation() {
        let mut flight = base_flight();
        flight.status = FlightStatus::Canceled;
        let snapshot = matching_snapshot(&flight);

        assert!(detect_changes(&flight, &snapshot).is_empty());
    }

    #[test]
    fn test_record_ordering_is_deterministic() {
        let flight = base_flight();
        let mut snapshot = matching_snapshot(&flight);
        snapshot.origin.gate = Some("C7".to_string());
        snapshot.destination.gate = Some("D1".to_string());
        snapshot.times.scheduled_departure = ts(10, 30);
        snapshot.times.scheduled_arrival = ts(18, 30);
        snapshot.status = FlightStatus::Canceled;
        snapshot.delay_minutes = 30;

        let kinds: Vec<ChangeKind> = detect_changes(&flight, &snapshot)
            .iter()
            .map(|c| c.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                ChangeKind::GateChange,
                ChangeKind::GateChange,
                ChangeKind::TimeChange,
                ChangeKind::TimeChange,
                ChangeKind::StatusChange,
                ChangeKind::DelayUpdate,
                ChangeKind::Cancellation,
            ]
        );
    }

    proptest! {
        /// A DELAY_UPDATE is emitted iff the delta is at least 5 minutes.
        #[test]
        fn prop_delay_update_iff_delta_at_least_five(old_delay in 0i32..240, new_delay in 0i32..240) {
            let mut flight = base_flight();
            flight.delay_minutes = old_delay;
            let mut snapshot = matching_snapshot(&flight);
            snapshot.delay_minutes = new_delay;

            let changes = detect_changes(&flight, &snapshot);
            let delay_updates = changes
                .iter()
                .filter(|c| c.kind == ChangeKind::DelayUpdate)
                .count();

            if (old_delay - new_delay).abs() >= 5 {
                prop_assert_eq!(delay_updates, 1);
            } else {
                prop_assert_eq!(delay_updates, 0);
            }
        }
    }
}

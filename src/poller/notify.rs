//! Mapping from detected changes to notification requests.
//!
//! Pure functions; the poller enqueues whatever they produce. Returning
//! `None` means the tracker has not opted in to that alert, or the change
//! kind does not notify (e.g. a status transition that is not into
//! BOARDING).

use uuid::Uuid;

use crate::models::{
    ChangeKind, ChangeRecord, Connection, FlightSnapshot, FlightStatus, NotificationData,
    NotificationKind, RiskLevel, TrackedFlight,
};
use crate::queue::{NotificationRequest, Priority};

/// Delay, in minutes, above which a delay notification escalates to high
/// priority.
const HIGH_PRIORITY_DELAY_MINUTES: i32 = 30;

/// Derives the notification for one change and one tracker, honoring the
/// tracker's per-alert-type preferences.
///
/// Cancellations always notify, ignoring the per-type toggles.
pub fn notification_for_change(
    tracker: &TrackedFlight,
    change: &ChangeRecord,
    flight: &FlightSnapshot,
) -> Option<NotificationRequest> {
    let label = flight.label();

    match change.kind {
        ChangeKind::GateChange => {
            if !tracker.gate_change_alerts {
                return None;
            }
            let old_gate = gate_from(&change.old_value);
            let new_gate = gate_from(&change.new_value);
            // The departure-gate record carries the origin's new gate
            let is_departure = new_gate == flight.origin.gate;
            Some(NotificationRequest {
                user_id: tracker.user_id,
                flight_id: tracker.flight_id,
                kind: NotificationKind::GateChange,
                title: if is_departure {
                    "Departure Gate Changed".to_string()
                } else {
                    "Arrival Gate Changed".to_string()
                },
                body: format!(
                    "Your flight {} gate has changed from {} to {}.",
                    label,
                    old_gate.as_deref().unwrap_or("TBD"),
                    new_gate.as_deref().unwrap_or("TBD"),
                ),
                data: NotificationData::GateChange {
                    airline_code: flight.airline_code.clone(),
                    flight_number: flight.flight_number.clone(),
                    old_gate,
                    new_gate,
                },
                priority: Priority::Normal,
            })
        }

        ChangeKind::DelayUpdate => {
            if !tracker.delay_alerts {
                return None;
            }
            let delay_minutes = flight.delay_minutes;
            Some(NotificationRequest {
                user_id: tracker.user_id,
                flight_id: tracker.flight_id,
                kind: NotificationKind::Delay,
                title: "Delay Updated".to_string(),
                body: format!(
                    "Your flight {} delay is now {} minutes.",
                    label, delay_minutes
                ),
                data: NotificationData::Delay {
                    airline_code: flight.airline_code.clone(),
                    flight_number: flight.flight_number.clone(),
                    delay_minutes,
                },
                priority: delay_priority(delay_minutes),
            })
        }

        ChangeKind::TimeChange => {
            if !tracker.delay_alerts {
                return None;
            }
            Some(NotificationRequest {
                user_id: tracker.user_id,
                flight_id: tracker.flight_id,
                kind: NotificationKind::Delay,
                title: "Schedule Change".to_string(),
                body: format!("Your flight {} schedule has been updated.", label),
                data: NotificationData::Schedule {
                    airline_code: flight.airline_code.clone(),
                    flight_number: flight.flight_number.clone(),
                },
                priority: delay_priority(flight.delay_minutes),
            })
        }

        ChangeKind::StatusChange => {
            // Only transitions into BOARDING notify
            if flight.status != FlightStatus::Boarding || !tracker.boarding_alerts {
                return None;
            }
            Some(NotificationRequest {
                user_id: tracker.user_id,
                flight_id: tracker.flight_id,
                kind: NotificationKind::Boarding,
                title: "Boarding Started".to_string(),
                body: format!("Your flight {} is now boarding.", label),
                data: NotificationData::Boarding {
                    airline_code: flight.airline_code.clone(),
                    flight_number: flight.flight_number.clone(),
                    gate: flight.origin.gate.clone(),
                },
                priority: Priority::High,
            })
        }

        ChangeKind::Cancellation => Some(NotificationRequest {
            user_id: tracker.user_id,
            flight_id: tracker.flight_id,
            kind: NotificationKind::FlightCanceled,
            title: "Flight Canceled".to_string(),
            body: format!("Your flight {} has been canceled.", label),
            data: NotificationData::Canceled {
                airline_code: flight.airline_code.clone(),
                flight_number: flight.flight_number.clone(),
            },
            priority: Priority::High,
        }),
    }
}

/// Builds the notification for a connection whose risk level changed.
///
/// `flight_id` is the leg the recipient tracks.
pub fn connection_risk_request(
    user_id: Uuid,
    flight_id: Uuid,
    connection: &Connection,
    previous: RiskLevel,
    current: RiskLevel,
) -> NotificationRequest {
    NotificationRequest {
        user_id,
        flight_id,
        kind: NotificationKind::ConnectionRisk,
        title: "Connection Status Updated".to_string(),
        body: format!("Connection risk changed from {} to {}.", previous, current),
        data: NotificationData::ConnectionRisk {
            incoming_flight_id: connection.incoming_flight_id,
            outgoing_flight_id: connection.outgoing_flight_id,
            previous_level: previous.to_string(),
            current_level: current.to_string(),
        },
        priority: if current >= RiskLevel::HighRisk {
            Priority::High
        } else {
            Priority::Normal
        },
    }
}

fn delay_priority(delay_minutes: i32) -> Priority {
    if delay_minutes > HIGH_PRIORITY_DELAY_MINUTES {
        Priority::High
    } else {
        Priority::Normal
    }
}

fn gate_from(value: &serde_json::Value) -> Option<String> {
    value
        .get("gate")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

//! APNS-shaped push payload construction and size validation.

use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{NotificationData, NotificationKind};

/// Hard payload size bound enforced by the delivery gateway, in bytes.
///
/// Oversized payloads are rejected before any send attempt rather than sent
/// truncated.
pub const MAX_PAYLOAD_BYTES: usize = 4096;

/// Alert block shown to the user
#[derive(Debug, Clone, Serialize)]
pub struct ApsAlert {
    pub title: String,
    pub body: String,
}

/// The `aps` dictionary of the push payload
#[derive(Debug, Clone, Serialize)]
pub struct Aps {
    pub alert: ApsAlert,
    pub sound: &'static str,
    pub category: &'static str,
    pub thread_id: String,
}

/// Complete push payload: the `aps` dictionary plus the typed custom keys
/// flattened beside it.
#[derive(Debug, Clone, Serialize)]
pub struct ApnsPayload {
    pub aps: Aps,
    #[serde(flatten)]
    pub custom: JsonValue,
}

impl ApnsPayload {
    /// Builds the payload for one notification.
    ///
    /// Notifications for the same flight share a thread id so clients can
    /// group them; connection-risk notifications thread by the leg pair.
    pub fn build(
        kind: NotificationKind,
        flight_id: Uuid,
        title: &str,
        body: &str,
        data: &NotificationData,
    ) -> AppResult<Self> {
        let thread_id = match data {
            NotificationData::ConnectionRisk {
                incoming_flight_id,
                outgoing_flight_id,
                ..
            } => format!("connection_{}_{}", incoming_flight_id, outgoing_flight_id),
            _ => format!("flight_{}", flight_id),
        };

        let custom = serde_json::to_value(data).map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })?;

        Ok(Self {
            aps: Aps {
                alert: ApsAlert {
                    title: title.to_string(),
                    body: body.to_string(),
                },
                sound: Self::sound_for(kind),
                category: Self::category_for(kind),
                thread_id,
            },
            custom,
        })
    }

    /// Serialized size in bytes, as it would go over the wire.
    pub fn encoded_size(&self) -> AppResult<usize> {
        let bytes = serde_json::to_vec(self).map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })?;
        Ok(bytes.len())
    }

    /// Fails fast when the payload exceeds the gateway bound.
    pub fn validate_size(&self) -> AppResult<()> {
        let size = self.encoded_size()?;
        if size > MAX_PAYLOAD_BYTES {
            return Err(AppError::Validation {
                field: "payload".to_string(),
                reason: format!(
                    "Payload size {} exceeds maximum {} bytes",
                    size, MAX_PAYLOAD_BYTES
                ),
            });
        }
        Ok(())
    }

    fn category_for(kind: NotificationKind) -> &'static str {
        match kind {
            NotificationKind::GateChange => "GATE_CHANGE",
            NotificationKind::Delay => "DELAY_ALERT",
            NotificationKind::Boarding => "BOARDING",
            NotificationKind::FlightCanceled => "CANCELLATION",
            NotificationKind::ConnectionRisk => "CONNECTION_RISK",
        }
    }

    fn sound_for(kind: NotificationKind) -> &'static str {
        match kind {
            NotificationKind::GateChange => "gate_change.caf",
            NotificationKind::Boarding => "boarding.caf",
            _ => "default",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data() -> NotificationData {
        NotificationData::GateChange {
            airline_code: "AA".to_string(),
            flight_number: "1234".to_string(),
            old_gate: Some("A12".to_string()),
            new_gate: Some("B3".to_string()),
        }
    }

    #[test]
    fn test_build_places_custom_keys_beside_aps() {
        let flight_id = Uuid::new_v4();
        let payload = ApnsPayload::build(
            NotificationKind::GateChange,
            flight_id,
            "Gate Changed",
            "Your flight AA1234 gate has changed from A12 to B3.",
            &sample_data(),
        )
        .unwrap();

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["aps"]["alert"]["title"], "Gate Changed");
        assert_eq!(json["aps"]["category"], "GATE_CHANGE");
        assert_eq!(json["aps"]["sound"], "gate_change.caf");
        assert_eq!(json["aps"]["thread_id"], format!("flight_{}", flight_id));
        // Custom keys flattened at the top level, not nested under aps
        assert_eq!(json["type"], "gate_change");
        assert_eq!(json["new_gate"], "B3");
    }

    #[test]
    fn test_connection_risk_threads_by_leg_pair() {
        let incoming = Uuid::new_v4();
        let outgoing = Uuid::new_v4();
        let payload = ApnsPayload::build(
            NotificationKind::ConnectionRisk,
            incoming,
            "Connection at Risk",
            "Your connection may be at risk.",
            &NotificationData::ConnectionRisk {
                incoming_flight_id: incoming,
                outgoing_flight_id: outgoing,
                previous_level: "ON_TRACK".to_string(),
                current_level: "HIGH_RISK".to_string(),
            },
        )
        .unwrap();

        assert_eq!(
            payload.aps.thread_id,
            format!("connection_{}_{}", incoming, outgoing)
        );
    }

    #[test]
    fn test_validate_size_accepts_normal_payload() {
        let payload = ApnsPayload::build(
            NotificationKind::Delay,
            Uuid::new_v4(),
            "Flight Delayed",
            "Your flight AA1234 is delayed 45 minutes.",
            &NotificationData::Delay {
                airline_code: "AA".to_string(),
                flight_number: "1234".to_string(),
                delay_minutes: 45,
            },
        )
        .unwrap();

        assert!(payload.validate_size().is_ok());
        assert!(payload.encoded_size().unwrap() < MAX_PAYLOAD_BYTES);
    }

    #[test]
    fn test_validate_size_rejects_oversized_payload() {
        let payload = ApnsPayload::build(
            NotificationKind::Delay,
            Uuid::new_v4(),
            "Flight Delayed",
            &"x".repeat(MAX_PAYLOAD_BYTES),
            &NotificationData::Delay {
                airline_code: "AA".to_string(),
                flight_number: "1234".to_string(),
                delay_minutes: 45,
            },
        )
        .unwrap();

        let result = payload.validate_size();
        assert!(result.is_err());
        match result {
            Err(AppError::Validation { field, reason }) => {
                assert_eq!(field, "payload");
                assert!(reason.contains("exceeds maximum"));
            }
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }
}

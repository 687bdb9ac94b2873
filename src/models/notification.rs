//! Notification models: kinds, delivery status, persisted records, and
//! device tokens.

use chrono::{DateTime, Utc};
use diesel::deserialize::{self, FromSql};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use diesel::{AsExpression, FromSqlRow};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::io::Write;
use uuid::Uuid;

// ============================================================================
// Enums
// ============================================================================

/// Kind of notification delivered to a user
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    GateChange,
    Delay,
    Boarding,
    FlightCanceled,
    ConnectionRisk,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::GateChange => "GATE_CHANGE",
            NotificationKind::Delay => "DELAY",
            NotificationKind::Boarding => "BOARDING",
            NotificationKind::FlightCanceled => "FLIGHT_CANCELED",
            NotificationKind::ConnectionRisk => "CONNECTION_RISK",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl diesel::query_builder::QueryId for NotificationKind {
    type QueryId = NotificationKind;
    const HAS_STATIC_QUERY_ID: bool = false;
}

impl ToSql<Text, Pg> for NotificationKind {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(serialize::IsNull::No)
    }
}

impl FromSql<Text, Pg> for NotificationKind {
    fn from_sql(
        bytes: <Pg as diesel::backend::Backend>::RawValue<'_>,
    ) -> deserialize::Result<Self> {
        let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        match s.as_str() {
            "GATE_CHANGE" => Ok(NotificationKind::GateChange),
            "DELAY" => Ok(NotificationKind::Delay),
            "BOARDING" => Ok(NotificationKind::Boarding),
            "FLIGHT_CANCELED" => Ok(NotificationKind::FlightCanceled),
            "CONNECTION_RISK" => Ok(NotificationKind::ConnectionRisk),
            _ => Err(format!("Unrecognized notification kind: {}", s).into()),
        }
    }
}

/// Terminal delivery status of a notification record.
///
/// Every queued job ends in exactly one of `Sent`, `Failed`, or `NoDevices`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
    NoDevices,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "PENDING",
            DeliveryStatus::Sent => "SENT",
            DeliveryStatus::Failed => "FAILED",
            DeliveryStatus::NoDevices => "NO_DEVICES",
        }
    }
}

impl diesel::query_builder::QueryId for DeliveryStatus {
    type QueryId = DeliveryStatus;
    const HAS_STATIC_QUERY_ID: bool = false;
}

impl ToSql<Text, Pg> for DeliveryStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(serialize::IsNull::No)
    }
}

impl FromSql<Text, Pg> for DeliveryStatus {
    fn from_sql(
        bytes: <Pg as diesel::backend::Backend>::RawValue<'_>,
    ) -> deserialize::Result<Self> {
        let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        match s.as_str() {
            "PENDING" => Ok(DeliveryStatus::Pending),
            "SENT" => Ok(DeliveryStatus::Sent),
            "FAILED" => Ok(DeliveryStatus::Failed),
            "NO_DEVICES" => Ok(DeliveryStatus::NoDevices),
            _ => Err(format!("Unrecognized delivery status: {}", s).into()),
        }
    }
}

// ============================================================================
// Typed Job Payload
// ============================================================================

/// Structured payload attached to a notification job.
///
/// Each variant carries only the fields its notification kind needs; the
/// union is serialized into the record's `data` column and into the push
/// payload's custom keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationData {
    GateChange {
        airline_code: String,
        flight_number: String,
        old_gate: Option<String>,
        new_gate: Option<String>,
    },
    Delay {
        airline_code: String,
        flight_number: String,
        delay_minutes: i32,
    },
    Schedule {
        airline_code: String,
        flight_number: String,
    },
    Boarding {
        airline_code: String,
        flight_number: String,
        gate: Option<String>,
    },
    Canceled {
        airline_code: String,
        flight_number: String,
    },
    ConnectionRisk {
        incoming_flight_id: Uuid,
        outgoing_flight_id: Uuid,
        previous_level: String,
        current_level: String,
    },
}

// ============================================================================
// Notification Models (Query/Insert/Update)
// ============================================================================

/// Notification record for SELECT operations.
///
/// Owned by the queue's processing path; one row per consumed job.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::schema::notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub flight_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub data: JsonValue,
    pub status: DeliveryStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// NewNotification insert model, persisted PENDING before any send attempt
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::notifications)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub flight_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub data: JsonValue,
    pub status: DeliveryStatus,
}

/// DeliveryUpdate changeset recording the terminal outcome of a job
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = crate::schema::notifications)]
pub struct DeliveryUpdate {
    pub status: Option<DeliveryStatus>,
    pub sent_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
}

impl DeliveryUpdate {
    pub fn sent(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(DeliveryStatus::Sent),
            sent_at: Some(at),
            ..Default::default()
        }
    }

    pub fn failed(at: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Self {
            status: Some(DeliveryStatus::Failed),
            failed_at: Some(at),
            failure_reason: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn no_devices(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(DeliveryStatus::NoDevices),
            failed_at: Some(at),
            failure_reason: Some("No device tokens registered".to_string()),
            ..Default::default()
        }
    }
}

// ============================================================================
// DeviceToken Model
// ============================================================================

/// DeviceToken query model for SELECT operations
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::schema::device_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DeviceToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub platform: String,
    pub created_at: DateTime<Utc>,
}

//! Change records produced by the change detector and their audit-trail rows.

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

/// Kind of detected change, in the order the detector emits them
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    GateChange,
    TimeChange,
    StatusChange,
    DelayUpdate,
    Cancellation,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::GateChange => "GATE_CHANGE",
            ChangeKind::TimeChange => "TIME_CHANGE",
            ChangeKind::StatusChange => "STATUS_CHANGE",
            ChangeKind::DelayUpdate => "DELAY_UPDATE",
            ChangeKind::Cancellation => "CANCELLATION",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl diesel::query_builder::QueryId for ChangeKind {
    type QueryId = ChangeKind;
    const HAS_STATIC_QUERY_ID: bool = false;
}

impl ToSql<Text, Pg> for ChangeKind {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(serialize::IsNull::No)
    }
}

impl FromSql<Text, Pg> for ChangeKind {
    fn from_sql(
        bytes: <Pg as diesel::backend::Backend>::RawValue<'_>,
    ) -> deserialize::Result<Self> {
        let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        match s.as_str() {
            "GATE_CHANGE" => Ok(ChangeKind::GateChange),
            "TIME_CHANGE" => Ok(ChangeKind::TimeChange),
            "STATUS_CHANGE" => Ok(ChangeKind::StatusChange),
            "DELAY_UPDATE" => Ok(ChangeKind::DelayUpdate),
            "CANCELLATION" => Ok(ChangeKind::Cancellation),
            _ => Err(format!("Unrecognized change type: {}", s).into()),
        }
    }
}

/// One detected difference between the persisted row and a fresh snapshot.
///
/// Ephemeral; produced per poll cycle and appended to the audit trail, never
/// used as a primary entity.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub old_value: JsonValue,
    pub new_value: JsonValue,
    pub description: String,
}

/// FlightChange audit row for SELECT operations
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::schema::flight_changes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FlightChange {
    pub id: i64,
    pub flight_id: Uuid,
    pub change_type: ChangeKind,
    pub old_value: JsonValue,
    pub new_value: JsonValue,
    pub description: String,
    pub detected_at: DateTime<Utc>,
}

/// NewFlightChange insert model for the append-only audit trail
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::flight_changes)]
pub struct NewFlightChange {
    pub flight_id: Uuid,
    pub change_type: ChangeKind,
    pub old_value: JsonValue,
    pub new_value: JsonValue,
    pub description: String,
}

impl NewFlightChange {
    pub fn from_record(flight_id: Uuid, record: &ChangeRecord) -> Self {
        Self {
            flight_id,
            change_type: record.kind,
            old_value: record.old_value.clone(),
            new_value: record.new_value.clone(),
            description: record.description.clone(),
        }
    }
}

//! Flight models for database operations and provider snapshots.

use chrono::{DateTime, Utc};
use diesel::deserialize::{self, FromSql};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use diesel::{AsExpression, FromSqlRow};
use serde::{Deserialize, Serialize};
use std::io::Write;
use uuid::Uuid;

// ============================================================================
// Enums
// ============================================================================

/// Operational status of a flight as reported by the provider
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightStatus {
    Scheduled,
    Boarding,
    Departed,
    InAir,
    Landed,
    Delayed,
    Canceled,
}

impl FlightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::Scheduled => "SCHEDULED",
            FlightStatus::Boarding => "BOARDING",
            FlightStatus::Departed => "DEPARTED",
            FlightStatus::InAir => "IN_AIR",
            FlightStatus::Landed => "LANDED",
            FlightStatus::Delayed => "DELAYED",
            FlightStatus::Canceled => "CANCELED",
        }
    }
}

impl std::fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl diesel::query_builder::QueryId for FlightStatus {
    type QueryId = FlightStatus;
    const HAS_STATIC_QUERY_ID: bool = false;
}

impl ToSql<Text, Pg> for FlightStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(serialize::IsNull::No)
    }
}

impl FromSql<Text, Pg> for FlightStatus {
    fn from_sql(
        bytes: <Pg as diesel::backend::Backend>::RawValue<'_>,
    ) -> deserialize::Result<Self> {
        let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        match s.as_str() {
            "SCHEDULED" => Ok(FlightStatus::Scheduled),
            "BOARDING" => Ok(FlightStatus::Boarding),
            "DEPARTED" => Ok(FlightStatus::Departed),
            "IN_AIR" => Ok(FlightStatus::InAir),
            "LANDED" => Ok(FlightStatus::Landed),
            "DELAYED" => Ok(FlightStatus::Delayed),
            "CANCELED" => Ok(FlightStatus::Canceled),
            _ => Err(format!("Unrecognized flight status: {}", s).into()),
        }
    }
}

// ============================================================================
// Flight Models (Query/Upsert)
// ============================================================================

/// Flight query model for SELECT operations.
///
/// The most recently persisted snapshot of a flight. Rows are created on
/// first fetch and mutated only by the poller; never deleted.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::schema::flights)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Flight {
    pub id: Uuid,
    pub airline_code: String,
    pub airline_name: String,
    pub flight_number: String,
    pub origin_code: String,
    pub origin_terminal: Option<String>,
    pub destination_code: String,
    pub destination_terminal: Option<String>,
    pub departure_gate: Option<String>,
    pub arrival_gate: Option<String>,
    pub scheduled_departure: DateTime<Utc>,
    pub scheduled_arrival: DateTime<Utc>,
    pub estimated_departure: Option<DateTime<Utc>>,
    pub estimated_arrival: Option<DateTime<Utc>>,
    pub actual_departure: Option<DateTime<Utc>>,
    pub actual_arrival: Option<DateTime<Utc>>,
    pub status: FlightStatus,
    pub delay_minutes: i32,
    pub aircraft_type: Option<String>,
    pub last_fetched_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Flight {
    /// Provider-facing identity of this flight
    pub fn ident(&self) -> FlightIdent {
        FlightIdent {
            airline_code: self.airline_code.clone(),
            flight_number: self.flight_number.clone(),
            scheduled_departure: self.scheduled_departure,
        }
    }

    /// Display label, e.g. "AA1234"
    pub fn label(&self) -> String {
        format!("{}{}", self.airline_code, self.flight_number)
    }
}

/// FlightUpsert model for provider-driven INSERT .. ON CONFLICT operations.
///
/// `treat_none_as_null` so a gate that disappears from the provider feed is
/// cleared in the row instead of silently kept.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::flights)]
#[diesel(treat_none_as_null = true)]
pub struct FlightUpsert {
    pub airline_code: String,
    pub airline_name: String,
    pub flight_number: String,
    pub origin_code: String,
    pub origin_terminal: Option<String>,
    pub destination_code: String,
    pub destination_terminal: Option<String>,
    pub departure_gate: Option<String>,
    pub arrival_gate: Option<String>,
    pub scheduled_departure: DateTime<Utc>,
    pub scheduled_arrival: DateTime<Utc>,
    pub estimated_departure: Option<DateTime<Utc>>,
    pub estimated_arrival: Option<DateTime<Utc>>,
    pub actual_departure: Option<DateTime<Utc>>,
    pub actual_arrival: Option<DateTime<Utc>>,
    pub status: FlightStatus,
    pub delay_minutes: i32,
    pub aircraft_type: Option<String>,
    pub last_fetched_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Provider Snapshot Types
// ============================================================================

/// Natural key of a flight: `(airline_code, flight_number, scheduled_departure)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightIdent {
    pub airline_code: String,
    pub flight_number: String,
    pub scheduled_departure: DateTime<Utc>,
}

impl std::fmt::Display for FlightIdent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.airline_code, self.flight_number)
    }
}

/// One end of a flight's route as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirportStop {
    pub code: String,
    pub terminal: Option<String>,
    pub gate: Option<String>,
}

/// Scheduled, estimated, and actual times for a flight.
///
/// Timestamps are opaque UTC instants; multi-day itineraries mean no
/// same-day assumption may be made about departure vs. arrival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightTimes {
    pub scheduled_departure: DateTime<Utc>,
    pub scheduled_arrival: DateTime<Utc>,
    pub estimated_departure: Option<DateTime<Utc>>,
    pub estimated_arrival: Option<DateTime<Utc>>,
    pub actual_departure: Option<DateTime<Utc>>,
    pub actual_arrival: Option<DateTime<Utc>>,
}

/// Freshly fetched state of a flight from the provider
#[derive(Debug, Clone, PartialEq)]
pub struct FlightSnapshot {
    pub airline_code: String,
    pub airline_name: String,
    pub flight_number: String,
    pub origin: AirportStop,
    pub destination: AirportStop,
    pub times: FlightTimes,
    pub status: FlightStatus,
    pub delay_minutes: i32,
    pub aircraft_type: Option<String>,
}

impl FlightSnapshot {
    /// Display label, e.g. "AA1234"
    pub fn label(&self) -> String {
        format!("{}{}", self.airline_code, self.flight_number)
    }

    /// Builds the row changeset persisted after a change is detected
    pub fn upsert_row(&self, now: DateTime<Utc>) -> FlightUpsert {
        FlightUpsert {
            airline_code: self.airline_code.clone(),
            airline_name: self.airline_name.clone(),
            flight_number: self.flight_number.clone(),
            origin_code: self.origin.code.clone(),
            origin_terminal: self.origin.terminal.clone(),
            destination_code: self.destination.code.clone(),
            destination_terminal: self.destination.terminal.clone(),
            departure_gate: self.origin.gate.clone(),
            arrival_gate: self.destination.gate.clone(),
            scheduled_departure: self.times.scheduled_departure,
            scheduled_arrival: self.times.scheduled_arrival,
            estimated_departure: self.times.estimated_departure,
            estimated_arrival: self.times.estimated_arrival,
            actual_departure: self.times.actual_departure,
            actual_arrival: self.times.actual_arrival,
            status: self.status,
            delay_minutes: self.delay_minutes,
            aircraft_type: self.aircraft_type.clone(),
            last_fetched_at: now,
            updated_at: now,
        }
    }
}

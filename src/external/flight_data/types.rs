//! Wire types for the AeroAPI flight-data provider.

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AeroApiResponse {
    #[serde(default)]
    pub flights: Vec<AeroApiFlight>,
}

#[derive(Debug, Deserialize)]
pub struct AeroApiFlight {
    pub airline_code: String,
    #[serde(default)]
    pub airline_icao: Option<String>,
    pub flight_number: String,
    pub origin: AeroApiAirport,
    pub destination: AeroApiAirport,
    pub scheduled_out: DateTime<Utc>,
    pub scheduled_in: DateTime<Utc>,
    #[serde(default)]
    pub estimated_out: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_in: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actual_out: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actual_in: Option<DateTime<Utc>>,
    pub status: String,
    #[serde(default)]
    pub delay_minutes: Option<i32>,
    #[serde(default)]
    pub gate_origin: Option<String>,
    #[serde(default)]
    pub gate_destination: Option<String>,
    #[serde(default)]
    pub terminal_origin: Option<String>,
    #[serde(default)]
    pub terminal_destination: Option<String>,
    #[serde(default)]
    pub aircraft_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AeroApiAirport {
    pub code: String,
}

//! AeroAPI flight-data provider implementation.

use async_trait::async_trait;

use super::provider::FlightDataProvider;
use super::types::{AeroApiFlight, AeroApiResponse};
use crate::config::ProviderConfig;
use crate::error::{AppError, AppResult};
use crate::external::client::HTTP_CLIENT;
use crate::models::{AirportStop, FlightIdent, FlightSnapshot, FlightStatus, FlightTimes};

pub struct AeroApiProvider {
    config: ProviderConfig,
}

impl AeroApiProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }

    fn make_error(message: impl Into<String>, source: Option<anyhow::Error>) -> AppError {
        AppError::ExternalApi {
            provider: "aeroapi".into(),
            message: message.into(),
            source,
        }
    }

    /// Maps the provider's free-form status string to the internal enum.
    ///
    /// Diverted has no internal counterpart and is treated as delayed.
    fn map_status(status: &str) -> FlightStatus {
        match status {
            "Scheduled" => FlightStatus::Scheduled,
            "Boarding" => FlightStatus::Boarding,
            "Departed" => FlightStatus::Departed,
            "En Route" | "In Flight" => FlightStatus::InAir,
            "Arrived" => FlightStatus::Landed,
            "Delayed" | "Diverted" => FlightStatus::Delayed,
            "Canceled" => FlightStatus::Canceled,
            _ => FlightStatus::Scheduled,
        }
    }

    fn to_snapshot(flight: AeroApiFlight) -> FlightSnapshot {
        let status = Self::map_status(&flight.status);
        FlightSnapshot {
            airline_name: flight
                .airline_icao
                .clone()
                .unwrap_or_else(|| flight.airline_code.clone()),
            airline_code: flight.airline_code,
            flight_number: flight.flight_number,
            origin: AirportStop {
                code: flight.origin.code,
                terminal: flight.terminal_origin,
                gate: flight.gate_origin,
            },
            destination: AirportStop {
                code: flight.destination.code,
                terminal: flight.terminal_destination,
                gate: flight.gate_destination,
            },
            times: FlightTimes {
                scheduled_departure: flight.scheduled_out,
                scheduled_arrival: flight.scheduled_in,
                estimated_departure: flight.estimated_out,
                estimated_arrival: flight.estimated_in,
                actual_departure: flight.actual_out,
                actual_arrival: flight.actual_in,
            },
            status,
            delay_minutes: flight.delay_minutes.unwrap_or(0),
            aircraft_type: flight.aircraft_type,
        }
    }
}

#[async_trait]
impl FlightDataProvider for AeroApiProvider {
    fn name(&self) -> &'static str {
        "aeroapi"
    }

    async fn fetch_flight(&self, ident: &FlightIdent) -> AppResult<Option<FlightSnapshot>> {
        let date = ident.scheduled_departure.date_naive();
        let url = format!(
            "{}/flights/{}?start={}&end={}",
            self.config.base_url, ident, date, date
        );

        let resp = HTTP_CLIENT
            .get(&url)
            .header("x-apikey", &self.config.api_key)
            .header("Accept", "application/json")
            .timeout(std::time::Duration::from_secs(
                self.config.request_timeout_seconds,
            ))
            .send()
            .await
            .map_err(|e: reqwest::Error| {
                Self::make_error(
                    format!("fetch_flight({}) request failed: {}", ident, e),
                    Some(e.into()),
                )
            })?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let resp = resp.error_for_status().map_err(|e: reqwest::Error| {
            Self::make_error(
                format!("fetch_flight({}) HTTP error: {}", ident, e),
                Some(e.into()),
            )
        })?;

        let data: AeroApiResponse = resp.json().await.map_err(|e: reqwest::Error| {
            Self::make_error(
                format!("fetch_flight({}) invalid JSON: {}", ident, e),
                Some(e.into()),
            )
        })?;

        // The provider returns every leg flying under the ident that day.
        // The leg whose scheduled departure is closest to ours is the one we
        // track; an exact match would miss legs whose schedule shifted.
        let matched = data.flights.into_iter().min_by_key(|f| {
            (f.scheduled_out - ident.scheduled_departure)
                .num_seconds()
                .abs()
        });

        Ok(matched.map(Self::to_snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_status_known_values() {
        assert_eq!(
            AeroApiProvider::map_status("Scheduled"),
            FlightStatus::Scheduled
        );
        assert_eq!(AeroApiProvider::map_status("En Route"), FlightStatus::InAir);
        assert_eq!(
            AeroApiProvider::map_status("In Flight"),
            FlightStatus::InAir
        );
        assert_eq!(AeroApiProvider::map_status("Arrived"), FlightStatus::Landed);
        assert_eq!(
            AeroApiProvider::map_status("Canceled"),
            FlightStatus::Canceled
        );
        assert_eq!(
            AeroApiProvider::map_status("Diverted"),
            FlightStatus::Delayed
        );
    }

    #[test]
    fn test_map_status_unknown_defaults_to_scheduled() {
        assert_eq!(
            AeroApiProvider::map_status("Taxiing"),
            FlightStatus::Scheduled
        );
    }

    #[test]
    fn test_to_snapshot_maps_gates_and_delay() {
        let raw = r#"{
            "airline_code": "AA",
            "airline_icao": "AAL",
            "flight_number": "1234",
            "origin": {"code": "LAX"},
            "destination": {"code": "JFK"},
            "scheduled_out": "2026-01-15T10:00:00Z",
            "scheduled_in": "2026-01-15T18:00:00Z",
            "estimated_out": "2026-01-15T10:15:00Z",
            "status": "Delayed",
            "delay_minutes": 15,
            "gate_origin": "A12",
            "gate_destination": "B24",
            "terminal_origin": "T4",
            "aircraft_type": "B738"
        }"#;
        let flight: AeroApiFlight = serde_json::from_str(raw).unwrap();
        let snapshot = AeroApiProvider::to_snapshot(flight);

        assert_eq!(snapshot.airline_name, "AAL");
        assert_eq!(snapshot.label(), "AA1234");
        assert_eq!(snapshot.origin.gate.as_deref(), Some("A12"));
        assert_eq!(snapshot.destination.gate.as_deref(), Some("B24"));
        assert_eq!(snapshot.origin.terminal.as_deref(), Some("T4"));
        assert_eq!(snapshot.destination.terminal, None);
        assert_eq!(snapshot.status, FlightStatus::Delayed);
        assert_eq!(snapshot.delay_minutes, 15);
        assert!(snapshot.times.estimated_departure.is_some());
        assert!(snapshot.times.actual_departure.is_none());
    }
}

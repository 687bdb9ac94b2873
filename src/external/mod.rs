//! External collaborator integrations: HTTP client, flight-data provider,
//! push gateway, and historical statistics.

pub mod client;
pub mod flight_data;
pub mod push;
pub mod stats;

pub use flight_data::{AeroApiProvider, FlightDataProvider};
pub use push::{ApnsPayload, HttpPushGateway, PushDeliveryResult, PushGateway};
pub use stats::OnTimeStatsSource;

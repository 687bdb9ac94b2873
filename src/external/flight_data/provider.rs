use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{FlightIdent, FlightSnapshot};

/// Seam to the external flight-data provider.
///
/// `Ok(None)` means the provider does not know the flight; the poller treats
/// that as a recoverable condition and skips the flight for the cycle.
#[async_trait]
pub trait FlightDataProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &'static str;

    /// Fetches the freshest state of one flight.
    async fn fetch_flight(&self, ident: &FlightIdent) -> AppResult<Option<FlightSnapshot>>;
}

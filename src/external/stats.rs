//! Historical on-time statistics seam.

use async_trait::async_trait;

use crate::error::AppResult;

/// Optional collaborator supplying a provider-independent on-time rate for a
/// flight, used as the HISTORICAL risk factor.
///
/// When no source is wired in, the factor is omitted from risk assessments
/// rather than fabricated.
#[async_trait]
pub trait OnTimeStatsSource: Send + Sync {
    /// Historical on-time rate in `[0, 1]`, or `None` when unknown.
    async fn on_time_rate(
        &self,
        airline_code: &str,
        flight_number: &str,
    ) -> AppResult<Option<f64>>;
}

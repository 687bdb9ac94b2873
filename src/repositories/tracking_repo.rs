//! Tracking relationship repository for async database operations.
//!
//! Read-only from the poller's perspective; rows are created and deleted by
//! the user-facing surface that owns flight tracking.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::TrackedFlight;

/// Tracking relationship repository
#[derive(Clone)]
pub struct TrackingRepository {
    pool: AsyncDbPool,
}

impl TrackingRepository {
    /// Creates a new TrackingRepository with the given connection pool.
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Lists every tracking relationship with alerts enabled.
    ///
    /// This is the poller's working set for one cycle.
    pub async fn list_alert_enabled(&self) -> AppResult<Vec<TrackedFlight>> {
        use crate::schema::tracked_flights::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        tracked_flights
            .filter(alerts_enabled.eq(true))
            .select(TrackedFlight::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Lists alert-enabled trackers of one flight.
    pub async fn list_by_flight(&self, fid: Uuid) -> AppResult<Vec<TrackedFlight>> {
        use crate::schema::tracked_flights::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        tracked_flights
            .filter(flight_id.eq(fid).and(alerts_enabled.eq(true)))
            .select(TrackedFlight::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }
}

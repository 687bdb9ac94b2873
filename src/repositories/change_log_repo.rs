//! Change audit-trail repository for async database operations.
//!
//! The flight_changes table is append-only; nothing updates or deletes rows.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{FlightChange, NewFlightChange};

/// Change audit-trail repository
#[derive(Clone)]
pub struct ChangeLogRepository {
    pool: AsyncDbPool,
}

impl ChangeLogRepository {
    /// Creates a new ChangeLogRepository with the given connection pool.
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Appends one detected change to the audit trail.
    pub async fn append(&self, new_change: NewFlightChange) -> AppResult<FlightChange> {
        use crate::schema::flight_changes::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        diesel::insert_into(flight_changes)
            .values(&new_change)
            .returning(FlightChange::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Returns the most recent changes recorded for one flight.
    pub async fn recent_for_flight(
        &self,
        fid: Uuid,
        limit: i64,
    ) -> AppResult<Vec<FlightChange>> {
        use crate::schema::flight_changes::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        flight_changes
            .filter(flight_id.eq(fid))
            .order(detected_at.desc())
            .limit(limit)
            .select(FlightChange::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }
}

//! Flight repository for async database operations.
//!
//! Provides snapshot reads and the natural-key upsert used by the poller.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{Flight, FlightUpsert};

/// Flight repository holding an async connection pool.
///
/// Since `AsyncDbPool` (bb8::Pool) internally uses `Arc`, cloning is cheap.
#[derive(Clone)]
pub struct FlightRepository {
    pool: AsyncDbPool,
}

impl FlightRepository {
    /// Creates a new FlightRepository with the given connection pool.
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Finds a flight by its surrogate id.
    pub async fn find_by_id(&self, flight_id: Uuid) -> AppResult<Option<Flight>> {
        use crate::schema::flights::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        flights
            .filter(id.eq(flight_id))
            .select(Flight::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Inserts or updates a flight keyed by its natural key
    /// `(airline_code, flight_number, scheduled_departure)`.
    ///
    /// Rows are never deleted; this is the only mutation path for snapshots.
    pub async fn upsert_by_natural_key(&self, row: FlightUpsert) -> AppResult<Flight> {
        use crate::schema::flights::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        diesel::insert_into(flights)
            .values(&row)
            .on_conflict((airline_code, flight_number, scheduled_departure))
            .do_update()
            .set(&row)
            .returning(Flight::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }
}

//! Connection repository for async database operations.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{Connection, UpdateConnectionRisk};

/// Connection repository
#[derive(Clone)]
pub struct ConnectionRepository {
    pool: AsyncDbPool,
}

impl ConnectionRepository {
    /// Creates a new ConnectionRepository with the given connection pool.
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Finds every connection where the given flight is either leg.
    pub async fn find_by_either_leg(&self, fid: Uuid) -> AppResult<Vec<Connection>> {
        use crate::schema::connections::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        connections
            .filter(incoming_flight_id.eq(fid).or(outgoing_flight_id.eq(fid)))
            .select(Connection::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Overwrites the stored risk assessment of one connection.
    ///
    /// The risk is recomputed, not appended; each row holds only the latest
    /// assessment.
    pub async fn update_risk(
        &self,
        cid: Uuid,
        update: UpdateConnectionRisk,
    ) -> AppResult<Connection> {
        use crate::schema::connections::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        diesel::update(connections.filter(id.eq(cid)))
            .set(&update)
            .returning(Connection::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }
}

//! Device token repository for async database operations.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::DeviceToken;

/// Device token repository
#[derive(Clone)]
pub struct DeviceTokenRepository {
    pool: AsyncDbPool,
}

impl DeviceTokenRepository {
    /// Creates a new DeviceTokenRepository with the given connection pool.
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Lists every device token registered by one user.
    pub async fn list_by_user(&self, uid: Uuid) -> AppResult<Vec<DeviceToken>> {
        use crate::schema::device_tokens::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        device_tokens
            .filter(user_id.eq(uid))
            .select(DeviceToken::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }
}

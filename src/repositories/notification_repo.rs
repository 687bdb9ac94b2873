//! Notification record repository for async database operations.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{DeliveryUpdate, NewNotification, Notification};

/// Notification record repository
#[derive(Clone)]
pub struct NotificationRepository {
    pool: AsyncDbPool,
}

impl NotificationRepository {
    /// Creates a new NotificationRepository with the given connection pool.
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Persists a new notification record, normally in PENDING state.
    pub async fn create(&self, new_notification: NewNotification) -> AppResult<Notification> {
        use crate::schema::notifications::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        diesel::insert_into(notifications)
            .values(&new_notification)
            .returning(Notification::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Records the terminal delivery outcome of a notification.
    pub async fn update_delivery(
        &self,
        nid: Uuid,
        update: DeliveryUpdate,
    ) -> AppResult<Notification> {
        use crate::schema::notifications::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        diesel::update(notifications.filter(id.eq(nid)))
            .set(&update)
            .returning(Notification::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }
}

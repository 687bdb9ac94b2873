//! Repository layer for data access operations.
//!
//! Provides async CRUD operations for all domain entities.

mod change_log_repo;
mod connection_repo;
mod device_token_repo;
mod flight_repo;
mod notification_repo;
mod tracking_repo;

pub use change_log_repo::ChangeLogRepository;
pub use connection_repo::ConnectionRepository;
pub use device_token_repo::DeviceTokenRepository;
pub use flight_repo::FlightRepository;
pub use notification_repo::NotificationRepository;
pub use tracking_repo::TrackingRepository;

use crate::db::AsyncDbPool;

/// Aggregates all repositories for convenient access.
///
/// Since `AsyncDbPool` uses `Arc` internally, cloning is cheap.
#[derive(Clone)]
pub struct Repositories {
    pub flights: FlightRepository,
    pub tracking: TrackingRepository,
    pub connections: ConnectionRepository,
    pub change_log: ChangeLogRepository,
    pub notifications: NotificationRepository,
    pub device_tokens: DeviceTokenRepository,
}

impl Repositories {
    /// Creates a new Repositories instance with all repositories initialized.
    pub fn new(pool: AsyncDbPool) -> Self {
        Self {
            flights: FlightRepository::new(pool.clone()),
            tracking: TrackingRepository::new(pool.clone()),
            connections: ConnectionRepository::new(pool.clone()),
            change_log: ChangeLogRepository::new(pool.clone()),
            notifications: NotificationRepository::new(pool.clone()),
            device_tokens: DeviceTokenRepository::new(pool),
        }
    }
}

//! Tracking relationship models.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

/// TrackedFlight query model for SELECT operations.
///
/// A user's subscription to alerts for one flight. Owned by the user-facing
/// API; the poller only ever reads these rows.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::schema::tracked_flights)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TrackedFlight {
    pub id: Uuid,
    pub user_id: Uuid,
    pub flight_id: Uuid,
    pub alerts_enabled: bool,
    pub gate_change_alerts: bool,
    pub delay_alerts: bool,
    pub boarding_alerts: bool,
    pub connection_risk_alerts: bool,
    pub created_at: DateTime<Utc>,
}

/// NewTrackedFlight insert model for INSERT operations
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::tracked_flights)]
pub struct NewTrackedFlight {
    pub user_id: Uuid,
    pub flight_id: Uuid,
    pub alerts_enabled: bool,
    pub gate_change_alerts: bool,
    pub delay_alerts: bool,
    pub boarding_alerts: bool,
    pub connection_risk_alerts: bool,
}

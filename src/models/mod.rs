//! Data models for the aerosense core.

mod change;
mod connection;
mod flight;
mod notification;
mod tracking;

pub use change::{ChangeKind, ChangeRecord, FlightChange, NewFlightChange};
pub use connection::{
    Connection, ConnectionRisk, FactorImpact, RiskFactor, RiskFactorKind, RiskLevel,
    UpdateConnectionRisk,
};
pub use flight::{
    AirportStop, Flight, FlightIdent, FlightSnapshot, FlightStatus, FlightTimes, FlightUpsert,
};
pub use notification::{
    DeliveryStatus, DeliveryUpdate, DeviceToken, NewNotification, Notification, NotificationData,
    NotificationKind,
};
pub use tracking::{NewTrackedFlight, TrackedFlight};

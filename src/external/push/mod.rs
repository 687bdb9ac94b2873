//! Push-notification gateway integration.

mod gateway;
mod http_gateway;
mod payload;

pub use gateway::{PushDeliveryResult, PushGateway};
pub use http_gateway::HttpPushGateway;
pub use payload::{ApnsPayload, Aps, ApsAlert, MAX_PAYLOAD_BYTES};

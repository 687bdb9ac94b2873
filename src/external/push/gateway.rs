use async_trait::async_trait;

use super::payload::ApnsPayload;
use crate::error::AppResult;

/// Outcome of one send attempt to one device
#[derive(Debug, Clone)]
pub struct PushDeliveryResult {
    pub success: bool,
    pub error: Option<String>,
}

/// Seam to the black-box push delivery gateway.
///
/// The gateway accepts a structured payload per device token and reports
/// success or failure; its own wire format and authentication are not this
/// core's concern. Delivery is at-least-once; downstream handling is
/// expected to be idempotent.
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Gateway name for logging
    fn name(&self) -> &'static str;

    /// Sends one payload to one device token.
    async fn send(&self, device_token: &str, payload: &ApnsPayload)
    -> AppResult<PushDeliveryResult>;
}

//! HTTP push gateway implementation.
//!
//! Posts `{device_token, payload}` JSON to the configured gateway URL using
//! the shared HTTP client.

use async_trait::async_trait;
use serde_json::json;

use super::gateway::{PushDeliveryResult, PushGateway};
use super::payload::ApnsPayload;
use crate::config::PushConfig;
use crate::error::AppResult;
use crate::external::client::HTTP_CLIENT;

pub struct HttpPushGateway {
    config: PushConfig,
}

impl HttpPushGateway {
    pub fn new(config: PushConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PushGateway for HttpPushGateway {
    fn name(&self) -> &'static str {
        "http-push"
    }

    /// Sends one payload to one device token.
    ///
    /// Transport and gateway-side failures are reported through the result
    /// rather than an error, so the delivery path can record a FAILED
    /// outcome with the captured reason instead of aborting the job.
    async fn send(
        &self,
        device_token: &str,
        payload: &ApnsPayload,
    ) -> AppResult<PushDeliveryResult> {
        let request = HTTP_CLIENT
            .post(&self.config.gateway_url)
            .timeout(std::time::Duration::from_secs(self.config.timeout_seconds))
            .json(&json!({
                "device_token": device_token,
                "payload": payload,
            }));

        match request.send().await {
            Ok(resp) => {
                if resp.status().is_success() {
                    Ok(PushDeliveryResult {
                        success: true,
                        error: None,
                    })
                } else {
                    let status = resp.status();
                    let detail = resp.text().await.unwrap_or_default();
                    Ok(PushDeliveryResult {
                        success: false,
                        error: Some(format!("Gateway returned {}: {}", status, detail)),
                    })
                }
            }
            Err(e) => Ok(PushDeliveryResult {
                success: false,
                error: Some(e.to_string()),
            }),
        }
    }
}

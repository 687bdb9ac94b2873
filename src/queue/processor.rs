//! Default delivery path for queued notification jobs.
//!
//! Builds the push payload, persists a PENDING record, fans out to the
//! user's devices through the gateway, and records the terminal outcome.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::{JobHandler, NotificationJob};
use crate::error::AppResult;
use crate::external::push::{ApnsPayload, PushGateway};
use crate::models::{DeliveryStatus, DeliveryUpdate, NewNotification};
use crate::repositories::{DeviceTokenRepository, NotificationRepository};

/// Generic handler used for every job kind unless a specialized handler is
/// registered. Every job ends in a SENT, FAILED, or NO_DEVICES record.
pub struct DeliveryProcessor {
    notifications: NotificationRepository,
    device_tokens: DeviceTokenRepository,
    gateway: Arc<dyn PushGateway>,
}

impl DeliveryProcessor {
    pub fn new(
        notifications: NotificationRepository,
        device_tokens: DeviceTokenRepository,
        gateway: Arc<dyn PushGateway>,
    ) -> Self {
        Self {
            notifications,
            device_tokens,
            gateway,
        }
    }
}

#[async_trait]
impl JobHandler for DeliveryProcessor {
    async fn handle(&self, job: &NotificationJob) -> AppResult<()> {
        let payload = ApnsPayload::build(job.kind, job.flight_id, &job.title, &job.body, &job.data)?;

        let record = self
            .notifications
            .create(NewNotification {
                user_id: job.user_id,
                flight_id: job.flight_id,
                kind: job.kind,
                title: job.title.clone(),
                body: job.body.clone(),
                data: serde_json::to_value(&job.data).unwrap_or_default(),
                status: DeliveryStatus::Pending,
            })
            .await?;

        // Oversized payloads are rejected before any send attempt; the
        // gateway would truncate or drop them anyway.
        if let Err(e) = payload.validate_size() {
            tracing::warn!(
                notification_id = %record.id,
                error = %e,
                "DeliveryProcessor: payload rejected before send"
            );
            self.notifications
                .update_delivery(record.id, DeliveryUpdate::failed(Utc::now(), e.to_string()))
                .await?;
            return Ok(());
        }

        let devices = self.device_tokens.list_by_user(job.user_id).await?;
        if devices.is_empty() {
            tracing::warn!(
                notification_id = %record.id,
                user_id = %job.user_id,
                "DeliveryProcessor: no device tokens registered, skipping send"
            );
            self.notifications
                .update_delivery(record.id, DeliveryUpdate::no_devices(Utc::now()))
                .await?;
            return Ok(());
        }

        // One send per device; devices are independent, so the fan-out runs
        // concurrently within this job's single concurrency slot
        let sends = devices
            .iter()
            .map(|device| self.gateway.send(&device.token, &payload));
        let results = futures::future::join_all(sends).await;

        let mut failure_reason: Option<String> = None;
        let mut delivered = 0usize;

        for result in results {
            match result {
                Ok(outcome) if outcome.success => delivered += 1,
                Ok(outcome) => {
                    if failure_reason.is_none() {
                        failure_reason = Some(
                            outcome
                                .error
                                .unwrap_or_else(|| "Unknown gateway error".to_string()),
                        );
                    }
                }
                Err(e) => {
                    if failure_reason.is_none() {
                        failure_reason = Some(e.to_string());
                    }
                }
            }
        }

        let now = Utc::now();
        let update = match failure_reason {
            // At-least-once: the record goes SENT only when every device
            // accepted the payload
            None => DeliveryUpdate::sent(now),
            Some(reason) => DeliveryUpdate::failed(now, reason),
        };
        let status = update.status;
        self.notifications.update_delivery(record.id, update).await?;

        tracing::info!(
            notification_id = %record.id,
            devices = devices.len(),
            delivered,
            status = ?status,
            "DeliveryProcessor: notification processing complete"
        );

        Ok(())
    }
}

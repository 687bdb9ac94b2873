//! Notification job types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{NotificationData, NotificationKind};

/// Delivery priority of a queued job.
///
/// High-priority jobs are dispatched ahead of the normal tier; normal and
/// low share the tail tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
}

impl Priority {
    pub fn is_high(&self) -> bool {
        matches!(self, Priority::High)
    }
}

/// Enqueue request; the queue assigns the id and creation time
#[derive(Debug, Clone)]
pub struct NotificationRequest {
    pub user_id: Uuid,
    pub flight_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub data: NotificationData,
    pub priority: Priority,
}

/// A queued notification job, consumed exactly once by a dispatch worker
#[derive(Debug, Clone)]
pub struct NotificationJob {
    pub id: Uuid,
    pub user_id: Uuid,
    pub flight_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub data: NotificationData,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

impl NotificationJob {
    pub fn from_request(request: NotificationRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            flight_id: request.flight_id,
            kind: request.kind,
            title: request.title,
            body: request.body,
            data: request.data,
            priority: request.priority,
            created_at: Utc::now(),
        }
    }
}

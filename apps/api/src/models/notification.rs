use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Notification kinds emitted by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    SegmentCreated,
    SegmentUpdated,
    JobCancelled,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::SegmentCreated => "segment_created",
            NotificationKind::SegmentUpdated => "segment_updated",
            NotificationKind::JobCancelled => "job_cancelled",
        }
    }
}

/// A notification row to insert for a tenant's users.
#[derive(Debug, Clone, Serialize)]
pub struct NewNotification {
    pub customer_id: Uuid,
    pub user_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub data: Value,
}

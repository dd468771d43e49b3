use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Status written whenever a segment needs (re)processing downstream.
pub const STATUS_NEW: &str = "new";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SegmentRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub filters: Value,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

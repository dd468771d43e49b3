use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Statuses after which a job can no longer change.
pub const TERMINAL_STATUSES: &[&str] = &["completed", "error", "exhausted", "cancelled"];

pub const STATUS_CANCELLED: &str = "cancelled";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LlmJobRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub user_id: Option<Uuid>,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

impl LlmJobRow {
    pub fn is_terminal(&self) -> bool {
        is_terminal_status(&self.status)
    }
}

pub fn is_terminal_status(status: &str) -> bool {
    TERMINAL_STATUSES.contains(&status)
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A tenant's relationship to a company. Only the scoring columns are written here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CustomerCompanyRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub company_id: Uuid,
    pub last_scoring_results: Option<Value>,
    pub scoring_results_updated_at: Option<DateTime<Utc>>,
}

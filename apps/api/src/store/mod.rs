//! Persistence seams.
//!
//! Every tenant-scoped method takes a `TenantScope` and the Postgres
//! implementation injects `customer_id = $n` into the query, so a row that
//! belongs to another tenant is indistinguishable from a missing one.
//!
//! `AppState` carries an `Arc<dyn Store>`; tests swap in an in-memory store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::TenantScope;
use crate::models::company::CustomerCompanyRow;
use crate::models::job::LlmJobRow;
use crate::models::notification::NewNotification;
use crate::models::segment::SegmentRow;

pub mod postgres;

pub use postgres::PgStore;

#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn company_exists(&self, company_id: Uuid) -> Result<bool, sqlx::Error>;

    async fn customer_exists(&self, customer_id: Uuid) -> Result<bool, sqlx::Error>;

    async fn find_customer_company(
        &self,
        customer_id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<CustomerCompanyRow>, sqlx::Error>;

    /// Freshest non-null enrichment snapshot for the company.
    async fn latest_diffbot_json(&self, company_id: Uuid) -> Result<Option<Value>, sqlx::Error>;

    /// Returns the number of association rows updated.
    async fn save_scoring_results(
        &self,
        customer_company_id: Uuid,
        results: &Value,
        scored_at: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error>;
}

/// Fields of a segment insert.
#[derive(Debug, Clone)]
pub struct NewSegment {
    pub name: String,
    pub filters: Value,
}

/// Fields of a segment update. `reset_status` is set when the filters changed.
#[derive(Debug, Clone)]
pub struct SegmentChanges {
    pub name: String,
    pub filters: Value,
    pub reset_status: bool,
}

#[async_trait]
pub trait SegmentStore: Send + Sync {
    async fn industry_names(&self) -> Result<Vec<String>, sqlx::Error>;

    async fn company_size_names(&self) -> Result<Vec<String>, sqlx::Error>;

    /// Case-insensitive lookup among the tenant's non-deleted segments.
    async fn segment_name_taken(
        &self,
        scope: &TenantScope,
        name: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<bool, sqlx::Error>;

    async fn insert_segment(
        &self,
        scope: &TenantScope,
        segment: NewSegment,
    ) -> Result<SegmentRow, sqlx::Error>;

    /// Non-deleted segment owned by the tenant.
    async fn find_segment(
        &self,
        scope: &TenantScope,
        segment_id: Uuid,
    ) -> Result<Option<SegmentRow>, sqlx::Error>;

    async fn update_segment(
        &self,
        scope: &TenantScope,
        segment_id: Uuid,
        changes: SegmentChanges,
    ) -> Result<Option<SegmentRow>, sqlx::Error>;

    /// Deletes materialized member rows. Returns the number removed.
    async fn delete_segment_members(&self, segment_id: Uuid) -> Result<u64, sqlx::Error>;

    /// Soft delete. Returns false when no live segment matched.
    async fn soft_delete_segment(
        &self,
        scope: &TenantScope,
        segment_id: Uuid,
    ) -> Result<bool, sqlx::Error>;
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn find_job(
        &self,
        scope: &TenantScope,
        job_id: Uuid,
    ) -> Result<Option<LlmJobRow>, sqlx::Error>;

    /// Conditional cancel: only rows not already terminal are touched.
    /// Returns true when this call performed the cancellation.
    async fn cancel_job_if_active(
        &self,
        scope: &TenantScope,
        job_id: Uuid,
    ) -> Result<bool, sqlx::Error>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn customer_for_user(&self, user_id: Uuid) -> Result<Option<Uuid>, sqlx::Error>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create_notification(&self, notification: &NewNotification)
        -> Result<(), sqlx::Error>;
}

/// Everything the handlers need from the backing store.
pub trait Store: CompanyStore + SegmentStore + JobStore + ProfileStore + NotificationStore {}

impl<T> Store for T where T: CompanyStore + SegmentStore + JobStore + ProfileStore + NotificationStore
{}

/// True for Postgres unique-constraint violations (SQLSTATE 23505).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|e| e.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::TenantScope;
use crate::models::company::CustomerCompanyRow;
use crate::models::job::{LlmJobRow, STATUS_CANCELLED, TERMINAL_STATUSES};
use crate::models::notification::NewNotification;
use crate::models::segment::{SegmentRow, STATUS_NEW};
use crate::store::{
    CompanyStore, JobStore, NewSegment, NotificationStore, ProfileStore, SegmentChanges,
    SegmentStore,
};

/// Postgres-backed store. Each method is a single statement; nothing here
/// opens a transaction.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn terminal_statuses() -> Vec<String> {
    TERMINAL_STATUSES.iter().map(|s| s.to_string()).collect()
}

#[async_trait]
impl CompanyStore for PgStore {
    async fn company_exists(&self, company_id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM companies WHERE id = $1)")
            .bind(company_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn customer_exists(&self, customer_id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1)")
            .bind(customer_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn find_customer_company(
        &self,
        customer_id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<CustomerCompanyRow>, sqlx::Error> {
        sqlx::query_as::<_, CustomerCompanyRow>(
            r#"
            SELECT id, customer_id, company_id, last_scoring_results, scoring_results_updated_at
            FROM customer_companies
            WHERE customer_id = $1 AND company_id = $2
            LIMIT 1
            "#,
        )
        .bind(customer_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn latest_diffbot_json(&self, company_id: Uuid) -> Result<Option<Value>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT diffbot_json
            FROM company_metadata
            WHERE company_id = $1 AND diffbot_json IS NOT NULL
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn save_scoring_results(
        &self,
        customer_company_id: Uuid,
        results: &Value,
        scored_at: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE customer_companies
            SET last_scoring_results = $1, scoring_results_updated_at = $2
            WHERE id = $3
            "#,
        )
        .bind(results)
        .bind(scored_at)
        .bind(customer_company_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SegmentStore for PgStore {
    async fn industry_names(&self) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT name FROM industries ORDER BY name")
            .fetch_all(&self.pool)
            .await
    }

    async fn company_size_names(&self) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT name FROM company_sizes ORDER BY sort_order, name")
            .fetch_all(&self.pool)
            .await
    }

    async fn segment_name_taken(
        &self,
        scope: &TenantScope,
        name: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM lists
                WHERE customer_id = $1
                  AND deleted_at IS NULL
                  AND lower(name) = lower($2)
                  AND ($3::uuid IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(scope.customer_id)
        .bind(name)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn insert_segment(
        &self,
        scope: &TenantScope,
        segment: NewSegment,
    ) -> Result<SegmentRow, sqlx::Error> {
        sqlx::query_as::<_, SegmentRow>(
            r#"
            INSERT INTO lists (id, customer_id, user_id, name, filters, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(scope.customer_id)
        .bind(scope.user_id)
        .bind(&segment.name)
        .bind(&segment.filters)
        .bind(STATUS_NEW)
        .fetch_one(&self.pool)
        .await
    }

    async fn find_segment(
        &self,
        scope: &TenantScope,
        segment_id: Uuid,
    ) -> Result<Option<SegmentRow>, sqlx::Error> {
        sqlx::query_as::<_, SegmentRow>(
            "SELECT * FROM lists WHERE id = $1 AND customer_id = $2 AND deleted_at IS NULL",
        )
        .bind(segment_id)
        .bind(scope.customer_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_segment(
        &self,
        scope: &TenantScope,
        segment_id: Uuid,
        changes: SegmentChanges,
    ) -> Result<Option<SegmentRow>, sqlx::Error> {
        sqlx::query_as::<_, SegmentRow>(
            r#"
            UPDATE lists
            SET name = $1,
                filters = $2,
                status = CASE WHEN $3 THEN $4 ELSE status END,
                updated_at = now()
            WHERE id = $5 AND customer_id = $6 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(&changes.name)
        .bind(&changes.filters)
        .bind(changes.reset_status)
        .bind(STATUS_NEW)
        .bind(segment_id)
        .bind(scope.customer_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_segment_members(&self, segment_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM list_companies WHERE list_id = $1")
            .bind(segment_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn soft_delete_segment(
        &self,
        scope: &TenantScope,
        segment_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE lists
            SET deleted_at = now(), updated_at = now()
            WHERE id = $1 AND customer_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(segment_id)
        .bind(scope.customer_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn find_job(
        &self,
        scope: &TenantScope,
        job_id: Uuid,
    ) -> Result<Option<LlmJobRow>, sqlx::Error> {
        sqlx::query_as::<_, LlmJobRow>(
            r#"
            SELECT id, customer_id, user_id, status, updated_at
            FROM llm_jobs
            WHERE id = $1 AND customer_id = $2
            "#,
        )
        .bind(job_id)
        .bind(scope.customer_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn cancel_job_if_active(
        &self,
        scope: &TenantScope,
        job_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE llm_jobs
            SET status = $1, updated_at = now()
            WHERE id = $2 AND customer_id = $3 AND status <> ALL($4)
            "#,
        )
        .bind(STATUS_CANCELLED)
        .bind(job_id)
        .bind(scope.customer_id)
        .bind(terminal_statuses())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn customer_for_user(&self, user_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
        let customer: Option<Option<Uuid>> =
            sqlx::query_scalar("SELECT customer_id FROM profiles WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(customer.flatten())
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn create_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO notifications (customer_id, user_id, kind, title, message, data)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(notification.customer_id)
        .bind(notification.user_id)
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.data)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

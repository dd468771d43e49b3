//! In-memory fakes shared by the unit tests.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::{TenantScope, TokenVerifier};
use crate::config::Config;
use crate::llm_client::{CompletionProvider, CompletionRequest, LlmError};
use crate::models::company::CustomerCompanyRow;
use crate::models::job::{is_terminal_status, LlmJobRow, STATUS_CANCELLED};
use crate::models::notification::NewNotification;
use crate::models::segment::{SegmentRow, STATUS_NEW};
use crate::segments::processing::ProcessTrigger;
use crate::state::AppState;
use crate::store::{
    CompanyStore, JobStore, NewSegment, NotificationStore, ProfileStore, SegmentChanges,
    SegmentStore,
};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";
pub const TEST_AUDIENCE: &str = "authenticated";

pub fn tenant() -> TenantScope {
    TenantScope {
        user_id: Uuid::new_v4(),
        customer_id: Uuid::new_v4(),
    }
}

/// Lets detached tasks spawned by the code under test run to completion.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

#[derive(Serialize)]
struct TestClaims<'a> {
    sub: &'a str,
    aud: &'a str,
    exp: i64,
    role: &'a str,
}

pub fn sign_token(sub: &str, secret: &str, ttl_secs: i64) -> String {
    let claims = TestClaims {
        sub,
        aud: TEST_AUDIENCE,
        exp: (Utc::now() + Duration::seconds(ttl_secs)).timestamp(),
        role: "authenticated",
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/forge_test".to_string(),
        database_max_connections: 1,
        openai_api_key: "sk-test".to_string(),
        openai_base_url: "http://localhost:0".to_string(),
        llm_model: "gpt-4o-mini".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        jwt_audience: TEST_AUDIENCE.to_string(),
        segments_process_url: None,
        segments_process_token: None,
        scoring_staleness_days: 30,
        port: 0,
        rust_log: "debug".to_string(),
    }
}

pub fn test_state(
    store: Arc<MemoryStore>,
    llm: Arc<MockLlm>,
    trigger: Arc<RecordingTrigger>,
) -> AppState {
    let config = test_config();
    AppState {
        store,
        llm,
        processor: trigger,
        verifier: Arc::new(TokenVerifier::new(&config.jwt_secret, &config.jwt_audience)),
        config,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// MockLlm
// ────────────────────────────────────────────────────────────────────────────

/// Scripted completion provider that counts calls.
pub struct MockLlm {
    reply: Option<String>,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlm {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionProvider for MockLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        self.reply.clone().ok_or(LlmError::Api {
            status: 503,
            message: "provider unavailable".to_string(),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// RecordingTrigger
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingTrigger {
    triggered: Mutex<Vec<Uuid>>,
    fail: bool,
}

impl RecordingTrigger {
    pub fn failing() -> Self {
        Self {
            triggered: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn triggered(&self) -> Vec<Uuid> {
        self.triggered.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessTrigger for RecordingTrigger {
    async fn trigger(&self, segment_id: Uuid, _customer_id: Uuid) -> anyhow::Result<()> {
        self.triggered.lock().unwrap().push(segment_id);
        if self.fail {
            anyhow::bail!("processing endpoint unavailable");
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// MemoryStore
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct UniqueViolation;

impl std::fmt::Display for UniqueViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("duplicate key value violates unique constraint \"lists_customer_name_key\"")
    }
}

impl std::error::Error for UniqueViolation {}

impl sqlx::error::DatabaseError for UniqueViolation {
    fn message(&self) -> &str {
        "duplicate key value violates unique constraint \"lists_customer_name_key\""
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed("23505"))
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> sqlx::error::ErrorKind {
        sqlx::error::ErrorKind::UniqueViolation
    }
}

fn write_failure() -> sqlx::Error {
    sqlx::Error::Protocol("simulated write failure".to_string())
}

#[derive(Default)]
struct Inner {
    companies: HashSet<Uuid>,
    customers: HashSet<Uuid>,
    customer_companies: Vec<CustomerCompanyRow>,
    metadata: Vec<(Uuid, Value, DateTime<Utc>)>,
    industries: Vec<String>,
    company_sizes: Vec<String>,
    segments: Vec<SegmentRow>,
    members: HashMap<Uuid, usize>,
    jobs: Vec<LlmJobRow>,
    profiles: HashMap<Uuid, Option<Uuid>>,
    notifications: Vec<NewNotification>,
    fail_writes: bool,
    fail_notifications: bool,
    unique_violation_on_insert: bool,
    complete_before_cancel: bool,
    member_delete_failures: usize,
}

/// Store fake honoring the same tenant predicates as the Postgres queries.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    fn with<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        f(&mut self.inner.lock().unwrap())
    }

    pub fn add_company(&self, id: Uuid) {
        self.with(|s| s.companies.insert(id));
    }

    pub fn add_customer(&self, id: Uuid) {
        self.with(|s| s.customers.insert(id));
    }

    pub fn add_customer_company(
        &self,
        customer_id: Uuid,
        company_id: Uuid,
        results: Option<Value>,
        scored_at: Option<DateTime<Utc>>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.with(|s| {
            s.customer_companies.push(CustomerCompanyRow {
                id,
                customer_id,
                company_id,
                last_scoring_results: results,
                scoring_results_updated_at: scored_at,
            })
        });
        id
    }

    pub fn customer_company(&self, id: Uuid) -> Option<CustomerCompanyRow> {
        self.with(|s| s.customer_companies.iter().find(|r| r.id == id).cloned())
    }

    pub fn add_company_metadata(&self, company_id: Uuid, diffbot_json: Value, updated_at: DateTime<Utc>) {
        self.with(|s| s.metadata.push((company_id, diffbot_json, updated_at)));
    }

    pub fn set_vocabularies(&self, industries: &[&str], company_sizes: &[&str]) {
        self.with(|s| {
            s.industries = industries.iter().map(|v| v.to_string()).collect();
            s.company_sizes = company_sizes.iter().map(|v| v.to_string()).collect();
        });
    }

    pub fn set_segment_status(&self, segment_id: Uuid, status: &str) {
        self.with(|s| {
            if let Some(seg) = s.segments.iter_mut().find(|seg| seg.id == segment_id) {
                seg.status = status.to_string();
            }
        });
    }

    pub fn add_segment_members(&self, segment_id: Uuid, count: usize) {
        self.with(|s| *s.members.entry(segment_id).or_default() += count);
    }

    pub fn segment_member_count(&self, segment_id: Uuid) -> usize {
        self.with(|s| s.members.get(&segment_id).copied().unwrap_or(0))
    }

    pub fn add_job(&self, customer_id: Uuid, status: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.with(|s| {
            s.jobs.push(LlmJobRow {
                id,
                customer_id,
                user_id: None,
                status: status.to_string(),
                updated_at: Utc::now(),
            })
        });
        id
    }

    pub fn job_status(&self, job_id: Uuid) -> Option<String> {
        self.with(|s| s.jobs.iter().find(|j| j.id == job_id).map(|j| j.status.clone()))
    }

    pub fn add_profile(&self, user_id: Uuid, customer_id: Option<Uuid>) {
        self.with(|s| s.profiles.insert(user_id, customer_id));
    }

    pub fn notifications(&self) -> Vec<NewNotification> {
        self.with(|s| s.notifications.clone())
    }

    pub fn fail_writes(&self, fail: bool) {
        self.with(|s| s.fail_writes = fail);
    }

    pub fn fail_notifications(&self, fail: bool) {
        self.with(|s| s.fail_notifications = fail);
    }

    pub fn fail_inserts_with_unique_violation(&self, fail: bool) {
        self.with(|s| s.unique_violation_on_insert = fail);
    }

    /// The next `count` member purges fail.
    pub fn fail_member_deletes(&self, count: usize) {
        self.with(|s| s.member_delete_failures = count);
    }

    /// Simulates the worker finishing a job between lookup and cancel.
    pub fn complete_jobs_before_cancel(&self, enabled: bool) {
        self.with(|s| s.complete_before_cancel = enabled);
    }
}

#[async_trait]
impl CompanyStore for MemoryStore {
    async fn company_exists(&self, company_id: Uuid) -> Result<bool, sqlx::Error> {
        Ok(self.with(|s| s.companies.contains(&company_id)))
    }

    async fn customer_exists(&self, customer_id: Uuid) -> Result<bool, sqlx::Error> {
        Ok(self.with(|s| s.customers.contains(&customer_id)))
    }

    async fn find_customer_company(
        &self,
        customer_id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<CustomerCompanyRow>, sqlx::Error> {
        Ok(self.with(|s| {
            s.customer_companies
                .iter()
                .find(|r| r.customer_id == customer_id && r.company_id == company_id)
                .cloned()
        }))
    }

    async fn latest_diffbot_json(&self, company_id: Uuid) -> Result<Option<Value>, sqlx::Error> {
        Ok(self.with(|s| {
            s.metadata
                .iter()
                .filter(|(id, json, _)| *id == company_id && !json.is_null())
                .max_by_key(|(_, _, updated_at)| *updated_at)
                .map(|(_, json, _)| json.clone())
        }))
    }

    async fn save_scoring_results(
        &self,
        customer_company_id: Uuid,
        results: &Value,
        scored_at: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        self.with(|s| {
            if s.fail_writes {
                return Err(write_failure());
            }
            let Some(row) = s
                .customer_companies
                .iter_mut()
                .find(|r| r.id == customer_company_id)
            else {
                return Ok(0);
            };
            row.last_scoring_results = Some(results.clone());
            row.scoring_results_updated_at = Some(scored_at);
            Ok(1)
        })
    }
}

#[async_trait]
impl SegmentStore for MemoryStore {
    async fn industry_names(&self) -> Result<Vec<String>, sqlx::Error> {
        Ok(self.with(|s| s.industries.clone()))
    }

    async fn company_size_names(&self) -> Result<Vec<String>, sqlx::Error> {
        Ok(self.with(|s| s.company_sizes.clone()))
    }

    async fn segment_name_taken(
        &self,
        scope: &TenantScope,
        name: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        let needle = name.to_lowercase();
        Ok(self.with(|s| {
            s.segments.iter().any(|seg| {
                seg.customer_id == scope.customer_id
                    && seg.deleted_at.is_none()
                    && seg.name.to_lowercase() == needle
                    && Some(seg.id) != exclude_id
            })
        }))
    }

    async fn insert_segment(
        &self,
        scope: &TenantScope,
        segment: NewSegment,
    ) -> Result<SegmentRow, sqlx::Error> {
        self.with(|s| {
            if s.unique_violation_on_insert {
                return Err(sqlx::Error::Database(Box::new(UniqueViolation)));
            }
            if s.fail_writes {
                return Err(write_failure());
            }
            let now = Utc::now();
            let row = SegmentRow {
                id: Uuid::new_v4(),
                customer_id: scope.customer_id,
                user_id: Some(scope.user_id),
                name: segment.name,
                filters: segment.filters,
                status: STATUS_NEW.to_string(),
                created_at: now,
                updated_at: now,
                deleted_at: None,
            };
            s.segments.push(row.clone());
            Ok(row)
        })
    }

    async fn find_segment(
        &self,
        scope: &TenantScope,
        segment_id: Uuid,
    ) -> Result<Option<SegmentRow>, sqlx::Error> {
        Ok(self.with(|s| {
            s.segments
                .iter()
                .find(|seg| {
                    seg.id == segment_id
                        && seg.customer_id == scope.customer_id
                        && seg.deleted_at.is_none()
                })
                .cloned()
        }))
    }

    async fn update_segment(
        &self,
        scope: &TenantScope,
        segment_id: Uuid,
        changes: SegmentChanges,
    ) -> Result<Option<SegmentRow>, sqlx::Error> {
        self.with(|s| {
            if s.fail_writes {
                return Err(write_failure());
            }
            let Some(seg) = s.segments.iter_mut().find(|seg| {
                seg.id == segment_id
                    && seg.customer_id == scope.customer_id
                    && seg.deleted_at.is_none()
            }) else {
                return Ok(None);
            };
            seg.name = changes.name;
            seg.filters = changes.filters;
            if changes.reset_status {
                seg.status = STATUS_NEW.to_string();
            }
            seg.updated_at = Utc::now();
            Ok(Some(seg.clone()))
        })
    }

    async fn delete_segment_members(&self, segment_id: Uuid) -> Result<u64, sqlx::Error> {
        self.with(|s| {
            if s.member_delete_failures > 0 {
                s.member_delete_failures -= 1;
                return Err(write_failure());
            }
            Ok(s.members.remove(&segment_id).unwrap_or(0) as u64)
        })
    }

    async fn soft_delete_segment(
        &self,
        scope: &TenantScope,
        segment_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        self.with(|s| {
            if s.fail_writes {
                return Err(write_failure());
            }
            let Some(seg) = s.segments.iter_mut().find(|seg| {
                seg.id == segment_id
                    && seg.customer_id == scope.customer_id
                    && seg.deleted_at.is_none()
            }) else {
                return Ok(false);
            };
            seg.deleted_at = Some(Utc::now());
            Ok(true)
        })
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn find_job(
        &self,
        scope: &TenantScope,
        job_id: Uuid,
    ) -> Result<Option<LlmJobRow>, sqlx::Error> {
        Ok(self.with(|s| {
            s.jobs
                .iter()
                .find(|j| j.id == job_id && j.customer_id == scope.customer_id)
                .cloned()
        }))
    }

    async fn cancel_job_if_active(
        &self,
        scope: &TenantScope,
        job_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        self.with(|s| {
            if s.fail_writes {
                return Err(write_failure());
            }
            let race = s.complete_before_cancel;
            let Some(job) = s
                .jobs
                .iter_mut()
                .find(|j| j.id == job_id && j.customer_id == scope.customer_id)
            else {
                return Ok(false);
            };
            if race {
                job.status = "completed".to_string();
            }
            if is_terminal_status(&job.status) {
                return Ok(false);
            }
            job.status = STATUS_CANCELLED.to_string();
            job.updated_at = Utc::now();
            Ok(true)
        })
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn customer_for_user(&self, user_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
        Ok(self.with(|s| s.profiles.get(&user_id).copied().flatten()))
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn create_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<(), sqlx::Error> {
        self.with(|s| {
            if s.fail_notifications {
                return Err(write_failure());
            }
            s.notifications.push(notification.clone());
            Ok(())
        })
    }
}

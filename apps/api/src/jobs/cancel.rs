//! Job cancellation.
//!
//! Every lookup carries the caller's tenant, so a job owned by someone else
//! produces the same 404 as one that never existed. The final update is
//! conditional on the job still being active: if the worker finishes the job
//! between the status check and the update, the request succeeds with
//! `cancelled: false`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::TenantScope;
use crate::errors::AppError;
use crate::models::notification::{NewNotification, NotificationKind};
use crate::notifications;
use crate::store::Store;

#[derive(Debug, Clone, Deserialize)]
pub struct CancelJobRequest {
    #[serde(default)]
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancelJobResponse {
    pub cancelled: bool,
    pub job_id: String,
    pub message: String,
}

fn job_not_found() -> AppError {
    AppError::NotFound("Job not found or access denied".to_string())
}

pub async fn cancel_job(
    store: &Arc<dyn Store>,
    scope: &TenantScope,
    request: &CancelJobRequest,
) -> Result<CancelJobResponse, AppError> {
    let raw_id = request
        .job_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("job_id is required".to_string()))?;

    // An id that cannot name a job is reported like any other invisible job.
    let job_id = Uuid::try_parse(raw_id).map_err(|_| job_not_found())?;

    let job = store
        .find_job(scope, job_id)
        .await?
        .ok_or_else(job_not_found)?;

    if job.is_terminal() {
        return Err(AppError::Conflict(format!(
            "Job is already {} and cannot be cancelled",
            job.status
        )));
    }

    let cancelled = store.cancel_job_if_active(scope, job_id).await?;
    if !cancelled {
        info!("Job {job_id} finished before cancellation took effect");
        return Ok(CancelJobResponse {
            cancelled: false,
            job_id: raw_id.to_string(),
            message: "Job finished before it could be cancelled".to_string(),
        });
    }

    info!("Cancelled job {job_id} for customer {}", scope.customer_id);
    notifications::dispatch(
        store.clone(),
        NewNotification {
            customer_id: scope.customer_id,
            user_id: Some(scope.user_id),
            kind: NotificationKind::JobCancelled,
            title: "Job cancelled".to_string(),
            message: "Your AI job was cancelled".to_string(),
            data: json!({ "job_id": job_id }),
        },
    );

    Ok(CancelJobResponse {
        cancelled: true,
        job_id: raw_id.to_string(),
        message: "Job cancelled".to_string(),
    })
}

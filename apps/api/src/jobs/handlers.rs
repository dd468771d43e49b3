//! Axum route handlers for LLM job control.

use axum::{extract::State, Json};

use crate::auth::AuthContext;
use crate::errors::AppError;
use crate::jobs::cancel::{cancel_job, CancelJobRequest, CancelJobResponse};
use crate::routes::extract::JsonBody;
use crate::state::AppState;

/// POST /api/v1/llm-cancel
pub async fn handle_llm_cancel(
    State(state): State<AppState>,
    auth: AuthContext,
    JsonBody(request): JsonBody<CancelJobRequest>,
) -> Result<Json<CancelJobResponse>, AppError> {
    let scope = auth.tenant()?;
    let response = cancel_job(&state.store, &scope, &request).await?;
    Ok(Json(response))
}

/// Any method other than POST on a job-control route.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

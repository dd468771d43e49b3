//! Axum route handler for company scoring.

use anyhow::anyhow;
use axum::{extract::State, Json};
use chrono::{Duration, Utc};

use crate::errors::AppError;
use crate::routes::extract::JsonBody;
use crate::scoring::scorer::{score_company, ScoreCompanyRequest, ScoringOutcome};
use crate::state::AppState;

/// POST /api/v1/company-scoring
///
/// Scores a company for a customer, or reports a skip when a fresh score exists.
pub async fn handle_company_scoring(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ScoreCompanyRequest>,
) -> Result<Json<ScoringOutcome>, AppError> {
    let days = state.config.scoring_staleness_days;
    let window = Duration::try_days(days)
        .filter(|w| *w > Duration::zero())
        .ok_or_else(|| anyhow!("Invalid scoring staleness window: {days} days"))?;
    let outcome = score_company(
        state.store.as_ref(),
        state.llm.as_ref(),
        &request,
        window,
        Utc::now(),
    )
    .await?;
    Ok(Json(outcome))
}

//! Company scoring pipeline.
//!
//! Flow: validate ids → company / customer / association lookups →
//!       staleness check → enrichment snapshot → LLM → validate → persist.
//!
//! The staleness check is a timestamp comparison, not a lock. Two concurrent
//! requests for the same pair can both pass it and both call the LLM.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::{
    parse_json_reply, CompletionProvider, CompletionRequest, LlmError, ResponseFormat,
};
use crate::models::company::CustomerCompanyRow;
use crate::scoring::prompts::{
    scoring_response_schema, scoring_system_prompt, scoring_user_prompt, SCORING_SCHEMA_NAME,
};
use crate::store::Store;
use crate::validation::parse_uuid;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreCompanyRequest {
    pub company_id: String,
    pub customer_id: String,
}

/// The LLM's verdict. Exactly these three fields are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompanyScore {
    pub score: f64,
    pub short_description: String,
    pub full_description: String,
}

impl CompanyScore {
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.score.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&self.score) {
            return Err(AppError::Llm(format!(
                "LLM score {} is outside [{MIN_SCORE}, {MAX_SCORE}]",
                self.score
            )));
        }
        if self.short_description.trim().is_empty() {
            return Err(AppError::Llm("LLM short_description is empty".to_string()));
        }
        if self.full_description.trim().is_empty() {
            return Err(AppError::Llm("LLM full_description is empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    RecentlyScored,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScoringOutcome {
    Completed(CompanyScore),
    Skipped { reason: SkipReason },
}

/// Parses raw LLM text into a validated score. Any failure is a 500.
pub fn parse_company_score(raw: &str) -> Result<CompanyScore, AppError> {
    let score: CompanyScore = parse_json_reply(raw).map_err(|e| match e {
        LlmError::EmptyContent => AppError::Llm(e.to_string()),
        e => AppError::Llm(format!("Invalid scoring response: {e}")),
    })?;
    score.validate()?;
    Ok(score)
}

/// True when the association carries a score newer than the window.
pub fn recently_scored(row: &CustomerCompanyRow, now: DateTime<Utc>, window: Duration) -> bool {
    match (&row.last_scoring_results, row.scoring_results_updated_at) {
        (Some(results), Some(scored_at)) if !results.is_null() => now - scored_at < window,
        _ => false,
    }
}

/// Runs the scoring pipeline for one (company, customer) pair.
pub async fn score_company(
    store: &dyn Store,
    llm: &dyn CompletionProvider,
    request: &ScoreCompanyRequest,
    staleness_window: Duration,
    now: DateTime<Utc>,
) -> Result<ScoringOutcome, AppError> {
    let company_id = parse_uuid("company_id", &request.company_id)?;
    let customer_id = parse_uuid("customer_id", &request.customer_id)?;

    if !store.company_exists(company_id).await? {
        return Err(AppError::NotFound(format!("Company {company_id} not found")));
    }
    if !store.customer_exists(customer_id).await? {
        return Err(AppError::NotFound(format!("Customer {customer_id} not found")));
    }
    let association = store
        .find_customer_company(customer_id, company_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Company {company_id} is not associated with customer {customer_id}"
            ))
        })?;

    if recently_scored(&association, now, staleness_window) {
        info!("Skipping scoring for company {company_id}: scored within window");
        return Ok(ScoringOutcome::Skipped {
            reason: SkipReason::RecentlyScored,
        });
    }

    let diffbot_json = store.latest_diffbot_json(company_id).await?.ok_or_else(|| {
        AppError::Validation(format!(
            "No enrichment data found for company {company_id}. Run segment processing first."
        ))
    })?;

    let score = request_score(llm, &diffbot_json).await?;

    persist_score(store, &association, &score, now).await?;

    info!(
        "Scored company {company_id} for customer {customer_id}: {}",
        score.score
    );
    Ok(ScoringOutcome::Completed(score))
}

async fn request_score(
    llm: &dyn CompletionProvider,
    diffbot_json: &serde_json::Value,
) -> Result<CompanyScore, AppError> {
    let request = CompletionRequest {
        system: scoring_system_prompt(),
        user: scoring_user_prompt(diffbot_json),
        temperature: None,
        format: ResponseFormat::JsonSchema {
            name: SCORING_SCHEMA_NAME,
            schema: scoring_response_schema(),
        },
    };

    let raw = llm
        .complete(&request)
        .await
        .map_err(|e| AppError::Llm(format!("Company scoring failed: {e}")))?;

    parse_company_score(&raw)
}

async fn persist_score(
    store: &dyn Store,
    association: &CustomerCompanyRow,
    score: &CompanyScore,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let results = serde_json::to_value(score)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize score: {e}")))?;

    let updated = store
        .save_scoring_results(association.id, &results, now)
        .await?;
    if updated == 0 {
        return Err(AppError::Internal(anyhow::anyhow!(
            "Scoring results were not saved for association {}",
            association.id
        )));
    }
    Ok(())
}

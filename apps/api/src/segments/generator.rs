//! AI segment generation. Turns an audience description into a proposed
//! segment name and filters. Nothing is persisted here; the client saves the
//! proposal through the create endpoint.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::TenantScope;
use crate::errors::AppError;
use crate::llm_client::{
    parse_json_reply, CompletionProvider, CompletionRequest, LlmError, ResponseFormat,
};
use crate::segments::filters::{DraftFilters, SegmentFilters};
use crate::segments::prompts::{segment_system_prompt, segment_user_prompt};
use crate::segments::service::MAX_NAME_LEN;
use crate::store::Store;
use crate::validation::bounded_text;

pub const MIN_DESCRIPTION_LEN: usize = 3;
pub const MAX_DESCRIPTION_LEN: usize = 1000;
const GENERATION_TEMPERATURE: f32 = 0.3;

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateSegmentRequest {
    #[serde(default)]
    pub description: Option<String>,
}

/// Raw model output. Unknown fields anywhere fail the parse.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SegmentDraft {
    pub name: String,
    pub filters: DraftFilters,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedSegment {
    pub name: String,
    pub filters: SegmentFilters,
}

/// Parses raw LLM text into a draft. Any failure is a 500.
pub fn parse_segment_draft(raw: &str) -> Result<SegmentDraft, AppError> {
    let draft: SegmentDraft = parse_json_reply(raw).map_err(|e| match e {
        LlmError::EmptyContent => AppError::Llm(e.to_string()),
        e => AppError::Llm(format!("Invalid segment response: {e}")),
    })?;
    if draft.name.trim().is_empty() {
        return Err(AppError::Llm("LLM returned an empty segment name".to_string()));
    }
    Ok(draft)
}

/// Clips a generated name to the length the create endpoint accepts.
fn clip_name(name: &str) -> String {
    name.trim().chars().take(MAX_NAME_LEN).collect::<String>().trim_end().to_string()
}

pub async fn generate_segment(
    store: &dyn Store,
    llm: &dyn CompletionProvider,
    scope: &TenantScope,
    request: &GenerateSegmentRequest,
) -> Result<GeneratedSegment, AppError> {
    let description = request
        .description
        .as_deref()
        .ok_or_else(|| AppError::Validation("description is required".to_string()))?;
    let description = bounded_text(
        "description",
        description,
        MIN_DESCRIPTION_LEN,
        MAX_DESCRIPTION_LEN,
    )?;

    let industries = store.industry_names().await?;
    let company_sizes = store.company_size_names().await?;

    let completion = CompletionRequest {
        system: segment_system_prompt(&industries, &company_sizes),
        user: segment_user_prompt(&description),
        temperature: Some(GENERATION_TEMPERATURE),
        format: ResponseFormat::JsonObject,
    };
    let raw = llm
        .complete(&completion)
        .await
        .map_err(|e| AppError::Llm(format!("Segment generation failed: {e}")))?;

    let draft = parse_segment_draft(&raw)?;
    if draft.filters.is_empty() {
        return Err(AppError::Validation(
            "Could not extract any filters from the description. Try adding a location, industry, or company size.".to_string(),
        ));
    }

    let filters = draft.filters.normalize(&industries, &company_sizes);
    info!(
        "Generated segment draft for customer {}: {:?}",
        scope.customer_id, draft.name
    );

    Ok(GeneratedSegment {
        name: clip_name(&draft.name),
        filters,
    })
}

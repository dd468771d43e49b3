// Segment generation LLM prompt templates.

use crate::llm_client::JSON_ONLY_INSTRUCTION;

/// Builds the system prompt with the current vocabularies inlined.
pub fn segment_system_prompt(industries: &[String], company_sizes: &[String]) -> String {
    format!(
        r#"You are an expert B2B marketing strategist. You turn a free-text description
of a target audience into a saved company segment.

Return a JSON object with this EXACT schema (no extra fields):
{{
  "name": "Short descriptive segment name (3-100 characters)",
  "filters": {{
    "country": "Country name, if the description names one",
    "location": "City or region, if the description names one",
    "employees": "ONE value from the company size list",
    "categories": ["Values from the industry list"],
    "technographics": ["Technologies the companies use"]
  }}
}}

Omit any filter the description does not support. Never invent constraints.

VALID COMPANY SIZES (use the exact spelling):
{sizes}

VALID INDUSTRIES (use the exact spelling):
{industries}

{JSON_ONLY_INSTRUCTION}"#,
        sizes = bullet_list(company_sizes),
        industries = bullet_list(industries),
    )
}

pub fn segment_user_prompt(description: &str) -> String {
    format!("Create a segment for this audience description:\n\n{description}")
}

fn bullet_list(values: &[String]) -> String {
    if values.is_empty() {
        return "- (none available)".to_string();
    }
    values
        .iter()
        .map(|v| format!("- {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

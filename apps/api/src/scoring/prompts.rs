// Company scoring LLM prompt templates.

use serde_json::{json, Value};

use crate::llm_client::JSON_ONLY_INSTRUCTION;

pub const SCORING_SCHEMA_NAME: &str = "company_score";

/// Fixed evaluation rubric sent as the system prompt.
pub fn scoring_system_prompt() -> String {
    format!(
        "You are a B2B market analyst evaluating companies as potential customers. \
        You receive enrichment data describing a single company and rate how attractive \
        it is as a sales target.\n\n\
        SCORING RUBRIC (0-10):\n\
        - 0-2: defunct, unidentifiable, or clearly outside any commercial target market\n\
        - 3-4: weak signals; very small, stagnant, or with sparse public footprint\n\
        - 5-6: viable company with moderate size, growth, or digital maturity\n\
        - 7-8: solid company with clear growth, funding, or technology adoption signals\n\
        - 9-10: exceptional target with strong momentum across size, growth and technology\n\n\
        OUTPUT FIELDS:\n\
        - score: number between 0 and 10\n\
        - short_description: one sentence summarizing the verdict\n\
        - full_description: two to four paragraphs justifying the score from the data\n\n\
        Base every statement on the provided data. Do not invent facts. \
        Return exactly these three fields and nothing else. {JSON_ONLY_INSTRUCTION}"
    )
}

/// User message carrying the enrichment snapshot.
pub fn scoring_user_prompt(diffbot_json: &Value) -> String {
    let data = serde_json::to_string_pretty(diffbot_json).unwrap_or_else(|_| diffbot_json.to_string());
    format!("Evaluate the following company.\n\nCOMPANY DATA:\n{data}")
}

/// Structured-output schema for the scoring response.
pub fn scoring_response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "score": {
                "type": "number",
                "description": "Overall score from 0 to 10"
            },
            "short_description": {
                "type": "string",
                "description": "One sentence verdict"
            },
            "full_description": {
                "type": "string",
                "description": "Detailed justification of the score"
            }
        },
        "required": ["score", "short_description", "full_description"],
        "additionalProperties": false
    })
}

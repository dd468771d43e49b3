// Company scoring: rates a tenant's fit with a company from its enrichment
// snapshot. All LLM calls go through llm_client.

pub mod handlers;
pub mod prompts;
pub mod scorer;

// Segments: tenant-scoped saved company filters.
// AI generation proposes a name + filters; create/update/delete persist them.
// All LLM calls go through llm_client.

pub mod filters;
pub mod generator;
pub mod handlers;
pub mod processing;
pub mod prompts;
pub mod service;

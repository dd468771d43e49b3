use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::config::Config;
use crate::llm_client::CompletionProvider;
use crate::segments::processing::ProcessTrigger;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub llm: Arc<dyn CompletionProvider>,
    /// Kicks off downstream processing for new or re-filtered segments.
    pub processor: Arc<dyn ProcessTrigger>,
    pub verifier: Arc<TokenVerifier>,
    pub config: Config,
}

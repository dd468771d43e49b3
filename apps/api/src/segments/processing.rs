//! Trigger for the downstream segment-processing pipeline.
//!
//! The pipeline materializes `list_companies` rows for segments in status
//! `new`. This service only asks it to start; it never waits for the result.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

const TRIGGER_TIMEOUT_SECS: u64 = 30;

#[async_trait]
pub trait ProcessTrigger: Send + Sync {
    async fn trigger(&self, segment_id: Uuid, customer_id: Uuid) -> Result<()>;
}

/// POSTs `{segment_id, customer_id}` to the configured processing endpoint.
/// Without an endpoint the trigger is a logged no-op.
pub struct HttpProcessTrigger {
    client: Client,
    url: Option<String>,
    token: Option<String>,
}

impl HttpProcessTrigger {
    pub fn new(url: Option<String>, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TRIGGER_TIMEOUT_SECS))
            .build()
            .context("Failed to build processing HTTP client")?;
        Ok(Self { client, url, token })
    }
}

#[async_trait]
impl ProcessTrigger for HttpProcessTrigger {
    async fn trigger(&self, segment_id: Uuid, customer_id: Uuid) -> Result<()> {
        let Some(url) = &self.url else {
            debug!("Segment processing endpoint not configured; skipping {segment_id}");
            return Ok(());
        };

        let mut request = self.client.post(url).json(&json!({
            "segment_id": segment_id,
            "customer_id": customer_id,
        }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .context("Segment processing request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Segment processing endpoint returned {status}: {body}");
        }
        Ok(())
    }
}

/// Starts processing in the background. Failures are logged and dropped.
pub fn spawn_processing(
    trigger: Arc<dyn ProcessTrigger>,
    segment_id: Uuid,
    customer_id: Uuid,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match trigger.trigger(segment_id, customer_id).await {
            Ok(()) => info!("Requested processing for segment {segment_id}"),
            Err(e) => warn!("Failed to request processing for segment {segment_id}: {e:#}"),
        }
    })
}

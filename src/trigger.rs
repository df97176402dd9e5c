use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{Config, SOURCE_TAG};
use crate::error::{AppError, Result};

/// Body of the request that starts an upstream analysis run.
#[derive(Debug, Serialize)]
pub struct TriggerRequest<'a> {
    pub timestamp: String,
    pub source: &'a str,
}

/// Raw webhook response plus how long the round trip took.
#[derive(Debug)]
pub struct TriggerResponse {
    pub body: serde_json::Value,
    pub elapsed: Duration,
}

/// Starts the external analysis workflow with a single POST.
/// No retries: a failed call is terminal and the caller decides what to do.
#[derive(Debug, Clone)]
pub struct WebhookTrigger {
    client: reqwest::Client,
    url: String,
}

impl WebhookTrigger {
    /// The configured analysis timeout is applied as the total request deadline.
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.analysis_timeout_ms))
            .build()
            .map_err(AppError::Network)?;
        Ok(Self {
            client,
            url: cfg.webhook_url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn trigger_analysis(&self) -> Result<TriggerResponse> {
        let body = TriggerRequest {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            source: SOURCE_TAG,
        };
        debug!(url = %self.url, "POST analysis trigger");

        let started = Instant::now();
        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("Webhook request failed: {e}");
                AppError::Network(e)
            })?;

        let status = resp.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Webhook returned error status");
            return Err(AppError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value = resp.json().await.map_err(|e| {
            if e.is_decode() {
                AppError::Decode(e)
            } else {
                AppError::Network(e)
            }
        })?;
        let elapsed = started.elapsed();

        info!(
            elapsed_ms = elapsed.as_millis() as u64,
            "Webhook responded in {}ms",
            elapsed.as_millis(),
        );
        Ok(TriggerResponse { body, elapsed })
    }
}

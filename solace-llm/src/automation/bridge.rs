//! Bridge client - connects to a local browser automation service
//!
//! The service wraps a vision-capable browser agent and exposes it over
//! HTTP. One POST runs one task to completion, so the request timeout is
//! long: the agent's own step and failure budgets are what bound a run.
//!
//! Default endpoint: http://localhost:5170/v1/agent/run

use super::*;
use crate::error::{self, Error};
use reqwest::Client;

/// Default automation service port
pub const DEFAULT_PORT: u16 = 5170;

/// Bridge client - connects to a local browser automation service
pub struct BrowserBridge {
    client: Client,
    base_url: String,
}

impl BrowserBridge {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                Error::config_invalid("failed to create HTTP client")
                    .with_operation("bridge::new")
                    .set_source(e)
            })?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    /// Create with default local service settings
    pub fn local() -> Result<Self> {
        Self::with_port(DEFAULT_PORT)
    }

    /// Create with custom port
    pub fn with_port(port: u16) -> Result<Self> {
        Self::new(format!("http://localhost:{}", port), 900)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the automation service is running
    pub async fn health_check(&self) -> Result<bool> {
        let response = self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| {
                error::automation_unreachable(&self.base_url, e.to_string())
                    .with_operation("bridge::health_check")
            })?;

        Ok(response.status().is_success())
    }
}

impl BrowserAutomation for BrowserBridge {
    fn name(&self) -> &str {
        "bridge"
    }

    async fn run(&self, task: AutomationTask) -> Result<AutomationHistory> {
        tracing::info!(
            service = %self.base_url,
            model = %task.llm.model,
            max_actions_per_step = task.max_actions_per_step,
            max_failures = task.max_failures,
            "dispatching browser automation task"
        );

        let response = self.client
            .post(format!("{}/v1/agent/run", self.base_url))
            .json(&task)
            .send()
            .await
            .map_err(|e| {
                error::automation_unreachable(&self.base_url, e.to_string())
                    .with_operation("bridge::run")
            })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();

            if status == 503 {
                return Err(Error::automation_failed(
                    "Automation service not available. Make sure the browser agent is running.",
                )
                .with_operation("bridge::run")
                .with_context("http_status", status.to_string())
                .temporary());
            }

            return Err(Error::automation_failed(text)
                .with_operation("bridge::run")
                .with_context("http_status", status.to_string()));
        }

        let history: AutomationHistory = response.json().await.map_err(|e| {
            Error::parse_failed("invalid automation history")
                .with_operation("bridge::run")
                .set_source(e)
        })?;

        tracing::info!(
            steps = history.steps.len(),
            failures = history.errors().count(),
            done = history.is_done(),
            "browser automation finished"
        );

        Ok(history)
    }
}

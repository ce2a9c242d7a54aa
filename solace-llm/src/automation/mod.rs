//! # Browser Automation
//!
//! solace never drives a browser itself. A task description is handed to an
//! external automation agent, which plans and performs the clicks on its own
//! and reports back a history of steps plus a final free-text result.
//!
//! - `BrowserAutomation` is the seam; `BrowserBridge` is the HTTP client for
//!   a locally running automation service.
//! - Step and failure budgets travel with the task and are enforced by the
//!   agent, not here.

pub mod bridge;

pub use bridge::BrowserBridge;

use crate::error::Result;
use crate::provider::ProviderConfig;
use serde::{Deserialize, Serialize};

/// Language model the automation agent should reason with
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct AutomationLlm {
    pub provider: String,
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
}

impl AutomationLlm {
    /// Derive the agent's model settings from a provider config
    pub fn from_config(config: &ProviderConfig, temperature: f32) -> Self {
        Self {
            provider: config.provider_type.as_str().to_string(),
            model: config.model().to_string(),
            api_key: config.api_key().unwrap_or_default().to_string(),
            temperature,
        }
    }
}

impl std::fmt::Debug for AutomationLlm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutomationLlm")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// A single natural-language task for the automation agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AutomationTask {
    pub task: String,
    pub llm: AutomationLlm,
    pub max_actions_per_step: u32,
    pub max_failures: u32,
    pub use_vision: bool,
}

impl AutomationTask {
    pub fn new(task: impl Into<String>, llm: AutomationLlm) -> Self {
        Self {
            task: task.into(),
            llm,
            max_actions_per_step: 10,
            max_failures: 3,
            use_vision: true,
        }
    }

    pub fn with_max_actions_per_step(mut self, max: u32) -> Self {
        self.max_actions_per_step = max;
        self
    }

    pub fn with_max_failures(mut self, max: u32) -> Self {
        self.max_failures = max;
        self
    }

    pub fn with_vision(mut self, use_vision: bool) -> Self {
        self.use_vision = use_vision;
        self
    }
}

/// One action the agent took
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AutomationStep {
    pub action: String,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Everything the agent reported after finishing (or giving up)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AutomationHistory {
    #[serde(default)]
    pub steps: Vec<AutomationStep>,
    #[serde(default)]
    pub final_result: Option<String>,
    #[serde(default)]
    pub is_done: bool,
}

impl AutomationHistory {
    pub fn final_result(&self) -> Option<&str> {
        self.final_result.as_deref()
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().filter_map(|s| s.error.as_deref())
    }

    pub fn is_done(&self) -> bool {
        self.is_done
    }
}

/// An autonomous agent that carries out a task on a third-party website
#[allow(async_fn_in_trait)]
pub trait BrowserAutomation: Send + Sync {
    fn name(&self) -> &str;

    /// Run the task to completion; blocks until the agent stops
    async fn run(&self, task: AutomationTask) -> Result<AutomationHistory>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_from_openai_config() {
        let llm = AutomationLlm::from_config(&ProviderConfig::openai("sk-test"), 0.0);
        assert_eq!(llm.provider, "openai");
        assert_eq!(llm.model, "gpt-4o");
        assert_eq!(llm.api_key, "sk-test");
        assert!(!format!("{:?}", llm).contains("sk-test"));
    }

    #[test]
    fn test_task_builder() {
        let llm = AutomationLlm::from_config(&ProviderConfig::openai("k"), 0.0);
        let task = AutomationTask::new("go", llm)
            .with_max_actions_per_step(5)
            .with_max_failures(25)
            .with_vision(true);
        assert_eq!(task.max_actions_per_step, 5);
        assert_eq!(task.max_failures, 25);
        assert!(task.use_vision);
    }

    #[test]
    fn test_history_helpers() {
        let history: AutomationHistory = serde_json::from_value(serde_json::json!({
            "steps": [
                {"action": "go_to_url"},
                {"action": "click", "error": "element not found"},
                {"action": "done", "outcome": "https://imgflip.com/i/abc123"}
            ],
            "final_result": "https://imgflip.com/i/abc123",
            "is_done": true
        }))
        .unwrap();

        assert_eq!(history.final_result(), Some("https://imgflip.com/i/abc123"));
        assert_eq!(history.errors().collect::<Vec<_>>(), vec!["element not found"]);
        assert!(history.is_done());
    }
}

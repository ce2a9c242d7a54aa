//! Test doubles for the provider and automation seams

use solace_llm::{
    AutomationHistory, AutomationTask, BrowserAutomation, CompletionRequest, CompletionResponse,
    FinishReason, LlmProvider, ProviderError, Result, Role, Usage,
};
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: Option<String>,
    pub prompt: String,
    pub images: usize,
}

/// Replies from a script, one entry per call
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<std::result::Result<String, ProviderError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    pub fn replying(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| Ok(r.to_string())).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Succeed until call number `n` (1-based), which fails
    pub fn failing_at(n: usize) -> Self {
        let replies = (1..=4)
            .map(|i| {
                if i == n {
                    Err(ProviderError::Api { status: 500, message: "internal error".into() })
                } else {
                    Ok(format!("reply {}", i))
                }
            })
            .collect();
        Self {
            replies: Mutex::new(replies),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-1"
    }

    async fn complete(&self, request: CompletionRequest) -> std::result::Result<CompletionResponse, ProviderError> {
        let user = request.messages.iter().find(|m| m.role == Role::User);
        self.calls.lock().unwrap().push(RecordedCall {
            system: request.system_text().map(str::to_string),
            prompt: user.map(|m| m.content.clone()).unwrap_or_default(),
            images: user.map(|m| m.images.len()).unwrap_or_default(),
        });

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Other("script exhausted".into())))?;

        Ok(CompletionResponse {
            id: "scripted".into(),
            model: "scripted-1".into(),
            content: Some(reply),
            finish_reason: FinishReason::Stop,
            usage: Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
        })
    }
}

/// Automation agent that returns a canned history and keeps the task it saw
pub struct FakeAutomation {
    history: Result<AutomationHistory>,
    seen: Mutex<Vec<AutomationTask>>,
}

impl FakeAutomation {
    pub fn finishing_with(final_result: Option<&str>) -> Self {
        Self {
            history: Ok(AutomationHistory {
                steps: Vec::new(),
                final_result: final_result.map(str::to_string),
                is_done: true,
            }),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: solace_llm::Error) -> Self {
        Self {
            history: Err(err),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn tasks(&self) -> Vec<AutomationTask> {
        self.seen.lock().unwrap().clone()
    }
}

impl BrowserAutomation for FakeAutomation {
    fn name(&self) -> &str {
        "fake"
    }

    async fn run(&self, task: AutomationTask) -> Result<AutomationHistory> {
        self.seen.lock().unwrap().push(task);
        match &self.history {
            Ok(history) => Ok(history.clone()),
            Err(err) => Err(solace_llm::Error::new(err.kind(), err.message())),
        }
    }
}

//! # solace-llm
//!
//! The network-facing half of solace.
//!
//! ## Core Concepts
//! - **Provider**: Trait-based LLM communication (Gemini, OpenAI)
//! - **Images**: Staged screenshots encoded as inline provider parts
//! - **Automation**: Client for an external browser-automation agent

pub mod error;
pub mod image;
pub mod provider;
pub mod automation;

pub use error::{Error, ErrorKind, ErrorStatus, Result};
pub use image::ImagePart;
pub use provider::{
    LlmProvider, ProviderConfig, ProviderType, ProviderError,
    ChatMessage, Role, CompletionRequest, CompletionResponse,
    FinishReason, Usage, UsageTracker,
    GeminiProvider, OpenAIProvider,
};
pub use automation::{
    BrowserAutomation, BrowserBridge, AutomationTask, AutomationLlm,
    AutomationHistory, AutomationStep,
};

//! # Solace Agent
//!
//! Orchestration for the two workflows:
//! 1. Support: a credential opens the gate, screenshots are staged, and four
//!    personas (therapist, closure, recovery planner, stoic) answer in turn
//! 2. Meme: a browser automation agent builds a meme on imgflip and the
//!    share link is rewritten into a direct image URL
//!
//! The language model and the browser agent are external; this crate only
//! decides what to send them and in which order.

pub mod gate;
pub mod meme;
pub mod persona;
pub mod staging;
pub mod support;

#[cfg(test)]
mod testing;

pub use gate::{connect_gemini, connect_openai, Credential, PersonaSet};
pub use meme::{build_task, extract_meme_url, generate_meme, MemeResult, MemeWorkflow, ModelSelector};
pub use persona::{Persona, PersonaCatalog, PersonaKind};
pub use staging::{stage_images, ImageUpload, StagedBatch, StagedImage, StagingMode};
pub use support::{AgentResponse, SupportReport, SupportRequest, SupportWorkflow, WorkflowState};

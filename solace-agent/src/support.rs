//! Emotional-support workflow
//!
//! One request runs the four personas in fixed order against the same text
//! and images. Calls are strictly sequential. The first failure ends the
//! request; nothing partial is returned.

use crate::gate::PersonaSet;
use crate::persona::{Persona, PersonaKind};
use crate::staging::{stage_images, ImageUpload, StagingMode};
use serde::Serialize;
use solace_llm::{
    ChatMessage, CompletionRequest, Error, ImagePart, LlmProvider, Result, Usage, UsageTracker,
};

/// Free text plus uploaded screenshots
#[derive(Debug, Clone, Default)]
pub struct SupportRequest {
    pub text: Option<String>,
    pub uploads: Vec<ImageUpload>,
}

impl SupportRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            uploads: Vec::new(),
        }
    }

    pub fn with_uploads(mut self, uploads: Vec<ImageUpload>) -> Self {
        self.uploads = uploads;
        self
    }

    /// The user's text, trimmed; empty when none was given
    pub fn text(&self) -> &str {
        self.text.as_deref().map(str::trim).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_empty() && self.uploads.is_empty()
    }
}

/// Where a request is in its lifecycle. Steps are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    AwaitingInput,
    PersonaCall(usize),
    Rendered,
    Failed { step: usize },
}

/// One persona's reply
#[derive(Debug, Clone, Serialize)]
pub struct AgentResponse {
    pub persona: PersonaKind,
    pub name: String,
    pub heading: String,
    pub content: String,
    #[serde(skip)]
    pub usage: Usage,
}

/// All four replies, in invocation order
#[derive(Debug, Clone, Serialize)]
pub struct SupportReport {
    pub responses: Vec<AgentResponse>,
    #[serde(skip)]
    pub usage: UsageTracker,
}

impl SupportReport {
    pub fn get(&self, kind: PersonaKind) -> Option<&AgentResponse> {
        self.responses.iter().find(|r| r.persona == kind)
    }

    /// Render every reply under its heading
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        for response in &self.responses {
            out.push_str("## ");
            out.push_str(&response.heading);
            out.push_str("\n\n");
            out.push_str(response.content.trim());
            out.push_str("\n\n");
        }
        out
    }
}

/// Runs one support request against a persona set
pub struct SupportWorkflow<'a, P> {
    personas: &'a PersonaSet<P>,
    staging_mode: StagingMode,
    state: WorkflowState,
    transitions: Vec<WorkflowState>,
}

impl<'a, P: LlmProvider> SupportWorkflow<'a, P> {
    pub fn new(personas: &'a PersonaSet<P>) -> Self {
        Self {
            personas,
            staging_mode: StagingMode::default(),
            state: WorkflowState::Idle,
            transitions: vec![WorkflowState::Idle],
        }
    }

    pub fn with_staging_mode(mut self, mode: StagingMode) -> Self {
        self.staging_mode = mode;
        self
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Every state visited so far, starting with `Idle`
    pub fn transitions(&self) -> &[WorkflowState] {
        &self.transitions
    }

    fn enter(&mut self, state: WorkflowState) {
        tracing::debug!(from = ?self.state, to = ?state, "support workflow transition");
        self.state = state;
        self.transitions.push(state);
    }

    /// Stage the images and run all four personas
    pub async fn run(&mut self, request: &SupportRequest) -> Result<SupportReport> {
        self.enter(WorkflowState::AwaitingInput);

        if request.is_empty() {
            return Err(missing_input());
        }

        let batch = stage_images(&request.uploads, self.staging_mode).await?;
        let images = batch.load_parts().await;
        if request.text().is_empty() && images.is_empty() {
            return Err(missing_input());
        }

        tracing::info!(
            text_len = request.text().len(),
            images = images.len(),
            skipped = batch.skipped().len(),
            "starting support workflow"
        );

        let mut responses = Vec::with_capacity(self.personas.personas().len());
        let mut usage = UsageTracker::new();

        let personas = self.personas;
        for (index, persona) in personas.personas().iter().enumerate() {
            let step = index + 1;
            self.enter(WorkflowState::PersonaCall(step));
            tracing::info!(step, persona = %persona.name, "{}", persona.kind.progress_label());

            match invoke(personas.provider(), persona, request.text(), &images).await {
                Ok((response, model)) => {
                    usage.record(&model, &response.usage);
                    responses.push(response);
                }
                Err(cause) => {
                    self.enter(WorkflowState::Failed { step });
                    tracing::error!(step, persona = %persona.name, error = %cause, "persona call failed");
                    return Err(persona_error(persona, step, cause));
                }
            }
        }

        self.enter(WorkflowState::Rendered);
        tracing::info!(
            calls = usage.calls(),
            tokens = usage.total_tokens(),
            "support workflow finished"
        );

        Ok(SupportReport { responses, usage })
    }
}

/// One call; returns the reply and the model that produced it
async fn invoke<P: LlmProvider>(
    provider: &P,
    persona: &Persona,
    text: &str,
    images: &[ImagePart],
) -> Result<(AgentResponse, String)> {
    let request = CompletionRequest::new(vec![
        ChatMessage::system(persona.system_instruction()),
        ChatMessage::user(persona.render_prompt(text)).with_images(images.to_vec()),
    ]);

    let response = provider.complete(request).await.map_err(Error::from)?;
    let content = response
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| Error::inference_failed("empty response"))?;

    Ok((
        AgentResponse {
            persona: persona.kind,
            name: persona.name.clone(),
            heading: persona.heading.clone(),
            content,
            usage: response.usage,
        },
        response.model,
    ))
}

fn missing_input() -> Error {
    Error::input_missing("Please share your feelings or upload screenshots to get help.")
        .with_operation("support::run")
}

fn persona_error(persona: &Persona, step: usize, cause: Error) -> Error {
    let mut err = Error::persona_failed(persona.name.clone(), cause.message().to_string())
        .with_operation("support::run")
        .with_context("step", step.to_string())
        .with_context("cause", cause.kind().as_str());
    if cause.is_retryable() {
        err = err.temporary();
    }
    err.set_source(cause)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::Credential;
    use crate::persona::PersonaCatalog;
    use crate::testing::ScriptedProvider;
    use solace_llm::ErrorKind;

    fn personas(provider: ScriptedProvider) -> PersonaSet<ScriptedProvider> {
        let credential = Credential::new("key").unwrap();
        PersonaSet::build(&credential, &PersonaCatalog::builtin(), |_| Ok(provider)).unwrap()
    }

    fn png(name: &str) -> ImageUpload {
        ImageUpload::new(name, Some("image/png".into()), b"\x89PNGfake".to_vec())
    }

    #[tokio::test]
    async fn test_personas_run_in_order() {
        let set = personas(ScriptedProvider::replying(&["comfort", "letters", "plan", "truth"]));
        let mut workflow = SupportWorkflow::new(&set);

        let report = workflow.run(&SupportRequest::new("  they left me  ")).await.unwrap();

        let headings: Vec<_> = report.responses.iter().map(|r| r.heading.as_str()).collect();
        assert_eq!(
            headings,
            vec!["Emotional Support", "Finding Closure", "Your 7-Day Recovery Plan", "Honest Perspective"]
        );
        assert_eq!(report.get(PersonaKind::Stoic).unwrap().content, "truth");

        let calls = set.provider().calls();
        assert_eq!(calls.len(), 4);
        assert!(calls[0].system.as_deref().unwrap().starts_with("You are an empathetic therapist"));
        assert!(calls[0].prompt.contains("User's message: they left me\n"));
        assert!(calls[3].prompt.ends_with("situation: they left me"));

        assert_eq!(workflow.state(), WorkflowState::Rendered);
        assert_eq!(
            workflow.transitions(),
            &[
                WorkflowState::Idle,
                WorkflowState::AwaitingInput,
                WorkflowState::PersonaCall(1),
                WorkflowState::PersonaCall(2),
                WorkflowState::PersonaCall(3),
                WorkflowState::PersonaCall(4),
                WorkflowState::Rendered,
            ]
        );
        assert_eq!(report.usage.calls(), 4);
        assert_eq!(report.usage.total_tokens(), 60);
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_calls() {
        let set = personas(ScriptedProvider::failing_at(2));
        let mut workflow = SupportWorkflow::new(&set);

        let err = workflow.run(&SupportRequest::new("help")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PersonaInvocationFailed);
        assert!(err.context().iter().any(|(k, v)| *k == "persona" && v == "Closure Agent"));
        assert!(err.context().iter().any(|(k, v)| *k == "step" && v == "2"));
        assert_eq!(set.provider().calls().len(), 2);
        assert_eq!(workflow.state(), WorkflowState::Failed { step: 2 });
    }

    #[tokio::test]
    async fn test_empty_reply_is_a_failure() {
        let set = personas(ScriptedProvider::replying(&["fine", "   ", "plan", "truth"]));
        let mut workflow = SupportWorkflow::new(&set);

        let err = workflow.run(&SupportRequest::new("help")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PersonaInvocationFailed);
        assert_eq!(set.provider().calls().len(), 2);
    }

    #[tokio::test]
    async fn test_every_call_gets_every_image() {
        let set = personas(ScriptedProvider::replying(&["a", "b", "c", "d"]));
        let request = SupportRequest::default().with_uploads(vec![
            png("one.png"),
            ImageUpload::new("notes.txt", Some("text/plain".into()), b"hi".to_vec()),
            png("two.png"),
        ]);

        SupportWorkflow::new(&set).run(&request).await.unwrap();

        let calls = set.provider().calls();
        assert_eq!(calls.len(), 4);
        assert!(calls.iter().all(|c| c.images == 2));
        assert!(calls[1].prompt.contains("User's feelings: \n"));
    }

    #[tokio::test]
    async fn test_first_only_staging() {
        let set = personas(ScriptedProvider::replying(&["a", "b", "c", "d"]));
        let request = SupportRequest::new("look").with_uploads(vec![png("one.png"), png("two.png")]);

        SupportWorkflow::new(&set)
            .with_staging_mode(StagingMode::FirstOnly)
            .run(&request)
            .await
            .unwrap();

        assert!(set.provider().calls().iter().all(|c| c.images == 1));
    }

    #[tokio::test]
    async fn test_missing_input_makes_no_calls() {
        let set = personas(ScriptedProvider::replying(&["a", "b", "c", "d"]));

        for request in [
            SupportRequest::default(),
            SupportRequest::new("   "),
            SupportRequest::default().with_uploads(vec![ImageUpload::new("x.gif", None, vec![1])]),
        ] {
            let mut workflow = SupportWorkflow::new(&set);
            let err = workflow.run(&request).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InputMissing);
            assert_eq!(workflow.state(), WorkflowState::AwaitingInput);
        }
        assert!(set.provider().calls().is_empty());
    }

    #[test]
    fn test_report_markdown() {
        let report = SupportReport {
            responses: vec![AgentResponse {
                persona: PersonaKind::Therapist,
                name: "Therapist Agent".into(),
                heading: "Emotional Support".into(),
                content: "You are not alone.\n".into(),
                usage: Usage::default(),
            }],
            usage: UsageTracker::new(),
        };
        assert_eq!(report.to_markdown(), "## Emotional Support\n\nYou are not alone.\n\n");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["responses"][0]["persona"], "therapist");
    }
}

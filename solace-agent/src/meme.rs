//! Meme generation through a browser automation agent
//!
//! The agent is told, in plain language, how to build a meme on imgflip.
//! Whatever it reports back is searched for a share link, which is turned
//! into a direct image URL.

use crate::gate::Credential;
use regex::Regex;
use solace_llm::{
    AutomationHistory, AutomationLlm, AutomationTask, BrowserAutomation, Error, ProviderConfig,
    Result,
};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Actions the agent may take per step
pub const MAX_ACTIONS_PER_STEP: u32 = 5;

/// Failed steps tolerated before the agent gives up
pub const MAX_FAILURES: u32 = 25;

const QUERY_PLACEHOLDER: &str = "{query}";

const TASK_TEMPLATE: &str = "You are a meme generator expert. You are given a query and you need to generate a meme for it.
1. Go to https://imgflip.com/memetemplates
2. Click on the Search bar in the middle and search for ONLY ONE MAIN ACTION VERB (like 'bully', 'laugh', 'cry') in this query: '{query}'
3. Choose any meme template that metaphorically fits the meme topic: '{query}'
   by clicking on the 'Add Caption' button below it
4. Write a Top Text (setup/context) and Bottom Text (punchline/outcome) related to '{query}'.
5. Check the preview making sure it is funny and a meaningful meme. Adjust text directly if needed.
6. Look at the meme and text on it, if it doesnt make sense, PLEASE retry by filling the text boxes with different text.
7. Click on the Generate meme button to generate the meme
8. Copy the image link and give it as the output
";

static SHARE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://imgflip\.com/i/(\w+)").expect("share link pattern is valid")
});

/// Models the automation agent can reason with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSelector {
    OpenAi,
}

impl ModelSelector {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSelector::OpenAi => "OPEN_AI",
        }
    }

    pub fn model(&self) -> &'static str {
        match self {
            ModelSelector::OpenAi => "gpt-4o",
        }
    }

    /// Sampling temperature; the agent should be deterministic
    pub fn temperature(&self) -> f32 {
        0.0
    }

    pub fn provider_config(&self, credential: &Credential) -> ProviderConfig {
        match self {
            ModelSelector::OpenAi => ProviderConfig::openai(credential.expose()).with_model(self.model()),
        }
    }
}

impl FromStr for ModelSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "OPEN_AI" | "open_ai" | "openai" => Ok(ModelSelector::OpenAi),
            other => Err(Error::unsupported(format!("unsupported model selector '{}'", other))
                .with_operation("meme::model_selector")
                .with_context("supported", "OPEN_AI")),
        }
    }
}

impl fmt::Display for ModelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The agent's instructions for one query
pub fn build_task(query: &str) -> String {
    TASK_TEMPLATE.replace(QUERY_PLACEHOLDER, query)
}

/// Direct image URL for the first imgflip share link in `text`
pub fn extract_meme_url(text: &str) -> Option<String> {
    let token = SHARE_LINK.captures(text)?.get(1)?.as_str();
    Some(format!("https://i.imgflip.com/{}.jpg", token))
}

/// What a run produced
#[derive(Debug, Clone)]
pub struct MemeResult {
    pub url: Option<String>,
    pub history: AutomationHistory,
}

pub struct MemeWorkflow<A> {
    automation: A,
}

impl<A: BrowserAutomation> MemeWorkflow<A> {
    pub fn new(automation: A) -> Self {
        Self { automation }
    }

    pub fn automation(&self) -> &A {
        &self.automation
    }

    /// Run the agent once and pull the meme URL out of its final result.
    ///
    /// A run that finishes without a share link is `Ok` with no URL; only a
    /// failure to run the agent at all is an error.
    pub async fn generate(
        &self,
        query: &str,
        model: ModelSelector,
        credential: &Credential,
    ) -> Result<MemeResult> {
        if query.trim().is_empty() {
            return Err(Error::input_missing("meme query is empty").with_operation("meme::generate"));
        }

        let llm = AutomationLlm::from_config(&model.provider_config(credential), model.temperature());
        let task = AutomationTask::new(build_task(query), llm)
            .with_max_actions_per_step(MAX_ACTIONS_PER_STEP)
            .with_max_failures(MAX_FAILURES)
            .with_vision(true);

        tracing::info!(agent = self.automation.name(), model = %model, "generating meme");

        let history = self
            .automation
            .run(task)
            .await
            .map_err(|e| e.with_operation("meme::generate"))?;

        let url = history.final_result().and_then(extract_meme_url);
        match &url {
            Some(url) => tracing::info!(%url, "meme generated"),
            None => tracing::warn!(
                done = history.is_done(),
                failures = history.errors().count(),
                "no meme link in automation result"
            ),
        }

        Ok(MemeResult { url, history })
    }
}

/// One-shot helper: validate inputs, run, return the URL if any
pub async fn generate_meme<A: BrowserAutomation>(
    automation: A,
    query: &str,
    model_id: &str,
    api_key: &str,
) -> Result<Option<String>> {
    let model: ModelSelector = model_id.parse()?;
    let credential = Credential::new(api_key)?;
    let result = MemeWorkflow::new(automation).generate(query, model, &credential).await?;
    Ok(result.url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeAutomation;
    use solace_llm::ErrorKind;

    #[test]
    fn test_extract_meme_url() {
        assert_eq!(
            extract_meme_url("Done! https://imgflip.com/i/abc123 enjoy"),
            Some("https://i.imgflip.com/abc123.jpg".to_string())
        );
        assert_eq!(
            extract_meme_url("first https://imgflip.com/i/one then https://imgflip.com/i/two"),
            Some("https://i.imgflip.com/one.jpg".to_string())
        );
        assert_eq!(extract_meme_url("https://imgflip.com/i/9xk2pq."), Some("https://i.imgflip.com/9xk2pq.jpg".to_string()));
        assert_eq!(extract_meme_url("https://imgflip.com/memetemplates"), None);
        assert_eq!(extract_meme_url("http://imgflip.com/i/abc123"), None);
        assert_eq!(extract_meme_url(""), None);
    }

    #[test]
    fn test_model_selector() {
        assert_eq!("OPEN_AI".parse::<ModelSelector>().unwrap(), ModelSelector::OpenAi);
        assert_eq!("openai".parse::<ModelSelector>().unwrap(), ModelSelector::OpenAi);

        let err = "GEMINI".parse::<ModelSelector>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn test_build_task() {
        let task = build_task("cats judging dogs");
        assert!(task.starts_with("You are a meme generator expert."));
        assert_eq!(task.matches("'cats judging dogs'").count(), 3);
        assert!(task.contains("8. Copy the image link and give it as the output"));
        assert!(!task.contains(QUERY_PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_generate_sends_budgets() {
        let workflow = MemeWorkflow::new(FakeAutomation::finishing_with(Some(
            "The meme is ready: https://imgflip.com/i/abc123",
        )));
        let credential = Credential::new("sk-test").unwrap();

        let result = workflow
            .generate("cats judging dogs", ModelSelector::OpenAi, &credential)
            .await
            .unwrap();
        assert_eq!(result.url.as_deref(), Some("https://i.imgflip.com/abc123.jpg"));

        let tasks = workflow.automation().tasks();
        assert_eq!(tasks.len(), 1);
        let task = &tasks[0];
        assert_eq!(task.max_actions_per_step, 5);
        assert_eq!(task.max_failures, 25);
        assert!(task.use_vision);
        assert_eq!(task.llm.model, "gpt-4o");
        assert_eq!(task.llm.provider, "openai");
        assert_eq!(task.llm.api_key, "sk-test");
        assert_eq!(task.llm.temperature, 0.0);
    }

    #[tokio::test]
    async fn test_no_link_is_not_an_error() {
        let url = generate_meme(
            FakeAutomation::finishing_with(Some("I could not finish the meme")),
            "query",
            "OPEN_AI",
            "sk-test",
        )
        .await
        .unwrap();
        assert_eq!(url, None);

        let url = generate_meme(FakeAutomation::finishing_with(None), "query", "OPEN_AI", "sk-test")
            .await
            .unwrap();
        assert_eq!(url, None);
    }

    #[tokio::test]
    async fn test_rejects_before_running() {
        let automation = FakeAutomation::finishing_with(Some("https://imgflip.com/i/abc123"));
        let err = generate_meme(automation, "query", "CLAUDE", "sk-test").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);

        let err = generate_meme(FakeAutomation::finishing_with(None), "query", "OPEN_AI", " ")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CredentialMissing);
    }

    #[tokio::test]
    async fn test_automation_failure_propagates() {
        let workflow = MemeWorkflow::new(FakeAutomation::failing(Error::automation_failed("browser crashed")));
        let credential = Credential::new("sk-test").unwrap();

        let err = workflow
            .generate("query", ModelSelector::OpenAi, &credential)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AutomationFailed);
    }
}

//! Persona backend selection shared by `serve` and `support`

use solace_agent::{
    connect_gemini, connect_openai, Credential, PersonaCatalog, PersonaSet, StagingMode,
    SupportReport, SupportRequest, SupportWorkflow,
};
use solace_llm::{Error, ErrorKind, LlmProvider};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PersonaBackend {
    #[default]
    Gemini,
    Openai,
}

/// Which stage of a support run failed
#[derive(Debug)]
pub enum SupportError {
    /// The persona set could not be built
    Gate(Error),
    /// Input validation or one of the persona calls
    Analysis(Error),
}

impl SupportError {
    pub fn error(&self) -> &Error {
        match self {
            SupportError::Gate(e) | SupportError::Analysis(e) => e,
        }
    }
}

impl std::fmt::Display for SupportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupportError::Gate(e) => write!(f, "failed to initialize personas: {}", e),
            SupportError::Analysis(e) => write!(f, "support analysis failed: {}", e),
        }
    }
}

impl std::error::Error for SupportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.error())
    }
}

/// Everything a support run needs besides the credential and the request
#[derive(Debug, Clone)]
pub struct SupportSettings {
    pub backend: PersonaBackend,
    pub provider_url: Option<String>,
    pub catalog: Arc<PersonaCatalog>,
    pub staging_mode: StagingMode,
}

impl SupportSettings {
    pub fn new(catalog: PersonaCatalog) -> Self {
        Self {
            backend: PersonaBackend::default(),
            provider_url: None,
            catalog: Arc::new(catalog),
            staging_mode: StagingMode::default(),
        }
    }

    pub fn with_backend(mut self, backend: PersonaBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_provider_url(mut self, url: Option<String>) -> Self {
        self.provider_url = url;
        self
    }

    pub fn with_staging_mode(mut self, mode: StagingMode) -> Self {
        self.staging_mode = mode;
        self
    }

    /// Build the persona set for `credential` and run the request through it
    pub async fn run(
        &self,
        credential: &Credential,
        request: &SupportRequest,
    ) -> Result<SupportReport, SupportError> {
        let url = self.provider_url.as_deref();
        match self.backend {
            PersonaBackend::Gemini => {
                let personas = PersonaSet::build(credential, &self.catalog, |c| connect_gemini(c, url))
                    .map_err(SupportError::Gate)?;
                self.analyze(&personas, request).await
            }
            PersonaBackend::Openai => {
                let personas = PersonaSet::build(credential, &self.catalog, |c| connect_openai(c, url))
                    .map_err(SupportError::Gate)?;
                self.analyze(&personas, request).await
            }
        }
    }

    async fn analyze<P: LlmProvider>(
        &self,
        personas: &PersonaSet<P>,
        request: &SupportRequest,
    ) -> Result<SupportReport, SupportError> {
        SupportWorkflow::new(personas)
            .with_staging_mode(self.staging_mode)
            .run(request)
            .await
            .map_err(classify)
    }
}

/// A key the provider rejects on the first call is a gate failure, not an analysis one
fn classify(err: Error) -> SupportError {
    let rejected_key = err.kind() == ErrorKind::AuthenticationFailed
        || err.context_value("cause") == Some(ErrorKind::AuthenticationFailed.as_str());
    if rejected_key {
        SupportError::Gate(err)
    } else {
        SupportError::Analysis(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_request_fails_after_gate() {
        let settings = SupportSettings::new(PersonaCatalog::builtin())
            .with_provider_url(Some("http://127.0.0.1:9".into()));
        let credential = Credential::new("key").unwrap();

        for backend in [PersonaBackend::Gemini, PersonaBackend::Openai] {
            let err = settings
                .clone()
                .with_backend(backend)
                .run(&credential, &SupportRequest::default())
                .await
                .unwrap_err();
            assert!(matches!(err, SupportError::Analysis(_)));
            assert_eq!(err.error().kind(), ErrorKind::InputMissing);
        }
    }

    #[test]
    fn test_rejected_key_is_a_gate_failure() {
        let rejected = Error::persona_failed("Therapist Agent", "API key rejected")
            .with_context("cause", ErrorKind::AuthenticationFailed.as_str());
        assert!(matches!(classify(rejected), SupportError::Gate(_)));

        let flaky = Error::persona_failed("Therapist Agent", "provider unreachable")
            .with_context("cause", ErrorKind::NetworkFailed.as_str());
        assert!(matches!(classify(flaky), SupportError::Analysis(_)));
    }
}

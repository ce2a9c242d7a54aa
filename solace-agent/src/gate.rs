//! Credential gate - nothing runs without a key
//!
//! A `Credential` can only be built from a non-empty string, so an empty key
//! is rejected before any provider exists and before any network call. A
//! `PersonaSet` is either complete (all four personas bound to one provider)
//! or not built at all.

use crate::persona::{Persona, PersonaCatalog};
use solace_llm::{
    Error, GeminiProvider, LlmProvider, OpenAIProvider, ProviderConfig, Result,
};
use std::fmt;

/// A caller-supplied API key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Result<Self> {
        let secret = secret.into();
        let trimmed = secret.trim();
        if trimmed.is_empty() {
            return Err(Error::credential_missing("API key").with_operation("gate::credential"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<redacted>)")
    }
}

/// Build a Gemini provider bound to the credential
pub fn connect_gemini(credential: &Credential, base_url: Option<&str>) -> Result<GeminiProvider> {
    let mut config = ProviderConfig::gemini(credential.expose());
    if let Some(url) = base_url {
        config = config.with_base_url(url);
    }
    GeminiProvider::new(config).map_err(|e| Error::from(e).with_operation("gate::connect_gemini"))
}

/// Build an OpenAI provider bound to the credential
pub fn connect_openai(credential: &Credential, base_url: Option<&str>) -> Result<OpenAIProvider> {
    let mut config = ProviderConfig::openai(credential.expose());
    if let Some(url) = base_url {
        config = config.with_base_url(url);
    }
    OpenAIProvider::new(config).map_err(|e| Error::from(e).with_operation("gate::connect_openai"))
}

/// The four support personas bound to one provider
pub struct PersonaSet<P> {
    provider: P,
    personas: Vec<Persona>,
}

impl<P: LlmProvider> PersonaSet<P> {
    /// Build every persona or none.
    ///
    /// `connect` turns the credential into a provider; its error is returned
    /// as-is so callers can tell a rejected key from a broken catalog.
    pub fn build<F>(credential: &Credential, catalog: &PersonaCatalog, connect: F) -> Result<Self>
    where
        F: FnOnce(&Credential) -> Result<P>,
    {
        catalog
            .validate()
            .map_err(|e| e.with_operation("gate::build"))?;

        let provider = connect(credential)?;

        tracing::debug!(
            provider = provider.name(),
            model = provider.default_model(),
            catalog_version = catalog.version(),
            "persona set ready"
        );

        Ok(Self {
            provider,
            personas: catalog.personas().to_vec(),
        })
    }

    /// Validate a raw key, then build
    pub fn from_raw_key<F>(raw_key: &str, catalog: &PersonaCatalog, connect: F) -> Result<Self>
    where
        F: FnOnce(&Credential) -> Result<P>,
    {
        let credential = Credential::new(raw_key)?;
        Self::build(&credential, catalog, connect)
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Personas in invocation order
    pub fn personas(&self) -> &[Persona] {
        &self.personas
    }
}

//! Connection settings shared by every provider

/// Which wire protocol a config talks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Gemini,
    OpenAI,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Gemini => "gemini",
            ProviderType::OpenAI => "openai",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderType::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            ProviderType::OpenAI => "https://api.openai.com/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderType::Gemini => "gemini-2.0-flash-exp",
            ProviderType::OpenAI => "gpt-4o",
        }
    }
}

/// Key, endpoint, model and timeout for one provider.
///
/// `Debug` never prints the key.
#[derive(Clone)]
pub struct ProviderConfig {
    pub provider_type: ProviderType,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub default_model: Option<String>,
    pub timeout_secs: u64,
}

impl ProviderConfig {
    const DEFAULT_TIMEOUT_SECS: u64 = 120;

    pub fn new(provider_type: ProviderType, api_key: impl Into<String>) -> Self {
        Self {
            provider_type,
            api_key: Some(api_key.into()),
            base_url: None,
            default_model: None,
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self::new(ProviderType::Gemini, api_key)
    }

    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new(ProviderType::OpenAI, api_key)
    }

    pub fn with_model(self, model: impl Into<String>) -> Self {
        Self { default_model: Some(model.into()), ..self }
    }

    pub fn with_base_url(self, base_url: impl Into<String>) -> Self {
        Self { base_url: Some(base_url.into()), ..self }
    }

    pub fn with_timeout(self, timeout_secs: u64) -> Self {
        Self { timeout_secs, ..self }
    }

    /// The key, unless missing or blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Endpoint root without a trailing slash
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(self.provider_type.default_base_url())
            .trim_end_matches('/')
    }

    pub fn model(&self) -> &str {
        self.default_model
            .as_deref()
            .unwrap_or(self.provider_type.default_model())
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider_type.as_str())
            .field("api_key", &self.api_key().map(|_| "<redacted>"))
            .field("base_url", &self.base_url())
            .field("model", &self.model())
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_provider_type() {
        let config = ProviderConfig::gemini("AIza-test");
        assert_eq!(config.model(), "gemini-2.0-flash-exp");
        assert_eq!(config.base_url(), "https://generativelanguage.googleapis.com/v1beta");
        assert_eq!(config.timeout_secs, 120);

        let config = ProviderConfig::openai("sk-test").with_model("gpt-4o-mini").with_timeout(30);
        assert_eq!(config.provider_type, ProviderType::OpenAI);
        assert_eq!(config.model(), "gpt-4o-mini");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_base_url_override_is_trimmed() {
        let config = ProviderConfig::openai("sk").with_base_url("http://127.0.0.1:8080/v1/");
        assert_eq!(config.base_url(), "http://127.0.0.1:8080/v1");
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        assert_eq!(ProviderConfig::openai("sk-test").api_key(), Some("sk-test"));
        assert_eq!(ProviderConfig::openai("   ").api_key(), None);
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", ProviderConfig::gemini("AIza-super-secret"));
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}

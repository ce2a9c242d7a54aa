//! Gemini `generateContent` client
//!
//! System messages become `systemInstruction`; images ride along as
//! `inlineData` parts of the user turn.

use super::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub struct GeminiProvider {
    client: Client,
    config: ProviderConfig,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        if config.api_key().is_none() {
            return Err(ProviderError::InvalidRequest("Gemini API key is required".into()));
        }
        let client = build_client(&config)?;

        Ok(Self { client, config })
    }

    fn build_request(&self, request: &CompletionRequest) -> GeminiRequest {
        let system_instruction = request.system_text().map(|text| GeminiContent {
            role: None,
            parts: vec![GeminiPart::Text { text: text.to_string() }],
        });

        let contents = request
            .turns()
            .map(|m| {
                let mut parts = Vec::with_capacity(m.images.len() + 1);
                if !m.content.is_empty() {
                    parts.push(GeminiPart::Text { text: m.content.clone() });
                }
                for image in &m.images {
                    parts.push(GeminiPart::InlineData {
                        inline_data: GeminiBlob {
                            mime_type: image.mime_type.clone(),
                            data: image.data.clone(),
                        },
                    });
                }
                GeminiContent {
                    role: Some(match m.role {
                        Role::Assistant => "model".into(),
                        _ => "user".into(),
                    }),
                    parts,
                }
            })
            .collect();

        let generation_config = (request.temperature.is_some() || request.max_tokens.is_some())
            .then(|| GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            });

        GeminiRequest {
            system_instruction,
            contents,
            generation_config,
        }
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        self.config.model()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let model = request.model.as_deref().unwrap_or(self.default_model()).to_string();
        let api_request = self.build_request(&request);
        let api_key = self.config.api_key().ok_or(ProviderError::AuthenticationFailed)?;

        tracing::debug!(
            model = %model,
            turns = api_request.contents.len(),
            "gemini generateContent"
        );

        let endpoint = format!("{}/models/{}:generateContent", self.config.base_url(), model);
        let response = send(
            self.client
                .post(endpoint)
                .header("x-goog-api-key", api_key)
                .json(&api_request),
        )
        .await?;

        let api_response: GeminiResponse = response.json().await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        if let Some(feedback) = &api_response.prompt_feedback {
            if let Some(reason) = &feedback.block_reason {
                return Err(ProviderError::Other(format!("prompt blocked: {}", reason)));
            }
        }

        let candidate = api_response.candidates.first()
            .ok_or_else(|| ProviderError::Other("gemini returned no candidates".into()))?;

        let text: String = candidate
            .content
            .as_ref()
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| match p {
                        GeminiPart::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let finish_reason = match candidate.finish_reason.as_deref() {
            Some("STOP") => FinishReason::Stop,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("RECITATION") | Some("BLOCKLIST") => FinishReason::ContentFilter,
            _ => FinishReason::Unknown,
        };

        let usage = api_response
            .usage_metadata
            .map(|u| Usage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            id: api_response.response_id.unwrap_or_default(),
            model: api_response.model_version.unwrap_or(model),
            content: if text.is_empty() { None } else { Some(text) },
            finish_reason,
            usage,
        })
    }
}

// generateContent wire types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiBlob,
    },
    /// Function calls, thoughts and anything else we never ask for
    Other(serde_json::Value),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiBlob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
    prompt_feedback: Option<GeminiPromptFeedback>,
    model_version: Option<String>,
    response_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
    #[serde(default)]
    total_token_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

//! Text-generation backend client
//!
//! One HTTP call: prompt in, generated text out. Failures are surfaced to
//! the caller exactly as the backend reported them (status plus body) — the
//! user needs the verbatim upstream message to self-diagnose an invalid
//! credential or an exhausted quota. No automatic retries.

use crate::config::GenerationSettings;
use crate::{GitGlossError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Generation calls carry large prompts and can stream slowly
const GENERATE_TIMEOUT: Duration = Duration::from_secs(60);

/// Generation API client
pub struct GenerationClient {
    client: reqwest::Client,
    settings: GenerationSettings,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerationClient {
    pub fn new(settings: GenerationSettings, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(GENERATE_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            settings,
            api_key,
        })
    }

    /// Swap the credential (called on an explicit update notification)
    pub fn set_api_key(&mut self, api_key: Option<String>) {
        self.api_key = api_key;
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Generate text for a prompt.
    ///
    /// Fails fast with [`GitGlossError::MissingCredential`] before any I/O
    /// when no key is configured; any non-success response becomes
    /// [`GitGlossError::Upstream`] with the body preserved verbatim.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(GitGlossError::MissingCredential)?;

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.settings.endpoint, self.settings.model, api_key
        );

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.settings.max_output_tokens,
                temperature: self.settings.temperature,
            },
        };

        debug!(
            model = %self.settings.model,
            prompt_bytes = prompt.len(),
            "Calling generation backend"
        );

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GitGlossError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let data: GenerateResponse = response.json().await?;
        data.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .map(|p| p.text.clone())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                GitGlossError::Other("Generation backend returned no text".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_credential_fails_fast() {
        let client = GenerationClient::new(GenerationSettings::default(), None).unwrap();
        let err = client.generate("explain this").await.unwrap_err();
        assert!(matches!(err, GitGlossError::MissingCredential));

        let blank = GenerationClient::new(GenerationSettings::default(), Some(String::new()))
            .unwrap();
        let err = blank.generate("explain this").await.unwrap_err();
        assert!(matches!(err, GitGlossError::MissingCredential));
    }

    #[test]
    fn test_request_serialization_uses_api_field_names() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: "hi".to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: 4096,
                temperature: 0.7,
            },
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("generationConfig"));
        assert!(json.contains("maxOutputTokens"));
    }

    #[test]
    fn test_response_text_extraction() {
        let json = r#"{"candidates":[{"content":{"parts":[{"text":"an explanation"}]}}]}"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        let text = response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .map(|p| p.text.as_str());
        assert_eq!(text, Some("an explanation"));
    }

    #[test]
    fn test_empty_response_parses() {
        let response: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(response.candidates.is_empty());
    }
}

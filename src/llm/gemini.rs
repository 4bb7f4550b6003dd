//! Gemini API client.
//!
//! This module provides a client for the Gemini `generateContent` REST
//! endpoint, the sole network boundary of the test harness.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::error::LlmError;

/// Default base URL for the Gemini API.
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default request timeout. A timed-out call surfaces as an ordinary
/// request failure, never an abort.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Request for text generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model identifier to use for generation.
    pub model: String,
    /// Fully rendered prompt text.
    pub prompt: String,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Hard cap on output tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl GenerationRequest {
    /// Creates a new generation request with default sampling parameters.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: None,
            max_output_tokens: None,
        }
    }

    /// Sets the temperature for this request.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the output-token cap for this request.
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }
}

/// Response from a generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Generated text.
    pub text: String,
}

/// Trait for providers that can generate text.
#[async_trait]
pub trait GenerateText: Send + Sync {
    /// Generate a response for the given request.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError>;
}

/// Client for the Gemini REST API.
pub struct GeminiClient {
    /// Base URL for the API.
    api_base: String,
    /// API key for authentication.
    api_key: String,
    /// HTTP client for making API requests.
    http_client: Client,
}

impl GeminiClient {
    /// Creates a new client with an explicit API key.
    ///
    /// Returns [`LlmError::MissingApiKey`] eagerly when the key is empty,
    /// before any network attempt.
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_timeout(api_key, DEFAULT_TIMEOUT)
    }

    /// Creates a new client with an explicit API key and request timeout.
    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }
        Ok(Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key,
            http_client: Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| LlmError::RequestFailed(e.to_string()))?,
        })
    }

    /// Creates a new client from the `GEMINI_API_KEY` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::MissingApiKey`] if the variable is not set.
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key = env::var("GEMINI_API_KEY").map_err(|_| LlmError::MissingApiKey)?;
        Self::new(api_key)
    }

    /// Creates a client from an explicit key, falling back to the
    /// `GEMINI_API_KEY` environment variable when none is given.
    pub fn from_key_or_env(api_key: Option<String>) -> Result<Self, LlmError> {
        match api_key {
            Some(key) => Self::new(key),
            None => Self::from_env(),
        }
    }

    /// Overrides the API base URL. Useful for pointing tests at a stub
    /// server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Gets the API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

/// Internal request structure for the generateContent API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest {
    contents: Vec<ApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<ApiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiContent {
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// Internal response structure from the generateContent API.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
}

#[derive(Debug, Deserialize)]
struct ApiCandidate {
    content: Option<ApiContent>,
}

/// Error response from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)] // Fields kept for complete API error deserialization
struct ApiErrorDetail {
    message: String,
    code: Option<u16>,
    status: Option<String>,
}

#[async_trait]
impl GenerateText for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let generation_config =
            if request.temperature.is_some() || request.max_output_tokens.is_some() {
                Some(ApiGenerationConfig {
                    temperature: request.temperature,
                    max_output_tokens: request.max_output_tokens,
                })
            } else {
                None
            };

        let api_request = ApiRequest {
            contents: vec![ApiContent {
                parts: vec![ApiPart {
                    text: request.prompt,
                }],
            }],
            generation_config,
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.api_base, request.model
        );

        let http_response = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = http_response.status();

        if !status.is_success() {
            let status_code = status.as_u16();

            let error_text = http_response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());

            // Try to parse as structured error
            if let Ok(error_response) = serde_json::from_str::<ApiErrorResponse>(&error_text) {
                if status_code == 429 {
                    return Err(LlmError::RateLimited(error_response.error.message));
                }

                return Err(LlmError::ApiError {
                    code: status_code,
                    message: error_response.error.message,
                });
            }

            // Fall back to raw error text
            return Err(LlmError::ApiError {
                code: status_code,
                message: error_text,
            });
        }

        let api_response: ApiResponse = http_response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(format!("Failed to parse API response: {}", e)))?;

        let text = api_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .ok_or(LlmError::EmptyResponse)?;

        Ok(GenerationResponse { text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_rejected_eagerly() {
        let result = GeminiClient::new("");
        assert!(matches!(result, Err(LlmError::MissingApiKey)));
    }

    #[test]
    fn test_request_builders() {
        let request = GenerationRequest::new("gemini-2.5-flash-lite", "Say hi")
            .with_temperature(0.2)
            .with_max_output_tokens(64);

        assert_eq!(request.model, "gemini-2.5-flash-lite");
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_output_tokens, Some(64));
    }

    #[test]
    fn test_api_request_serialization_omits_unset_config() {
        let api_request = ApiRequest {
            contents: vec![ApiContent {
                parts: vec![ApiPart {
                    text: "hello".to_string(),
                }],
            }],
            generation_config: None,
        };

        let json = serde_json::to_value(&api_request).expect("serialize");
        assert!(json.get("generationConfig").is_none());
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_api_response_text_extraction_shape() {
        let body = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "Hello "}, {"text": "world"}]}}
            ]
        }"#;
        let response: ApiResponse = serde_json::from_str(body).expect("parse");
        let text: String = response.candidates[0]
            .content
            .as_ref()
            .expect("content present")
            .parts
            .iter()
            .map(|p| p.text.clone())
            .collect();
        assert_eq!(text, "Hello world");
    }
}

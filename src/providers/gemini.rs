//! Google Gemini adapter (Generative Language `generateContent` REST API).
//!
//! One request carries the instruction text followed by the page as inline
//! base64 data. The key travels in the `x-goog-api-key` header rather than the
//! query string so it never shows up in logged URLs.

use super::{http_client, status_error, transport_error};
use crate::error::{PipelineError, ProviderError};
use crate::ledger::TokenUsage;
use crate::pipeline::encode::ModelRequest;
use crate::pipeline::llm::{ModelClient, ModelResponse, ProviderSettings};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const PROVIDER: &str = "gemini";

/// [`ModelClient`] for Google Gemini.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    settings: ProviderSettings,
    timeout: Duration,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart<'a> {
    Text { text: &'a str },
    InlineData { inline_data: GeminiInlineData<'a> },
}

#[derive(Debug, Serialize)]
struct GeminiInlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GeminiUsage>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiUsage {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u64,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u64,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        settings: ProviderSettings,
        timeout: Duration,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            client: http_client(PROVIDER, timeout)?,
            api_key: api_key.into(),
            settings,
            timeout,
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    /// Point the client at a different endpoint root (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.settings.model
        )
    }
}

fn build_body<'a>(request: &'a ModelRequest, settings: &ProviderSettings) -> GeminiRequest<'a> {
    GeminiRequest {
        contents: vec![GeminiContent {
            role: "user",
            parts: vec![
                GeminiPart::Text {
                    text: &request.instruction,
                },
                GeminiPart::InlineData {
                    inline_data: GeminiInlineData {
                        mime_type: request.image.mime_type,
                        data: &request.image.base64,
                    },
                },
            ],
        }],
        generation_config: GeminiGenerationConfig {
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
        },
    }
}

/// Decode a 2xx body. Text is every part of the first candidate, joined.
fn parse_response(body: &str) -> Result<ModelResponse, ProviderError> {
    let response: GeminiResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed {
            provider: PROVIDER.into(),
            detail: format!("undecodable body: {e}"),
        })?;

    if let Some(error) = response.error {
        return Err(ProviderError::Api {
            provider: PROVIDER.into(),
            status: None,
            detail: error.message,
        });
    }

    let candidate = response
        .candidates
        .and_then(|c| c.into_iter().next())
        .ok_or_else(|| ProviderError::Malformed {
            provider: PROVIDER.into(),
            detail: "response has no candidates".into(),
        })?;

    let text = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
        .unwrap_or_default();

    let usage = response.usage_metadata.unwrap_or_default();

    Ok(ModelResponse {
        text,
        usage: TokenUsage::new(usage.prompt_token_count, usage.candidates_token_count),
    })
}

#[async_trait]
impl ModelClient for GeminiClient {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn send(&self, request: &ModelRequest) -> Result<ModelResponse, ProviderError> {
        let body = build_body(request, &self.settings);
        debug!(
            "Gemini request for '{}' page {} ({})",
            request.document, request.page, self.settings.model
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, self.timeout, e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(PROVIDER, self.timeout, e))?;

        if !status.is_success() {
            return Err(status_error(PROVIDER, status, &headers, &text));
        }

        parse_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::encode::EncodedImage;
    use std::sync::Arc;

    fn settings(temperature: Option<f32>) -> ProviderSettings {
        ProviderSettings {
            model: "gemini-2.5-flash".into(),
            temperature,
            max_output_tokens: 8192,
        }
    }

    fn request() -> ModelRequest {
        ModelRequest {
            document: "doc".into(),
            page: 1,
            instruction: Arc::from("Extrahiere Entitäten."),
            image: EncodedImage {
                mime_type: "image/png",
                base64: "iVBORw0KGgo=".into(),
            },
        }
    }

    #[test]
    fn body_has_text_then_inline_image() {
        let req = request();
        let json = serde_json::to_value(build_body(&req, &settings(None))).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "Extrahiere Entitäten.");
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(parts[1]["inline_data"]["data"], "iVBORw0KGgo=");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 8192);
        assert!(json["generationConfig"].get("temperature").is_none());
    }

    #[test]
    fn body_carries_temperature_when_set() {
        let req = request();
        let json = serde_json::to_value(build_body(&req, &settings(Some(0.5)))).unwrap();
        assert_eq!(json["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn parses_text_and_usage() {
        let body = r#"{
            "candidates": [{"content": {"parts": [{"text": "Zeile 1\n"}, {"text": "Zeile 2"}], "role": "model"}}],
            "usageMetadata": {"promptTokenCount": 1290, "candidatesTokenCount": 312, "totalTokenCount": 1602}
        }"#;
        let response = parse_response(body).unwrap();
        assert_eq!(response.text, "Zeile 1\nZeile 2");
        assert_eq!(response.usage, TokenUsage::new(1290, 312));
    }

    #[test]
    fn missing_usage_defaults_to_zero() {
        let body = r#"{"candidates": [{"content": {"parts": [{"text": "x"}]}}]}"#;
        assert_eq!(parse_response(body).unwrap().usage, TokenUsage::default());
    }

    #[test]
    fn candidate_without_content_is_empty_text() {
        let body = r#"{"candidates": [{"finishReason": "SAFETY"}], "usageMetadata": {"promptTokenCount": 10}}"#;
        let response = parse_response(body).unwrap();
        assert_eq!(response.text, "");
        assert_eq!(response.usage, TokenUsage::new(10, 0));
    }

    #[test]
    fn no_candidates_is_malformed() {
        let err = parse_response(r#"{"candidates": []}"#).unwrap_err();
        assert!(matches!(err, ProviderError::Malformed { .. }), "got: {err:?}");
    }

    #[test]
    fn garbage_body_is_malformed() {
        let err = parse_response("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, ProviderError::Malformed { .. }));
    }

    #[test]
    fn embedded_error_is_api_error() {
        let err = parse_response(r#"{"error": {"code": 400, "message": "Invalid image"}}"#)
            .unwrap_err();
        assert!(matches!(err, ProviderError::Api { ref detail, .. } if detail == "Invalid image"));
    }

    #[test]
    fn endpoint_includes_model() {
        let client = GeminiClient::new("k", settings(None), Duration::from_secs(5))
            .unwrap()
            .with_base_url("http://localhost:9/v1beta/models/");
        assert_eq!(
            client.endpoint(),
            "http://localhost:9/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}

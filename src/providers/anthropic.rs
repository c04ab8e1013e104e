//! Anthropic adapter (Messages API).
//!
//! A single user turn holds the instruction text block followed by the page
//! as a base64 image block. The reply's text blocks are concatenated.

use super::{http_client, status_error, transport_error};
use crate::error::{PipelineError, ProviderError};
use crate::ledger::TokenUsage;
use crate::pipeline::encode::ModelRequest;
use crate::pipeline::llm::{ModelClient, ModelResponse, ProviderSettings};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const PROVIDER: &str = "anthropic";

/// [`ModelClient`] for Anthropic Claude models.
pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: String,
    settings: ProviderSettings,
    timeout: Duration,
    url: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: Vec<AnthropicContent<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContent<'a> {
    Text { text: &'a str },
    Image { source: ImageSource<'a> },
}

#[derive(Debug, Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    source_type: &'static str,
    media_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ResponseBlock>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

impl AnthropicClient {
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
            url: ANTHROPIC_API_URL.to_string(),
        })
    }

    /// Point the client at a different messages endpoint (proxies, tests).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    fn headers(&self) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key).map_err(|_| ProviderError::Auth {
                provider: PROVIDER.into(),
                detail: "API key contains characters not allowed in a header".into(),
            })?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        Ok(headers)
    }
}

fn build_body<'a>(
    request: &'a ModelRequest,
    settings: &'a ProviderSettings,
) -> AnthropicRequest<'a> {
    AnthropicRequest {
        model: &settings.model,
        max_tokens: settings.max_output_tokens,
        temperature: settings.temperature,
        messages: vec![AnthropicMessage {
            role: "user",
            content: vec![
                AnthropicContent::Text {
                    text: &request.instruction,
                },
                AnthropicContent::Image {
                    source: ImageSource {
                        source_type: "base64",
                        media_type: request.image.mime_type,
                        data: &request.image.base64,
                    },
                },
            ],
        }],
    }
}

fn parse_response(body: &str) -> Result<ModelResponse, ProviderError> {
    let response: AnthropicResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed {
            provider: PROVIDER.into(),
            detail: format!("undecodable body: {e}"),
        })?;

    let text = response
        .content
        .into_iter()
        .filter(|b| b.block_type == "text")
        .filter_map(|b| b.text)
        .collect::<String>();
    let usage = response.usage.unwrap_or_default();

    Ok(ModelResponse {
        text,
        usage: TokenUsage::new(usage.input_tokens, usage.output_tokens),
    })
}

#[async_trait]
impl ModelClient for AnthropicClient {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn send(&self, request: &ModelRequest) -> Result<ModelResponse, ProviderError> {
        let body = build_body(request, &self.settings);
        debug!(
            "Anthropic request for '{}' page {} ({})",
            request.document, request.page, self.settings.model
        );

        let response = self
            .client
            .post(&self.url)
            .headers(self.headers()?)
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

    fn settings() -> ProviderSettings {
        ProviderSettings {
            model: "claude-sonnet-4-5-20250929".into(),
            temperature: Some(0.5),
            max_output_tokens: 8192,
        }
    }

    #[test]
    fn body_matches_messages_api_shape() {
        let req = ModelRequest {
            document: "doc".into(),
            page: 2,
            instruction: Arc::from("Transkribiere."),
            image: EncodedImage {
                mime_type: "image/png",
                base64: "AAAA".into(),
            },
        };
        let s = settings();
        let json = serde_json::to_value(build_body(&req, &s)).unwrap();
        assert_eq!(json["model"], "claude-sonnet-4-5-20250929");
        assert_eq!(json["max_tokens"], 8192);
        assert_eq!(json["temperature"], 0.5);
        let content = &json["messages"][0]["content"];
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[0]["text"], "Transkribiere.");
        assert_eq!(content[1]["type"], "image");
        assert_eq!(content[1]["source"]["type"], "base64");
        assert_eq!(content[1]["source"]["media_type"], "image/png");
        assert_eq!(content[1]["source"]["data"], "AAAA");
    }

    #[test]
    fn concatenates_text_blocks_and_reads_usage() {
        let body = r#"{
            "id": "msg_01", "type": "message", "role": "assistant",
            "content": [
                {"type": "text", "text": "Erste Hälfte. "},
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "Zweite Hälfte."}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 1600, "output_tokens": 420}
        }"#;
        let response = parse_response(body).unwrap();
        assert_eq!(response.text, "Erste Hälfte. Zweite Hälfte.");
        assert_eq!(response.usage, TokenUsage::new(1600, 420));
    }

    #[test]
    fn empty_content_is_empty_text() {
        let response = parse_response(r#"{"content": []}"#).unwrap();
        assert_eq!(response.text, "");
        assert_eq!(response.usage, TokenUsage::default());
    }

    #[test]
    fn body_without_content_is_malformed() {
        let err = parse_response(r#"{"type": "error"}"#).unwrap_err();
        assert!(matches!(err, ProviderError::Malformed { .. }));
    }

    #[test]
    fn invalid_header_key_is_auth_error() {
        let client = AnthropicClient::new("bad\nkey", settings(), Duration::from_secs(5)).unwrap();
        assert!(matches!(client.headers(), Err(ProviderError::Auth { .. })));
    }
}

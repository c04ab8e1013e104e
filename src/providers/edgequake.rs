//! Adapter for every provider `edgequake-llm` knows (openai, azure, mistral,
//! ollama, ...).
//!
//! The factory reads the provider's own key variables (`OPENAI_API_KEY` and
//! friends), so no credential resolution happens here. The instruction goes
//! in the user turn next to the image; there is no system message.

use crate::error::{PipelineError, ProviderError};
use crate::ledger::TokenUsage;
use crate::pipeline::encode::ModelRequest;
use crate::pipeline::llm::{ModelClient, ModelResponse, ProviderSettings};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::debug;

/// [`ModelClient`] over an `edgequake-llm` provider.
pub struct LlmProviderClient {
    name: String,
    provider: Arc<dyn LLMProvider>,
    settings: ProviderSettings,
}

impl LlmProviderClient {
    /// Create the named provider through `ProviderFactory`.
    pub fn from_factory(name: &str, settings: ProviderSettings) -> Result<Self, PipelineError> {
        let provider =
            ProviderFactory::create_llm_provider(name, &settings.model).map_err(|e| {
                PipelineError::ProviderNotConfigured {
                    provider: name.to_string(),
                    hint: format!("{e}"),
                }
            })?;
        Ok(Self::with_provider(name, provider, settings))
    }

    /// Wrap a provider the caller already built.
    pub fn with_provider(
        name: impl Into<String>,
        provider: Arc<dyn LLMProvider>,
        settings: ProviderSettings,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            settings,
        }
    }
}

fn build_messages(request: &ModelRequest) -> Vec<ChatMessage> {
    let image = ImageData::new(request.image.base64.clone(), request.image.mime_type)
        .with_detail("high");
    vec![ChatMessage::user_with_images(
        request.instruction.to_string(),
        vec![image],
    )]
}

fn build_options(settings: &ProviderSettings) -> CompletionOptions {
    CompletionOptions {
        temperature: settings.temperature,
        max_tokens: Some(settings.max_output_tokens as usize),
        ..Default::default()
    }
}

#[async_trait]
impl ModelClient for LlmProviderClient {
    fn provider(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn send(&self, request: &ModelRequest) -> Result<ModelResponse, ProviderError> {
        let messages = build_messages(request);
        let options = build_options(&self.settings);
        debug!(
            "{} request for '{}' page {} ({})",
            self.name, request.document, request.page, self.settings.model
        );

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| ProviderError::Api {
                provider: self.name.clone(),
                status: None,
                detail: format!("{e}"),
            })?;

        Ok(ModelResponse {
            text: response.content,
            usage: TokenUsage::new(
                response.prompt_tokens as u64,
                response.completion_tokens as u64,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_follow_settings() {
        let opts = build_options(&ProviderSettings {
            model: "gpt-4.1-nano".into(),
            temperature: None,
            max_output_tokens: 8192,
        });
        assert_eq!(opts.temperature, None);
        assert_eq!(opts.max_tokens, Some(8192));
    }

    #[test]
    fn page_is_a_single_user_turn() {
        let request = ModelRequest {
            document: "doc".into(),
            page: 1,
            instruction: Arc::from("Transkribiere."),
            image: crate::pipeline::encode::EncodedImage {
                mime_type: "image/png",
                base64: "AAAA".into(),
            },
        };
        assert_eq!(build_messages(&request).len(), 1);
    }
}

//! Provider adapters behind [`ModelClient`].
//!
//! Gemini and Anthropic are called directly over `reqwest` so their usage
//! metadata and HTTP status codes map cleanly onto [`ProviderError`]. Every
//! other provider name goes through `edgequake-llm`'s `ProviderFactory`,
//! which reads its own environment variables.

pub mod anthropic;
pub mod edgequake;
pub mod gemini;

pub use anthropic::AnthropicClient;
pub use edgequake::LlmProviderClient;
pub use gemini::GeminiClient;

use crate::config::{PipelineConfig, ProviderKind};
use crate::error::{PipelineError, ProviderError};
use crate::pipeline::llm::{ModelClient, ProviderSettings};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

impl From<&PipelineConfig> for ProviderSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

/// Build the client for the configured provider.
///
/// Credentials come from `config.api_key` when set, otherwise from the
/// provider's environment variables in order.
pub fn build_client(config: &PipelineConfig) -> Result<Arc<dyn ModelClient>, PipelineError> {
    let settings = ProviderSettings::from(config);
    let timeout = Duration::from_secs(config.request_timeout_secs);

    let client: Arc<dyn ModelClient> = match &config.provider {
        ProviderKind::Gemini => {
            let key = resolve_credential(&config.provider, config.api_key.as_deref())?;
            Arc::new(GeminiClient::new(key, settings, timeout)?)
        }
        ProviderKind::Anthropic => {
            let key = resolve_credential(&config.provider, config.api_key.as_deref())?;
            Arc::new(AnthropicClient::new(key, settings, timeout)?)
        }
        ProviderKind::Factory(name) => Arc::new(LlmProviderClient::from_factory(name, settings)?),
    };

    info!("Using provider={} model={}", client.provider(), client.model());
    Ok(client)
}

fn resolve_credential(
    provider: &ProviderKind,
    explicit: Option<&str>,
) -> Result<String, PipelineError> {
    if let Some(key) = explicit.filter(|k| !k.trim().is_empty()) {
        return Ok(key.to_string());
    }
    let vars = provider.credential_vars();
    vars.iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.trim().is_empty())
        .ok_or_else(|| PipelineError::MissingCredential {
            provider: provider.name().to_string(),
            vars: vars.join(", "),
        })
}

/// HTTP client shared by the direct adapters.
fn http_client(provider: &str, timeout: Duration) -> Result<reqwest::Client, PipelineError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("pagescribe/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| PipelineError::ProviderNotConfigured {
            provider: provider.to_string(),
            hint: format!("HTTP client could not be built: {e}"),
        })
}

/// Map a transport error.
fn transport_error(provider: &str, timeout: Duration, err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout {
            provider: provider.to_string(),
            secs: timeout.as_secs(),
        }
    } else {
        ProviderError::Network {
            provider: provider.to_string(),
            detail: err.to_string(),
        }
    }
}

/// Map a non-success HTTP status.
fn status_error(
    provider: &str,
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
) -> ProviderError {
    let provider = provider.to_string();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Auth {
            provider,
            detail: format!("{status}: {}", truncate(body)),
        },
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited {
            provider,
            retry_after_secs: headers
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok()),
        },
        _ => ProviderError::Api {
            provider,
            status: Some(status.as_u16()),
            detail: truncate(body).to_string(),
        },
    }
}

/// Error bodies can be whole HTML pages; keep logs readable.
fn truncate(body: &str) -> &str {
    const MAX: usize = 500;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

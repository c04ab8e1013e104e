//! Model interaction: the provider-agnostic client seam and the bounded call.
//!
//! Every provider adapter in [`crate::providers`] implements [`ModelClient`];
//! the orchestrator only ever talks to `Arc<dyn ModelClient>`. Prompt text
//! lives in [`crate::prompts`] and arrives here already inside the
//! [`ModelRequest`].
//!
//! ## No retries
//!
//! A request is sent exactly once. Failures, including the timeout enforced
//! by [`request_page`], come back as [`ProviderError`] and the page is
//! skipped.

use crate::error::ProviderError;
use crate::ledger::TokenUsage;
use crate::pipeline::encode::ModelRequest;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// A successful model reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelResponse {
    /// Reply text; empty when the provider returned none.
    pub text: String,
    /// Zero when the provider omitted usage.
    pub usage: TokenUsage,
}

/// Per-run generation settings shared by every adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub model: String,
    /// `None` leaves the provider default in place.
    pub temperature: Option<f32>,
    pub max_output_tokens: u32,
}

/// Sends one page request to a vision-language model.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Short provider name used in logs and the summary.
    fn provider(&self) -> &str;

    fn model(&self) -> &str;

    async fn send(&self, request: &ModelRequest) -> Result<ModelResponse, ProviderError>;
}

/// Send `request` once, bounded by `limit`.
pub async fn request_page(
    client: &Arc<dyn ModelClient>,
    request: &ModelRequest,
    limit: Duration,
) -> Result<ModelResponse, ProviderError> {
    let start = Instant::now();

    let result = match timeout(limit, client.send(request)).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout {
            provider: client.provider().to_string(),
            secs: limit.as_secs(),
        }),
    };

    match &result {
        Ok(response) => debug!(
            "'{}' page {}: {} input tokens, {} output tokens, {:?}",
            request.document,
            request.page,
            response.usage.input_tokens,
            response.usage.output_tokens,
            start.elapsed()
        ),
        Err(e) => warn!(
            "'{}' page {}: request failed after {:?}: {}",
            request.document,
            request.page,
            start.elapsed(),
            e
        ),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::encode::EncodedImage;

    struct Sleepy(Duration);

    #[async_trait]
    impl ModelClient for Sleepy {
        fn provider(&self) -> &str {
            "sleepy"
        }
        fn model(&self) -> &str {
            "sleepy-1"
        }
        async fn send(&self, _request: &ModelRequest) -> Result<ModelResponse, ProviderError> {
            tokio::time::sleep(self.0).await;
            Ok(ModelResponse {
                text: "done".into(),
                usage: TokenUsage::new(3, 4),
            })
        }
    }

    fn request() -> ModelRequest {
        ModelRequest {
            document: "doc".into(),
            page: 1,
            instruction: Arc::from("x"),
            image: EncodedImage {
                mime_type: "image/png",
                base64: String::new(),
            },
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        let client: Arc<dyn ModelClient> = Arc::new(Sleepy(Duration::from_secs(900)));
        let err = request_page(&client, &request(), Duration::from_secs(600))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ProviderError::Timeout {
                provider: "sleepy".into(),
                secs: 600
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fast_provider_passes_through() {
        let client: Arc<dyn ModelClient> = Arc::new(Sleepy(Duration::from_millis(5)));
        let response = request_page(&client, &request(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(response.text, "done");
        assert_eq!(response.usage, TokenUsage::new(3, 4));
    }
}

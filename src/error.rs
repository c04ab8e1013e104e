//! Error types for the pagescribe library.
//!
//! Failures are split by the granularity at which the batch recovers:
//!
//! * [`PipelineError`]: **Fatal**: the batch cannot start at all (missing
//!   credential, unknown provider, unusable input or output directory,
//!   pdfium not loadable). Returned as `Err` from [`crate::batch::Batch::run`]
//!   before any page is processed.
//!
//! * [`ConversionError`]: **Per document**: the file could not be read or
//!   rasterised. The orchestrator logs it and moves on to the next document.
//!
//! * [`ProviderError`]: **Per page**: the model request failed. The page
//!   produces no artifact; sibling pages and later documents still run.
//!
//! * [`ParseError`]: **Per page, policy-driven**: the entity response was not
//!   valid JSON for the entity schema. What happens next is decided by
//!   [`crate::config::ParseFailurePolicy`].
//!
//! [`PageError`] wraps every per-page failure kind so page reports carry a
//! single error type.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that abort a batch before processing begins.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No credential was found for the selected provider.
    #[error("No API key for provider '{provider}'.\nSet one of: {vars}")]
    MissingCredential { provider: String, vars: String },

    /// The provider could not be constructed (unknown name, factory failure).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The input root does not exist or is not a directory.
    #[error("Input directory not found: '{path}'")]
    InputNotFound { path: PathBuf },

    /// Walking the input tree failed.
    #[error("Failed to scan input directory '{path}': {source}")]
    DiscoveryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output directory could not be created.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An instruction override file could not be read.
    #[error("Failed to read instruction file '{path}': {source}")]
    InstructionFileFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium on the system library path, or\n\
set PDFIUM_LIB_PATH=/path/to/dir/containing/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),
}

/// A document could not be turned into page images.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ConversionError {
    /// The file could not be read from disk.
    #[error("cannot read '{document}': {detail}")]
    Unreadable { document: String, detail: String },

    /// The file does not start with the `%PDF` magic bytes.
    #[error("'{document}' is not a PDF (first bytes: {magic:?})")]
    NotAPdf { document: String, magic: Vec<u8> },

    /// pdfium refused to open the document (corrupt, encrypted, truncated).
    #[error("'{document}' could not be opened: {detail}")]
    CorruptPdf { document: String, detail: String },

    /// A single page failed to render after the document opened.
    #[error("'{document}' page {page}: rasterisation failed: {detail}")]
    PageRender {
        document: String,
        page: usize,
        detail: String,
    },

    /// The rasteriser task stopped unexpectedly.
    #[error("rasteriser for '{document}' stopped: {detail}")]
    Interrupted { document: String, detail: String },
}

/// A model request failed. Covers every way a provider can let us down.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ProviderError {
    /// The request never reached the provider, or the connection dropped.
    #[error("{provider}: network error: {detail}")]
    Network { provider: String, detail: String },

    /// No response within the configured request timeout.
    #[error("{provider}: request timed out after {secs}s")]
    Timeout { provider: String, secs: u64 },

    /// HTTP 401/403.
    #[error("{provider}: authentication failed: {detail}")]
    Auth { provider: String, detail: String },

    /// HTTP 429.
    #[error("{provider}: rate limit exceeded{}", .retry_after_secs.map(|s| format!(" (retry after {s}s)")).unwrap_or_default())]
    RateLimited {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    /// Any other non-success status, or an error reported by the provider SDK.
    #[error("{provider}: API error{}: {detail}", .status.map(|s| format!(" {s}")).unwrap_or_default())]
    Api {
        provider: String,
        status: Option<u16>,
        detail: String,
    },

    /// The response body could not be understood.
    #[error("{provider}: malformed response: {detail}")]
    Malformed { provider: String, detail: String },
}

/// The entity response could not be parsed against the entity schema.
#[derive(Debug, Clone, Error, PartialEq, serde::Serialize, serde::Deserialize)]
#[error("model output is not valid entity JSON: {reason}")]
pub struct ParseError {
    /// Parser message, including line/column.
    pub reason: String,
}

/// A non-fatal error for a single page.
///
/// Carried in [`crate::output::PageReport`]; the batch always continues.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The page could not be rendered.
    #[error("rasterisation failed: {0}")]
    Render(#[from] ConversionError),

    /// The rendered page could not be PNG-encoded.
    #[error("image encoding failed: {0}")]
    Encode(String),

    /// The model request failed.
    #[error("model request failed: {0}")]
    Provider(#[from] ProviderError),

    /// The entity response was unparsable and the run skips such pages.
    #[error("{0}")]
    Unparsable(#[from] ParseError),

    /// The artifact could not be written.
    #[error("failed to write '{path}': {detail}")]
    WriteFailed { path: PathBuf, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_display_with_retry() {
        let e = ProviderError::RateLimited {
            provider: "gemini".into(),
            retry_after_secs: Some(60),
        };
        let msg = e.to_string();
        assert!(msg.contains("gemini"), "got: {msg}");
        assert!(msg.contains("60s"), "got: {msg}");
    }

    #[test]
    fn rate_limit_display_without_retry() {
        let e = ProviderError::RateLimited {
            provider: "anthropic".into(),
            retry_after_secs: None,
        };
        assert_eq!(e.to_string(), "anthropic: rate limit exceeded");
    }

    #[test]
    fn api_error_display_includes_status() {
        let e = ProviderError::Api {
            provider: "gemini".into(),
            status: Some(500),
            detail: "backend overloaded".into(),
        };
        assert_eq!(e.to_string(), "gemini: API error 500: backend overloaded");
    }

    #[test]
    fn timeout_display() {
        let e = ProviderError::Timeout {
            provider: "anthropic".into(),
            secs: 600,
        };
        assert!(e.to_string().contains("600s"));
    }

    #[test]
    fn page_error_wraps_provider_error() {
        let e: PageError = ProviderError::Auth {
            provider: "anthropic".into(),
            detail: "invalid x-api-key".into(),
        }
        .into();
        let msg = e.to_string();
        assert!(msg.starts_with("model request failed"), "got: {msg}");
        assert!(msg.contains("invalid x-api-key"), "got: {msg}");
    }

    #[test]
    fn missing_credential_lists_vars() {
        let e = PipelineError::MissingCredential {
            provider: "anthropic".into(),
            vars: "ANTHROPIC_API_KEY, CLAUDE_API_KEY".into(),
        };
        assert!(e.to_string().contains("CLAUDE_API_KEY"));
    }
}

//! Configuration types for a batch run.
//!
//! Every knob lives in [`PipelineConfig`], built via [`PipelineConfigBuilder`].
//! A run is fully described by one config value: which pipeline (transcribe
//! or extract entities), which provider and model, generation settings, the
//! price table for the end-of-run estimate, and the input/output roots.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Configuration for one batch run.
///
/// # Example
/// ```rust
/// use pagescribe::{PipelineConfig, PipelineKind, ProviderKind};
///
/// let config = PipelineConfig::builder()
///     .input_dir("pdf_data_ner")
///     .output_dir("answers/google_ner")
///     .kind(PipelineKind::ExtractEntities)
///     .provider(ProviderKind::Gemini)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gemini-2.5-flash");
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root directory searched recursively for `.pdf` files.
    pub input_dir: PathBuf,

    /// Flat directory receiving one artifact per page.
    pub output_dir: PathBuf,

    /// Transcription or entity extraction. Fixed for the whole run.
    pub kind: PipelineKind,

    /// Provider adapter used for every request.
    pub provider: ProviderKind,

    /// Provider credential. `None` for factory providers, which read their
    /// own environment variables.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Model identifier passed to the provider.
    pub model: String,

    /// Sampling temperature. `None` leaves the provider default in place.
    pub temperature: Option<f32>,

    /// Maximum tokens the model may generate per page. Default: 8192.
    pub max_output_tokens: u32,

    /// Rendering resolution in dots per inch. Range: 72–600. Default: 200.
    pub dpi: u32,

    /// Cap on the longest rendered edge in pixels. Default: 4000.
    pub max_rendered_pixels: u32,

    /// Per-request timeout in seconds. Default: 600.
    pub request_timeout_secs: u64,

    /// USD per million tokens, used only for the summary estimate.
    pub prices: PriceTable,

    /// What to do with an entity response that does not parse.
    pub on_parse_failure: ParseFailurePolicy,

    /// Replaces the built-in instruction text for this run.
    pub instruction_override: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let provider = ProviderKind::Gemini;
        Self {
            input_dir: PathBuf::from("pdf_data"),
            output_dir: PathBuf::from("answers"),
            kind: PipelineKind::default(),
            model: provider.default_model().to_string(),
            prices: provider.default_prices(),
            provider,
            api_key: None,
            temperature: None,
            max_output_tokens: 8192,
            dpi: 200,
            max_rendered_pixels: 4000,
            request_timeout_secs: 600,
            on_parse_failure: ParseFailurePolicy::default(),
            instruction_override: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("kind", &self.kind)
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("dpi", &self.dpi)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("prices", &self.prices)
            .field("on_parse_failure", &self.on_parse_failure)
            .field(
                "instruction_override",
                &self.instruction_override.as_ref().map(|s| s.len()),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
            model_set: false,
            prices_set: false,
        }
    }

    /// The instruction text sent with every page of this run.
    pub fn instruction(&self) -> &str {
        self.instruction_override
            .as_deref()
            .unwrap_or_else(|| self.kind.default_instruction())
    }
}

/// Builder for [`PipelineConfig`].
///
/// Selecting a provider also selects its default model and price table
/// unless those were set explicitly, in either order.
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
    model_set: bool,
    prices_set: bool,
}

impl PipelineConfigBuilder {
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn kind(mut self, kind: PipelineKind) -> Self {
        self.config.kind = kind;
        self
    }

    pub fn provider(mut self, provider: ProviderKind) -> Self {
        if !self.model_set {
            self.config.model = provider.default_model().to_string();
        }
        if !self.prices_set {
            self.config.prices = provider.default_prices();
        }
        self.config.provider = provider;
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self.model_set = true;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn prices(mut self, prices: PriceTable) -> Self {
        self.config.prices = prices;
        self.prices_set = true;
        self
    }

    pub fn on_parse_failure(mut self, policy: ParseFailurePolicy) -> Self {
        self.config.on_parse_failure = policy;
        self
    }

    pub fn instruction_override(mut self, text: impl Into<String>) -> Self {
        self.config.instruction_override = Some(text.into());
        self
    }

    /// Use the contents of `path` as the instruction text.
    pub fn instruction_file(self, path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| PipelineError::InstructionFileFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(self.instruction_override(text))
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, PipelineError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(PipelineError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.max_output_tokens == 0 {
            return Err(PipelineError::InvalidConfig(
                "max output tokens must be ≥ 1".into(),
            ));
        }
        if c.request_timeout_secs == 0 {
            return Err(PipelineError::InvalidConfig(
                "request timeout must be ≥ 1 second".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(PipelineError::InvalidConfig("model must not be empty".into()));
        }
        if c.prices.input_per_million < 0.0 || c.prices.output_per_million < 0.0 {
            return Err(PipelineError::InvalidConfig(
                "prices must not be negative".into(),
            ));
        }
        if let Some(text) = &c.instruction_override {
            if text.trim().is_empty() {
                return Err(PipelineError::InvalidConfig(
                    "instruction override is empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which of the two fixed pipelines a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    /// Word-for-word transcription, one `.txt` per page. (default)
    #[default]
    Transcribe,
    /// Named-entity annotation, one `.json` per page.
    ExtractEntities,
}

impl PipelineKind {
    /// File extension of the artifacts this pipeline writes.
    pub fn extension(self) -> &'static str {
        match self {
            PipelineKind::Transcribe => "txt",
            PipelineKind::ExtractEntities => "json",
        }
    }

    /// The built-in instruction template for this pipeline.
    pub fn default_instruction(self) -> &'static str {
        match self {
            PipelineKind::Transcribe => crate::prompts::TRANSCRIBE,
            PipelineKind::ExtractEntities => crate::prompts::EXTRACT_ENTITIES,
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineKind::Transcribe => f.write_str("transcribe"),
            PipelineKind::ExtractEntities => f.write_str("entities"),
        }
    }
}

/// The provider adapter a run talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Google Gemini `generateContent` REST API.
    Gemini,
    /// Anthropic Messages API.
    Anthropic,
    /// Any provider name understood by `edgequake_llm::ProviderFactory`
    /// (openai, azure, mistral, ollama, …).
    Factory(String),
}

impl ProviderKind {
    /// Parse a provider name as accepted on the command line.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "gemini" | "google" => ProviderKind::Gemini,
            "anthropic" | "claude" => ProviderKind::Anthropic,
            other => ProviderKind::Factory(other.to_string()),
        }
    }

    /// Short name used in logs and error messages.
    pub fn name(&self) -> &str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Factory(name) => name,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-2.5-flash",
            ProviderKind::Anthropic => "claude-sonnet-4-5-20250929",
            ProviderKind::Factory(_) => "gpt-4.1-nano",
        }
    }

    /// List prices used when the run does not supply its own.
    pub fn default_prices(&self) -> PriceTable {
        match self {
            ProviderKind::Gemini => PriceTable::new(2.5, 10.0),
            ProviderKind::Anthropic => PriceTable::new(3.0, 15.0),
            ProviderKind::Factory(_) => PriceTable::new(0.0, 0.0),
        }
    }

    /// Environment variables searched for the credential, in order.
    /// Empty for factory providers.
    pub fn credential_vars(&self) -> &'static [&'static str] {
        match self {
            ProviderKind::Gemini => &["GEMINI_API_KEY"],
            ProviderKind::Anthropic => &["ANTHROPIC_API_KEY", "CLAUDE_API_KEY"],
            ProviderKind::Factory(_) => &[],
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl PriceTable {
    pub const fn new(input_per_million: f64, output_per_million: f64) -> Self {
        Self {
            input_per_million,
            output_per_million,
        }
    }
}

/// What to do when an entity response is not valid JSON for the schema.
///
/// Applied to every page of a run; never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseFailurePolicy {
    /// Write `{"error": ..., "raw_text": ...}` in place of the entities. (default)
    #[default]
    FallbackRecord,
    /// Write nothing and count the page as failed.
    SkipPage,
}

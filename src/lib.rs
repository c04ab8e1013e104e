//! # pagescribe
//!
//! Batch-process scanned PDF archives with Vision Language Models (VLMs),
//! one page at a time.
//!
//! Every page of every PDF under an input directory is rasterised, sent to a
//! VLM together with a fixed instruction, and the answer is written next to
//! its siblings as `{document}_page_{n}.txt` (transcription) or
//! `{document}_page_{n}.json` (named-entity annotations). Token usage is
//! tallied across the run and reported with a cost estimate.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input dir
//!  │
//!  ├─ 1. Discover   every *.pdf, recursively, sorted by path
//!  ├─ 2. Render     rasterise pages via pdfium (spawn_blocking, one at a time)
//!  ├─ 3. Encode     PNG → base64, paired with the instruction
//!  ├─ 4. VLM        gemini / anthropic / any edgequake-llm provider
//!  ├─ 5. Normalize  transcription as-is; entities fence-unwrapped and parsed
//!  └─ 6. Persist    one artifact per page + usage ledger and cost summary
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pagescribe::{run_batch, PipelineConfig, PipelineKind, ProviderKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Key read from GEMINI_API_KEY
//!     let config = PipelineConfig::builder()
//!         .input_dir("pdf_data")
//!         .output_dir("answers")
//!         .kind(PipelineKind::ExtractEntities)
//!         .provider(ProviderKind::Gemini)
//!         .build()?;
//!     let summary = run_batch(config).await?;
//!     println!("{summary}");
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pagescribe` binary (clap + anyhow + tracing-subscriber + indicatif + dotenvy) |
//!
//! ## Providers
//!
//! | Provider | Default model | $/1M in / out |
//! |----------|---------------|---------------|
//! | `gemini` | `gemini-2.5-flash` | $2.50 / $10.00 |
//! | `anthropic` | `claude-sonnet-4-5-20250929` | $3.00 / $15.00 |
//! | anything `edgequake-llm` knows | `gpt-4.1-nano` | set with `--price-input/--price-output` |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod entities;
pub mod error;
pub mod ledger;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod providers;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{run_batch, Batch};
pub use config::{
    ParseFailurePolicy, PipelineConfig, PipelineConfigBuilder, PipelineKind, PriceTable,
    ProviderKind,
};
pub use entities::{EntityAnnotations, ParseFailureRecord};
pub use error::{ConversionError, PageError, ParseError, PipelineError, ProviderError};
pub use ledger::{CostEstimate, TokenUsage, UsageLedger};
pub use output::{BatchSummary, PageArtifact, PageReport};
pub use pipeline::discover::Document;
pub use pipeline::encode::{EncodedImage, ModelRequest};
pub use pipeline::llm::{ModelClient, ModelResponse, ProviderSettings};
pub use pipeline::render::{
    PageImage, PageStream, PdfiumRasterizer, RasterizedDocument, Rasterizer,
};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};

//! CLI binary for pagescribe.
//!
//! A thin shim over the library crate that maps CLI flags (and their
//! environment fallbacks, optionally loaded from `.env`) to a
//! `PipelineConfig`, runs the batch, and prints the summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pagescribe::{
    Batch, BatchProgressCallback, BatchSummary, ParseFailurePolicy, PipelineConfig, PipelineKind,
    PriceTable, ProgressCallback, ProviderKind,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const SPINNER_TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one bar over documents, one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    page_errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(SPINNER_TICKS),
        );
        bar.set_prefix("Scanning");
        bar.set_message("looking for PDFs…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_errors: AtomicUsize::new(0),
        })
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} documents  \
                 ⏱ {elapsed_precise}  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(SPINNER_TICKS),
        );
        self.bar.set_length(total_documents as u64);
        self.bar.set_prefix("Processing");
        self.bar.set_message("");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Found {total_documents} documents"))
        ));
    }

    fn on_document_start(&self, document: &str, total_pages: usize) {
        self.bar.println(format!(
            "{} {}  {}",
            cyan("▸"),
            bold(document),
            dim(&format!("{total_pages} pages"))
        ));
        if total_pages == 0 {
            self.bar.inc(1);
        }
    }

    fn on_document_skipped(&self, document: &str, error: &str) {
        self.bar
            .println(format!("{} {}  {}", red("✗"), bold(document), red(error)));
        self.bar.inc(1);
    }

    fn on_page_start(&self, document: &str, page: usize, total_pages: usize) {
        self.bar
            .set_message(format!("{document} page {page}/{total_pages}"));
    }

    fn on_page_complete(&self, _document: &str, page: usize, total_pages: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}",
            green("✓"),
            page,
            total_pages
        ));
        if page == total_pages {
            self.bar.inc(1);
        }
    }

    fn on_page_error(&self, _document: &str, page: usize, total_pages: usize, error: &str) {
        self.page_errors.fetch_add(1, Ordering::SeqCst);
        let msg = match error.char_indices().nth(80) {
            Some((idx, _)) => format!("{}\u{2026}", &error[..idx]),
            None => error.to_string(),
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page,
            total_pages,
            red(&msg)
        ));
        if page == total_pages {
            self.bar.inc(1);
        }
    }

    fn on_batch_complete(&self, summary: &BatchSummary) {
        self.bar.finish_and_clear();
        let l = &summary.ledger;
        let failed = self.page_errors.load(Ordering::SeqCst);
        if failed == 0 && l.documents_skipped == 0 {
            eprintln!(
                "{} {} pages written",
                green("✔"),
                bold(&l.pages_succeeded.to_string())
            );
        } else {
            eprintln!(
                "{} {} pages written  ({} pages failed, {} documents skipped)",
                cyan("⚠"),
                bold(&l.pages_succeeded.to_string()),
                red(&failed.to_string()),
                red(&l.documents_skipped.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Transcribe every PDF under ./pdf_data with Gemini
  pagescribe -i pdf_data -o answers

  # Named-entity extraction with Claude
  pagescribe --mode entities --provider anthropic -o answers_ner

  # Any edgequake-llm provider, with your own price table
  pagescribe --provider openai --model gpt-4.1 --price-input 2 --price-output 8

  # Custom instruction text, summary as JSON
  pagescribe --instructions prompt.txt --json > summary.json

PROVIDERS:
  Provider     Default model               Input $/1M  Output $/1M  Key
  ─────────    ──────────────────────────  ──────────  ───────────  ──────────────────────────────
  gemini       gemini-2.5-flash            $2.50       $10.00       GEMINI_API_KEY
  anthropic    claude-sonnet-4-5-20250929  $3.00       $15.00       ANTHROPIC_API_KEY / CLAUDE_API_KEY
  others       gpt-4.1-nano                $0          $0           per edgequake-llm (OPENAI_API_KEY, …)

ENVIRONMENT VARIABLES:
  Every option can be set through the PAGESCRIBE_* variable shown in --help.
  A .env file in the working directory is loaded first.
  PDFIUM_LIB_PATH         libpdfium file, or the directory holding it
  RUST_LOG                Override the log filter
"#;

/// Transcribe scanned PDF pages or extract named entities with Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "pagescribe",
    version,
    about = "Transcribe scanned PDF pages or extract named entities with Vision LLMs",
    long_about = "Rasterise every page of every PDF under an input directory, send each page \
to a Vision Language Model with a fixed instruction, and write one artifact per page. \
Supports Google Gemini, Anthropic, and any provider known to edgequake-llm.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory searched recursively for *.pdf files.
    #[arg(short, long, env = "PAGESCRIBE_INPUT", default_value = "pdf_data")]
    input: PathBuf,

    /// Directory receiving one artifact per page.
    #[arg(short, long, env = "PAGESCRIBE_OUTPUT", default_value = "answers")]
    output: PathBuf,

    /// Pipeline: transcribe (.txt) or entities (.json).
    #[arg(long, env = "PAGESCRIBE_MODE", value_enum, default_value = "transcribe")]
    mode: ModeArg,

    /// Provider: gemini, anthropic, or any edgequake-llm provider name.
    #[arg(long, env = "PAGESCRIBE_PROVIDER", default_value = "gemini")]
    provider: String,

    /// Model ID. Defaults per provider.
    #[arg(long, env = "PAGESCRIBE_MODEL")]
    model: Option<String>,

    /// Sampling temperature (0.0–2.0). Provider default when unset.
    #[arg(long, env = "PAGESCRIBE_TEMPERATURE")]
    temperature: Option<f32>,

    /// Max output tokens per page.
    #[arg(long, env = "PAGESCRIBE_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: u32,

    /// Rendering DPI (72–600).
    #[arg(long, env = "PAGESCRIBE_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// USD per million input tokens. Defaults per provider.
    #[arg(long, env = "PAGESCRIBE_PRICE_INPUT")]
    price_input: Option<f64>,

    /// USD per million output tokens. Defaults per provider.
    #[arg(long, env = "PAGESCRIBE_PRICE_OUTPUT")]
    price_output: Option<f64>,

    /// Per-page model request timeout in seconds.
    #[arg(long, env = "PAGESCRIBE_TIMEOUT", default_value_t = 600)]
    timeout: u64,

    /// Entity mode only: what to write when the reply is not valid JSON.
    #[arg(long, env = "PAGESCRIBE_ON_PARSE_FAILURE", value_enum, default_value = "fallback")]
    on_parse_failure: ParseFailureArg,

    /// Text file replacing the built-in instruction.
    #[arg(long, env = "PAGESCRIBE_INSTRUCTIONS")]
    instructions: Option<PathBuf>,

    /// Print the summary, including per-page outcomes, as JSON on stdout.
    #[arg(long, env = "PAGESCRIBE_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PAGESCRIBE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PAGESCRIBE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PAGESCRIBE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Transcribe,
    Entities,
}

impl From<ModeArg> for PipelineKind {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Transcribe => PipelineKind::Transcribe,
            ModeArg::Entities => PipelineKind::ExtractEntities,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ParseFailureArg {
    /// Write {"error", "raw_text"} in place of the entities.
    Fallback,
    /// Write nothing for the page.
    Skip,
}

impl From<ParseFailureArg> for ParseFailurePolicy {
    fn from(v: ParseFailureArg) -> Self {
        match v {
            ParseFailureArg::Fallback => ParseFailurePolicy::FallbackRecord,
            ParseFailureArg::Skip => ParseFailurePolicy::SkipPage,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before parsing so clap's env fallbacks see its values.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config and batch ───────────────────────────────────────────
    let config = build_config(&cli)?;
    let mut batch = Batch::from_config(config).context("Failed to start batch")?;

    if show_progress {
        let cb: ProgressCallback = CliProgressCallback::new();
        batch = batch.with_progress(cb);
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let summary = batch.run().await.context("Batch failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?;
        println!("{json}");
    } else if !cli.quiet {
        println!("{summary}");
    }

    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let provider = ProviderKind::from_name(&cli.provider);
    let default_prices = provider.default_prices();

    let mut builder = PipelineConfig::builder()
        .input_dir(&cli.input)
        .output_dir(&cli.output)
        .kind(cli.mode.into())
        .provider(provider)
        .max_output_tokens(cli.max_tokens)
        .dpi(cli.dpi)
        .request_timeout_secs(cli.timeout)
        .on_parse_failure(cli.on_parse_failure.into());

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }
    if cli.price_input.is_some() || cli.price_output.is_some() {
        builder = builder.prices(PriceTable::new(
            cli.price_input.unwrap_or(default_prices.input_per_million),
            cli.price_output.unwrap_or(default_prices.output_per_million),
        ));
    }
    if let Some(ref path) = cli.instructions {
        builder = builder
            .instruction_file(path)
            .context("Failed to load instructions")?;
    }

    builder.build().context("Invalid configuration")
}

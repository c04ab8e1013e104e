//! Batch orchestration: every document, every page, one at a time.
//!
//! [`Batch::run`] discovers the input tree, then for each document loads and
//! rasterises it and walks its pages in order:
//!
//! ```text
//! page ──▶ build request ──▶ model (with timeout) ──▶ normalize ──▶ write
//! ```
//!
//! Failures are contained at the smallest scope that makes sense. A document
//! that cannot be opened is skipped; a page whose render, request, parse or
//! write fails yields no artifact and the next page runs anyway. Only the
//! conditions in [`PipelineError`] stop a batch, and all of them surface
//! before the first page is sent.
//!
//! Token usage is folded into a [`UsageLedger`] from the per-page reports.

use crate::config::PipelineConfig;
use crate::error::{ConversionError, PageError, PipelineError};
use crate::ledger::{TokenUsage, UsageLedger};
use crate::output::{BatchSummary, PageReport};
use crate::pipeline::discover::{discover_documents, load_document, DocumentSource};
use crate::pipeline::encode::build_request;
use crate::pipeline::llm::{request_page, ModelClient};
use crate::pipeline::normalize::normalize;
use crate::pipeline::persist::ArtifactWriter;
use crate::pipeline::render::{PageImage, PdfiumRasterizer, Rasterizer};
use crate::progress::{NoopProgressCallback, ProgressCallback};
use crate::providers::build_client;
use futures::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// A configured batch run.
pub struct Batch {
    config: PipelineConfig,
    rasterizer: Arc<dyn Rasterizer>,
    client: Arc<dyn ModelClient>,
    progress: ProgressCallback,
}

impl Batch {
    /// Assemble a batch from explicit parts.
    pub fn new(
        config: PipelineConfig,
        rasterizer: Arc<dyn Rasterizer>,
        client: Arc<dyn ModelClient>,
    ) -> Self {
        Self {
            config,
            rasterizer,
            client,
            progress: Arc::new(NoopProgressCallback),
        }
    }

    /// Build the pdfium rasteriser and the configured provider client.
    ///
    /// Fails when the provider credential is missing, the provider is
    /// unknown, or pdfium cannot be bound.
    pub fn from_config(config: PipelineConfig) -> Result<Self, PipelineError> {
        let client = build_client(&config)?;
        let rasterizer = Arc::new(PdfiumRasterizer::from_env(config.max_rendered_pixels)?);
        Ok(Self::new(config, rasterizer, client))
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process every document under the input root.
    ///
    /// Returns `Ok` whenever the batch could start, however many documents
    /// or pages failed along the way.
    pub async fn run(&self) -> Result<BatchSummary, PipelineError> {
        let start = Instant::now();
        let config = &self.config;

        let sources = discover_documents(&config.input_dir)?;
        let writer = ArtifactWriter::create(&config.output_dir, config.kind).await?;
        let instruction: Arc<str> = Arc::from(config.instruction());

        info!(
            "Starting {} batch: {} documents from {} → {}",
            config.kind,
            sources.len(),
            config.input_dir.display(),
            config.output_dir.display()
        );
        self.progress.on_batch_start(sources.len());

        let mut ledger = UsageLedger::default();
        let mut pages = Vec::new();
        for source in &sources {
            ledger.record_document();
            match self.process_document(source, &writer, &instruction).await {
                Ok(reports) => {
                    for report in &reports {
                        ledger.record_page(report);
                    }
                    pages.extend(reports);
                }
                Err(e) => {
                    warn!("Skipping document '{}': {}", source.id, e);
                    self.progress.on_document_skipped(&source.id, &e.to_string());
                    ledger.record_skipped_document();
                }
            }
        }

        let summary = BatchSummary::new(
            config.kind,
            self.client.provider(),
            self.client.model(),
            start.elapsed(),
            ledger,
            config.prices,
        )
        .with_pages(pages);
        info!(
            "Batch done: {} documents, {} pages written, {} failed, {} in / {} out tokens in {:.2}s",
            summary.ledger.documents_processed,
            summary.ledger.pages_succeeded,
            summary.ledger.pages_failed,
            summary.ledger.input_tokens,
            summary.ledger.output_tokens,
            summary.elapsed.as_secs_f64()
        );
        self.progress.on_batch_complete(&summary);
        Ok(summary)
    }

    /// Rasterise one document and process its pages in order.
    async fn process_document(
        &self,
        source: &DocumentSource,
        writer: &ArtifactWriter,
        instruction: &Arc<str>,
    ) -> Result<Vec<PageReport>, ConversionError> {
        let document = load_document(source).await?;
        let mut rasterized = self.rasterizer.rasterize(document, self.config.dpi).await?;
        let total = rasterized.page_count;
        self.progress.on_document_start(&source.id, total);

        let mut reports = Vec::with_capacity(total);
        while let Some(item) = rasterized.pages.next().await {
            let report = match item {
                Ok(page) => self.process_page(page, total, writer, instruction).await,
                Err(e) => {
                    let page = match &e {
                        ConversionError::PageRender { page, .. } => *page,
                        _ => reports.len() + 1,
                    };
                    self.page_failed(&source.id, page, total, None, e.into())
                }
            };
            reports.push(report);
        }

        if reports.len() != total {
            warn!(
                "'{}': rasteriser yielded {} of {} pages",
                source.id,
                reports.len(),
                total
            );
        }
        Ok(reports)
    }

    /// Request, normalise and persist one page. Never fails; the outcome is
    /// in the report.
    async fn process_page(
        &self,
        page: PageImage,
        total: usize,
        writer: &ArtifactWriter,
        instruction: &Arc<str>,
    ) -> PageReport {
        let config = &self.config;
        let document = page.document.clone();
        let index = page.index;
        self.progress.on_page_start(&document, index, total);

        let request = match build_request(&page, instruction) {
            Ok(request) => request,
            Err(e) => {
                let error = PageError::Encode(e.to_string());
                return self.page_failed(&document, index, total, None, error);
            }
        };
        drop(page);

        let timeout = Duration::from_secs(config.request_timeout_secs);
        let response = match request_page(&self.client, &request, timeout).await {
            Ok(response) => response,
            Err(e) => return self.page_failed(&document, index, total, None, e.into()),
        };
        let usage = Some(response.usage);

        let content = match normalize(config.kind, &response.text, config.on_parse_failure) {
            Ok(content) => content,
            Err(e) => return self.page_failed(&document, index, total, usage, e.into()),
        };
        if content.is_fallback() {
            warn!(
                "'{}' page {}: response is not valid entity JSON; writing fallback record",
                document, index
            );
        }

        match writer.write(&document, index, &content).await {
            Ok(artifact) => {
                debug!("'{}' page {} → {}", document, index, artifact.path.display());
                self.progress.on_page_complete(&document, index, total);
                PageReport {
                    document,
                    page: index,
                    usage,
                    outcome: Ok(artifact),
                }
            }
            Err(e) => self.page_failed(&document, index, total, usage, e),
        }
    }

    fn page_failed(
        &self,
        document: &str,
        page: usize,
        total: usize,
        usage: Option<TokenUsage>,
        error: PageError,
    ) -> PageReport {
        warn!("'{}' page {}/{} failed: {}", document, page, total, error);
        self.progress
            .on_page_error(document, page, total, &error.to_string());
        PageReport {
            document: document.to_string(),
            page,
            usage,
            outcome: Err(error),
        }
    }
}

/// Run a batch with the pdfium rasteriser and the configured provider.
pub async fn run_batch(config: PipelineConfig) -> Result<BatchSummary, PipelineError> {
    Batch::from_config(config)?.run().await
}

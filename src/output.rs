//! Result types produced by a batch run.

use crate::config::{PipelineKind, PriceTable};
use crate::error::PageError;
use crate::ledger::{CostEstimate, TokenUsage, UsageLedger};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// An artifact written for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageArtifact {
    pub path: PathBuf,
    /// `true` when the file holds a parse-failure record rather than entities.
    pub fallback: bool,
}

/// What happened to one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageReport {
    /// Identifier of the owning document.
    pub document: String,
    /// 1-based page index.
    pub page: usize,
    /// Provider usage; `Some` exactly when the model response was a success.
    pub usage: Option<TokenUsage>,
    pub outcome: Result<PageArtifact, PageError>,
}

impl PageReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// End-of-run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub kind: PipelineKind,
    pub provider: String,
    pub model: String,
    pub elapsed: Duration,
    pub ledger: UsageLedger,
    pub prices: PriceTable,
    pub cost: CostEstimate,
    /// Output tokens per processed document; `None` when nothing was processed.
    pub average_output_tokens_per_document: Option<f64>,
    /// Every page attempted, in processing order.
    pub pages: Vec<PageReport>,
}

impl BatchSummary {
    pub fn new(
        kind: PipelineKind,
        provider: impl Into<String>,
        model: impl Into<String>,
        elapsed: Duration,
        ledger: UsageLedger,
        prices: PriceTable,
    ) -> Self {
        let cost = ledger.estimate_cost(&prices);
        let average_output_tokens_per_document = ledger.average_output_tokens_per_document();
        Self {
            kind,
            provider: provider.into(),
            model: model.into(),
            elapsed,
            ledger,
            prices,
            cost,
            average_output_tokens_per_document,
            pages: Vec::new(),
        }
    }

    pub fn with_pages(mut self, pages: Vec<PageReport>) -> Self {
        self.pages = pages;
        self
    }

    /// Reports of the pages that produced no artifact.
    pub fn failed_pages(&self) -> impl Iterator<Item = &PageReport> {
        self.pages.iter().filter(|p| !p.is_success())
    }
}

const RULE: &str = "----------------------------------------";

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let l = &self.ledger;
        writeln!(f, "{RULE}")?;
        writeln!(
            f,
            "Pipeline: {} via {} ({})",
            self.kind, self.provider, self.model
        )?;
        writeln!(
            f,
            "Total processing time: {:.2} seconds",
            self.elapsed.as_secs_f64()
        )?;
        writeln!(
            f,
            "Documents: {} processed, {} skipped",
            l.documents_processed, l.documents_skipped
        )?;
        writeln!(
            f,
            "Pages: {} written ({} fallback), {} failed",
            l.pages_succeeded, l.fallback_records, l.pages_failed
        )?;
        writeln!(
            f,
            "Total token cost (in/out): {} / {}",
            l.input_tokens, l.output_tokens
        )?;
        match self.average_output_tokens_per_document {
            Some(avg) => writeln!(f, "Average output tokens per file: {avg:.2}")?,
            None => writeln!(
                f,
                "No files were processed; check input directory or file types."
            )?,
        }
        writeln!(
            f,
            "Estimated cost (in/out): ${:.2} / ${:.2}",
            self.cost.input_usd, self.cost.output_usd
        )?;
        write!(f, "{RULE}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(ledger: UsageLedger) -> BatchSummary {
        BatchSummary::new(
            PipelineKind::Transcribe,
            "gemini",
            "gemini-2.5-flash",
            Duration::from_millis(12_340),
            ledger,
            PriceTable::new(2.5, 10.0),
        )
    }

    #[test]
    fn empty_batch_reports_no_files() {
        let text = summary(UsageLedger::default()).to_string();
        assert!(text.contains("No files were processed"), "got: {text}");
        assert!(text.contains("$0.00 / $0.00"), "got: {text}");
    }

    #[test]
    fn populated_batch_reports_average_and_cost() {
        let ledger = UsageLedger {
            documents_processed: 2,
            pages_succeeded: 5,
            input_tokens: 1_000_000,
            output_tokens: 300,
            ..Default::default()
        };
        let s = summary(ledger);
        assert_eq!(s.average_output_tokens_per_document, Some(150.0));
        let text = s.to_string();
        assert!(text.contains("Average output tokens per file: 150.00"), "got: {text}");
        assert!(text.contains("$2.50 / $0.00"), "got: {text}");
        assert!(text.contains("12.34 seconds"), "got: {text}");
    }

    #[test]
    fn summary_serialises_to_json() {
        let json = serde_json::to_value(summary(UsageLedger::default())).unwrap();
        assert_eq!(json["kind"], "transcribe");
        assert!(json["average_output_tokens_per_document"].is_null());
        assert_eq!(json["pages"], serde_json::json!([]));
    }

    #[test]
    fn page_reports_serialise_with_their_outcome() {
        let pages = vec![
            PageReport {
                document: "flugblatt".into(),
                page: 1,
                usage: Some(TokenUsage::new(100, 10)),
                outcome: Ok(PageArtifact {
                    path: PathBuf::from("answers/flugblatt_page_1.txt"),
                    fallback: false,
                }),
            },
            PageReport {
                document: "flugblatt".into(),
                page: 2,
                usage: None,
                outcome: Err(PageError::Encode("zero-sized image".into())),
            },
        ];
        let s = summary(UsageLedger::default()).with_pages(pages);
        assert_eq!(s.failed_pages().map(|p| p.page).collect::<Vec<_>>(), vec![2]);

        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["pages"][0]["outcome"]["Ok"]["fallback"], false);
        assert_eq!(json["pages"][1]["outcome"]["Err"]["Encode"], "zero-sized image");
        assert!(json["pages"][1]["usage"].is_null());
    }
}

//! Token accounting and cost estimation.
//!
//! [`UsageLedger`] is a plain value that the orchestrator folds page reports
//! into; nothing here is global. Token totals only move when a page carries
//! usage, which happens only when its model response was a success.

use crate::config::PriceTable;
use crate::output::PageReport;
use serde::{Deserialize, Serialize};

/// Token counts reported by the provider for one request.
///
/// Zero when the provider omitted usage metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }
}

/// Running totals for a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLedger {
    /// Documents the loop attempted, including ones that failed to rasterise.
    pub documents_processed: u64,
    /// Documents skipped because they could not be rasterised.
    pub documents_skipped: u64,
    /// Pages that produced an artifact.
    pub pages_succeeded: u64,
    /// Pages that produced no artifact.
    pub pages_failed: u64,
    /// Artifacts written as parse-failure records instead of entities.
    pub fallback_records: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl UsageLedger {
    /// Count a document as attempted.
    pub fn record_document(&mut self) {
        self.documents_processed += 1;
    }

    /// Count a document whose pages never reached the model.
    pub fn record_skipped_document(&mut self) {
        self.documents_skipped += 1;
    }

    /// Fold one page report into the totals.
    pub fn record_page(&mut self, report: &PageReport) {
        if let Some(usage) = report.usage {
            self.input_tokens += usage.input_tokens;
            self.output_tokens += usage.output_tokens;
        }
        match &report.outcome {
            Ok(artifact) => {
                self.pages_succeeded += 1;
                if artifact.fallback {
                    self.fallback_records += 1;
                }
            }
            Err(_) => self.pages_failed += 1,
        }
    }

    /// Average output tokens per processed document.
    ///
    /// `None` when no documents were processed.
    pub fn average_output_tokens_per_document(&self) -> Option<f64> {
        if self.documents_processed == 0 {
            None
        } else {
            Some(self.output_tokens as f64 / self.documents_processed as f64)
        }
    }

    pub fn estimate_cost(&self, prices: &PriceTable) -> CostEstimate {
        CostEstimate::from_tokens(self.input_tokens, self.output_tokens, prices)
    }
}

/// Estimated spend in USD. Not a bill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub input_usd: f64,
    pub output_usd: f64,
}

impl CostEstimate {
    pub fn from_tokens(input_tokens: u64, output_tokens: u64, prices: &PriceTable) -> Self {
        Self {
            input_usd: input_tokens as f64 / 1e6 * prices.input_per_million,
            output_usd: output_tokens as f64 / 1e6 * prices.output_per_million,
        }
    }

    pub fn total_usd(&self) -> f64 {
        self.input_usd + self.output_usd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PageError, ProviderError};
    use crate::output::PageArtifact;
    use std::path::PathBuf;

    fn success(page: usize, input: u64, output: u64, fallback: bool) -> PageReport {
        PageReport {
            document: "doc".into(),
            page,
            usage: Some(TokenUsage::new(input, output)),
            outcome: Ok(PageArtifact {
                path: PathBuf::from(format!("out/doc_page_{page}.json")),
                fallback,
            }),
        }
    }

    fn provider_failure(page: usize) -> PageReport {
        PageReport {
            document: "doc".into(),
            page,
            usage: None,
            outcome: Err(PageError::Provider(ProviderError::Network {
                provider: "gemini".into(),
                detail: "connection reset".into(),
            })),
        }
    }

    #[test]
    fn totals_sum_only_successful_responses() {
        let mut ledger = UsageLedger::default();
        ledger.record_page(&success(1, 1200, 300, false));
        ledger.record_page(&provider_failure(2));
        ledger.record_page(&success(3, 1100, 250, true));

        assert_eq!(ledger.input_tokens, 2300);
        assert_eq!(ledger.output_tokens, 550);
        assert_eq!(ledger.pages_succeeded, 2);
        assert_eq!(ledger.pages_failed, 1);
        assert_eq!(ledger.fallback_records, 1);
    }

    #[test]
    fn skipped_unparsable_page_still_costs_tokens() {
        let mut ledger = UsageLedger::default();
        ledger.record_page(&PageReport {
            document: "doc".into(),
            page: 1,
            usage: Some(TokenUsage::new(900, 40)),
            outcome: Err(PageError::Unparsable(crate::error::ParseError {
                reason: "expected value at line 1 column 1".into(),
            })),
        });
        assert_eq!(ledger.input_tokens, 900);
        assert_eq!(ledger.pages_failed, 1);
    }

    #[test]
    fn average_is_none_without_documents() {
        let ledger = UsageLedger::default();
        assert_eq!(ledger.average_output_tokens_per_document(), None);
    }

    #[test]
    fn average_divides_by_documents() {
        let ledger = UsageLedger {
            documents_processed: 4,
            output_tokens: 1000,
            ..Default::default()
        };
        assert_eq!(ledger.average_output_tokens_per_document(), Some(250.0));
    }

    #[test]
    fn cost_uses_per_million_rates() {
        let cost = CostEstimate::from_tokens(2_000_000, 500_000, &PriceTable::new(2.5, 10.0));
        assert_eq!(cost.input_usd, 5.0);
        assert_eq!(cost.output_usd, 5.0);
        assert_eq!(cost.total_usd(), 10.0);
    }

    #[test]
    fn zero_tokens_cost_nothing() {
        let cost = UsageLedger::default().estimate_cost(&PriceTable::new(3.0, 15.0));
        assert_eq!(cost, CostEstimate::default());
    }
}

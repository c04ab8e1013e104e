//! Progress-callback trait for batch events.
//!
//! Hand an [`Arc<dyn BatchProgressCallback>`] to
//! [`crate::batch::Batch::with_progress`] to observe a run as it moves through
//! documents and pages. The CLI uses it to drive an `indicatif` bar; a service
//! could forward the same events to a channel or a database row.
//!
//! # Example
//!
//! ```rust
//! use pagescribe::BatchProgressCallback;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct CountingCallback {
//!     pages: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, document: &str, page: usize, _total_pages: usize) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{document} page {page} done");
//!     }
//! }
//! ```

use crate::output::BatchSummary;
use std::sync::Arc;

/// Called by the orchestrator as it works through a batch.
///
/// Pages are processed strictly one after another, so events for a batch
/// arrive in order from a single task. All methods default to no-ops.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after discovery.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called when a document opened and its page count is known.
    fn on_document_start(&self, document: &str, total_pages: usize) {
        let _ = (document, total_pages);
    }

    /// Called when a document could not be read or rasterised.
    fn on_document_skipped(&self, document: &str, error: &str) {
        let _ = (document, error);
    }

    /// Called just before a page's model request is sent.
    fn on_page_start(&self, document: &str, page: usize, total_pages: usize) {
        let _ = (document, page, total_pages);
    }

    /// Called after a page's artifact was written.
    fn on_page_complete(&self, document: &str, page: usize, total_pages: usize) {
        let _ = (document, page, total_pages);
    }

    /// Called when a page produced no artifact.
    fn on_page_error(&self, document: &str, page: usize, total_pages: usize, error: &str) {
        let _ = (document, page, total_pages, error);
    }

    /// Called once with the final summary.
    fn on_batch_complete(&self, summary: &BatchSummary) {
        let _ = summary;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias for the shared callback handle.
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

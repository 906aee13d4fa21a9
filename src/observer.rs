//! Observer trait for live repair-run events.
//!
//! Inject an [`Arc<dyn RepairObserver>`] via
//! [`crate::config::RepairConfigBuilder::observer`] to mirror report
//! appends and per-page outcomes as the run progresses.
//!
//! # Why an observer instead of reading the report afterwards?
//!
//! The [`crate::report::RepairReport`] is the authoritative audit trail,
//! but it is only flushed when the run ends. The observer is the
//! least-invasive way for a host program to also stream the same events to
//! a terminal progress bar, a log file, or a UI — without the library
//! knowing anything about how the host communicates. Console output is a
//! side observer, never part of the core contract.
//!
//! # Example
//!
//! ```rust
//! use pdfmend::{RepairConfig, RepairObserver};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingObserver {
//!     pages: AtomicUsize,
//! }
//!
//! impl RepairObserver for CountingObserver {
//!     fn on_page_outcome(&self, record: &pdfmend::PageRecord, total: usize) {
//!         let done = self.pages.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("page {}/{} → {:?}", done, total, record.decision);
//!     }
//! }
//!
//! let config = RepairConfig::builder()
//!     .observer(Arc::new(CountingObserver { pages: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::report::PageRecord;
use std::sync::Arc;

/// Called by the repair pipeline as the run progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The trait is `Send + Sync` because the public
/// async entry points move the run onto a blocking worker thread.
pub trait RepairObserver: Send + Sync {
    /// Called once after the source document is opened.
    ///
    /// # Arguments
    /// * `total_pages` — number of source pages that will be processed
    fn on_run_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page is classified.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages in the source document
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page's outcome has been decided (after pruning).
    fn on_page_outcome(&self, record: &PageRecord, total_pages: usize) {
        let _ = (record, total_pages);
    }

    /// Mirrors every action appended to the report.
    fn on_action(&self, msg: &str) {
        let _ = msg;
    }

    /// Mirrors every error appended to the report.
    fn on_error(&self, msg: &str) {
        let _ = msg;
    }

    /// Called once after all pages have been attempted.
    ///
    /// # Arguments
    /// * `total_pages`  — total pages in the source document
    /// * `failed_pages` — pages whose outcome is `image_insert_failed`
    fn on_run_complete(&self, total_pages: usize, failed_pages: usize) {
        let _ = (total_pages, failed_pages);
    }
}

/// A no-op implementation for callers that don't need live events.
pub struct NoopObserver;

impl RepairObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::RepairConfig`].
pub type ObserverHandle = Arc<dyn RepairObserver>;

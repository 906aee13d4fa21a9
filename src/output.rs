//! Result types returned by a repair run.

use crate::report::RepairReport;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Aggregate page counters for one repair run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairStats {
    /// Pages in the source document.
    pub total_pages: usize,
    /// Pages copied verbatim because they carried text.
    pub copied_pages: usize,
    /// Pages reconstructed as searchable via OCR.
    pub ocr_pages: usize,
    /// Pages inserted as raw images (with or without a prior OCR attempt).
    pub image_pages: usize,
    /// Pages where every reconstruction step failed.
    pub failed_pages: usize,
    /// Output pages pruned as blank.
    pub removed_blank_pages: usize,
    /// Wall-clock duration of the run in milliseconds.
    pub duration_ms: u64,
}

impl RepairStats {
    /// Record one page decision in the counters.
    pub(crate) fn record(&mut self, decision: &crate::report::PageDecision) {
        use crate::report::PageDecision::*;
        match decision {
            Copied { .. } => self.copied_pages += 1,
            OcrApplied => self.ocr_pages += 1,
            OcrFailedFallbackImage { .. } | ImageInserted => self.image_pages += 1,
            ImageInsertFailed { .. } => self.failed_pages += 1,
        }
    }
}

/// Everything a caller gets back from a successful repair.
#[derive(Debug, Clone)]
pub struct RepairOutput {
    /// Where the repaired document was written.
    pub output_path: PathBuf,
    /// Where the JSON report was written, when one was requested.
    pub report_path: Option<PathBuf>,
    /// Aggregate counters for the run.
    pub stats: RepairStats,
    /// The full per-page audit trail.
    pub report: RepairReport,
}

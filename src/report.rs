//! The Report Sink: an append-only, JSON-serialisable audit log of one
//! repair run.
//!
//! Every action, error, and per-page outcome of a run is appended here with
//! a UTC timestamp and flushed to disk exactly once when the run reaches its
//! terminal state — including runs that fail. The report is the
//! authoritative record of what succeeded, degraded, or failed per page;
//! the repaired document alone cannot tell you *why* a page looks the way
//! it does.
//!
//! # Schema
//!
//! ```json
//! {
//!   "input_path": "scan.pdf",
//!   "timestamp": "2026-08-30T12:00:00Z",
//!   "actions": [{ "time": "...", "msg": "Opening source PDF scan.pdf" }],
//!   "errors":  [{ "time": "...", "msg": "Page 2 OCR failed: ..." }],
//!   "pages":   [
//!     { "page": 1, "time": "...", "action": "copied", "text_chars": 5 },
//!     { "page": 2, "time": "...", "action": "ocr_applied", "removed_blank": true }
//!   ]
//! }
//! ```
//!
//! Entries are never edited or removed after being appended; the one
//! exception the schema allows for is `removed_blank`, which is decided
//! *before* the page record is appended (the pruner runs between the append
//! of the output page and the append of its record).

use crate::error::RepairError;
use crate::observer::ObserverHandle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{error, info};

/// One timestamped free-text entry in the `actions` or `errors` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub time: DateTime<Utc>,
    pub msg: String,
}

impl LogEntry {
    fn now(msg: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            msg: msg.into(),
        }
    }
}

/// The decision taken for one source page, with decision-specific fields.
///
/// Serialised internally-tagged as `"action"` so each page entry in the
/// report reads as a flat object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PageDecision {
    /// The page had extractable text and was copied verbatim.
    Copied {
        /// Length of the page's extracted text after trimming whitespace.
        text_chars: usize,
    },
    /// OCR produced a searchable reconstruction that was appended.
    OcrApplied,
    /// OCR failed; the page was re-inserted as a raw rasterised image.
    OcrFailedFallbackImage {
        /// The OCR failure, verbatim.
        ocr_error: String,
    },
    /// OCR was disabled; the page was inserted as a raw rasterised image.
    ImageInserted,
    /// Every reconstruction step failed; the page contributes no content.
    ImageInsertFailed {
        /// Concatenated error text from the failed step(s).
        error: String,
    },
}

impl PageDecision {
    /// Whether this decision appended at least one page to the output.
    ///
    /// Only `image_insert_failed` leaves the output untouched; the pruner
    /// must not run for such pages or it would inspect a *different*
    /// page's append.
    pub fn appended_page(&self) -> bool {
        !matches!(self, PageDecision::ImageInsertFailed { .. })
    }

    /// Whether this decision means the page yielded no output content.
    pub fn is_failure(&self) -> bool {
        matches!(self, PageDecision::ImageInsertFailed { .. })
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// The recorded outcome for one source page.
///
/// Exactly one record exists per source page, in source order. A record is
/// never deleted: when the pruner removes the page from the output, the
/// record stays and is flagged `removed_blank` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    /// 1-based source page index.
    pub page: usize,
    pub time: DateTime<Utc>,
    #[serde(flatten)]
    pub decision: PageDecision,
    /// Set when the blank-page pruner removed this page from the output.
    #[serde(default, skip_serializing_if = "is_false")]
    pub removed_blank: bool,
}

impl PageRecord {
    pub fn new(page: usize, decision: PageDecision) -> Self {
        Self {
            page,
            time: Utc::now(),
            decision,
            removed_blank: false,
        }
    }
}

/// Append-only log of one repair run, flushed to JSON at the end.
///
/// Owned exclusively by the orchestrator for the run's duration; mutated
/// only by appends. Every append is mirrored to the `tracing` stream and,
/// when configured, to the run's [`crate::observer::RepairObserver`].
#[derive(Clone, Serialize, Deserialize)]
pub struct RepairReport {
    pub input_path: String,
    /// Start of the run.
    pub timestamp: DateTime<Utc>,
    pub actions: Vec<LogEntry>,
    pub errors: Vec<LogEntry>,
    pub pages: Vec<PageRecord>,
    #[serde(skip)]
    observer: Option<ObserverHandle>,
}

impl std::fmt::Debug for RepairReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepairReport")
            .field("input_path", &self.input_path)
            .field("timestamp", &self.timestamp)
            .field("actions", &self.actions.len())
            .field("errors", &self.errors.len())
            .field("pages", &self.pages.len())
            .finish()
    }
}

impl RepairReport {
    /// Start a new report for the given input.
    pub fn new(input_path: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            timestamp: Utc::now(),
            actions: Vec::new(),
            errors: Vec::new(),
            pages: Vec::new(),
            observer: None,
        }
    }

    /// Attach an observer that mirrors every subsequent append.
    pub fn with_observer(mut self, observer: Option<ObserverHandle>) -> Self {
        self.observer = observer;
        self
    }

    /// Append a timestamped action entry.
    pub fn add_action(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        info!("{msg}");
        if let Some(ref obs) = self.observer {
            obs.on_action(&msg);
        }
        self.actions.push(LogEntry::now(msg));
    }

    /// Append a timestamped error entry.
    pub fn add_error(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        error!("{msg}");
        if let Some(ref obs) = self.observer {
            obs.on_error(&msg);
        }
        self.errors.push(LogEntry::now(msg));
    }

    /// Append the outcome record for one source page.
    pub fn add_page(&mut self, record: PageRecord, total_pages: usize) {
        if let Some(ref obs) = self.observer {
            obs.on_page_outcome(&record, total_pages);
        }
        self.pages.push(record);
    }

    /// Flush the report to `path` as pretty-printed JSON.
    ///
    /// Called exactly once per run, from the terminal state — for failed
    /// runs too, so the audit trail always survives.
    pub fn save(&mut self, path: &Path) -> Result<(), RepairError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| RepairError::Internal(format!("report serialisation: {e}")))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| RepairError::ReportWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            }
        }
        std::fs::write(path, json).map_err(|e| RepairError::ReportWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.add_action(format!("Saved JSON report to {}", path.display()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_tags_serialise_snake_case() {
        let copied = serde_json::to_value(PageDecision::Copied { text_chars: 5 }).unwrap();
        assert_eq!(copied["action"], "copied");
        assert_eq!(copied["text_chars"], 5);

        let ocr = serde_json::to_value(PageDecision::OcrApplied).unwrap();
        assert_eq!(ocr["action"], "ocr_applied");

        let fallback = serde_json::to_value(PageDecision::OcrFailedFallbackImage {
            ocr_error: "engine exploded".into(),
        })
        .unwrap();
        assert_eq!(fallback["action"], "ocr_failed_fallback_image");
        assert_eq!(fallback["ocr_error"], "engine exploded");

        let failed = serde_json::to_value(PageDecision::ImageInsertFailed {
            error: "a; b".into(),
        })
        .unwrap();
        assert_eq!(failed["action"], "image_insert_failed");
        assert_eq!(failed["error"], "a; b");
    }

    #[test]
    fn removed_blank_is_omitted_when_false() {
        let record = PageRecord::new(1, PageDecision::ImageInserted);
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("removed_blank").is_none());
        assert_eq!(json["page"], 1);
        assert_eq!(json["action"], "image_inserted");

        let mut pruned = PageRecord::new(2, PageDecision::OcrApplied);
        pruned.removed_blank = true;
        let json = serde_json::to_value(&pruned).unwrap();
        assert_eq!(json["removed_blank"], true);
    }

    #[test]
    fn appended_page_covers_all_decisions() {
        assert!(PageDecision::Copied { text_chars: 1 }.appended_page());
        assert!(PageDecision::OcrApplied.appended_page());
        assert!(PageDecision::OcrFailedFallbackImage {
            ocr_error: "x".into()
        }
        .appended_page());
        assert!(PageDecision::ImageInserted.appended_page());
        assert!(!PageDecision::ImageInsertFailed { error: "x".into() }.appended_page());
    }

    #[test]
    fn report_round_trips_through_json() {
        let mut report = RepairReport::new("input.pdf");
        report.add_action("Opening source PDF input.pdf");
        report.add_error("Page 2 OCR failed: no engine");
        report.add_page(PageRecord::new(1, PageDecision::Copied { text_chars: 11 }), 1);

        let json = serde_json::to_string(&report).unwrap();
        let parsed: RepairReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.input_path, "input.pdf");
        assert_eq!(parsed.actions.len(), 1);
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.pages.len(), 1);
        assert_eq!(
            parsed.pages[0].decision,
            PageDecision::Copied { text_chars: 11 }
        );
    }

    #[test]
    fn report_clones_with_observer_attached() {
        use crate::observer::NoopObserver;
        use std::sync::Arc;

        let mut report =
            RepairReport::new("input.pdf").with_observer(Some(Arc::new(NoopObserver)));
        report.add_action("Opening source PDF input.pdf");
        report.add_page(PageRecord::new(1, PageDecision::ImageInserted), 1);

        let cloned = report.clone();
        assert_eq!(cloned.input_path, report.input_path);
        assert_eq!(cloned.actions.len(), 1);
        assert_eq!(cloned.pages.len(), 1);
    }

    #[test]
    fn save_writes_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let mut report = RepairReport::new("doc.pdf");
        report.add_action("first");
        report.save(&path).expect("save should succeed");

        let raw = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["input_path"], "doc.pdf");
        assert_eq!(json["actions"][0]["msg"], "first");
        // The "saved report" action is appended after the write.
        assert_eq!(report.actions.len(), 2);
    }
}

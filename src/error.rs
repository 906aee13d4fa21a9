//! Error types for the pdfmend library.
//!
//! Three error types reflect three distinct failure scopes:
//!
//! * [`RepairError`] — **Fatal**: the repair run cannot proceed or cannot
//!   produce an output document (unreadable input, failed final save).
//!   Returned as `Err(RepairError)` from the top-level `repair*` functions.
//!   The repair report is still flushed before these surface.
//!
//! * [`EngineError`] — **Recoverable**: a single document-engine operation
//!   failed (text extraction, rasterisation, page assembly). Captured at the
//!   smallest possible scope and converted into a report entry or page
//!   outcome rather than propagated upward.
//!
//! * [`OcrError`] — **Recoverable**: one OCR attempt failed. Always answered
//!   by the raw-image fallback for that page; the error text is carried in
//!   the page's outcome record.
//!
//! The separation keeps the failure policy explicit: only an unreadable
//! input or a failed final serialisation ends a run in a failed state —
//! everything else degrades and is audited in the report.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdfmend library.
///
/// Per-page and per-stage failures use [`EngineError`] / [`OcrError`] and
/// are recorded in the [`crate::report::RepairReport`] rather than
/// propagated here.
#[derive(Debug, Error)]
pub enum RepairError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// The document engine could not open the input at all. An unreadable
    /// document cannot be repaired, so this aborts before page processing.
    #[error("Cannot open PDF '{path}': {detail}\nThe file may be truncated beyond recovery.")]
    UnreadableInput { path: PathBuf, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The final structural-cleanup save of the rebuilt document failed.
    ///
    /// Fatal for the run's success, but the repair report is flushed first
    /// so the per-page audit trail survives.
    #[error("Failed to save repaired PDF to '{path}': {detail}")]
    SerializeFailed { path: PathBuf, detail: String },

    /// Could not write the JSON repair report.
    #[error("Failed to write repair report '{path}': {source}")]
    ReportWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A recoverable failure from one document-engine operation.
///
/// Engine errors are captured where they happen — a classification falls
/// back to "no text", a failed page copy degrades into the fallback chain,
/// a failed pre-repair resave falls back to the original input — and the
/// error text lands in the report.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The engine could not parse the document.
    #[error("failed to open document: {0}")]
    Open(String),

    /// A page index beyond the document's page count was requested.
    #[error("page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// Text extraction failed for a page.
    #[error("text extraction failed for page {page}: {detail}")]
    TextExtraction { page: usize, detail: String },

    /// Rasterisation failed for a page.
    #[error("rasterisation failed for page {page}: {detail}")]
    Rasterisation { page: usize, detail: String },

    /// Page insertion, image-page assembly, or page deletion failed.
    #[error("page assembly failed: {0}")]
    Assembly(String),

    /// Writing document properties failed.
    #[error("failed to set document properties: {0}")]
    Properties(String),

    /// Serialising the document to disk failed.
    #[error("failed to save document to '{path}': {detail}")]
    Save { path: PathBuf, detail: String },
}

/// A recoverable failure from one OCR attempt.
///
/// Every variant triggers the same degradation: the page is re-inserted as
/// a raw rasterised image and the outcome records the OCR error text.
#[derive(Debug, Clone, Error)]
pub enum OcrError {
    /// No OCR engine is installed or reachable.
    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The engine ran but failed to recognise the bitmap.
    #[error("OCR recognition failed: {0}")]
    RecognitionFailed(String),

    /// The engine exceeded the per-page deadline and was killed.
    #[error("OCR timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The engine produced output that is not a usable single-page document.
    #[error("OCR produced a malformed result: {0}")]
    MalformedResult(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_input_display() {
        let e = RepairError::UnreadableInput {
            path: PathBuf::from("broken.pdf"),
            detail: "xref table missing".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("broken.pdf"), "got: {msg}");
        assert!(msg.contains("xref table missing"));
    }

    #[test]
    fn serialize_failed_display() {
        let e = RepairError::SerializeFailed {
            path: PathBuf::from("out.pdf"),
            detail: "disk full".into(),
        };
        assert!(e.to_string().contains("out.pdf"));
        assert!(e.to_string().contains("disk full"));
    }

    #[test]
    fn page_out_of_range_display() {
        let e = EngineError::PageOutOfRange { page: 7, total: 3 };
        assert!(e.to_string().contains("page 7"));
        assert!(e.to_string().contains("3 pages"));
    }

    #[test]
    fn ocr_timeout_display() {
        let e = OcrError::Timeout { secs: 120 };
        assert!(e.to_string().contains("120s"));
    }

    #[test]
    fn ocr_unavailable_display() {
        let e = OcrError::EngineUnavailable("tesseract not found in PATH".into());
        assert!(e.to_string().contains("tesseract"));
    }
}

//! # pdfmend
//!
//! Repair damaged PDF documents page by page, with an auditable JSON report.
//!
//! ## Why this crate?
//!
//! A corrupted PDF usually isn't *uniformly* corrupted — most pages still
//! carry their text and can be copied verbatim, while a few are damaged
//! beyond text extraction. Whole-file "fix the xref" tools either succeed
//! completely or give up completely. This crate rebuilds the document one
//! page at a time instead, so every salvageable page is preserved at full
//! fidelity and every broken page degrades gracefully: first to a
//! searchable OCR reconstruction, then to a raw page image, and only as a
//! last resort to an explicitly recorded failure.
//!
//! ## Pipeline Overview
//!
//! ```text
//! damaged.pdf
//!  │
//!  ├─ 1. Validate  existence, permissions, %PDF magic
//!  ├─ 2. Resave    structural rewrite via pdfium (fixes most xref damage)
//!  ├─ 3. Pages     per page: has text? ─ yes → copy verbatim
//!  │                         └─ no  → OCR reconstruction → raw page image
//!  │               optional: prune the appended page when blank
//!  ├─ 4. Metadata  resolve title/author/creator/producer with fallbacks
//!  └─ 5. Output    repaired.pdf + repair_report.json (per-page audit)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfmend::RepairConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RepairConfig::builder()
//!         .ocr(true)
//!         .remove_blank(true)
//!         .build()?;
//!     let result = pdfmend::repair("damaged.pdf", "repaired.pdf", config).await?;
//!     println!(
//!         "{} pages: {} copied, {} OCR, {} image, {} failed",
//!         result.stats.total_pages,
//!         result.stats.copied_pages,
//!         result.stats.ocr_pages,
//!         result.stats.image_pages,
//!         result.stats.failed_pages,
//!     );
//!     Ok(())
//! }
//! ```
//!
//! OCR requires a `tesseract` binary on `PATH`; without one, text-less
//! pages are still preserved as raw page images.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfmend` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdfmend = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod engine;
pub mod error;
pub mod observer;
pub mod ocr;
pub mod output;
pub mod pipeline;
pub mod repair;
pub mod report;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{RepairConfig, RepairConfigBuilder};
pub use engine::pdfium::PdfiumEngine;
pub use engine::{DocumentEngine, DocumentHandle, DocumentInfo, DocumentProperties};
pub use error::{EngineError, OcrError, RepairError};
pub use observer::{NoopObserver, ObserverHandle, RepairObserver};
pub use ocr::{OcrEngine, TesseractOcr};
pub use output::{RepairOutput, RepairStats};
pub use repair::{inspect, repair, repair_sync, run_repair};
pub use report::{LogEntry, PageDecision, PageRecord, RepairReport};

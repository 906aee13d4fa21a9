//! The ordered fallback chain for pages without text.
//!
//! Policy, in strict priority order:
//!
//! 1. **OCR reconstruction** (when enabled): rasterise the page, hand the
//!    bitmap to the OCR engine, append the searchable single-page document
//!    it returns → `ocr_applied`.
//! 2. **Raw image insertion**: rasterise the page and append it as a
//!    full-page image → `image_inserted` (OCR disabled) or
//!    `ocr_failed_fallback_image` (OCR failed first).
//!
//! Each step is isolated: an OCR failure triggers step 2 for the same
//! page; only when the image insertion *also* fails does the page end as
//! `image_insert_failed`, carrying both error texts. Visual content is
//! never silently dropped — every text-less page yields exactly one
//! best-effort reconstructed page, degrading from "searchable" to
//! "visual-only" rather than failing the page outright.

use crate::config::RepairConfig;
use crate::engine::{DocumentEngine, DocumentHandle};
use crate::error::EngineError;
use crate::ocr::OcrEngine;
use crate::report::PageDecision;
use tracing::debug;

/// Rebuild one text-less source page into `out`, returning the decision.
///
/// Appends zero pages (`image_insert_failed`) or at least one page (every
/// other decision). Never returns an error: every failure mode is part of
/// the decision space.
pub fn reconstruct_page<E: DocumentEngine>(
    engine: &E,
    source: &E::Doc,
    out: &mut E::Doc,
    index: usize,
    ocr: Option<&dyn OcrEngine>,
    config: &RepairConfig,
) -> PageDecision {
    let Some(ocr) = ocr else {
        return match insert_image_page(source, out, index, config.dpi) {
            Ok(()) => PageDecision::ImageInserted,
            Err(e) => PageDecision::ImageInsertFailed {
                error: e.to_string(),
            },
        };
    };

    match apply_ocr(engine, source, out, index, ocr, config) {
        Ok(()) => PageDecision::OcrApplied,
        Err(ocr_error) => {
            debug!("Page {}: OCR failed, trying raw image: {ocr_error}", index + 1);
            match insert_image_page(source, out, index, config.dpi) {
                Ok(()) => PageDecision::OcrFailedFallbackImage { ocr_error },
                Err(img_error) => PageDecision::ImageInsertFailed {
                    error: format!("{ocr_error}; {img_error}"),
                },
            }
        }
    }
}

/// Step 1: OCR the page and append the reconstructed document's page(s).
fn apply_ocr<E: DocumentEngine>(
    engine: &E,
    source: &E::Doc,
    out: &mut E::Doc,
    index: usize,
    ocr: &dyn OcrEngine,
    config: &RepairConfig,
) -> Result<(), String> {
    let bitmap = source
        .rasterize(index, config.dpi)
        .map_err(|e| e.to_string())?;
    let pdf_bytes = ocr
        .recognize(&bitmap, &config.ocr_lang, config.dpi)
        .map_err(|e| e.to_string())?;
    let reconstructed = engine
        .open_bytes(pdf_bytes)
        .map_err(|e| format!("reconstructed page unreadable: {e}"))?;
    if reconstructed.page_count() == 0 {
        return Err("reconstructed document has no pages".into());
    }
    out.append_document(&reconstructed)
        .map_err(|e| e.to_string())?;
    Ok(())
}

/// Step 2: append the page as a raw full-page image.
fn insert_image_page<D: DocumentHandle>(
    source: &D,
    out: &mut D,
    index: usize,
    dpi: u32,
) -> Result<(), EngineError> {
    let bitmap = source.rasterize(index, dpi)?;
    out.append_image_page(&bitmap, dpi)
}

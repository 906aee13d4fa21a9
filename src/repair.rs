//! The repair orchestrator: the end-to-end run from damaged input to
//! repaired output plus JSON report.
//!
//! ## Run shape
//!
//! 1. **Pre-repair resave** (optional): reopen the input and write it back
//!    through a structure-rewriting save. This alone fixes most xref and
//!    trailer damage; failure falls back to the original file and is
//!    logged, never fatal.
//! 2. **Per-page loop**: classify each source page, copy it verbatim when
//!    it has text, otherwise run the fallback chain (OCR, then raw image);
//!    optionally prune the just-appended page when blank. Exactly one
//!    [`PageRecord`] is appended per source page, in source order,
//!    whatever happens.
//! 3. **Image extraction** (optional) and **metadata merge**: both
//!    best-effort, logged on failure.
//! 4. **Final save**: write the rebuilt document with structural cleanup.
//!    Failure here is fatal.
//!
//! The report is flushed to disk exactly once per run — on failure too,
//! so the audit trail always survives.
//!
//! The core is synchronous and generic over [`DocumentEngine`]; the public
//! [`repair`] entry point moves it onto a blocking worker thread, matching
//! how rasterisation-heavy work should sit inside an async application.

use crate::config::RepairConfig;
use crate::engine::pdfium::PdfiumEngine;
use crate::engine::{DocumentEngine, DocumentHandle, DocumentInfo};
use crate::error::RepairError;
use crate::ocr::{OcrEngine, TesseractOcr};
use crate::output::{RepairOutput, RepairStats};
use crate::pipeline::classify::{classify, PageClass};
use crate::pipeline::fallback::reconstruct_page;
use crate::pipeline::input::validate_input;
use crate::pipeline::metadata::resolve_metadata;
use crate::pipeline::prune::prune_if_blank;
use crate::report::{PageDecision, PageRecord, RepairReport};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// Repair `input` into `output` using the pdfium engine.
///
/// Runs the blocking repair core on a worker thread via
/// `tokio::task::spawn_blocking`, so it is safe to call from an async
/// context without stalling the executor.
///
/// # Example
/// ```no_run
/// use pdfmend::RepairConfig;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), pdfmend::RepairError> {
/// let config = RepairConfig::builder().ocr(true).build()?;
/// let result = pdfmend::repair("damaged.pdf", "repaired.pdf", config).await?;
/// println!("{} pages, {} failed", result.stats.total_pages, result.stats.failed_pages);
/// # Ok(())
/// # }
/// ```
pub async fn repair(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: RepairConfig,
) -> Result<RepairOutput, RepairError> {
    let input = input.as_ref().to_path_buf();
    let output = output.as_ref().to_path_buf();
    tokio::task::spawn_blocking(move || repair_sync(&input, &output, &config))
        .await
        .map_err(|e| RepairError::Internal(format!("repair task panicked: {e}")))?
}

/// Blocking variant of [`repair`] for synchronous callers.
pub fn repair_sync(
    input: &Path,
    output: &Path,
    config: &RepairConfig,
) -> Result<RepairOutput, RepairError> {
    let input = validate_input(input)?;
    let engine = PdfiumEngine;
    let ocr = config.ocr.then(|| TesseractOcr::new(config.ocr_timeout_secs));
    let ocr: Option<&dyn OcrEngine> = ocr.as_ref().map(|o| o as &dyn OcrEngine);
    run_repair(&engine, ocr, &input, output, config)
}

/// Open `input` and return its page count and properties without repairing.
pub fn inspect(input: &Path, password: Option<&str>) -> Result<DocumentInfo, RepairError> {
    let input = validate_input(input)?;
    let engine = PdfiumEngine;
    let doc = engine
        .open(&input, password)
        .map_err(|e| RepairError::UnreadableInput {
            path: input.clone(),
            detail: e.to_string(),
        })?;
    let properties = doc.properties().unwrap_or_default();
    Ok(DocumentInfo {
        page_count: doc.page_count(),
        properties,
    })
}

/// The engine-generic repair core.
///
/// `ocr` is only consulted when `config.ocr` is set; passing an engine
/// that fails every recognition is how "OCR requested but unavailable"
/// degrades — per page, to the raw-image fallback, never fatally.
pub fn run_repair<E: DocumentEngine>(
    engine: &E,
    ocr: Option<&dyn OcrEngine>,
    input: &Path,
    output: &Path,
    config: &RepairConfig,
) -> Result<RepairOutput, RepairError> {
    let started = Instant::now();
    let mut report = RepairReport::new(input.display().to_string())
        .with_observer(config.observer.clone());
    let report_path = config
        .report_path
        .clone()
        .unwrap_or_else(|| default_report_path(input));
    report.add_action(format!("Starting repair of {}", input.display()));

    let result = run_stages(engine, ocr, input, output, config, &mut report);

    match result {
        Ok(mut stats) => {
            stats.duration_ms = started.elapsed().as_millis() as u64;
            report.save(&report_path)?;
            if let Some(ref obs) = config.observer {
                obs.on_run_complete(stats.total_pages, stats.failed_pages);
            }
            info!(
                "Repair complete: {} pages in {}ms ({} failed)",
                stats.total_pages, stats.duration_ms, stats.failed_pages
            );
            Ok(RepairOutput {
                output_path: output.to_path_buf(),
                report_path: Some(report_path),
                stats,
                report,
            })
        }
        Err(e) => {
            report.add_error(format!("Repair failed: {e}"));
            if let Err(save_err) = report.save(&report_path) {
                warn!("Could not write report after failure: {save_err}");
            }
            Err(e)
        }
    }
}

/// Everything between input validation and the report flush.
fn run_stages<E: DocumentEngine>(
    engine: &E,
    ocr: Option<&dyn OcrEngine>,
    input: &Path,
    output: &Path,
    config: &RepairConfig,
    report: &mut RepairReport,
) -> Result<RepairStats, RepairError> {
    let ocr = if config.ocr { ocr } else { None };
    let (source, _resaved) = open_working_document(engine, input, config, report)?;

    let total = source.page_count();
    report.add_action(format!("Source document has {total} page(s)"));
    if let Some(ref obs) = config.observer {
        obs.on_run_start(total);
    }

    let mut out = engine.create().map_err(|e| {
        RepairError::Internal(format!("cannot create output document: {e}"))
    })?;
    let mut stats = RepairStats {
        total_pages: total,
        ..Default::default()
    };

    for index in 0..total {
        let page_num = index + 1;
        if let Some(ref obs) = config.observer {
            obs.on_page_start(page_num, total);
        }

        let decision = match classify(&source, index) {
            PageClass::Text { chars } => match out.copy_page_from(&source, index) {
                Ok(()) => PageDecision::Copied { text_chars: chars },
                Err(e) => {
                    report.add_error(format!(
                        "Page {page_num}: verbatim copy failed ({e}), rebuilding instead"
                    ));
                    reconstruct_page(engine, &source, &mut out, index, ocr, config)
                }
            },
            PageClass::NoText => reconstruct_page(engine, &source, &mut out, index, ocr, config),
        };

        let mut record = PageRecord::new(page_num, decision);
        if config.remove_blank && record.decision.appended_page() {
            match prune_if_blank(&mut out) {
                Ok(removed) => record.removed_blank = removed,
                Err(e) => {
                    report.add_error(format!("Page {page_num}: blank-page check failed: {e}"))
                }
            }
        }

        match &record.decision {
            PageDecision::Copied { text_chars } => {
                report.add_action(format!("Page {page_num}: copied verbatim ({text_chars} chars)"))
            }
            PageDecision::OcrApplied => {
                report.add_action(format!("Page {page_num}: OCR reconstruction applied"))
            }
            PageDecision::OcrFailedFallbackImage { ocr_error } => report.add_action(format!(
                "Page {page_num}: OCR failed ({ocr_error}), inserted raw page image"
            )),
            PageDecision::ImageInserted => {
                report.add_action(format!("Page {page_num}: inserted raw page image"))
            }
            PageDecision::ImageInsertFailed { error } => {
                report.add_error(format!("Page {page_num}: could not rebuild page: {error}"))
            }
        }
        if record.removed_blank {
            report.add_action(format!("Page {page_num}: removed blank output page"));
            stats.removed_blank_pages += 1;
        }

        stats.record(&record.decision);
        report.add_page(record, total);
    }

    if let Some(ref dir) = config.extract_images_dir {
        extract_images(&source, dir, report);
    }

    merge_metadata(&source, &mut out, input, report);

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| RepairError::SerializeFailed {
                path: output.to_path_buf(),
                detail: format!("create parent directory: {e}"),
            })?;
        }
    }
    out.save(output, true).map_err(|e| RepairError::SerializeFailed {
        path: output.to_path_buf(),
        detail: e.to_string(),
    })?;
    report.add_action(format!("Saved repaired document to {}", output.display()));

    Ok(stats)
}

/// Open the document the page loop will read from.
///
/// With `resave` enabled, first attempt a structural resave to a temp file
/// and reopen that. The temp file must outlive the returned handle, so it
/// rides along in the tuple.
fn open_working_document<E: DocumentEngine>(
    engine: &E,
    input: &Path,
    config: &RepairConfig,
    report: &mut RepairReport,
) -> Result<(E::Doc, Option<NamedTempFile>), RepairError> {
    if config.resave {
        match resave_to_temp(engine, input, config) {
            Ok((doc, tmp)) => {
                report.add_action("Structural resave of input succeeded");
                return Ok((doc, Some(tmp)));
            }
            Err(e) => report.add_error(format!(
                "Structural resave failed ({e}); continuing with original input"
            )),
        }
    }
    let doc = engine
        .open(input, config.password.as_deref())
        .map_err(|e| RepairError::UnreadableInput {
            path: input.to_path_buf(),
            detail: e.to_string(),
        })?;
    Ok((doc, None))
}

fn resave_to_temp<E: DocumentEngine>(
    engine: &E,
    input: &Path,
    config: &RepairConfig,
) -> Result<(E::Doc, NamedTempFile), crate::error::EngineError> {
    let doc = engine.open(input, config.password.as_deref())?;
    let tmp = NamedTempFile::new().map_err(|e| {
        crate::error::EngineError::Save {
            path: PathBuf::from("<temp>"),
            detail: e.to_string(),
        }
    })?;
    doc.save(tmp.path(), true)?;
    // The resaved copy is never encrypted, so no password on reopen.
    let reopened = engine.open(tmp.path(), None)?;
    Ok((reopened, tmp))
}

/// Export every decodable embedded image of the source document.
fn extract_images<D: DocumentHandle>(source: &D, dir: &Path, report: &mut RepairReport) {
    if let Err(e) = std::fs::create_dir_all(dir) {
        report.add_error(format!(
            "Cannot create image directory {}: {e}",
            dir.display()
        ));
        return;
    }
    let mut saved = 0usize;
    for index in 0..source.page_count() {
        let images = match source.page_images(index) {
            Ok(images) => images,
            Err(e) => {
                report.add_error(format!("Page {}: image extraction failed: {e}", index + 1));
                continue;
            }
        };
        for (m, image) in images.iter().enumerate() {
            let path = dir.join(format!("page{}_img{}.png", index + 1, m + 1));
            match image.save(&path) {
                Ok(()) => saved += 1,
                Err(e) => report.add_error(format!(
                    "Cannot write {}: {e}",
                    path.display()
                )),
            }
        }
    }
    report.add_action(format!(
        "Extracted {saved} embedded image(s) to {}",
        dir.display()
    ));
}

/// Stamp resolved properties onto the output document. Best-effort.
fn merge_metadata<D: DocumentHandle>(
    source: &D,
    out: &mut D,
    input: &Path,
    report: &mut RepairReport,
) {
    let props = match source.properties() {
        Ok(props) => props,
        Err(e) => {
            report.add_error(format!("Cannot read source properties ({e}); using defaults"));
            Default::default()
        }
    };
    let resolved = resolve_metadata(&props, input);
    match out.set_properties(&resolved) {
        Ok(()) => report.add_action(format!(
            "Set document properties (title: {:?})",
            resolved.title.as_deref().unwrap_or("")
        )),
        Err(e) => report.add_error(format!("Cannot set document properties: {e}")),
    }
}

fn default_report_path(input: &Path) -> PathBuf {
    let mut s = input.as_os_str().to_os_string();
    s.push(".repair_report.json");
    PathBuf::from(s)
}

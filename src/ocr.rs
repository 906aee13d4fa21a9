//! OCR boundary: turn a rasterised page into a searchable single-page PDF.
//!
//! The trait keeps the repair pipeline ignorant of which engine does the
//! recognising; the production implementation shells out to the `tesseract`
//! binary, whose built-in PDF renderer produces exactly the artefact the
//! fallback chain needs — a one-page PDF with the recognised text layered
//! invisibly over the page image.
//!
//! ## Why a subprocess instead of a binding crate?
//!
//! Linking libtesseract ties the build to a system C++ toolchain and a
//! matching leptonica, for one call per text-less page. The CLI is stable,
//! ubiquitous in distro packages, and trivially sandboxed by a kill-on-
//! deadline — a hung recognition must never stall the whole run.

use crate::error::OcrError;
use image::DynamicImage;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Converts a page bitmap plus a language code into single-page PDF bytes.
pub trait OcrEngine {
    fn recognize(&self, image: &DynamicImage, lang: &str, dpi: u32) -> Result<Vec<u8>, OcrError>;
}

/// OCR via the system `tesseract` binary.
///
/// Discovery happens once at construction; a missing binary is reported per
/// recognition call as [`OcrError::EngineUnavailable`], so the fallback
/// chain degrades every text-less page to raw-image insertion instead of
/// aborting the run.
pub struct TesseractOcr {
    binary: Option<PathBuf>,
    /// Kill the child and fail the page after this long.
    timeout: Duration,
}

impl TesseractOcr {
    pub fn new(timeout_secs: u64) -> Self {
        let binary = which::which("tesseract").ok();
        match &binary {
            Some(path) => debug!("Found tesseract at {}", path.display()),
            None => warn!("tesseract not found in PATH; OCR will fall back to raw images"),
        }
        Self {
            binary,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Whether a tesseract binary was found.
    pub fn is_available(&self) -> bool {
        self.binary.is_some()
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &DynamicImage, lang: &str, dpi: u32) -> Result<Vec<u8>, OcrError> {
        let binary = self.binary.as_ref().ok_or_else(|| {
            OcrError::EngineUnavailable(
                "tesseract not found in PATH (install tesseract-ocr)".into(),
            )
        })?;

        let workdir = tempfile::tempdir()
            .map_err(|e| OcrError::RecognitionFailed(format!("tempdir: {e}")))?;
        let png_path = workdir.path().join("page.png");
        let out_base = workdir.path().join("page");
        let out_pdf = workdir.path().join("page.pdf");

        image
            .save(&png_path)
            .map_err(|e| OcrError::RecognitionFailed(format!("PNG staging: {e}")))?;

        // `tesseract page.png page --dpi N -l LANG pdf` writes page.pdf.
        let mut child = Command::new(binary)
            .arg(&png_path)
            .arg(&out_base)
            .arg("--dpi")
            .arg(dpi.to_string())
            .arg("-l")
            .arg(lang)
            .arg("pdf")
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| OcrError::RecognitionFailed(format!("failed to start: {e}")))?;

        let status = wait_with_deadline(&mut child, self.timeout)?;

        if !status.success() {
            let stderr = child
                .stderr
                .take()
                .and_then(|mut s| {
                    use std::io::Read;
                    let mut buf = String::new();
                    s.read_to_string(&mut buf).ok().map(|_| buf)
                })
                .unwrap_or_default();
            return Err(OcrError::RecognitionFailed(format!(
                "exit code {}: {}",
                status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        let bytes = std::fs::read(&out_pdf)
            .map_err(|e| OcrError::MalformedResult(format!("no PDF produced: {e}")))?;
        if !bytes.starts_with(b"%PDF") {
            return Err(OcrError::MalformedResult(
                "engine output is not a PDF".into(),
            ));
        }
        debug!("OCR produced {} bytes of PDF", bytes.len());
        Ok(bytes)
    }
}

/// Poll the child until it exits or the deadline passes; kill on expiry.
fn wait_with_deadline(
    child: &mut std::process::Child,
    timeout: Duration,
) -> Result<std::process::ExitStatus, OcrError> {
    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if started.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(OcrError::Timeout {
                        secs: timeout.as_secs(),
                    });
                }
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                return Err(OcrError::RecognitionFailed(format!("wait failed: {e}")));
            }
        }
    }
}

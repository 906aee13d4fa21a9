//! Configuration types for a PDF repair run.
//!
//! All repair behaviour is controlled through [`RepairConfig`], built via
//! its [`RepairConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across threads, serialise them for logging, and
//! diff two runs to understand why their reports differ.
//!
//! # Design choice: builder over constructor
//! A many-field constructor breaks on every new field. The builder lets
//! callers set only what they care about and rely on documented defaults
//! for the rest, with validation in `build()`.

use crate::error::RepairError;
use crate::observer::ObserverHandle;
use std::fmt;
use std::path::PathBuf;

/// Configuration for one repair run.
///
/// Built via [`RepairConfig::builder()`] or [`RepairConfig::default()`].
///
/// # Example
/// ```rust
/// use pdfmend::RepairConfig;
///
/// let config = RepairConfig::builder()
///     .dpi(300)
///     .ocr(true)
///     .ocr_lang("deu")
///     .remove_blank(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct RepairConfig {
    /// Rasterisation DPI for OCR input and image re-insertion. Range: 72–1200. Default: 300.
    ///
    /// 300 DPI is the classic OCR sweet spot: enough pixel density for
    /// tesseract to resolve body text reliably without the multi-hundred-MB
    /// bitmaps that 600+ DPI produces on large pages. Drop to 150 for
    /// speed on clean scans; raise for small-font documents.
    pub dpi: u32,

    /// Attempt OCR reconstruction for pages without text. Default: false.
    ///
    /// Off by default because OCR needs an external engine installed. With
    /// OCR off, text-less pages are still preserved — as raw page images —
    /// so visual content is never dropped either way.
    pub ocr: bool,

    /// OCR language code passed to the engine (e.g. "eng", "deu", "eng+fra").
    /// Default: "eng".
    pub ocr_lang: String,

    /// Per-page OCR deadline in seconds. Default: 120.
    ///
    /// A hung engine would otherwise stall the whole run on one page. On
    /// expiry the OCR child is killed and the page degrades to the raw-image
    /// fallback, exactly like any other OCR failure.
    pub ocr_timeout_secs: u64,

    /// Remove a just-appended output page that carries no text. Default: false.
    ///
    /// The pruner only ever inspects the page appended for the current
    /// source page, and keeps it whenever the check itself fails — removal
    /// on uncertain information would be silent data loss.
    pub remove_blank: bool,

    /// Attempt a structural resave of the input before page processing. Default: true.
    ///
    /// A plain reopen-and-cleanup-save through the engine often fixes xref
    /// and minor structural damage on its own, which gives the per-page
    /// pipeline a healthier document to read from. Failure falls back to
    /// the original input and is logged, never fatal.
    pub resave: bool,

    /// Directory to export embedded source images into (`page{N}_img{M}.png`).
    /// Default: None (no extraction).
    pub extract_images_dir: Option<PathBuf>,

    /// PDF user password for encrypted inputs.
    pub password: Option<String>,

    /// Where to write the JSON repair report.
    /// Default: None — derived as `<input>.repair_report.json`.
    pub report_path: Option<PathBuf>,

    /// Observer mirroring report appends and page outcomes. Default: None.
    pub observer: Option<ObserverHandle>,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            ocr: false,
            ocr_lang: "eng".to_string(),
            ocr_timeout_secs: 120,
            remove_blank: false,
            resave: true,
            extract_images_dir: None,
            password: None,
            report_path: None,
            observer: None,
        }
    }
}

impl fmt::Debug for RepairConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepairConfig")
            .field("dpi", &self.dpi)
            .field("ocr", &self.ocr)
            .field("ocr_lang", &self.ocr_lang)
            .field("ocr_timeout_secs", &self.ocr_timeout_secs)
            .field("remove_blank", &self.remove_blank)
            .field("resave", &self.resave)
            .field("extract_images_dir", &self.extract_images_dir)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("report_path", &self.report_path)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn RepairObserver>"))
            .finish()
    }
}

impl RepairConfig {
    /// Create a new builder for `RepairConfig`.
    pub fn builder() -> RepairConfigBuilder {
        RepairConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RepairConfig`].
#[derive(Debug)]
pub struct RepairConfigBuilder {
    config: RepairConfig,
}

impl RepairConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 1200);
        self
    }

    pub fn ocr(mut self, v: bool) -> Self {
        self.config.ocr = v;
        self
    }

    pub fn ocr_lang(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_lang = lang.into();
        self
    }

    pub fn ocr_timeout_secs(mut self, secs: u64) -> Self {
        self.config.ocr_timeout_secs = secs.max(1);
        self
    }

    pub fn remove_blank(mut self, v: bool) -> Self {
        self.config.remove_blank = v;
        self
    }

    pub fn resave(mut self, v: bool) -> Self {
        self.config.resave = v;
        self
    }

    pub fn extract_images_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.extract_images_dir = Some(dir.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.report_path = Some(path.into());
        self
    }

    pub fn observer(mut self, observer: ObserverHandle) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RepairConfig, RepairError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 1200 {
            return Err(RepairError::InvalidConfig(format!(
                "DPI must be 72–1200, got {}",
                c.dpi
            )));
        }
        if c.ocr_lang.trim().is_empty() {
            return Err(RepairError::InvalidConfig(
                "OCR language must be non-empty".into(),
            ));
        }
        Ok(self.config)
    }
}

//! The document-engine boundary: the trait seam between the repair pipeline
//! and whatever library actually parses, renders, and serialises PDFs.
//!
//! The repair orchestrator is generic over [`DocumentEngine`], so the core
//! decision pipeline — classify, fallback chain, prune, metadata merge — is
//! testable against an in-memory engine with scripted failures, while
//! production runs use the pdfium-backed [`pdfium::PdfiumEngine`].
//!
//! ## Why an associated `Doc` type instead of trait objects?
//!
//! Page copying (`copy_page_from`, `append_document`) moves content between
//! two documents of the *same* engine; expressing that with `dyn` handles
//! would force downcasting at every call site. The associated type keeps
//! the same-engine constraint in the signature and costs nothing, because
//! the orchestrator never needs to mix engines within one run.

use crate::error::EngineError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod pdfium;

#[cfg(test)]
pub(crate) mod mock;

/// The key/value document properties the repair pipeline reads and rewrites.
///
/// All fields are optional on read; [`crate::pipeline::metadata`] resolves
/// them to concrete values before they are written to the output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentProperties {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
}

/// Document summary returned by [`crate::repair::inspect`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub page_count: usize,
    #[serde(flatten)]
    pub properties: DocumentProperties,
}

/// Opens and creates documents for one engine implementation.
pub trait DocumentEngine {
    type Doc: DocumentHandle;

    /// Open a document from disk.
    fn open(&self, path: &Path, password: Option<&str>) -> Result<Self::Doc, EngineError>;

    /// Open a document from in-memory bytes (e.g. an OCR engine's output).
    fn open_bytes(&self, bytes: Vec<u8>) -> Result<Self::Doc, EngineError>;

    /// Create a new, empty document.
    fn create(&self) -> Result<Self::Doc, EngineError>;
}

/// One open document.
///
/// Page indices are 0-based at this boundary; the report layer translates
/// to the 1-based numbering users see.
pub trait DocumentHandle {
    fn page_count(&self) -> usize;

    /// Extract the text content of one page.
    fn page_text(&self, index: usize) -> Result<String, EngineError>;

    /// Render one page to a bitmap at the given resolution.
    fn rasterize(&self, index: usize, dpi: u32) -> Result<DynamicImage, EngineError>;

    /// Decode the embedded images of one page (for image extraction).
    fn page_images(&self, index: usize) -> Result<Vec<DynamicImage>, EngineError>;

    /// Read the document's properties.
    fn properties(&self) -> Result<DocumentProperties, EngineError>;

    /// Copy one page verbatim from `source`, appending it to this document.
    fn copy_page_from(&mut self, source: &Self, index: usize) -> Result<(), EngineError>
    where
        Self: Sized;

    /// Append every page of `source` to this document.
    fn append_document(&mut self, source: &Self) -> Result<(), EngineError>
    where
        Self: Sized;

    /// Append a new page consisting of a single full-page image.
    ///
    /// The page takes the physical size the bitmap had at `dpi`, so a page
    /// rasterised and re-inserted at the same DPI keeps its dimensions.
    fn append_image_page(&mut self, image: &DynamicImage, dpi: u32) -> Result<(), EngineError>;

    /// Delete the last page of this document.
    fn delete_last_page(&mut self) -> Result<(), EngineError>;

    /// Stage properties to be written into the document on save.
    fn set_properties(&mut self, props: &DocumentProperties) -> Result<(), EngineError>;

    /// Serialise the document to `path`.
    ///
    /// With `structural_cleanup` the engine rewrites the cross-reference
    /// structure, discards unreachable objects, and recompresses streams —
    /// the save mode both the pre-repair resave and the final output use.
    fn save(&self, path: &Path, structural_cleanup: bool) -> Result<(), EngineError>;
}

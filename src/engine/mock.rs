//! In-memory document engine for unit tests.
//!
//! Documents are plain serde structs; "serialised" documents are their JSON
//! encoding, which also serves as the byte format the mock OCR engine
//! returns and [`MemEngine::open_bytes`] parses. Failure behaviour is
//! scripted through flags on the engine and per-page fields, so tests can
//! drive every branch of the repair pipeline without pdfium.

use super::{DocumentEngine, DocumentHandle, DocumentProperties};
use crate::error::{EngineError, OcrError};
use crate::ocr::OcrEngine;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One page of an in-memory document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemPage {
    /// Extracted text; `None` simulates a text-extraction failure.
    pub text: Option<String>,
    /// When set, rasterisation of this page fails.
    #[serde(default)]
    pub raster_fails: bool,
    /// When set, verbatim copying of this page fails.
    #[serde(default)]
    pub copy_fails: bool,
}

impl MemPage {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    pub fn blank() -> Self {
        Self::with_text("")
    }
}

/// An in-memory document: a page list plus properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemDoc {
    pub pages: Vec<MemPage>,
    #[serde(default)]
    pub properties: DocumentProperties,
    /// When set, appending an image page to this document fails.
    #[serde(default)]
    pub image_append_fails: bool,
    /// When set, saving this document fails.
    #[serde(default)]
    pub save_fails: bool,
}

impl MemDoc {
    pub fn of_pages(pages: Vec<MemPage>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    /// Write this document as a JSON fixture the engine can `open`.
    pub fn write_to(&self, path: &Path) {
        std::fs::write(path, serde_json::to_vec(self).unwrap()).unwrap();
    }
}

/// The scripted engine.
#[derive(Debug, Default)]
pub struct MemEngine {
    /// Fail every `open` (unreadable input).
    pub fail_open: bool,
    /// Created (output) documents fail to save — drives the fatal
    /// serialize-failure path without touching the source fixture.
    pub created_docs_fail_save: bool,
}

impl DocumentEngine for MemEngine {
    type Doc = MemDoc;

    fn open(&self, path: &Path, _password: Option<&str>) -> Result<MemDoc, EngineError> {
        if self.fail_open {
            return Err(EngineError::Open("scripted open failure".into()));
        }
        let bytes = std::fs::read(path)
            .map_err(|e| EngineError::Open(format!("{}: {e}", path.display())))?;
        serde_json::from_slice(&bytes).map_err(|e| EngineError::Open(format!("parse: {e}")))
    }

    fn open_bytes(&self, bytes: Vec<u8>) -> Result<MemDoc, EngineError> {
        serde_json::from_slice(&bytes).map_err(|e| EngineError::Open(format!("parse: {e}")))
    }

    fn create(&self) -> Result<MemDoc, EngineError> {
        Ok(MemDoc {
            save_fails: self.created_docs_fail_save,
            ..Default::default()
        })
    }
}

impl DocumentHandle for MemDoc {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String, EngineError> {
        let page = self.pages.get(index).ok_or(EngineError::PageOutOfRange {
            page: index + 1,
            total: self.pages.len(),
        })?;
        page.text.clone().ok_or(EngineError::TextExtraction {
            page: index + 1,
            detail: "scripted extraction failure".into(),
        })
    }

    fn rasterize(&self, index: usize, _dpi: u32) -> Result<DynamicImage, EngineError> {
        let page = self.pages.get(index).ok_or(EngineError::PageOutOfRange {
            page: index + 1,
            total: self.pages.len(),
        })?;
        if page.raster_fails {
            return Err(EngineError::Rasterisation {
                page: index + 1,
                detail: "scripted rasterisation failure".into(),
            });
        }
        Ok(DynamicImage::new_rgb8(8, 8))
    }

    fn page_images(&self, _index: usize) -> Result<Vec<DynamicImage>, EngineError> {
        Ok(vec![DynamicImage::new_rgb8(4, 4)])
    }

    fn properties(&self) -> Result<DocumentProperties, EngineError> {
        Ok(self.properties.clone())
    }

    fn copy_page_from(&mut self, source: &Self, index: usize) -> Result<(), EngineError> {
        let page = source
            .pages
            .get(index)
            .ok_or(EngineError::PageOutOfRange {
                page: index + 1,
                total: source.pages.len(),
            })?;
        if page.copy_fails {
            return Err(EngineError::Assembly(format!(
                "scripted copy failure for page {}",
                index + 1
            )));
        }
        self.pages.push(page.clone());
        Ok(())
    }

    fn append_document(&mut self, source: &Self) -> Result<(), EngineError> {
        self.pages.extend(source.pages.iter().cloned());
        Ok(())
    }

    fn append_image_page(&mut self, _image: &DynamicImage, _dpi: u32) -> Result<(), EngineError> {
        if self.image_append_fails {
            return Err(EngineError::Assembly("scripted image-append failure".into()));
        }
        // A raw image page has no extractable text.
        self.pages.push(MemPage::blank());
        Ok(())
    }

    fn delete_last_page(&mut self) -> Result<(), EngineError> {
        self.pages
            .pop()
            .map(|_| ())
            .ok_or_else(|| EngineError::Assembly("document has no pages".into()))
    }

    fn set_properties(&mut self, props: &DocumentProperties) -> Result<(), EngineError> {
        self.properties = props.clone();
        Ok(())
    }

    fn save(&self, path: &Path, _structural_cleanup: bool) -> Result<(), EngineError> {
        if self.save_fails {
            return Err(EngineError::Save {
                path: path.to_path_buf(),
                detail: "scripted save failure".into(),
            });
        }
        std::fs::write(path, serde_json::to_vec(self).unwrap()).map_err(|e| EngineError::Save {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }
}

/// Scripted OCR engine. Returns JSON-encoded [`MemDoc`] bytes, which
/// [`MemEngine::open_bytes`] parses — mirroring how the real chain feeds
/// tesseract's PDF output back through the document engine.
pub struct MockOcr {
    pub behaviour: MockOcrBehaviour,
}

pub enum MockOcrBehaviour {
    /// Produce a single-page document with the given text.
    Succeed(String),
    /// Produce a single-page document whose page is blank.
    SucceedBlank,
    /// Fail with the given error.
    Fail(OcrError),
}

impl MockOcr {
    pub fn succeeding(text: &str) -> Self {
        Self {
            behaviour: MockOcrBehaviour::Succeed(text.to_string()),
        }
    }

    pub fn blank() -> Self {
        Self {
            behaviour: MockOcrBehaviour::SucceedBlank,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            behaviour: MockOcrBehaviour::Fail(OcrError::EngineUnavailable(
                "no engine in test".into(),
            )),
        }
    }
}

impl OcrEngine for MockOcr {
    fn recognize(
        &self,
        _image: &DynamicImage,
        _lang: &str,
        _dpi: u32,
    ) -> Result<Vec<u8>, OcrError> {
        match &self.behaviour {
            MockOcrBehaviour::Succeed(text) => {
                let doc = MemDoc::of_pages(vec![MemPage::with_text(text)]);
                Ok(serde_json::to_vec(&doc).unwrap())
            }
            MockOcrBehaviour::SucceedBlank => {
                let doc = MemDoc::of_pages(vec![MemPage::blank()]);
                Ok(serde_json::to_vec(&doc).unwrap())
            }
            MockOcrBehaviour::Fail(e) => Err(e.clone()),
        }
    }
}

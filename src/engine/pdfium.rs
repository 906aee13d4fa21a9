//! Production document engine backed by pdfium.
//!
//! ## Why a process-wide binding?
//!
//! `pdfium-render` wraps the pdfium C++ library, which must be bound once
//! and is not cheap to re-bind per document. A `Lazy<Pdfium>` (compiled
//! with the `sync` feature, which serialises calls internally and makes
//! the binding shareable) gives every [`PdfiumDocument`] a `'static`
//! binding to borrow from, so handles can live in structs instead of being
//! confined to one function scope.
//!
//! ## Why lopdf on the way out?
//!
//! pdfium's public API can *read* document properties but not write them,
//! and its save already rewrites the cross-reference table. Metadata writes
//! and the structural-cleanup pass therefore run as a post-pass: pdfium
//! serialises to bytes, lopdf rewrites the Info dictionary, prunes
//! unreachable objects, renumbers, recompresses, and writes the file.

use super::{DocumentEngine, DocumentHandle, DocumentProperties};
use crate::error::EngineError;
use image::DynamicImage;
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

static PDFIUM: Lazy<Pdfium> = Lazy::new(Pdfium::default);

/// The `'static` binding ties the document lifetime to its password
/// reference, so an owned copy is leaked per encrypted open. Encrypted
/// opens are rare (at most two per run) and the copies are tiny.
fn static_password(password: Option<&str>) -> Option<&'static str> {
    password.map(|p| &*Box::leak(p.to_owned().into_boxed_str()))
}

/// The pdfium-backed engine. Stateless; all state lives in the documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumEngine;

/// One open pdfium document, plus properties staged for the next save.
pub struct PdfiumDocument {
    doc: PdfDocument<'static>,
    // pdfium reads lazily from the backing file, so a document opened from
    // bytes must keep its temp file alive for the handle's lifetime.
    _backing: Option<NamedTempFile>,
    pending_props: Option<DocumentProperties>,
}

impl DocumentEngine for PdfiumEngine {
    type Doc = PdfiumDocument;

    fn open(&self, path: &Path, password: Option<&str>) -> Result<Self::Doc, EngineError> {
        let doc = PDFIUM
            .load_pdf_from_file(path, static_password(password))
            .map_err(|e| EngineError::Open(format!("{e:?}")))?;
        Ok(PdfiumDocument {
            doc,
            _backing: None,
            pending_props: None,
        })
    }

    fn open_bytes(&self, bytes: Vec<u8>) -> Result<Self::Doc, EngineError> {
        let mut tmp =
            NamedTempFile::new().map_err(|e| EngineError::Open(format!("tempfile: {e}")))?;
        tmp.write_all(&bytes)
            .map_err(|e| EngineError::Open(format!("tempfile write: {e}")))?;
        let doc = PDFIUM
            .load_pdf_from_file(tmp.path(), None)
            .map_err(|e| EngineError::Open(format!("{e:?}")))?;
        Ok(PdfiumDocument {
            doc,
            _backing: Some(tmp),
            pending_props: None,
        })
    }

    fn create(&self) -> Result<Self::Doc, EngineError> {
        let doc = PDFIUM
            .create_new_pdf()
            .map_err(|e| EngineError::Open(format!("{e:?}")))?;
        Ok(PdfiumDocument {
            doc,
            _backing: None,
            pending_props: None,
        })
    }
}

impl PdfiumDocument {
    fn page_index(&self, index: usize) -> Result<u16, EngineError> {
        let total = self.page_count();
        if index >= total {
            return Err(EngineError::PageOutOfRange {
                page: index + 1,
                total,
            });
        }
        Ok(index as u16)
    }
}

impl DocumentHandle for PdfiumDocument {
    fn page_count(&self) -> usize {
        self.doc.pages().len() as usize
    }

    fn page_text(&self, index: usize) -> Result<String, EngineError> {
        let idx = self.page_index(index)?;
        let page = self
            .doc
            .pages()
            .get(idx)
            .map_err(|e| EngineError::TextExtraction {
                page: index + 1,
                detail: format!("{e:?}"),
            })?;
        let text = page.text().map_err(|e| EngineError::TextExtraction {
            page: index + 1,
            detail: format!("{e:?}"),
        })?;
        Ok(text.all())
    }

    fn rasterize(&self, index: usize, dpi: u32) -> Result<DynamicImage, EngineError> {
        let idx = self.page_index(index)?;
        let page = self
            .doc
            .pages()
            .get(idx)
            .map_err(|e| EngineError::Rasterisation {
                page: index + 1,
                detail: format!("{e:?}"),
            })?;

        let render_config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / 72.0);

        let bitmap =
            page.render_with_config(&render_config)
                .map_err(|e| EngineError::Rasterisation {
                    page: index + 1,
                    detail: format!("{e:?}"),
                })?;

        let image = bitmap.as_image();
        debug!(
            "Rasterised page {} at {} dpi → {}x{} px",
            index + 1,
            dpi,
            image.width(),
            image.height()
        );
        Ok(image)
    }

    fn page_images(&self, index: usize) -> Result<Vec<DynamicImage>, EngineError> {
        let idx = self.page_index(index)?;
        let page = self.doc.pages().get(idx).map_err(|e| {
            EngineError::Assembly(format!("page {} access: {e:?}", index + 1))
        })?;

        let mut images = Vec::new();
        for object in page.objects().iter() {
            if let Some(image_obj) = object.as_image_object() {
                match image_obj.get_raw_image() {
                    Ok(img) => images.push(img),
                    // A single undecodable XObject should not abort the
                    // extraction of its siblings.
                    Err(e) => warn!("Skipping undecodable image on page {}: {e:?}", index + 1),
                }
            }
        }
        Ok(images)
    }

    fn properties(&self) -> Result<DocumentProperties, EngineError> {
        let metadata = self.doc.metadata();

        let get_tag = |tag: PdfDocumentMetadataTagType| -> Option<String> {
            metadata.get(tag).and_then(|t| {
                let v = t.value().to_string();
                if v.is_empty() {
                    None
                } else {
                    Some(v)
                }
            })
        };

        Ok(DocumentProperties {
            title: get_tag(PdfDocumentMetadataTagType::Title),
            author: get_tag(PdfDocumentMetadataTagType::Author),
            subject: get_tag(PdfDocumentMetadataTagType::Subject),
            keywords: get_tag(PdfDocumentMetadataTagType::Keywords),
            creator: get_tag(PdfDocumentMetadataTagType::Creator),
            producer: get_tag(PdfDocumentMetadataTagType::Producer),
        })
    }

    fn copy_page_from(&mut self, source: &Self, index: usize) -> Result<(), EngineError> {
        let src_idx = source.page_index(index)?;
        let dest_idx = self.page_count() as u16;
        self.doc
            .pages_mut()
            .copy_page_from_document(&source.doc, src_idx, dest_idx)
            .map_err(|e| EngineError::Assembly(format!("copy of page {}: {e:?}", index + 1)))
    }

    fn append_document(&mut self, source: &Self) -> Result<(), EngineError> {
        self.doc
            .pages_mut()
            .append(&source.doc)
            .map_err(|e| EngineError::Assembly(format!("append: {e:?}")))
    }

    fn append_image_page(&mut self, image: &DynamicImage, dpi: u32) -> Result<(), EngineError> {
        // Physical size in points so a page rasterised at `dpi` and
        // re-inserted here keeps its original dimensions.
        let width_pts = image.width() as f32 * 72.0 / dpi as f32;
        let height_pts = image.height() as f32 * 72.0 / dpi as f32;

        let object = PdfPageImageObject::new_with_size(
            &self.doc,
            image,
            PdfPoints::new(width_pts),
            PdfPoints::new(height_pts),
        )
        .map_err(|e| EngineError::Assembly(format!("image object: {e:?}")))?;

        let mut page = self
            .doc
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::Custom(
                PdfPoints::new(width_pts),
                PdfPoints::new(height_pts),
            ))
            .map_err(|e| EngineError::Assembly(format!("new image page: {e:?}")))?;

        page.objects_mut()
            .add_image_object(object)
            .map_err(|e| EngineError::Assembly(format!("add image object: {e:?}")))?;
        Ok(())
    }

    fn delete_last_page(&mut self) -> Result<(), EngineError> {
        let total = self.page_count();
        if total == 0 {
            return Err(EngineError::Assembly("document has no pages".into()));
        }
        let page = self
            .doc
            .pages_mut()
            .get((total - 1) as u16)
            .map_err(|e| EngineError::Assembly(format!("last page access: {e:?}")))?;
        page.delete()
            .map_err(|e| EngineError::Assembly(format!("delete last page: {e:?}")))
    }

    fn set_properties(&mut self, props: &DocumentProperties) -> Result<(), EngineError> {
        // pdfium cannot write the Info dictionary; staged here and applied
        // by the lopdf post-pass in `save`.
        self.pending_props = Some(props.clone());
        Ok(())
    }

    fn save(&self, path: &Path, structural_cleanup: bool) -> Result<(), EngineError> {
        let bytes = self.doc.save_to_bytes().map_err(|e| EngineError::Save {
            path: path.to_path_buf(),
            detail: format!("{e:?}"),
        })?;

        if self.pending_props.is_none() && !structural_cleanup {
            return std::fs::write(path, &bytes).map_err(|e| EngineError::Save {
                path: path.to_path_buf(),
                detail: e.to_string(),
            });
        }

        rewrite_with_lopdf(&bytes, self.pending_props.as_ref(), structural_cleanup, path)
    }
}

/// Post-pass over pdfium's output: Info-dictionary rewrite plus the
/// structural-cleanup steps pdfium does not expose.
fn rewrite_with_lopdf(
    bytes: &[u8],
    props: Option<&DocumentProperties>,
    structural_cleanup: bool,
    path: &Path,
) -> Result<(), EngineError> {
    let mut doc = lopdf::Document::load_mem(bytes).map_err(|e| EngineError::Save {
        path: path.to_path_buf(),
        detail: format!("lopdf parse of engine output: {e}"),
    })?;

    if let Some(props) = props {
        write_info_dictionary(&mut doc, props).map_err(|e| EngineError::Properties(e))?;
    }

    if structural_cleanup {
        let pruned = doc.prune_objects();
        if !pruned.is_empty() {
            debug!("Cleanup save pruned {} unreachable objects", pruned.len());
        }
        doc.renumber_objects();
        doc.compress();
    }

    doc.save(path).map_err(|e| EngineError::Save {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    Ok(())
}

fn write_info_dictionary(
    doc: &mut lopdf::Document,
    props: &DocumentProperties,
) -> Result<(), String> {
    use lopdf::{Dictionary, Object};

    let info_id = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => *id,
        _ => {
            let id = doc.add_object(Dictionary::new());
            doc.trailer.set("Info", id);
            id
        }
    };

    let info = doc
        .get_object_mut(info_id)
        .and_then(|obj| obj.as_dict_mut())
        .map_err(|e| format!("Info dictionary: {e}"))?;

    let mut set = |key: &str, value: &Option<String>| {
        if let Some(v) = value {
            info.set(key, Object::string_literal(v.as_str()));
        }
    };
    set("Title", &props.title);
    set("Author", &props.author);
    set("Subject", &props.subject);
    set("Keywords", &props.keywords);
    set("Creator", &props.creator);
    set("Producer", &props.producer);
    Ok(())
}

//! End-to-end integration tests for pdfmend.
//!
//! These tests run the real pdfium engine against PDFs generated on the
//! fly, so they need a libpdfium available at runtime. They are gated
//! behind the `PDFMEND_E2E` environment variable so they do not run in CI
//! unless explicitly requested.
//!
//! Run with:
//!   PDFMEND_E2E=1 cargo test --test e2e -- --nocapture
//!
//! OCR paths additionally need a `tesseract` binary on PATH; tests that
//! use it skip themselves when it is missing.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use pdfmend::{inspect, repair_sync, PageDecision, RepairConfig, TesseractOcr};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless PDFMEND_E2E is set.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("PDFMEND_E2E").is_err() {
            println!("SKIP — set PDFMEND_E2E=1 to run e2e tests");
            return;
        }
    }};
}

/// Build a PDF where each entry of `page_texts` becomes one page; `None`
/// produces a page with no text content at all.
fn write_fixture(path: &Path, page_texts: &[Option<&str>]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in page_texts {
        let ops = match text {
            Some(text) => vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
            None => vec![],
        };
        let content = Content { operations: ops };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).expect("write fixture PDF");
}

fn load_report(path: &Path) -> serde_json::Value {
    serde_json::from_slice(&std::fs::read(path).expect("report file"))
        .expect("report is valid JSON")
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn inspect_reads_page_count() {
    e2e_skip_unless_ready!();
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("three.pdf");
    write_fixture(&input, &[Some("one"), Some("two"), Some("three")]);

    let info = inspect(&input, None).expect("inspect");
    assert_eq!(info.page_count, 3);
}

#[test]
fn repairs_mixed_document_without_ocr() {
    e2e_skip_unless_ready!();
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("mixed.pdf");
    let output = dir.path().join("mixed.repaired.pdf");
    let report_path = dir.path().join("report.json");
    write_fixture(&input, &[Some("Hello"), None, Some("World")]);

    let config = RepairConfig::builder()
        .report_path(&report_path)
        .build()
        .unwrap();
    let result = repair_sync(&input, &output, &config).expect("repair");

    assert_eq!(result.stats.total_pages, 3);
    assert_eq!(result.stats.copied_pages, 2);
    assert_eq!(result.stats.image_pages, 1);
    assert_eq!(result.stats.failed_pages, 0);
    assert!(output.is_file());

    // The output must reopen cleanly with all three pages.
    let info = inspect(&output, None).expect("inspect output");
    assert_eq!(info.page_count, 3);
    // Metadata was stamped during the repair.
    assert_eq!(info.properties.title.as_deref(), Some("mixed (repaired)"));

    let report = load_report(&report_path);
    let pages = report["pages"].as_array().unwrap();
    assert_eq!(pages.len(), 3);
    assert_eq!(pages[0]["action"], "copied");
    assert_eq!(pages[1]["action"], "image_inserted");
    assert_eq!(pages[2]["action"], "copied");
}

#[test]
fn report_written_next_to_input_by_default() {
    e2e_skip_unless_ready!();
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("doc.pdf");
    let output = dir.path().join("doc.repaired.pdf");
    write_fixture(&input, &[Some("only page")]);

    let result = repair_sync(&input, &output, &RepairConfig::default()).expect("repair");
    let expected: PathBuf = dir.path().join("doc.pdf.repair_report.json");
    assert_eq!(result.report_path.as_deref(), Some(expected.as_path()));
    assert!(expected.is_file());
}

#[test]
fn remove_blank_prunes_textless_reinsertions() {
    e2e_skip_unless_ready!();
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("blanky.pdf");
    let output = dir.path().join("blanky.repaired.pdf");
    write_fixture(&input, &[Some("kept"), None]);

    // Without OCR the text-less page comes back as a raw image, which has
    // no text and is therefore pruned.
    let config = RepairConfig::builder().remove_blank(true).build().unwrap();
    let result = repair_sync(&input, &output, &config).expect("repair");

    assert_eq!(result.report.pages.len(), 2);
    assert!(result.report.pages[1].removed_blank);
    assert_eq!(result.stats.removed_blank_pages, 1);

    let info = inspect(&output, None).expect("inspect output");
    assert_eq!(info.page_count, 1);
}

#[test]
fn repairs_with_ocr_reconstruction() {
    e2e_skip_unless_ready!();
    if !TesseractOcr::new(120).is_available() {
        println!("SKIP — tesseract not found on PATH");
        return;
    }
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("scan.pdf");
    let output = dir.path().join("scan.repaired.pdf");
    write_fixture(&input, &[Some("typed page"), None]);

    let config = RepairConfig::builder().ocr(true).build().unwrap();
    let result = repair_sync(&input, &output, &config).expect("repair");

    assert_eq!(result.stats.total_pages, 2);
    assert_eq!(result.stats.copied_pages, 1);
    // The fixture's text-less page is empty white, so tesseract either
    // produces an (empty) searchable page or reports a recognition
    // failure; both are valid decisions, failure is not.
    assert_eq!(result.stats.failed_pages, 0);
    assert!(matches!(
        result.report.pages[1].decision,
        PageDecision::OcrApplied | PageDecision::OcrFailedFallbackImage { .. }
    ));
}

#[test]
fn rejects_non_pdf_input() {
    e2e_skip_unless_ready!();
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("not_a.pdf");
    std::fs::write(&input, b"just some text, no header").unwrap();

    let err = repair_sync(
        &input,
        &dir.path().join("out.pdf"),
        &RepairConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, pdfmend::RepairError::NotAPdf { .. }));
}

//! Metadata resolution for the repaired document.
//!
//! The output document gets a fresh Info dictionary rather than a copy of
//! the (possibly damaged) source one. Each field resolves through a small
//! fallback chain over the source properties, so whatever survives the
//! corruption is carried over and the rest is stamped with sane defaults.

use crate::engine::DocumentProperties;
use std::path::Path;

const TOOL_NAME: &str = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"));

/// Build the properties to stamp onto the repaired output.
///
/// Resolution per field:
/// - `title`: source title, else the input file stem with a " (repaired)"
///   suffix.
/// - `author`: source author, else the tool name.
/// - `creator`: source creator, else source producer, else the tool name.
/// - `producer`: source producer, else source creator, else empty.
/// - `subject`, `keywords`: source values, else empty.
pub fn resolve_metadata(source: &DocumentProperties, input: &Path) -> DocumentProperties {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    DocumentProperties {
        title: Some(
            non_empty(&source.title).unwrap_or_else(|| format!("{stem} (repaired)")),
        ),
        author: Some(non_empty(&source.author).unwrap_or_else(|| TOOL_NAME.to_string())),
        subject: Some(non_empty(&source.subject).unwrap_or_default()),
        keywords: Some(non_empty(&source.keywords).unwrap_or_default()),
        creator: Some(
            non_empty(&source.creator)
                .or_else(|| non_empty(&source.producer))
                .unwrap_or_else(|| TOOL_NAME.to_string()),
        ),
        producer: Some(
            non_empty(&source.producer)
                .or_else(|| non_empty(&source.creator))
                .unwrap_or_default(),
        ),
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

//! Page classification: does a page already carry usable text?
//!
//! The rule is deliberately blunt: a page "has text" iff extraction yields
//! a string that is non-empty after trimming whitespace. Any extraction
//! failure counts as "no text" — the fail-safe direction, because a page
//! wrongly classified as text-less still comes back through the fallback
//! chain as a visual reconstruction, whereas a page wrongly classified as
//! textual would be copied from a possibly-broken source and lost.

use crate::engine::DocumentHandle;

/// The classifier's verdict for one source page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageClass {
    /// The page has extractable text of the given trimmed length.
    Text { chars: usize },
    /// No usable text — the page goes through the fallback chain.
    NoText,
}

/// Classify one source page. No side effects.
pub fn classify<D: DocumentHandle>(doc: &D, index: usize) -> PageClass {
    match doc.page_text(index) {
        Ok(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                PageClass::NoText
            } else {
                PageClass::Text {
                    chars: trimmed.chars().count(),
                }
            }
        }
        Err(_) => PageClass::NoText,
    }
}

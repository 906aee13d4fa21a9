//! Optional removal of blank pages from the output document.
//!
//! The pruner runs immediately after each page append, inspecting only
//! the most recently appended output page. A page is blank when its
//! extracted text trims to empty; if extraction itself fails the page is
//! kept, since "could not read" is not evidence of "has nothing".

use crate::engine::DocumentHandle;
use crate::error::EngineError;
use tracing::{debug, warn};

/// Delete the last page of `out` if it carries no extractable text.
///
/// Returns `Ok(true)` when a page was removed. A no-op on an empty
/// document (a failed append leaves nothing to inspect).
pub fn prune_if_blank<D: DocumentHandle>(out: &mut D) -> Result<bool, EngineError> {
    let count = out.page_count();
    if count == 0 {
        return Ok(false);
    }
    let last = count - 1;
    let text = match out.page_text(last) {
        Ok(t) => t,
        Err(e) => {
            warn!("Cannot check output page {} for blankness, keeping it: {e}", last + 1);
            return Ok(false);
        }
    };
    if !text.trim().is_empty() {
        return Ok(false);
    }
    debug!("Removing blank output page {}", last + 1);
    out.delete_last_page()?;
    Ok(true)
}

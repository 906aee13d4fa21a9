//! Input validation: confirm a user-supplied path is a readable PDF.
//!
//! pdfium gives opaque errors (and can crash on garbage input), so the
//! path is checked up front: existence, read permission, and the `%PDF`
//! magic bytes. Callers get a precise error naming the problem rather
//! than a generic open failure.

use crate::error::RepairError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` names an existing, readable PDF file.
///
/// Heavily damaged files still pass as long as the header survives; the
/// repair run itself decides how much of the body is salvageable.
pub fn validate_input(path: &Path) -> Result<PathBuf, RepairError> {
    if !path.exists() {
        return Err(RepairError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    // Check read permission by attempting to open
    match std::fs::File::open(path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(RepairError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(RepairError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(RepairError::UnreadableInput {
                path: path.to_path_buf(),
                detail: e.to_string(),
            });
        }
    }

    debug!("Validated input PDF: {}", path.display());
    Ok(path.to_path_buf())
}

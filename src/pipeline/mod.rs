//! Pipeline stages for page-by-page PDF repair.
//!
//! Each submodule implements exactly one decision or transformation of the
//! per-page repair pipeline. Keeping stages separate makes each
//! independently testable against the in-memory mock engine and keeps the
//! orchestrator in [`crate::repair`] a readable state machine.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ classify ──▶ [copy | fallback] ──▶ prune ──▶ metadata
//! (path)   (has text?)   (OCR ▸ raw image)    (blank?)   (key fallbacks)
//! ```
//!
//! 1. [`input`]    — validate the user-supplied path (existence, read
//!    permission, `%PDF` magic bytes)
//! 2. [`classify`] — decide whether a page already carries usable text
//! 3. [`fallback`] — rebuild a text-less page: OCR reconstruction first,
//!    raw rasterised image second, each step isolated
//! 4. [`prune`]    — optionally drop a just-appended page that stayed blank
//! 5. [`metadata`] — resolve output document properties through the
//!    original-value ▸ alternate-key ▸ generated-default chain

pub mod classify;
pub mod fallback;
pub mod input;
pub mod metadata;
pub mod prune;

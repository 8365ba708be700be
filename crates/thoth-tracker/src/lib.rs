//! thoth-tracker — the PDF tracker ledger (spec §4.1): decides whether a
//! file needs processing, records the outcome, and detects silent
//! modifications.
//!
//! Grounded on the file-lock + temp-then-rename pattern `redisun-ctx`
//! uses for its repository lock (`ctx_core::repo::acquire_lock`), here
//! applied to a single JSON ledger document instead of a whole
//! content-addressed store.

pub mod ledger;

pub use ledger::{ProcessedFile, Tracker};

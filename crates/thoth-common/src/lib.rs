//! thoth-common — shared types, errors, and traits used across all Thoth crates.

pub mod error;
pub mod ids;
pub mod sandbox;
pub mod time;

pub use error::{Result, ThothError};

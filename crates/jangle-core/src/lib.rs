//! Jangle Core
//!
//! Core types shared across the Jangle classifier and demo server.
//!
//! This crate provides:
//! - Error types and result handling
//! - The ordered class vocabulary and its validation rules

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{Vocabulary, DURIAN, EXPECTED_CLASSES, INEDIBLE, NON_DURIAN_EDIBLE};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::Vocabulary;
}

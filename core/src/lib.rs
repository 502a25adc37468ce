//! ocimeta Core - Shared Types
//!
//! This crate provides the error taxonomy shared by the registry client
//! and the CLI.

pub mod error;

// Re-export commonly used types
pub use error::{MetaError, Result};

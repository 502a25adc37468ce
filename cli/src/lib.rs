//! ocimeta CLI - query remote container image metadata.

pub mod commands;
pub mod output;

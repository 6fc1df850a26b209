//! # Quill Admin Library
//!
//! Operator tooling for the Quill authentication core.
//!
//! ## Modules
//!
//! - `cli`: Command line definitions
//! - `commands`: Command implementations

pub mod cli;
pub mod commands;

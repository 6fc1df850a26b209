//! # Quill Shared Library
//!
//! This crate contains the authentication core shared by the Quill blog
//! server and its admin tooling.
//!
//! ## Module Organization
//!
//! - `auth`: Credential hashing, bearer tokens and role checks
//! - `models`: User accounts and the lookup collaborator
//! - `config`: Configuration management
//! - `error`: Common error types
//! - `seed`: Default account seeding

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod seed;

/// Current version of the Quill shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Command line definitions
///
/// Passwords are never accepted as arguments; `hash` and `verify` read them
/// from stdin so they stay out of shell history and process listings.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use quill_shared::models::user::Role;

/// Quill Admin - operator tooling for Quill authentication
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Generate a random base64 signing key for JWT_KEY
    Keygen,

    /// Hash a password read from stdin
    Hash,

    /// Check a password read from stdin against a stored hash
    Verify {
        /// Stored credential hash
        #[arg(long)]
        hash: String,
    },

    /// Issue a bearer token for an identity
    IssueToken {
        /// Identity id placed in the `sub` claim
        #[arg(long)]
        id: String,

        /// Role placed in the `role` claim
        #[arg(long)]
        role: Role,

        /// Issue time (RFC 3339), defaults to now
        #[arg(long)]
        issued_at: Option<DateTime<Utc>>,
    },

    /// Validate a bearer token and print its claims and expiry
    InspectToken {
        /// Token to validate
        token: String,
    },

    /// Print the default accounts with hashes of DEFAULT_PASSWORD
    Seed,
}

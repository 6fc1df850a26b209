//! # Quill Admin
//!
//! Operator CLI for the Quill authentication core: signing key generation,
//! credential hashing, token inspection and default account seeding.
//!
//! ## Usage
//!
//! ```bash
//! quill-admin keygen
//! echo 'S3cret!1' | quill-admin hash
//! quill-admin issue-token --id u1 --role admin
//! ```
//!
//! Every command except `keygen` reads its configuration from the
//! environment (or `.env`) and refuses to start if `JWT_KEY` is invalid.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quill_admin::{cli::Cli, commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quill_admin=info,quill_shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Quill Admin v{} starting", env!("CARGO_PKG_VERSION"));

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    commands::run(cli.command, &mut stdin.lock(), &mut stdout.lock()).await
}

/// Command implementations
///
/// Each command writes its result to `output` and reads passwords from
/// `input`, so the whole surface runs against in-memory buffers in tests.
/// Failures propagate as `anyhow` errors and end the process non-zero.

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::info;

use quill_shared::auth::claims::ClaimsSet;
use quill_shared::auth::jwt::SigningKey;
use quill_shared::auth::password::{self, CredentialHash, PasswordHasher};
use quill_shared::config::AuthConfig;
use quill_shared::models::user::{InMemoryUserRepository, UserRepository};
use quill_shared::seed::{self, DEFAULT_ACCOUNTS};

use crate::cli::Command;

/// Runs a command with configuration from the environment
///
/// `keygen` runs without configuration so a first key can be produced.
pub async fn run<I, O>(command: Command, input: &mut I, output: &mut O) -> Result<()>
where
    I: BufRead,
    O: Write,
{
    if command == Command::Keygen {
        return keygen(output);
    }

    let config = AuthConfig::from_env().context("Invalid authentication configuration")?;
    execute(&config, command, input, output).await
}

/// Runs a command against an already loaded configuration
pub async fn execute<I, O>(
    config: &AuthConfig,
    command: Command,
    input: &mut I,
    output: &mut O,
) -> Result<()>
where
    I: BufRead,
    O: Write,
{
    match command {
        Command::Keygen => keygen(output),
        Command::Hash => hash(config, input, output).await,
        Command::Verify { hash } => verify(config, CredentialHash::from(hash), input, output).await,
        Command::IssueToken { id, role, issued_at } => {
            let tokens = config.token_service();
            let token = tokens.issue_token_at(
                &ClaimsSet::new(id, role),
                issued_at.unwrap_or_else(Utc::now),
            )?;
            writeln!(output, "{}", token)?;
            Ok(())
        }
        Command::InspectToken { token } => inspect_token(config, token.trim(), output),
        Command::Seed => seed_accounts(config, output).await,
    }
}

fn keygen<O: Write>(output: &mut O) -> Result<()> {
    writeln!(output, "{}", SigningKey::generate().to_base64())?;
    Ok(())
}

async fn hash<I, O>(config: &AuthConfig, input: &mut I, output: &mut O) -> Result<()>
where
    I: BufRead,
    O: Write,
{
    let password = read_password(input)?;
    password::validate_password_strength(&password)?;

    let hasher: Arc<dyn PasswordHasher> = Arc::new(config.password_hasher());
    let hash = password::hash_blocking(hasher, password).await?;

    writeln!(output, "{}", hash.as_str())?;
    Ok(())
}

async fn verify<I, O>(
    config: &AuthConfig,
    stored: CredentialHash,
    input: &mut I,
    output: &mut O,
) -> Result<()>
where
    I: BufRead,
    O: Write,
{
    let password = read_password(input)?;

    let hasher: Arc<dyn PasswordHasher> = Arc::new(config.password_hasher());
    if !password::verify_blocking(hasher, password, stored).await? {
        bail!("Password does not match");
    }

    writeln!(output, "ok")?;
    Ok(())
}

fn inspect_token<O: Write>(config: &AuthConfig, token: &str, output: &mut O) -> Result<()> {
    let tokens = config.token_service();
    let payload = tokens
        .validation_parameters()
        .decode_payload(token)
        .context("Token rejected")?;

    let timestamp = |secs: i64| DateTime::<Utc>::from_timestamp(secs, 0).map(|t| t.to_rfc3339());
    let report = json!({
        "sub": payload.sub,
        "role": payload.role,
        "issued_at": timestamp(payload.iat),
        "expires_at": timestamp(payload.exp),
        "expires_in_secs": payload.time_until_expiration().map(|left| left.num_seconds()),
    });

    writeln!(output, "{}", serde_json::to_string_pretty(&report)?)?;
    Ok(())
}

async fn seed_accounts<O: Write>(config: &AuthConfig, output: &mut O) -> Result<()> {
    let Some(default_password) = config.default_password.as_deref() else {
        bail!("DEFAULT_PASSWORD must be set to seed accounts");
    };

    let repo = InMemoryUserRepository::new();
    let hasher: Arc<dyn PasswordHasher> = Arc::new(config.password_hasher());
    let created = seed::seed_default_users(&repo, hasher, default_password).await?;
    info!(created, "Generated default accounts");

    for (email, _) in DEFAULT_ACCOUNTS {
        let Some(user) = repo.find_by_email(email).await? else {
            bail!("Seeded account {} missing", email);
        };

        let line = json!({
            "email": user.email,
            "user_name": user.user_name,
            "role": user.role,
            "password_hash": user.password_hash.as_str(),
        });
        writeln!(output, "{}", line)?;
    }

    Ok(())
}

/// Reads one line, without its line terminator
fn read_password<I: BufRead>(input: &mut I) -> Result<String> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;

    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(line)
}

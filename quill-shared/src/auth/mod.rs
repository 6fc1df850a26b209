/// Authentication and authorization for Quill
///
/// This module provides the credential and token primitives every Quill
/// surface signs users in with:
///
/// # Modules
///
/// - [`password`]: Argon2id credential hashing and constant-time verification
/// - [`jwt`]: HS512 bearer token issuance and validation
/// - [`claims`]: Translation between identities, claims and principals
/// - [`authorization`]: Role hierarchy checks
/// - [`middleware`]: Axum bearer authentication layer
/// - [`service`]: Login and registration flows
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id, 12 MiB memory, 3 passes, 16-byte salt
/// - **JWT Tokens**: HS512 only, fixed 7-day lifetime, zero clock leeway
/// - **Fail Closed**: Malformed hashes and tokens are rejections, never errors
/// - **Constant-time Comparison**: Digest comparison never short-circuits
///
/// # Example
///
/// ```no_run
/// use quill_shared::auth::claims::ClaimsSet;
/// use quill_shared::auth::jwt::{JwtService, SigningKey, TokenService};
/// use quill_shared::auth::password::{Argon2idHasher, PasswordHasher};
/// use quill_shared::models::user::Role;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// // Credential hashing
/// let hasher = Argon2idHasher::default();
/// let hash = hasher.hash("S3cret!1")?;
/// assert!(hasher.verify("S3cret!1", &hash));
///
/// // Bearer tokens
/// let tokens = JwtService::new(&SigningKey::generate());
/// let token = tokens.issue_token(&ClaimsSet::new("user-id", Role::Editor))?;
/// let claims = tokens.validate_token(&token)?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod claims;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

/// Error types for the authentication core
///
/// Every failure the core can report falls into one of a handful of
/// categories. Messages are deliberately generic: no variant ever carries
/// password material, derived hashes or signing keys.
///
/// # Categories
///
/// - [`AuthError::AuthenticationFailure`]: wrong credentials or unknown account
/// - [`AuthError::ValidationFailure`]: bad registration input (recoverable)
/// - [`AuthError::TokenInvalid`]: bad signature, wrong algorithm, expired, malformed
/// - [`AuthError::ConfigurationFault`]: missing or malformed key / cost parameters
/// - [`AuthError::Internal`]: collaborator failure (repository, worker pool)

/// Result alias used throughout the crate
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication error taxonomy
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Wrong password or unresolvable identity
    ///
    /// Never reveals whether the email existed.
    #[error("Invalid email or password")]
    AuthenticationFailure,

    /// Malformed input, e.g. duplicate email at registration
    #[error("Validation failed: {0}")]
    ValidationFailure(String),

    /// Token could not be trusted
    ///
    /// Covers bad signatures, disallowed algorithms, expiry and garbage input
    /// alike so callers cannot learn which check failed.
    #[error("Invalid token")]
    TokenInvalid,

    /// Missing or malformed configuration, fatal at startup
    #[error("Configuration fault: {0}")]
    ConfigurationFault(String),

    /// Unexpected failure in a collaborator
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
            })
            .collect();
        messages.sort();

        AuthError::ValidationFailure(messages.join("; "))
    }
}

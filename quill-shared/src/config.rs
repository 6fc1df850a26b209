/// Configuration for the authentication core
///
/// This module loads the signing secret and hashing cost from environment
/// variables and validates them once, at startup. A missing or malformed
/// key is a `ConfigurationFault` here, never a per-request error later.
///
/// # Environment Variables
///
/// - `JWT_KEY`: Base64 signing secret, at least 32 bytes decoded (required)
/// - `DEFAULT_PASSWORD`: Password for seeded accounts (optional)
/// - `ARGON2_MEMORY_KIB`: Argon2id memory cost (default: 12288, range 12288 to 1048576)
/// - `ARGON2_PASSES`: Argon2id passes (default: 3, range 3 to 32)
///
/// # Example
///
/// ```no_run
/// use quill_shared::config::AuthConfig;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AuthConfig::from_env()?;
/// let tokens = config.token_service();
/// let hasher = config.password_hasher();
/// # Ok(())
/// # }
/// ```

use std::env;

use crate::auth::jwt::{JwtService, SigningKey};
use crate::auth::password::{Argon2idHasher, HashParams, MIN_MEMORY_KIB, MIN_PASSES};
use crate::error::{AuthError, AuthResult};

/// Environment variable holding the signing secret
pub const JWT_KEY_VAR: &str = "JWT_KEY";

/// Environment variable holding the seeding password
pub const DEFAULT_PASSWORD_VAR: &str = "DEFAULT_PASSWORD";

/// Environment variable overriding the Argon2id memory cost
pub const MEMORY_KIB_VAR: &str = "ARGON2_MEMORY_KIB";

/// Environment variable overriding the Argon2id passes
pub const PASSES_VAR: &str = "ARGON2_PASSES";

/// Validated authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Token signing secret
    pub signing_key: SigningKey,

    /// Argon2id cost parameters
    pub hash_params: HashParams,

    /// Password for seeded accounts, unused by the core
    pub default_password: Option<String>,
}

impl AuthConfig {
    /// Loads configuration from the process environment
    ///
    /// A `.env` file in the working directory is read first if present.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ConfigurationFault` if `JWT_KEY` is missing or
    /// malformed, or a cost override is not a number or out of range.
    pub fn from_env() -> AuthResult<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> AuthResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_key = lookup(JWT_KEY_VAR).ok_or_else(|| {
            AuthError::ConfigurationFault(format!("{} environment variable is required", JWT_KEY_VAR))
        })?;
        let signing_key = SigningKey::from_base64(&jwt_key)?;

        let memory_kib = parse_var(&lookup, MEMORY_KIB_VAR, MIN_MEMORY_KIB)?;
        let passes = parse_var(&lookup, PASSES_VAR, MIN_PASSES)?;
        let hash_params = HashParams::new(memory_kib, passes)?;

        let default_password = lookup(DEFAULT_PASSWORD_VAR).filter(|p| !p.is_empty());

        Ok(Self {
            signing_key,
            hash_params,
            default_password,
        })
    }

    /// Builds the token service for this configuration
    pub fn token_service(&self) -> JwtService {
        JwtService::new(&self.signing_key)
    }

    /// Builds the credential hasher for this configuration
    pub fn password_hasher(&self) -> Argon2idHasher {
        Argon2idHasher::new(self.hash_params.clone())
    }
}

fn parse_var<F>(lookup: &F, name: &str, default: u32) -> AuthResult<u32>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse::<u32>().map_err(|_| {
            AuthError::ConfigurationFault(format!("{} must be a positive integer", name))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::ClaimsSet;
    use crate::auth::jwt::TokenService;
    use crate::models::user::Role;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_minimal_config() {
        let key = SigningKey::generate().to_base64();
        let config = AuthConfig::from_lookup(lookup(&[("JWT_KEY", key.as_str())])).unwrap();

        assert_eq!(config.hash_params, HashParams::default());
        assert!(config.default_password.is_none());
        assert_eq!(config.signing_key.to_base64(), key);
    }

    #[test]
    fn test_full_config() {
        let key = SigningKey::generate().to_base64();
        let config = AuthConfig::from_lookup(lookup(&[
            ("JWT_KEY", key.as_str()),
            ("DEFAULT_PASSWORD", "S3cret!1"),
            ("ARGON2_MEMORY_KIB", "19456"),
            ("ARGON2_PASSES", " 4 "),
        ]))
        .unwrap();

        assert_eq!(config.hash_params.memory_kib(), 19_456);
        assert_eq!(config.hash_params.passes(), 4);
        assert_eq!(config.default_password.as_deref(), Some("S3cret!1"));
    }

    #[test]
    fn test_missing_key_is_fatal() {
        let result = AuthConfig::from_lookup(lookup(&[]));
        assert!(matches!(result, Err(AuthError::ConfigurationFault(_))));
    }

    #[test]
    fn test_malformed_key_is_fatal() {
        for key in ["", "%%%", "c2hvcnQ="] {
            let result = AuthConfig::from_lookup(lookup(&[("JWT_KEY", key)]));
            assert!(matches!(result, Err(AuthError::ConfigurationFault(_))));
        }
    }

    #[test]
    fn test_cost_out_of_range_is_fatal() {
        let key = SigningKey::generate().to_base64();

        for (name, value) in [
            ("ARGON2_MEMORY_KIB", "4096"),
            ("ARGON2_MEMORY_KIB", "4294967295"),
            ("ARGON2_MEMORY_KIB", "1048577"),
            ("ARGON2_PASSES", "1"),
            ("ARGON2_PASSES", "33"),
            ("ARGON2_PASSES", "three"),
        ] {
            let result = AuthConfig::from_lookup(lookup(&[("JWT_KEY", key.as_str()), (name, value)]));
            assert!(matches!(result, Err(AuthError::ConfigurationFault(_))));
        }
    }

    #[test]
    fn test_error_never_echoes_key() {
        let result = AuthConfig::from_lookup(lookup(&[("JWT_KEY", "c2hvcnQ=")]));
        let message = result.unwrap_err().to_string();
        assert!(!message.contains("c2hvcnQ="));
    }

    #[test]
    fn test_built_services_agree() {
        let key = SigningKey::generate().to_base64();
        let config = AuthConfig::from_lookup(lookup(&[("JWT_KEY", key.as_str())])).unwrap();

        let token = config
            .token_service()
            .issue_token(&ClaimsSet::new("u1", Role::Editor))
            .unwrap();
        let claims = config.token_service().validate_token(&token).unwrap();
        assert_eq!(claims.role, Role::Editor);
    }
}

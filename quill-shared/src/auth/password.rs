/// Password hashing module using Argon2id
///
/// This module converts plaintext passwords into storage-safe credential
/// hashes at registration and verifies candidates against them at login.
///
/// # Security
///
/// - **Algorithm**: Argon2id, version 0x13
/// - **Memory**: 12 MiB (12288 KiB) minimum, 1 GiB maximum
/// - **Iterations**: 3 passes minimum, 32 maximum
/// - **Parallelism**: 1 lane
/// - **Salt**: 16 random bytes from the OS RNG, fresh on every call
/// - **Output**: 16-byte hash
///
/// Verification re-derives with the salt embedded in the stored value and
/// compares in constant time.
///
/// # Encoding
///
/// ```text
/// argon2id$<base64(salt)>$<base64(hash)>
/// ```
///
/// The algorithm tag keeps stored values self-describing, so the algorithm
/// can change later without a schema migration.
///
/// # Example
///
/// ```
/// use quill_shared::auth::password::{Argon2idHasher, PasswordHasher};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = Argon2idHasher::default();
///
/// let hash = hasher.hash("S3cret!1")?;
/// assert!(hasher.verify("S3cret!1", &hash));
/// assert!(!hasher.verify("S3cret!2", &hash));
/// # Ok(())
/// # }
/// ```

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::error::{AuthError, AuthResult};

/// Algorithm tag written in front of every credential hash
pub const ALGORITHM_TAG: &str = "argon2id";

/// Salt length in bytes (128 bits)
pub const SALT_LEN: usize = 16;

/// Derived hash length in bytes (128 bits)
pub const HASH_LEN: usize = 16;

/// Minimum memory cost in KiB (12 MiB)
pub const MIN_MEMORY_KIB: u32 = 12_288;

/// Maximum memory cost in KiB (1 GiB)
pub const MAX_MEMORY_KIB: u32 = 1_048_576;

/// Minimum number of passes
pub const MIN_PASSES: u32 = 3;

/// Maximum number of passes
pub const MAX_PASSES: u32 = 32;

/// Lanes used for every derivation
pub const PARALLELISM: u32 = 1;

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LEN: usize = 6;

/// Stored credential string
///
/// Wraps whatever the user store holds. Parsing never fails: a malformed
/// value is only detected by [`PasswordHasher::verify`], which then rejects.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialHash(String);

impl CredentialHash {
    /// Returns the encoded form for storage
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the encoding into salt and hash bytes
    ///
    /// Returns `None` for anything that is not a well-formed value produced
    /// by this module.
    fn decode(&self) -> Option<([u8; SALT_LEN], [u8; HASH_LEN])> {
        let mut parts = self.0.split('$');
        let (tag, salt, hash) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() || tag != ALGORITHM_TAG {
            return None;
        }

        let salt: [u8; SALT_LEN] = STANDARD.decode(salt).ok()?.try_into().ok()?;
        let hash: [u8; HASH_LEN] = STANDARD.decode(hash).ok()?.try_into().ok()?;
        Some((salt, hash))
    }

    fn encode(salt: &[u8], hash: &[u8]) -> Self {
        Self(format!(
            "{}${}${}",
            ALGORITHM_TAG,
            STANDARD.encode(salt),
            STANDARD.encode(hash)
        ))
    }
}

impl FromStr for CredentialHash {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for CredentialHash {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// Hash bytes stay out of logs.
impl fmt::Debug for CredentialHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialHash(..)")
    }
}

/// Argon2id cost parameters
///
/// Parallelism and output length are fixed; memory and passes are tunable
/// between their floors and ceilings. Construction validates the full
/// parameter set, so hashing never fails on configuration at request time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashParams {
    inner: Params,
}

/// Parameters at the cost floor
const FLOOR_PARAMS: Params = match Params::new(MIN_MEMORY_KIB, MIN_PASSES, PARALLELISM, Some(HASH_LEN)) {
    Ok(params) => params,
    Err(_) => panic!("Argon2 floor parameters are invalid"),
};

impl HashParams {
    /// Creates cost parameters, enforcing the floors and ceilings
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ConfigurationFault` if either value is outside
    /// its allowed range.
    pub fn new(memory_kib: u32, passes: u32) -> AuthResult<Self> {
        if !(MIN_MEMORY_KIB..=MAX_MEMORY_KIB).contains(&memory_kib) {
            return Err(AuthError::ConfigurationFault(format!(
                "Argon2 memory cost must be between {} and {} KiB, got {}",
                MIN_MEMORY_KIB, MAX_MEMORY_KIB, memory_kib
            )));
        }
        if !(MIN_PASSES..=MAX_PASSES).contains(&passes) {
            return Err(AuthError::ConfigurationFault(format!(
                "Argon2 passes must be between {} and {}, got {}",
                MIN_PASSES, MAX_PASSES, passes
            )));
        }

        let inner = Params::new(memory_kib, passes, PARALLELISM, Some(HASH_LEN)).map_err(|e| {
            AuthError::ConfigurationFault(format!("Invalid Argon2 parameters: {}", e))
        })?;

        Ok(Self { inner })
    }

    /// Memory cost in KiB
    pub fn memory_kib(&self) -> u32 {
        self.inner.m_cost()
    }

    /// Number of passes
    pub fn passes(&self) -> u32 {
        self.inner.t_cost()
    }
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            inner: FLOOR_PARAMS,
        }
    }
}

/// Credential hasher
///
/// Implementations are stateless and safe to call from many threads at
/// once. Both methods are CPU and memory bound; async callers should use
/// [`hash_blocking`] and [`verify_blocking`].
pub trait PasswordHasher: Send + Sync {
    /// Hashes a password with a fresh random salt
    fn hash(&self, password: &str) -> AuthResult<CredentialHash>;

    /// Verifies a password against a stored hash
    ///
    /// Malformed stored values yield `false`.
    fn verify(&self, password: &str, stored: &CredentialHash) -> bool;
}

/// Argon2id credential hasher
#[derive(Clone)]
pub struct Argon2idHasher {
    params: HashParams,
    argon2: Argon2<'static>,
}

impl Argon2idHasher {
    /// Creates a hasher with the given cost parameters
    pub fn new(params: HashParams) -> Self {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.inner.clone());
        Self { params, argon2 }
    }

    /// Cost parameters in use
    pub fn params(&self) -> &HashParams {
        &self.params
    }

    fn derive(&self, password: &str, salt: &[u8]) -> AuthResult<[u8; HASH_LEN]> {
        let mut output = [0u8; HASH_LEN];
        self.argon2
            .hash_password_into(password.as_bytes(), salt, &mut output)
            .map_err(|e| AuthError::Internal(format!("Hash generation failed: {}", e)))?;

        Ok(output)
    }
}

impl Default for Argon2idHasher {
    fn default() -> Self {
        Self::new(HashParams::default())
    }
}

impl fmt::Debug for Argon2idHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argon2idHasher")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl PasswordHasher for Argon2idHasher {
    fn hash(&self, password: &str) -> AuthResult<CredentialHash> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let hash = self.derive(password, &salt)?;
        Ok(CredentialHash::encode(&salt, &hash))
    }

    fn verify(&self, password: &str, stored: &CredentialHash) -> bool {
        let Some((salt, expected)) = stored.decode() else {
            debug!("Rejecting malformed credential hash");
            return false;
        };

        match self.derive(password, &salt) {
            Ok(candidate) => candidate[..].ct_eq(&expected[..]).into(),
            Err(e) => {
                debug!(error = %e, "Credential derivation failed during verification");
                false
            }
        }
    }
}

/// Hashes on tokio's blocking pool
///
/// Each call gets its own worker thread, so concurrent registrations do not
/// queue behind one another or stall the async executor.
pub async fn hash_blocking(
    hasher: Arc<dyn PasswordHasher>,
    password: String,
) -> AuthResult<CredentialHash> {
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| AuthError::Internal(format!("Hashing task failed: {}", e)))?
}

/// Verifies on tokio's blocking pool
pub async fn verify_blocking(
    hasher: Arc<dyn PasswordHasher>,
    password: String,
    stored: CredentialHash,
) -> AuthResult<bool> {
    tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
        .await
        .map_err(|e| AuthError::Internal(format!("Verification task failed: {}", e)))
}

/// Validates password input at registration
///
/// # Example
///
/// ```
/// use quill_shared::auth::password::validate_password_strength;
///
/// assert!(validate_password_strength("S3cret!1").is_ok());
/// assert!(validate_password_strength("abc").is_err());
/// ```
pub fn validate_password_strength(password: &str) -> AuthResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::ValidationFailure(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }

    Ok(())
}

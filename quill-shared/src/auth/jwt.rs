/// JWT token issuance and validation module
///
/// This module turns an authenticated identity's claims into a signed,
/// self-contained bearer token and recovers those claims from a presented
/// token.
///
/// # Security
///
/// - **Algorithm**: HS512 (HMAC with SHA-512), the only algorithm accepted
/// - **Expiration**: Fixed 7 days from issuance, checked with zero leeway
/// - **Validation**: Signature and expiry; issuer and audience are ignored
/// - **Secret Management**: Base64-encoded key of at least 32 bytes,
///   provisioned through configuration
///
/// The algorithm named in a token's header is never trusted on its own: a
/// token claiming anything other than HS512 is rejected before its signature
/// is considered.
///
/// # Lifecycle
///
/// ```text
/// Issued -> Valid (until exp) -> Expired
/// ```
///
/// There is no revocation; a token stays valid until it expires.
///
/// # Example
///
/// ```
/// use quill_shared::auth::claims::ClaimsSet;
/// use quill_shared::auth::jwt::{JwtService, SigningKey, TokenService};
/// use quill_shared::models::user::Role;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = JwtService::new(&SigningKey::generate());
///
/// let token = service.issue_token(&ClaimsSet::new("u1", Role::Admin))?;
/// let claims = service.validate_token(&token)?;
/// assert_eq!(claims, ClaimsSet::new("u1", Role::Admin));
/// # Ok(())
/// # }
/// ```

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::claims::ClaimsSet;
use crate::error::{AuthError, AuthResult};
use crate::models::user::Role;

/// The one signing algorithm issued and accepted
pub const SIGNATURE_ALGORITHM: Algorithm = Algorithm::HS512;

/// Token lifetime in days
pub const TOKEN_LIFETIME_DAYS: i64 = 7;

/// Minimum decoded signing key length in bytes
pub const MIN_KEY_LEN: usize = 32;

/// Length of keys produced by [`SigningKey::generate`]
pub const GENERATED_KEY_LEN: usize = 64;

/// Returns the fixed token lifetime
pub fn token_lifetime() -> Duration {
    Duration::days(TOKEN_LIFETIME_DAYS)
}

/// Process-wide HMAC secret
///
/// Read-only after startup. The bytes are never printed.
#[derive(Clone)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    /// Decodes a base64 secret from configuration
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ConfigurationFault` if the value is empty, not
    /// valid base64, or shorter than [`MIN_KEY_LEN`] bytes once decoded.
    pub fn from_base64(encoded: &str) -> AuthResult<Self> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Err(AuthError::ConfigurationFault(
                "Signing key is empty".to_string(),
            ));
        }

        let bytes = STANDARD.decode(encoded).map_err(|_| {
            AuthError::ConfigurationFault("Signing key is not valid base64".to_string())
        })?;

        Self::from_bytes(bytes)
    }

    /// Wraps raw key bytes
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ConfigurationFault` if the key is too short.
    pub fn from_bytes(bytes: Vec<u8>) -> AuthResult<Self> {
        if bytes.len() < MIN_KEY_LEN {
            return Err(AuthError::ConfigurationFault(format!(
                "Signing key must be at least {} bytes, got {}",
                MIN_KEY_LEN,
                bytes.len()
            )));
        }

        Ok(Self(bytes))
    }

    /// Generates a fresh random key
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; GENERATED_KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Encodes the key for configuration files
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey({} bytes)", self.0.len())
    }
}

/// Wire form of the token payload
///
/// # Claims
///
/// - `sub`: identity id
/// - `role`: role tag
/// - `iat`: issued at (Unix timestamp)
/// - `exp`: expiration (Unix timestamp)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject - identity id
    pub sub: String,

    /// Role tag
    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl TokenClaims {
    /// Builds the payload for claims issued at `issued_at`
    pub fn issue(claims: &ClaimsSet, issued_at: DateTime<Utc>) -> Self {
        Self {
            sub: claims.id.clone(),
            role: claims.role,
            iat: issued_at.timestamp(),
            exp: (issued_at + token_lifetime()).timestamp(),
        }
    }

    /// Gets time until expiration, `None` once expired
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let now = Utc::now().timestamp();
        if self.exp > now {
            Some(Duration::seconds(self.exp - now))
        } else {
            None
        }
    }
}

impl From<TokenClaims> for ClaimsSet {
    fn from(claims: TokenClaims) -> Self {
        ClaimsSet::new(claims.sub, claims.role)
    }
}

/// Reusable validation policy
///
/// Carries the allow-listed algorithms, the decoding key and the expiry
/// rules, so request-authentication layers can validate with exactly the
/// policy used here instead of re-declaring it.
#[derive(Clone)]
pub struct TokenValidationParameters {
    decoding_key: DecodingKey,
    algorithms: Vec<Algorithm>,
    validate_lifetime: bool,
    leeway_secs: u64,
}

impl TokenValidationParameters {
    /// Builds the policy for a signing key
    pub fn new(key: &SigningKey) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(key.as_bytes()),
            algorithms: vec![SIGNATURE_ALGORITHM],
            validate_lifetime: true,
            leeway_secs: 0,
        }
    }

    /// Algorithms a token may be signed with
    pub fn algorithms(&self) -> &[Algorithm] {
        &self.algorithms
    }

    /// Key used to check signatures
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    /// Whether `exp` is enforced
    pub fn validate_lifetime(&self) -> bool {
        self.validate_lifetime
    }

    /// Tolerated clock skew in seconds
    pub fn leeway_secs(&self) -> u64 {
        self.leeway_secs
    }

    /// Converts the policy to a `jsonwebtoken` validation
    pub fn validation(&self) -> Validation {
        let mut validation = Validation::new(SIGNATURE_ALGORITHM);
        validation.algorithms = self.algorithms.clone();
        validation.validate_exp = self.validate_lifetime;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = self.leeway_secs;
        validation
    }

    /// Validates a token and extracts its claims
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenInvalid` for every failure. The underlying
    /// cause is only logged at debug level.
    pub fn validate(&self, token: &str) -> AuthResult<ClaimsSet> {
        self.decode_payload(token).map(ClaimsSet::from)
    }

    /// Validates a token and returns its full wire payload
    ///
    /// Applies exactly the checks of [`validate`](Self::validate).
    pub fn decode_payload(&self, token: &str) -> AuthResult<TokenClaims> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation())
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(reason = ?e.kind(), "Rejected bearer token");
                AuthError::TokenInvalid
            })
    }
}

impl fmt::Debug for TokenValidationParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenValidationParameters")
            .field("algorithms", &self.algorithms)
            .field("validate_lifetime", &self.validate_lifetime)
            .field("leeway_secs", &self.leeway_secs)
            .finish_non_exhaustive()
    }
}

/// Bearer token service
///
/// Implementations are stateless apart from the immutable key and may be
/// shared freely across threads.
pub trait TokenService: Send + Sync {
    /// Issues a signed token for the claims, valid for 7 days
    fn issue_token(&self, claims: &ClaimsSet) -> AuthResult<String>;

    /// Validates a token and recovers its claims
    fn validate_token(&self, token: &str) -> AuthResult<ClaimsSet>;
}

/// HS512 JWT implementation of [`TokenService`]
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    parameters: TokenValidationParameters,
}

impl JwtService {
    /// Creates the service for a signing key
    pub fn new(key: &SigningKey) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(key.as_bytes()),
            parameters: TokenValidationParameters::new(key),
        }
    }

    /// Validation policy shared with request-authentication layers
    pub fn validation_parameters(&self) -> &TokenValidationParameters {
        &self.parameters
    }

    /// Issues a token as if the current time were `issued_at`
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if encoding fails.
    pub fn issue_token_at(&self, claims: &ClaimsSet, issued_at: DateTime<Utc>) -> AuthResult<String> {
        let payload = TokenClaims::issue(claims, issued_at);

        encode(&Header::new(SIGNATURE_ALGORITHM), &payload, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Token encoding failed: {}", e)))
    }
}

impl TokenService for JwtService {
    fn issue_token(&self, claims: &ClaimsSet) -> AuthResult<String> {
        self.issue_token_at(claims, Utc::now())
    }

    fn validate_token(&self, token: &str) -> AuthResult<ClaimsSet> {
        self.parameters.validate(token)
    }
}

impl fmt::Debug for JwtService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtService")
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Claims and the claims-to-principal bridge
///
/// [`ClaimsSet`] is what a valid token asserts: who the caller is and which
/// role they hold. It is derived from an identity at login and recovered from
/// the token on every later request; it is never persisted.
///
/// Request-authorization layers that work with generic claim containers use
/// [`Principal`], a flat list of `(kind, value)` assertions. The mapping in
/// both directions is a pure function.
///
/// # Example
///
/// ```
/// use quill_shared::auth::claims::{ClaimsSet, Principal};
/// use quill_shared::models::user::Role;
///
/// let claims = ClaimsSet::new("u1", Role::Admin);
/// let principal = claims.to_principal();
///
/// assert_eq!(principal.find("sub"), Some("u1"));
/// assert_eq!(principal.find("role"), Some("Admin"));
/// assert_eq!(ClaimsSet::from_principal(&principal).unwrap(), claims);
/// ```

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};
use crate::models::user::{Role, User};

/// Assertion kind carrying the identity id
pub const SUBJECT_CLAIM: &str = "sub";

/// Assertion kind carrying the role tag
pub const ROLE_CLAIM: &str = "role";

/// Decoded identity assertions used for authorization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsSet {
    /// Identity id
    pub id: String,

    /// Role held by the identity
    pub role: Role,
}

impl ClaimsSet {
    /// Creates a claims set
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    /// Derives claims from an authenticated identity
    pub fn from_identity(user: &User) -> Self {
        Self::new(user.id.clone(), user.role)
    }

    /// Maps the claims onto the generic `sub` / `role` assertions
    pub fn to_principal(&self) -> Principal {
        Principal {
            assertions: vec![
                Assertion::new(SUBJECT_CLAIM, self.id.clone()),
                Assertion::new(ROLE_CLAIM, self.role.as_str()),
            ],
        }
    }

    /// Rebuilds claims from a principal
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenInvalid` when either assertion is missing or
    /// the role tag is unknown.
    pub fn from_principal(principal: &Principal) -> AuthResult<Self> {
        let id = principal
            .find(SUBJECT_CLAIM)
            .filter(|id| !id.is_empty())
            .ok_or(AuthError::TokenInvalid)?;
        let role = principal
            .find(ROLE_CLAIM)
            .and_then(|role| role.parse::<Role>().ok())
            .ok_or(AuthError::TokenInvalid)?;

        Ok(Self::new(id, role))
    }
}

/// Single identity assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    /// Assertion kind, e.g. `sub`
    pub kind: String,

    /// Asserted value
    pub value: String,
}

impl Assertion {
    /// Creates an assertion
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

/// Generic claims container consumed by authorization layers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Assertions in insertion order
    pub assertions: Vec<Assertion>,
}

impl Principal {
    /// Returns the first value asserted for `kind`
    pub fn find(&self, kind: &str) -> Option<&str> {
        self.assertions
            .iter()
            .find(|a| a.kind == kind)
            .map(|a| a.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::CredentialHash;
    use chrono::Utc;

    #[test]
    fn test_from_identity() {
        let user = User {
            id: "user2".to_string(),
            user_name: "User2".to_string(),
            email: "user2@example.com".to_string(),
            role: Role::Admin,
            password_hash: CredentialHash::from(String::new()),
            created_at: Utc::now(),
        };

        let claims = ClaimsSet::from_identity(&user);
        assert_eq!(claims, ClaimsSet::new("user2", Role::Admin));
    }

    #[test]
    fn test_principal_has_exactly_two_assertions() {
        let principal = ClaimsSet::new("u1", Role::Editor).to_principal();

        assert_eq!(
            principal.assertions,
            vec![Assertion::new("sub", "u1"), Assertion::new("role", "Editor")]
        );
    }

    #[test]
    fn test_principal_roundtrip_for_every_role() {
        for role in Role::ALL {
            let claims = ClaimsSet::new("u1", role);
            let rebuilt = ClaimsSet::from_principal(&claims.to_principal()).unwrap();
            assert_eq!(rebuilt, claims);
        }
    }

    #[test]
    fn test_from_principal_missing_assertions() {
        let only_sub = Principal {
            assertions: vec![Assertion::new("sub", "u1")],
        };
        assert!(matches!(
            ClaimsSet::from_principal(&only_sub),
            Err(AuthError::TokenInvalid)
        ));

        let only_role = Principal {
            assertions: vec![Assertion::new("role", "Admin")],
        };
        assert!(ClaimsSet::from_principal(&only_role).is_err());

        let empty_sub = Principal {
            assertions: vec![Assertion::new("sub", ""), Assertion::new("role", "Admin")],
        };
        assert!(ClaimsSet::from_principal(&empty_sub).is_err());

        assert!(ClaimsSet::from_principal(&Principal::default()).is_err());
    }

    #[test]
    fn test_from_principal_unknown_role() {
        let principal = Principal {
            assertions: vec![Assertion::new("sub", "u1"), Assertion::new("role", "Owner")],
        };
        assert!(matches!(
            ClaimsSet::from_principal(&principal),
            Err(AuthError::TokenInvalid)
        ));
    }
}

/// Authorization helpers and permission checks
///
/// Authorization works purely on a validated [`ClaimsSet`]; no lookup is
/// needed because the role travels inside the token.
///
/// # Permission Model
///
/// Roles are hierarchical, each a superset of the next:
///
/// 1. **Admin**: everything, including account administration
/// 2. **Editor**: write and publish posts
/// 3. **Reader**: read posts and comment
///
/// # Example
///
/// ```
/// use quill_shared::auth::authorization::{require_permission, Permission};
/// use quill_shared::auth::claims::ClaimsSet;
/// use quill_shared::models::user::Role;
///
/// let editor = ClaimsSet::new("u1", Role::Editor);
///
/// assert!(require_permission(&editor, Permission::Publish).is_ok());
/// assert!(require_permission(&editor, Permission::Administer).is_err());
/// ```

use super::claims::ClaimsSet;
use crate::models::user::Role;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller's role is below the one required
    #[error("Insufficient permissions: requires {required}, has {actual}")]
    InsufficientRole { required: Role, actual: Role },
}

/// Permission types for authorization checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Read content and comment (Reader+)
    Read,

    /// Create, edit and publish posts (Editor+)
    Publish,

    /// Manage accounts and everything else (Admin only)
    Administer,
}

impl Permission {
    /// Gets the minimum role required for this permission
    pub fn min_role(&self) -> Role {
        match self {
            Permission::Read => Role::Reader,
            Permission::Publish => Role::Editor,
            Permission::Administer => Role::Admin,
        }
    }
}

/// Checks that the caller holds at least `required`
///
/// # Errors
///
/// Returns `AuthzError::InsufficientRole` if the caller's role is lower.
pub fn require_role(claims: &ClaimsSet, required: Role) -> Result<(), AuthzError> {
    if !claims.role.has_permission(&required) {
        return Err(AuthzError::InsufficientRole {
            required,
            actual: claims.role,
        });
    }

    Ok(())
}

/// Checks that the caller may exercise `permission`
pub fn require_permission(claims: &ClaimsSet, permission: Permission) -> Result<(), AuthzError> {
    require_role(claims, permission.min_role())
}

/// Whether the caller may administer the site
pub fn is_admin(claims: &ClaimsSet) -> bool {
    claims.role.has_permission(&Role::Admin)
}

/// Whether the caller may publish posts
pub fn can_publish(claims: &ClaimsSet) -> bool {
    claims.role.has_permission(&Role::Editor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_roles() {
        assert_eq!(Permission::Read.min_role(), Role::Reader);
        assert_eq!(Permission::Publish.min_role(), Role::Editor);
        assert_eq!(Permission::Administer.min_role(), Role::Admin);
    }

    #[test]
    fn test_require_role() {
        let reader = ClaimsSet::new("r", Role::Reader);

        assert!(require_role(&reader, Role::Reader).is_ok());

        let err = require_role(&reader, Role::Editor).unwrap_err();
        assert!(matches!(
            err,
            AuthzError::InsufficientRole {
                required: Role::Editor,
                actual: Role::Reader
            }
        ));
        assert_eq!(
            err.to_string(),
            "Insufficient permissions: requires Editor, has Reader"
        );
    }

    #[test]
    fn test_admin_can_do_everything() {
        let admin = ClaimsSet::new("a", Role::Admin);

        for permission in [Permission::Read, Permission::Publish, Permission::Administer] {
            assert!(require_permission(&admin, permission).is_ok());
        }
    }

    #[test]
    fn test_flags() {
        let admin = ClaimsSet::new("a", Role::Admin);
        let editor = ClaimsSet::new("e", Role::Editor);
        let reader = ClaimsSet::new("r", Role::Reader);

        assert!(is_admin(&admin) && can_publish(&admin));
        assert!(!is_admin(&editor) && can_publish(&editor));
        assert!(!is_admin(&reader) && !can_publish(&reader));
    }
}

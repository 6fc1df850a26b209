/// Default account seeding
///
/// Populates an empty user store with one account per role so a fresh
/// deployment can be signed into. All seeded accounts share the configured
/// `DEFAULT_PASSWORD`. Seeding an already populated store does nothing.
///
/// | Email                     | Role   |
/// |---------------------------|--------|
/// | admin@example.com         | Admin  |
/// | editor@example.com        | Editor |
/// | othereditor@example.com   | Editor |
/// | reader@example.com        | Reader |

use std::sync::Arc;

use tracing::info;

use crate::auth::password::{self, PasswordHasher};
use crate::error::AuthResult;
use crate::models::user::{CreateUser, Role, UserRepository};

/// Accounts created on an empty store
pub const DEFAULT_ACCOUNTS: [(&str, Role); 4] = [
    ("admin@example.com", Role::Admin),
    ("editor@example.com", Role::Editor),
    ("othereditor@example.com", Role::Editor),
    ("reader@example.com", Role::Reader),
];

/// Seeds the default accounts if the store is empty
///
/// Returns the number of accounts created.
pub async fn seed_default_users<R>(
    users: &R,
    hasher: Arc<dyn PasswordHasher>,
    default_password: &str,
) -> AuthResult<usize>
where
    R: UserRepository + ?Sized,
{
    if users.count().await? > 0 {
        info!("User store already populated, skipping seed");
        return Ok(0);
    }

    for (email, role) in DEFAULT_ACCOUNTS {
        let password_hash =
            password::hash_blocking(hasher.clone(), default_password.to_string()).await?;

        users
            .create(CreateUser {
                user_name: user_name_for(email),
                email: email.to_string(),
                password_hash,
                role,
            })
            .await?;
    }

    info!(count = DEFAULT_ACCOUNTS.len(), "Seeded default users");
    Ok(DEFAULT_ACCOUNTS.len())
}

/// Derives a display name from the local part of an email
fn user_name_for(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::Argon2idHasher;
    use crate::models::user::InMemoryUserRepository;

    #[test]
    fn test_user_name_for() {
        assert_eq!(user_name_for("admin@example.com"), "admin");
        assert_eq!(user_name_for("no-at-sign"), "no-at-sign");
    }

    #[tokio::test]
    async fn test_seed_creates_one_account_per_entry() {
        let repo = InMemoryUserRepository::new();
        let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2idHasher::default());

        let created = seed_default_users(&repo, hasher.clone(), "S3cret!1")
            .await
            .unwrap();
        assert_eq!(created, 4);
        assert_eq!(repo.count().await.unwrap(), 4);

        let editor = repo
            .find_by_email("othereditor@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(editor.role, Role::Editor);
        assert_eq!(editor.user_name, "othereditor");
        assert!(hasher.verify("S3cret!1", &editor.password_hash));
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let repo = InMemoryUserRepository::new();
        let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2idHasher::default());

        seed_default_users(&repo, hasher.clone(), "S3cret!1")
            .await
            .unwrap();
        let second = seed_default_users(&repo, hasher, "S3cret!1")
            .await
            .unwrap();

        assert_eq!(second, 0);
        assert_eq!(repo.count().await.unwrap(), 4);
    }
}

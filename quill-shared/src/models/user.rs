/// User model and the identity lookup collaborator
///
/// This module provides the [`User`] identity record shared between the
/// credential hasher and the token service, the closed [`Role`] set, and the
/// [`UserRepository`] trait through which the core looks identities up.
///
/// Persistence is not this crate's concern: production deployments plug in
/// their own repository. [`InMemoryUserRepository`] backs tests, seeding and
/// the admin CLI.
///
/// # Example
///
/// ```
/// use quill_shared::models::user::{CreateUser, InMemoryUserRepository, Role, UserRepository};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let repo = InMemoryUserRepository::new();
///
/// let user = repo.create(CreateUser {
///     user_name: "alice".to_string(),
///     email: "alice@example.com".to_string(),
///     password_hash: "argon2id$...".parse()?,
///     role: Role::Reader,
/// }).await?;
///
/// let found = repo.find_by_email("alice@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::password::CredentialHash;
use crate::error::{AuthError, AuthResult};

/// Authorization roles
///
/// Each role is a capability superset of the next:
/// Admin can do everything Editor can, Editor everything Reader can.
///
/// Serialized as `"Admin"`, `"Editor"` or `"Reader"`; deserialized with the
/// same case-insensitive rules as [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Role {
    /// Full control, including other accounts
    Admin,

    /// Can write and publish posts
    Editor,

    /// Can read and comment
    Reader,
}

impl Role {
    /// Every role, highest first
    pub const ALL: [Role; 3] = [Role::Admin, Role::Editor, Role::Reader];

    /// Converts role to its wire tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Editor => "Editor",
            Role::Reader => "Reader",
        }
    }

    /// Checks if this role has permission level of the required role
    ///
    /// Hierarchy: Admin > Editor > Reader
    pub fn has_permission(&self, required: &Role) -> bool {
        self.permission_level() >= required.permission_level()
    }

    /// Returns numeric permission level for comparison
    fn permission_level(&self) -> u8 {
        match self {
            Role::Admin => 3,
            Role::Editor => 2,
            Role::Reader => 1,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AuthError::ValidationFailure(format!("Unknown role: {}", s)))
    }
}

impl TryFrom<String> for Role {
    type Error = AuthError;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        tag.parse()
    }
}

/// Identity record
///
/// Owned by the user store. The core reads it during login and never writes
/// it back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque unique identifier
    pub id: String,

    /// Display name
    pub user_name: String,

    /// Login email, unique across users
    pub email: String,

    /// Authorization role
    pub role: Role,

    /// Stored Argon2id credential, never serialized to clients
    #[serde(skip_serializing)]
    pub password_hash: CredentialHash,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Display name
    pub user_name: String,

    /// Login email
    pub email: String,

    /// Already-hashed credential (NOT plaintext password!)
    pub password_hash: CredentialHash,

    /// Initial role
    pub role: Role,
}

/// Identity lookup collaborator
///
/// The core calls `find_by_email` once per login attempt; it neither caches
/// nor retries.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by login email
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// Finds a user by identifier
    async fn find_by_id(&self, id: &str) -> AuthResult<Option<User>>;

    /// Checks whether an email is already registered
    async fn email_exists(&self, email: &str) -> AuthResult<bool> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    /// Stores a new user, assigning its identifier
    async fn create(&self, data: CreateUser) -> AuthResult<User>;

    /// Number of stored users
    async fn count(&self) -> AuthResult<usize>;
}

/// Process-local user store
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    /// Creates an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-populated with users
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let users = users.into_iter().map(|u| (u.id.clone(), u)).collect();
        Self {
            users: RwLock::new(users),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> AuthResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn create(&self, data: CreateUser) -> AuthResult<User> {
        let mut users = self.users.write().await;

        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&data.email))
        {
            return Err(AuthError::ValidationFailure(
                "Email already exists.".to_string(),
            ));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            user_name: data.user_name,
            email: data.email,
            role: data.role,
            password_hash: data.password_hash,
            created_at: Utc::now(),
        };
        users.insert(user.id.clone(), user.clone());

        Ok(user)
    }

    async fn count(&self) -> AuthResult<usize> {
        Ok(self.users.read().await.len())
    }
}

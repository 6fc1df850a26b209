/// Login and registration orchestration
///
/// [`AuthService`] wires the credential hasher, the token service and the
/// identity lookup collaborator into the two account flows:
///
/// - **Login**: look the identity up once by email, verify the password on
///   the blocking pool, issue a bearer token
/// - **Register**: validate input, reject duplicate emails, hash, store as
///   Reader
///
/// Unknown emails and wrong passwords are reported identically, and both
/// pay for exactly one password verification.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use quill_shared::auth::jwt::{JwtService, SigningKey};
/// use quill_shared::auth::password::Argon2idHasher;
/// use quill_shared::auth::service::{AuthService, LoginRequest, RegisterRequest};
/// use quill_shared::models::user::InMemoryUserRepository;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = AuthService::new(
///     Arc::new(InMemoryUserRepository::new()),
///     Arc::new(Argon2idHasher::default()),
///     Arc::new(JwtService::new(&SigningKey::generate())),
/// );
///
/// service.register(RegisterRequest {
///     email: "alice@example.com".to_string(),
///     password: "S3cret!1".to_string(),
///     name: "alice".to_string(),
/// }).await?;
///
/// let login = service.login(LoginRequest {
///     email: "alice@example.com".to_string(),
///     password: "S3cret!1".to_string(),
/// }).await?;
/// assert!(!login.jwt.is_empty());
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{info, warn};
use validator::Validate;

use super::authorization::{can_publish, is_admin};
use super::claims::ClaimsSet;
use super::jwt::TokenService;
use super::password::{self, CredentialHash, PasswordHasher};
use crate::error::{AuthError, AuthResult};
use crate::models::user::{CreateUser, Role, User, UserRepository};

/// Login request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token, valid for 7 days
    pub jwt: String,
}

/// Register request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password, checked by [`password::validate_password_strength`]
    pub password: String,

    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,
}

/// Register response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// Registered email
    pub email: String,

    /// Registered display name
    pub name: String,
}

/// Public account summary for the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUserInfo {
    /// Identity id
    pub id: String,

    /// Display name
    pub username: String,

    /// Role held
    pub role: Role,

    /// Whether the user may administer the site
    pub is_admin: bool,

    /// Whether the user may publish posts
    pub can_publish: bool,
}

impl AuthUserInfo {
    fn from_user(user: &User) -> Self {
        let claims = ClaimsSet::from_identity(user);
        Self {
            id: user.id.clone(),
            username: user.user_name.clone(),
            role: user.role,
            is_admin: is_admin(&claims),
            can_publish: can_publish(&claims),
        }
    }
}

/// Verified against when the email is unknown
const DECOY_PASSWORD: &str = "quill-decoy-credential";

/// Account flows over pluggable collaborators
pub struct AuthService<R: UserRepository> {
    users: Arc<R>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
    decoy_hash: Arc<OnceCell<CredentialHash>>,
}

impl<R: UserRepository> Clone for AuthService<R> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            hasher: self.hasher.clone(),
            tokens: self.tokens.clone(),
            decoy_hash: self.decoy_hash.clone(),
        }
    }
}

impl<R: UserRepository> AuthService<R> {
    /// Creates the service
    pub fn new(
        users: Arc<R>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            decoy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Token service used for issuance
    pub fn tokens(&self) -> &Arc<dyn TokenService> {
        &self.tokens
    }

    /// Checks credentials and returns the account summary
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AuthenticationFailure` for an unknown email, a
    /// wrong password, or a stored hash that cannot be verified.
    pub async fn authenticate(&self, request: LoginRequest) -> AuthResult<AuthUserInfo> {
        let user = self.verify_credentials(request).await?;
        Ok(AuthUserInfo::from_user(&user))
    }

    /// Checks credentials and issues a bearer token
    pub async fn login(&self, request: LoginRequest) -> AuthResult<LoginResponse> {
        let user = self.verify_credentials(request).await?;

        let jwt = self.tokens.issue_token(&ClaimsSet::from_identity(&user))?;
        info!(user_id = %user.id, role = %user.role, "User logged in");

        Ok(LoginResponse { jwt })
    }

    /// Registers a new Reader account
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ValidationFailure` for malformed input or an email
    /// that is already registered.
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<RegisterResponse> {
        request.validate()?;
        password::validate_password_strength(&request.password)?;

        if self.users.email_exists(&request.email).await? {
            return Err(AuthError::ValidationFailure(
                "Email already exists.".to_string(),
            ));
        }

        let password_hash = password::hash_blocking(self.hasher.clone(), request.password).await?;

        let user = self
            .users
            .create(CreateUser {
                user_name: request.name,
                email: request.email,
                password_hash,
                role: Role::Reader,
            })
            .await?;
        info!(user_id = %user.id, "Registered new user");

        Ok(RegisterResponse {
            email: user.email,
            name: user.user_name,
        })
    }

    /// Resolves the account behind validated claims
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenInvalid` if the identity no longer exists.
    pub async fn user_info(&self, claims: &ClaimsSet) -> AuthResult<AuthUserInfo> {
        let user = self
            .users
            .find_by_id(&claims.id)
            .await?
            .ok_or(AuthError::TokenInvalid)?;

        Ok(AuthUserInfo::from_user(&user))
    }

    async fn verify_credentials(&self, request: LoginRequest) -> AuthResult<User> {
        request
            .validate()
            .map_err(|_| AuthError::AuthenticationFailure)?;

        let Some(user) = self.users.find_by_email(&request.email).await? else {
            // Same verification cost as a known account with a wrong password
            let decoy = self.decoy_hash().await?;
            password::verify_blocking(self.hasher.clone(), request.password, decoy).await?;

            warn!("Login failed: unknown account");
            return Err(AuthError::AuthenticationFailure);
        };

        let verified = password::verify_blocking(
            self.hasher.clone(),
            request.password,
            user.password_hash.clone(),
        )
        .await?;

        if !verified {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(AuthError::AuthenticationFailure);
        }

        Ok(user)
    }

    /// Hash of [`DECOY_PASSWORD`], produced once with the configured hasher
    async fn decoy_hash(&self) -> AuthResult<CredentialHash> {
        self.decoy_hash
            .get_or_try_init(|| {
                password::hash_blocking(self.hasher.clone(), DECOY_PASSWORD.to_string())
            })
            .await
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{JwtService, SigningKey};
    use crate::auth::password::CredentialHash;
    use crate::models::user::InMemoryUserRepository;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Reverses the password; keeps these tests independent of Argon2 cost
    struct FakePasswordHasher;

    impl PasswordHasher for FakePasswordHasher {
        fn hash(&self, password: &str) -> AuthResult<CredentialHash> {
            Ok(CredentialHash::from(password.chars().rev().collect::<String>()))
        }

        fn verify(&self, password: &str, stored: &CredentialHash) -> bool {
            password.chars().rev().collect::<String>() == stored.as_str()
        }
    }

    /// Fake hasher that counts calls
    #[derive(Default)]
    struct CountingHasher {
        hashes: AtomicUsize,
        verifies: AtomicUsize,
    }

    impl PasswordHasher for CountingHasher {
        fn hash(&self, password: &str) -> AuthResult<CredentialHash> {
            self.hashes.fetch_add(1, Ordering::SeqCst);
            FakePasswordHasher.hash(password)
        }

        fn verify(&self, password: &str, stored: &CredentialHash) -> bool {
            self.verifies.fetch_add(1, Ordering::SeqCst);
            FakePasswordHasher.verify(password, stored)
        }
    }

    fn user(id: &str, role: Role) -> User {
        User {
            id: id.to_string(),
            user_name: id.replace("user", "User"),
            email: format!("{}@example.com", id),
            role,
            password_hash: FakePasswordHasher.hash("fakepassword").unwrap(),
            created_at: Utc::now(),
        }
    }

    fn service() -> AuthService<InMemoryUserRepository> {
        let repo = InMemoryUserRepository::with_users([
            user("user1", Role::Reader),
            user("user2", Role::Admin),
        ]);

        AuthService::new(
            Arc::new(repo),
            Arc::new(FakePasswordHasher),
            Arc::new(JwtService::new(&SigningKey::generate())),
        )
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn register(email: &str, password: &str, name: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let info = service()
            .authenticate(login("user1@example.com", "fakepassword"))
            .await
            .unwrap();

        assert_eq!(info.username, "User1");
        assert_eq!(info.role, Role::Reader);
        assert!(!info.is_admin);
        assert!(!info.can_publish);
    }

    #[tokio::test]
    async fn test_authenticate_invalid_email() {
        let result = service()
            .authenticate(login("invalid", "fakepassword"))
            .await;
        assert!(matches!(result, Err(AuthError::AuthenticationFailure)));
    }

    #[tokio::test]
    async fn test_authenticate_invalid_password() {
        let result = service()
            .authenticate(login("user1@example.com", "invalid"))
            .await;
        assert!(matches!(result, Err(AuthError::AuthenticationFailure)));
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_look_alike() {
        let service = service();

        let unknown = service
            .login(login("nobody@example.com", "fakepassword"))
            .await
            .unwrap_err();
        let wrong = service
            .login(login("user1@example.com", "wrong"))
            .await
            .unwrap_err();

        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_empty_credentials_fail_authentication() {
        let result = service().login(login("", "")).await;
        assert!(matches!(result, Err(AuthError::AuthenticationFailure)));
    }

    #[tokio::test]
    async fn test_login_issues_token_with_claims() {
        let service = service();

        let response = service
            .login(login("user2@example.com", "fakepassword"))
            .await
            .unwrap();
        let claims = service.tokens().validate_token(&response.jwt).unwrap();

        assert_eq!(claims, ClaimsSet::new("user2", Role::Admin));
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let service = service();

        let registered = service
            .register(register("new@example.com", "S3cret!1", "Newbie"))
            .await
            .unwrap();
        assert_eq!(registered.email, "new@example.com");
        assert_eq!(registered.name, "Newbie");

        let response = service
            .login(login("new@example.com", "S3cret!1"))
            .await
            .unwrap();
        let claims = service.tokens().validate_token(&response.jwt).unwrap();
        assert_eq!(claims.role, Role::Reader);

        let info = service.user_info(&claims).await.unwrap();
        assert_eq!(info.username, "Newbie");
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let result = service()
            .register(register("user1@example.com", "S3cret!1", "Again"))
            .await;

        match result {
            Err(AuthError::ValidationFailure(msg)) => assert_eq!(msg, "Email already exists."),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input() {
        let service = service();

        for request in [
            register("not-an-email", "S3cret!1", "Name"),
            register("ok@example.com", "short", "Name"),
            register("ok@example.com", "S3cret!1", ""),
        ] {
            let result = service.register(request).await;
            assert!(matches!(result, Err(AuthError::ValidationFailure(_))));
        }
    }

    #[tokio::test]
    async fn test_user_info_for_admin() {
        let info = service()
            .user_info(&ClaimsSet::new("user2", Role::Admin))
            .await
            .unwrap();

        assert_eq!(info.username, "User2");
        assert!(info.is_admin);
        assert!(info.can_publish);
    }

    #[tokio::test]
    async fn test_user_info_unknown_identity() {
        let result = service()
            .user_info(&ClaimsSet::new("ghost", Role::Admin))
            .await;
        assert!(matches!(result, Err(AuthError::TokenInvalid)));
    }

    #[tokio::test]
    async fn test_every_failed_login_verifies_once() {
        let hasher = Arc::new(CountingHasher::default());
        let service = AuthService::new(
            Arc::new(InMemoryUserRepository::with_users([user("user1", Role::Reader)])),
            hasher.clone(),
            Arc::new(JwtService::new(&SigningKey::generate())),
        );

        let attempts = [
            ("nobody@example.com", "fakepassword"),
            ("user1@example.com", "wrong"),
            ("ghost@example.com", "wrong"),
            ("user1@example.com", "fakepassword"),
        ];
        for (i, (email, password)) in attempts.into_iter().enumerate() {
            let _ = service.login(login(email, password)).await;
            assert_eq!(hasher.verifies.load(Ordering::SeqCst), i + 1, "{}", email);
        }

        // The decoy hash is computed once and reused
        assert_eq!(hasher.hashes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_register_rejects_short_password_once() {
        let result = service()
            .register(register("ok@example.com", "Sh0rt", "Name"))
            .await;

        match result {
            Err(AuthError::ValidationFailure(msg)) => {
                assert_eq!(msg, "Password must be at least 6 characters long")
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }
}

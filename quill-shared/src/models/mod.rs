/// Account models for Quill
///
/// # Models
///
/// - `user`: User accounts, roles and the lookup collaborator
///
/// # Example
///
/// ```
/// use quill_shared::models::user::Role;
///
/// assert!(Role::Admin.has_permission(&Role::Editor));
/// assert_eq!("reader".parse::<Role>().unwrap(), Role::Reader);
/// ```

pub mod user;

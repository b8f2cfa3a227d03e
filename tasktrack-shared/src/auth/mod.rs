/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing
/// - [`jwt`]: HS256 bearer tokens carrying user id and role
/// - [`middleware`]: bearer extraction and the request-scoped [`middleware::AuthContext`]
/// - [`authorization`]: ownership and admin predicates
///
/// # Example
///
/// ```
/// use tasktrack_shared::auth::{jwt, middleware::AuthContext, password};
/// use tasktrack_shared::models::Role;
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = password::hash_password("longpass1")?;
/// assert!(password::verify_password("longpass1", &hash)?);
///
/// let secret = "a-secret-of-at-least-thirty-two-bytes!";
/// let claims = jwt::Claims::new(Uuid::new_v4(), Role::User, Duration::hours(1));
/// let token = jwt::create_token(&claims, secret)?;
/// let auth: AuthContext = jwt::validate_token(&token, secret)?.into();
/// assert!(!auth.is_admin());
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;

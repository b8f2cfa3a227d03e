/// Request authentication
///
/// Turns an `Authorization: Bearer <token>` header into an [`AuthContext`].
/// The API's auth layer calls [`authenticate`] and inserts the context into
/// request extensions; handlers read it back with `Extension<AuthContext>`.
///
/// # Example
///
/// ```no_run
/// use axum::Extension;
/// use tasktrack_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("user {} ({})", auth.user_id, auth.role)
/// }
/// ```

use axum::http::{header, HeaderMap};
use uuid::Uuid;

use super::jwt::{validate_token, Claims, JwtError};
use crate::models::Role;

/// Identity of the caller, fixed for the lifetime of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    /// Authenticated user id
    pub user_id: Uuid,

    /// Role carried by the token
    pub role: Role,
}

impl AuthContext {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Whether the caller holds the ADMIN role
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        Self::new(claims.sub, claims.role)
    }
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header
    #[error("Access token required")]
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    #[error("Invalid authorization header")]
    InvalidFormat,

    /// Token failed validation
    #[error("Invalid or expired token")]
    InvalidToken(#[source] JwtError),
}

/// Extracts the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat)?;

    // Auth schemes are case-insensitive
    let token = match value.trim().split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
        None if value.trim().eq_ignore_ascii_case("bearer") => "",
        _ => return Err(AuthError::InvalidFormat),
    };

    if token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    Ok(token)
}

/// Validates the bearer token in `headers` and returns the caller identity
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;
    let claims = validate_token(token, secret).map_err(AuthError::InvalidToken)?;
    Ok(claims.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::create_token;
    use axum::http::HeaderValue;
    use chrono::Duration;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_auth_context_is_admin() {
        assert!(AuthContext::new(Uuid::new_v4(), Role::Admin).is_admin());
        assert!(!AuthContext::new(Uuid::new_v4(), Role::User).is_admin());
    }

    #[test]
    fn test_missing_header() {
        let result = authenticate(&HeaderMap::new(), SECRET);
        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }

    #[test]
    fn test_wrong_scheme() {
        let result = authenticate(&headers_with("Basic dXNlcjpwYXNz"), SECRET);
        assert!(matches!(result, Err(AuthError::InvalidFormat)));
    }

    #[test]
    fn test_empty_bearer() {
        let headers = headers_with("Bearer ");
        let result = bearer_token(&headers);
        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        for value in ["bearer abc.def", "BEARER abc.def", "Bearer   abc.def"] {
            let headers = headers_with(value);
            assert_eq!(bearer_token(&headers).unwrap(), "abc.def", "{value}");
        }

        let headers = headers_with("Bearerabc.def");
        assert!(matches!(bearer_token(&headers), Err(AuthError::InvalidFormat)));
    }

    #[test]
    fn test_valid_token_yields_context() {
        let user_id = Uuid::new_v4();
        let token = create_token(&Claims::new(user_id, Role::Admin, Duration::hours(1)), SECRET).unwrap();

        let ctx = authenticate(&headers_with(&format!("Bearer {}", token)), SECRET).unwrap();
        assert_eq!(ctx, AuthContext::new(user_id, Role::Admin));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let token = create_token(&Claims::new(Uuid::new_v4(), Role::User, Duration::hours(1)), SECRET).unwrap();
        let tampered = format!("Bearer {}x", token);

        assert!(matches!(
            authenticate(&headers_with(&tampered), SECRET),
            Err(AuthError::InvalidToken(_))
        ));
    }
}

/// Role and ownership checks
///
/// Pure predicates over an [`AuthContext`]; nothing here touches storage.
/// Handlers load the resource first, then ask whether the caller may act on
/// it.
///
/// # Rules
///
/// - ADMIN may act on any task and on the user list.
/// - USER may act only on tasks whose owner is the caller.
/// - Only ADMIN may list, update or delete users.
///
/// # Example
///
/// ```
/// use tasktrack_shared::auth::authorization::{can_access_task, require_admin};
/// use tasktrack_shared::auth::middleware::AuthContext;
/// use tasktrack_shared::models::Role;
/// use uuid::Uuid;
///
/// let owner = Uuid::new_v4();
/// let caller = AuthContext::new(owner, Role::User);
/// assert!(can_access_task(&caller, owner));
/// assert!(require_admin(&caller).is_err());
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Operation is restricted to administrators
    #[error("Admin access required")]
    AdminRequired,

    /// Caller neither owns the resource nor is an administrator
    #[error("Not authorized")]
    NotOwner,
}

/// Whether `auth` may read or mutate a task owned by `owner_id`
pub fn can_access_task(auth: &AuthContext, owner_id: Uuid) -> bool {
    auth.is_admin() || auth.user_id == owner_id
}

/// [`can_access_task`] as a `Result`
pub fn require_task_access(auth: &AuthContext, owner_id: Uuid) -> Result<(), AuthzError> {
    if can_access_task(auth, owner_id) {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}

/// Fails unless the caller is an administrator
pub fn require_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err(AuthzError::AdminRequired)
    }
}

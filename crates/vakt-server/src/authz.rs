use thiserror::Error;
use vakt_common::models::auth::Principal;
use vakt_common::models::user::Role;

/// Why access to a gated operation was denied. The transport adapter maps
/// these onto its own signals (401/403 for HTTP, unauthenticated /
/// permission-denied for gRPC).
#[derive(Debug, PartialEq, Eq, Error)]
pub enum AuthzError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("insufficient role")]
    Forbidden,
}

/// Allow only callers with a bound principal whose role satisfies
/// `required`. Roles are ordered, so an admin passes a `User` requirement.
///
/// The granted role is resolved by the caller from the user record; tokens
/// do not carry roles. `None` covers callers whose record has vanished.
pub fn require_role(
    principal: Option<&Principal>,
    granted: Option<Role>,
    required: Role,
) -> Result<(), AuthzError> {
    if principal.is_none() {
        return Err(AuthzError::Unauthenticated);
    }
    match granted {
        Some(role) if role >= required => Ok(()),
        _ => Err(AuthzError::Forbidden),
    }
}

/// Allow the caller when it is the target subject itself, or when it
/// satisfies `require_role`.
pub fn require_self_or_role(
    principal: Option<&Principal>,
    granted: Option<Role>,
    target_subject: &str,
    required: Role,
) -> Result<(), AuthzError> {
    if let Some(principal) = principal {
        if principal.subject == target_subject {
            return Ok(());
        }
    }
    require_role(principal, granted, required)
}

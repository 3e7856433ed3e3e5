//! Access policy: decides whether verified claims permit an action.
//!
//! - No IO
//! - No panics
//! - First matching rule wins; anything unmatched is denied

use crate::models::auth::TokenClaims;

/// Operations gated by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ReadOwnProfile,
    UpdateOwnProfile,
    ListUsers,
    CreateUser,
    EditUser,
    ChangeRole,
    DeleteUser,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ReadOwnProfile => "read_own_profile",
            Action::UpdateOwnProfile => "update_own_profile",
            Action::ListUsers => "list_users",
            Action::CreateUser => "create_user",
            Action::EditUser => "edit_user",
            Action::ChangeRole => "change_role",
            Action::DeleteUser => "delete_user",
        }
    }

    fn requires_admin(&self) -> bool {
        matches!(
            self,
            Action::CreateUser | Action::EditUser | Action::ChangeRole | Action::DeleteUser
        )
    }
}

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No verified claims were presented.
    Unauthenticated,
    /// Self-service action aimed at somebody else.
    NotOwner,
    /// Action needs the admin role.
    AdminRequired,
    /// No rule grants the action.
    Unmatched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Decide whether `claims` may perform `action` on `target_id`.
///
/// `claims` must come from [`super::jwt::TokenCodec::verify`]. Endpoints that
/// need no identity (login, registration) never call this.
pub fn authorize(
    claims: Option<&TokenClaims>,
    action: Action,
    target_id: Option<&str>,
) -> Decision {
    let Some(claims) = claims else {
        return Decision::Deny(DenyReason::Unauthenticated);
    };

    match action {
        Action::ReadOwnProfile | Action::UpdateOwnProfile => match target_id {
            Some(target) if target == claims.sub => Decision::Allow,
            Some(_) => Decision::Deny(DenyReason::NotOwner),
            None => Decision::Deny(DenyReason::Unmatched),
        },
        // Any authenticated caller may enumerate users.
        Action::ListUsers => Decision::Allow,
        a if a.requires_admin() => {
            if claims.is_admin() {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::AdminRequired)
            }
        }
        _ => Decision::Deny(DenyReason::Unmatched),
    }
}

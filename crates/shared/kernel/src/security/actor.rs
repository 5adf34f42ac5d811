use crate::domain::roles::{Role, RoleSet};
use crate::security::session::SessionClaims;

/// The authenticated caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub email: String,
    pub roles: RoleSet,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>, roles: RoleSet) -> Self {
        Self { user_id: user_id.into(), email: email.into(), roles }
    }

    #[must_use]
    pub fn has(&self, role: Role) -> bool {
        self.roles.has(role)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has(Role::Admin)
    }

    #[must_use]
    pub fn is_professor(&self) -> bool {
        self.has(Role::Professor)
    }

    #[must_use]
    pub fn is_student(&self) -> bool {
        self.has(Role::Student)
    }

    /// True when `user_id` refers to the caller.
    #[must_use]
    pub fn is(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

impl From<SessionClaims> for Actor {
    fn from(claims: SessionClaims) -> Self {
        Self { user_id: claims.sub, email: claims.email, roles: claims.roles }
    }
}

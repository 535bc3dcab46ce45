//! Identity of the account invoking a use-case

use crate::domain::UserRole;

/// Authenticated caller, as established by the HTTP auth layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub role: UserRole,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Admins may act on any account; members only on their own.
    pub fn can_act_for(&self, user_id: &str) -> bool {
        self.is_admin() || self.user_id == user_id
    }
}

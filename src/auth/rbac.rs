//! Role-based authorization.

use crate::{auth::repo_types::User, error::AppError};

/// A permission a route can demand of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    AdminOnly,
}

impl Capability {
    fn allows(self, user: &User) -> bool {
        match self {
            Capability::AdminOnly => user.is_admin(),
        }
    }
}

/// Allow or deny `user` for `capability`. Depends only on the user's role.
pub fn authorize(user: &User, capability: Capability) -> Result<(), AppError> {
    if capability.allows(user) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin access required"))
    }
}

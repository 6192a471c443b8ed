use serde::{Deserialize, Serialize};

use crate::auth::repo_types::Role;

/// Caller-supplied claims, snapshotted into the token at issuance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    pub role: Role,
    pub email: String,
}

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user ID
    pub iat: i64,    // issued at (unix timestamp)
    pub exp: i64,    // expires at (unix timestamp)
    #[serde(flatten)]
    pub extra: TokenClaims,
}

impl Claims {
    /// Subject parsed back into a user id.
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

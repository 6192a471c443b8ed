use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::{debug, warn};

use crate::{
    auth::{
        jwt::JwtKeys,
        rbac::{authorize, Capability},
        repo::UserStore,
        repo_types::User,
    },
    error::AppError,
    state::AppState,
};

const BAD_HEADER: &str = "Missing or invalid authorization header";
const BAD_TOKEN: &str = "Invalid or expired token";

/// Resolve an `Authorization` header value to the live user it names.
///
/// Unknown subjects fail exactly like invalid tokens, so a stale token for a
/// deleted account learns nothing about the account.
pub async fn authenticate(
    header: Option<&str>,
    keys: &JwtKeys,
    users: &dyn UserStore,
) -> Result<User, AppError> {
    let token = header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthenticated(BAD_HEADER))?;

    let claims = keys
        .validate(token)
        .map_err(|_| AppError::Unauthenticated(BAD_TOKEN))?;

    let user_id = claims.user_id().ok_or_else(|| {
        debug!(sub = %claims.sub, "non-numeric subject");
        AppError::Unauthenticated(BAD_TOKEN)
    })?;

    match users.find_by_id(user_id).await? {
        Some(user) => Ok(user),
        None => {
            warn!(user_id, "token subject no longer exists");
            Err(AppError::Unauthenticated(BAD_TOKEN))
        }
    }
}

/// Extracts and validates the bearer token, returning the current user.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // A non-UTF-8 header counts as malformed.
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let user = authenticate(header, &state.keys, state.users.as_ref()).await?;
        Ok(CurrentUser(user))
    }
}

/// Like `CurrentUser`, but additionally requires the admin role.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if let Err(e) = authorize(&user, Capability::AdminOnly) {
            warn!(user_id = user.id, role = user.role.as_str(), "admin access denied");
            return Err(e);
        }
        Ok(AdminUser(user))
    }
}

use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest, TokenResponse, UserView},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::UserStore,
        repo_types::{NewUser, Role},
    },
    db::RepoError,
    error::AppError,
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const EMAIL_TAKEN: &str = "Email already registered";

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    // Verified against on unknown emails so both login failures cost the same.
    static ref TIMING_GUARD_HASH: Option<String> = hash_password("timing-guard").ok();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    email.len() <= 255 && EMAIL_RE.is_match(email)
}

fn validate_registration(req: &RegisterRequest) -> Result<(), AppError> {
    let name_len = req.name.trim().chars().count();
    if name_len == 0 || req.name.chars().count() > 255 {
        return Err(AppError::Validation(
            "name must be between 1 and 255 characters".into(),
        ));
    }
    if !is_valid_email(&req.email) {
        return Err(AppError::Validation("email is not a valid address".into()));
    }
    let password_len = req.password.chars().count();
    if !(8..=128).contains(&password_len) {
        return Err(AppError::Validation(
            "password must be between 8 and 128 characters".into(),
        ));
    }
    Ok(())
}

/// Registration and login over a credential store and token keys.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    keys: JwtKeys,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.users.clone(), state.keys.clone())
    }
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, keys: JwtKeys) -> Self {
        Self { users, keys }
    }

    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn register(&self, req: RegisterRequest) -> Result<UserView, AppError> {
        validate_registration(&req)?;

        // Best-effort pre-check; the unique index is the real guard.
        if self.users.find_by_email(&req.email).await?.is_some() {
            warn!("email already registered");
            return Err(AppError::Conflict(EMAIL_TAKEN));
        }

        let password = req.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .context("hashing task panicked")??;

        let new_user = NewUser {
            name: req.name,
            email: req.email,
            password_hash,
            role: Role::User,
        };
        let user = match self.users.insert(new_user).await {
            Ok(user) => user,
            Err(RepoError::Conflict) => {
                warn!("email registered concurrently");
                return Err(AppError::Conflict(EMAIL_TAKEN));
            }
            Err(e) => return Err(e.into()),
        };

        info!(user_id = user.id, "user registered");
        Ok(user.into())
    }

    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn login(&self, req: LoginRequest) -> Result<TokenResponse, AppError> {
        let user = self.users.find_by_email(&req.email).await?;

        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        let password = req.password;
        let verified = tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => verify_password(&password, &hash),
            None => {
                if let Some(guard) = TIMING_GUARD_HASH.as_deref() {
                    verify_password(&password, guard);
                }
                false
            }
        })
        .await
        .context("verify task panicked")?;

        let user = match user {
            Some(user) if verified => user,
            _ => {
                warn!("login failed");
                return Err(AppError::Unauthenticated(INVALID_CREDENTIALS));
            }
        };

        let access_token = self.keys.issue_access(&user)?;
        info!(user_id = user.id, role = user.role.as_str(), "user logged in");
        Ok(TokenResponse {
            access_token,
            token_type: "bearer",
            expires_in: self.keys.access_ttl().whole_seconds(),
        })
    }
}

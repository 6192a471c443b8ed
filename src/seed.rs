use anyhow::Context;
use tracing::{info, warn};

use crate::{
    auth::{
        password::hash_password,
        repo::UserStore,
        repo_types::{NewUser, Role},
    },
    config::AdminSeed,
    db::RepoError,
};

/// Create the configured admin account unless that email is already taken.
/// An existing account is never modified.
pub async fn ensure_admin(users: &dyn UserStore, seed: &AdminSeed) -> anyhow::Result<()> {
    if let Some(existing) = users
        .find_by_email(&seed.email)
        .await
        .context("look up admin account")?
    {
        if existing.role != Role::Admin {
            warn!(
                user_id = existing.id,
                "admin bootstrap email belongs to a non-admin account; leaving it unchanged"
            );
        }
        return Ok(());
    }

    let password = seed.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("hashing task panicked")??;

    match users
        .insert(NewUser {
            name: seed.name.clone(),
            email: seed.email.clone(),
            password_hash,
            role: Role::Admin,
        })
        .await
    {
        Ok(user) => {
            info!(user_id = user.id, "admin bootstrap: account created");
            Ok(())
        }
        // Another instance created it first.
        Err(RepoError::Conflict) => Ok(()),
        Err(e) => Err(anyhow::Error::new(e).context("insert admin account")),
    }
}

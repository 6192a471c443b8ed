use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use crate::{
    auth::{
        dto::UserView,
        extractors::{AdminUser, CurrentUser},
    },
    error::AppError,
    extract::ValidQuery,
    pagination::Pagination,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/me", get(get_me))
}

/// GET /users (admin only)
#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidQuery(p): ValidQuery<Pagination>,
) -> Result<Json<Vec<UserView>>, AppError> {
    let p = p.validated()?;
    let users = state.users.list(p.skip, p.limit).await?;
    Ok(Json(users.into_iter().map(UserView::from).collect()))
}

#[instrument(skip_all)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<UserView> {
    Json(user.into())
}

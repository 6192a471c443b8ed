use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::extractors::AdminUser,
    error::AppError,
    extract::{ValidJson, ValidPath, ValidQuery},
    pagination::Pagination,
    products::{
        dto::{CreateProductRequest, UpdateProductRequest},
        repo_types::Product,
    },
    state::AppState,
};

const NOT_FOUND: &str = "Product not found";

// List/get are public; writes require an admin.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    ValidQuery(p): ValidQuery<Pagination>,
) -> Result<Json<Vec<Product>>, AppError> {
    let p = p.validated()?;
    Ok(Json(state.products.list(p.skip, p.limit).await?))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<i64>,
) -> Result<Json<Product>, AppError> {
    state
        .products
        .get(id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound(NOT_FOUND))
}

#[instrument(skip(state, admin, body), fields(admin_id = admin.0.id))]
pub async fn create_product(
    State(state): State<AppState>,
    admin: AdminUser,
    ValidJson(body): ValidJson<CreateProductRequest>,
) -> Result<(StatusCode, HeaderMap, Json<Product>), AppError> {
    let product = state.products.create(body.into()).await?;
    info!(product_id = product.id, "product created");

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/products/{}", product.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(product)))
}

#[instrument(skip(state, admin, body), fields(admin_id = admin.0.id))]
pub async fn update_product(
    State(state): State<AppState>,
    admin: AdminUser,
    ValidPath(id): ValidPath<i64>,
    ValidJson(body): ValidJson<UpdateProductRequest>,
) -> Result<Json<Product>, AppError> {
    let product = state
        .products
        .update(id, body.into())
        .await?
        .ok_or(AppError::NotFound(NOT_FOUND))?;
    info!(product_id = id, "product updated");
    Ok(Json(product))
}

#[instrument(skip(state, admin), fields(admin_id = admin.0.id))]
pub async fn delete_product(
    State(state): State<AppState>,
    admin: AdminUser,
    ValidPath(id): ValidPath<i64>,
) -> Result<StatusCode, AppError> {
    if !state.products.delete(id).await? {
        return Err(AppError::NotFound(NOT_FOUND));
    }
    info!(product_id = id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}

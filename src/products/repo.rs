use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::RepoError;
use crate::products::repo_types::{NewProduct, Product, ProductPatch};

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn create(&self, product: NewProduct) -> Result<Product, RepoError>;
    async fn get(&self, id: i64) -> Result<Option<Product>, RepoError>;
    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Product>, RepoError>;
    async fn update(&self, id: i64, patch: ProductPatch) -> Result<Option<Product>, RepoError>;
    /// Returns whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool, RepoError>;
}

#[derive(Clone)]
pub struct PgProductStore {
    db: PgPool,
}

impl PgProductStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn create(&self, product: NewProduct) -> Result<Product, RepoError> {
        let row = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, description, price)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, price, created_at, updated_at
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn get(&self, id: i64) -> Result<Option<Product>, RepoError> {
        let row = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Product>, RepoError> {
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, created_at, updated_at
            FROM products
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn update(&self, id: i64, patch: ProductPatch) -> Result<Option<Product>, RepoError> {
        let (set_description, description) = match patch.description {
            Some(d) => (true, d),
            None => (false, None),
        };
        let row = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
               SET name = COALESCE($2, name),
                   price = COALESCE($3, price),
                   description = CASE WHEN $4 THEN $5 ELSE description END,
                   updated_at = now()
             WHERE id = $1
            RETURNING id, name, description, price, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.price)
        .bind(set_description)
        .bind(description)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

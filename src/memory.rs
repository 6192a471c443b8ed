//! In-memory stores backing `AppState::fake()`.

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::{
    auth::{
        repo::UserStore,
        repo_types::{NewUser, Role, User},
    },
    db::RepoError,
    products::{
        repo::ProductStore,
        repo_types::{NewProduct, Product, ProductPatch},
    },
};

#[derive(Default)]
struct Users {
    rows: Vec<User>,
    next_id: i64,
    fail_next_insert: bool,
    unavailable: bool,
}

#[derive(Default)]
pub struct MemoryUserStore {
    inner: Mutex<Users>,
}

impl MemoryUserStore {
    pub async fn count_email(&self, email: &str) -> usize {
        let inner = self.inner.lock().await;
        inner.rows.iter().filter(|u| u.email == email).count()
    }

    pub async fn set_role(&self, id: i64, role: Role) {
        let mut inner = self.inner.lock().await;
        if let Some(user) = inner.rows.iter_mut().find(|u| u.id == id) {
            user.role = role;
            user.updated_at = OffsetDateTime::now_utc();
        }
    }

    /// Simulates losing a registration race: the next insert hits the
    /// unique index even though the pre-check saw no row.
    pub async fn reject_next_insert_as_duplicate(&self) {
        self.inner.lock().await.fail_next_insert = true;
    }

    /// Every later call fails with a database error, as if the pool were down.
    pub async fn go_offline(&self) {
        self.inner.lock().await.unavailable = true;
    }
}

fn offline() -> RepoError {
    RepoError::Database(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let inner = self.inner.lock().await;
        if inner.unavailable {
            return Err(offline());
        }
        Ok(inner.rows.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        let inner = self.inner.lock().await;
        if inner.unavailable {
            return Err(offline());
        }
        Ok(inner.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, RepoError> {
        let mut inner = self.inner.lock().await;
        if inner.unavailable {
            return Err(offline());
        }
        if std::mem::take(&mut inner.fail_next_insert)
            || inner.rows.iter().any(|u| u.email == user.email)
        {
            return Err(RepoError::Conflict);
        }
        inner.next_id += 1;
        let now = OffsetDateTime::now_utc();
        let row = User {
            id: inner.next_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        inner.rows.push(row.clone());
        Ok(row)
    }

    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<User>, RepoError> {
        let inner = self.inner.lock().await;
        if inner.unavailable {
            return Err(offline());
        }
        Ok(page(&inner.rows, skip, limit))
    }
}

#[derive(Default)]
struct Products {
    rows: Vec<Product>,
    next_id: i64,
}

#[derive(Default)]
pub struct MemoryProductStore {
    inner: Mutex<Products>,
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn create(&self, product: NewProduct) -> Result<Product, RepoError> {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let now = OffsetDateTime::now_utc();
        let row = Product {
            id: inner.next_id,
            name: product.name,
            description: product.description,
            price: product.price.round_dp(2),
            created_at: now,
            updated_at: now,
        };
        inner.rows.push(row.clone());
        Ok(row)
    }

    async fn get(&self, id: i64) -> Result<Option<Product>, RepoError> {
        let inner = self.inner.lock().await;
        Ok(inner.rows.iter().find(|p| p.id == id).cloned())
    }

    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Product>, RepoError> {
        let inner = self.inner.lock().await;
        Ok(page(&inner.rows, skip, limit))
    }

    async fn update(&self, id: i64, patch: ProductPatch) -> Result<Option<Product>, RepoError> {
        let mut inner = self.inner.lock().await;
        let Some(row) = inner.rows.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            row.name = name;
        }
        if let Some(description) = patch.description {
            row.description = description;
        }
        if let Some(price) = patch.price {
            row.price = price.round_dp(2);
        }
        row.updated_at = OffsetDateTime::now_utc();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, RepoError> {
        let mut inner = self.inner.lock().await;
        let before = inner.rows.len();
        inner.rows.retain(|p| p.id != id);
        Ok(inner.rows.len() != before)
    }
}

fn page<T: Clone>(rows: &[T], skip: i64, limit: i64) -> Vec<T> {
    rows.iter()
        .skip(skip.max(0) as usize)
        .take(limit.max(0) as usize)
        .cloned()
        .collect()
}

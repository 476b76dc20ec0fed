//! Stores repository
//!
//! The auth layer hands the core an already-authenticated owner; the only
//! responsibility here is resolving that owner to a store id.

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{Owner, Store},
};

/// Resolution of a caller identity to a store id — the boundary the book
/// service depends on, kept as a trait so tests can substitute it.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait StoreResolver: Send + Sync {
    async fn resolve(&self, owner: Owner) -> AppResult<i32>;
}

#[derive(Clone)]
pub struct StoresRepository {
    pool: Pool<Postgres>,
}

#[async_trait::async_trait]
impl StoreResolver for StoresRepository {
    async fn resolve(&self, owner: Owner) -> AppResult<i32> {
        StoresRepository::resolve(self, owner).await
    }
}

impl StoresRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Resolve a caller identity to its store id.
    ///
    /// A `Store` owner is its own store; a `User` owner is looked up through
    /// the stores table. Either way the store must exist.
    pub async fn resolve(&self, owner: Owner) -> AppResult<i32> {
        match owner {
            Owner::Store(store_id) => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM stores WHERE id = $1)")
                        .bind(store_id)
                        .fetch_one(&self.pool)
                        .await?;
                if exists {
                    Ok(store_id)
                } else {
                    Err(AppError::NotFound(format!("Store {} not found", store_id)))
                }
            }
            Owner::User(user_id) => {
                sqlx::query_scalar("SELECT id FROM stores WHERE user_id = $1")
                    .bind(user_id)
                    .fetch_optional(&self.pool)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("No store associated with user {}", user_id))
                    })
            }
        }
    }

    /// Get store by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Store> {
        sqlx::query_as::<_, Store>("SELECT id, name, user_id, created_at FROM stores WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Store {} not found", id)))
    }

    /// Create a store (used by seeding and tests)
    pub async fn create(&self, name: &str, user_id: Option<i32>) -> AppResult<Store> {
        let store = sqlx::query_as::<_, Store>(
            "INSERT INTO stores (name, user_id) VALUES ($1, $2) RETURNING id, name, user_id, created_at",
        )
        .bind(name)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(store)
    }
}

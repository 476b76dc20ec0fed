//! Locations repository
//!
//! Store-scoped lookup table (shelves, storerooms...). Labels are unique per
//! store; books reference locations with RESTRICT semantics.

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::Location,
};

#[derive(Clone)]
pub struct LocationsRepository {
    pool: Pool<Postgres>,
}

impl LocationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all locations of a store
    pub async fn list(&self, store_id: i32) -> AppResult<Vec<Location>> {
        let locations = sqlx::query_as::<_, Location>(
            "SELECT id, store_id, label FROM locations WHERE store_id = $1 ORDER BY label",
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(locations)
    }

    /// Get location by ID, scoped to a store
    pub async fn get_by_id(&self, store_id: i32, id: i32) -> AppResult<Location> {
        sqlx::query_as::<_, Location>(
            "SELECT id, store_id, label FROM locations WHERE id = $1 AND store_id = $2",
        )
        .bind(id)
        .bind(store_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Location {} not found", id)))
    }

    /// Insert any labels the store does not have yet.
    pub async fn create_many_if_missing(
        &self,
        store_id: i32,
        labels: &[String],
    ) -> AppResult<Vec<Location>> {
        let mut locations = Vec::with_capacity(labels.len());
        for label in labels {
            let location = sqlx::query_as::<_, Location>(
                r#"
                INSERT INTO locations (store_id, label) VALUES ($1, $2)
                ON CONFLICT (store_id, label) DO UPDATE SET label = EXCLUDED.label
                RETURNING id, store_id, label
                "#,
            )
            .bind(store_id)
            .bind(label)
            .fetch_one(&self.pool)
            .await?;
            locations.push(location);
        }
        Ok(locations)
    }

    /// Delete a location still referenced by no book.
    pub async fn delete(&self, store_id: i32, id: i32) -> AppResult<()> {
        let referenced: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE location_id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        if referenced {
            return Err(AppError::Conflict(format!(
                "Location {} is still referenced by books",
                id
            )));
        }
        let result = sqlx::query("DELETE FROM locations WHERE id = $1 AND store_id = $2")
            .bind(id)
            .bind(store_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Location {} not found", id)));
        }
        Ok(())
    }
}

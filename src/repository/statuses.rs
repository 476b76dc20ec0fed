//! Statuses repository
//!
//! Global lookup table with unique labels; books reference statuses with
//! RESTRICT semantics.

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::Status,
};

#[derive(Clone)]
pub struct StatusesRepository {
    pool: Pool<Postgres>,
}

impl StatusesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all statuses
    pub async fn list(&self) -> AppResult<Vec<Status>> {
        let statuses = sqlx::query_as::<_, Status>("SELECT id, label FROM statuses ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(statuses)
    }

    /// Get status by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Status> {
        sqlx::query_as::<_, Status>("SELECT id, label FROM statuses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Status {} not found", id)))
    }

    /// Get status by its unique label
    pub async fn get_by_label(&self, label: &str) -> AppResult<Status> {
        sqlx::query_as::<_, Status>("SELECT id, label FROM statuses WHERE label = $1")
            .bind(label)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Status '{}' not found", label)))
    }

    /// Insert any labels not present yet; existing labels are left untouched.
    pub async fn create_many_if_missing(&self, labels: &[String]) -> AppResult<Vec<Status>> {
        let mut statuses = Vec::with_capacity(labels.len());
        for label in labels {
            let status = sqlx::query_as::<_, Status>(
                r#"
                INSERT INTO statuses (label) VALUES ($1)
                ON CONFLICT (label) DO UPDATE SET label = EXCLUDED.label
                RETURNING id, label
                "#,
            )
            .bind(label)
            .fetch_one(&self.pool)
            .await?;
            statuses.push(status);
        }
        Ok(statuses)
    }

    /// Delete a status still referenced by no book.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let referenced: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE status_id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        if referenced {
            return Err(AppError::Conflict(format!(
                "Status {} is still referenced by books",
                id
            )));
        }
        let result = sqlx::query("DELETE FROM statuses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Status {} not found", id)));
        }
        Ok(())
    }
}

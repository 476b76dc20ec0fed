//! Topics repository
//!
//! Topics are global and interned: a topic name is lower-cased at write time
//! and the existing row is reused when present, so two books tagged
//! "Fantasy" and "fantasy" share one `fantasy` row.

use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::Topic,
};

#[derive(Clone)]
pub struct TopicsRepository {
    pool: Pool<Postgres>,
}

impl TopicsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all topics
    pub async fn list(&self) -> AppResult<Vec<Topic>> {
        let topics = sqlx::query_as::<_, Topic>("SELECT id, name FROM topics ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(topics)
    }

    /// Get topic by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Topic> {
        sqlx::query_as::<_, Topic>("SELECT id, name FROM topics WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Topic {} not found", id)))
    }

    /// Find or create each topic within the caller's transaction; input names
    /// must already be lower-cased and deduplicated. Returns the topic rows
    /// in input order.
    ///
    /// `ON CONFLICT` keeps concurrent interning of the same name from
    /// failing the transaction.
    pub async fn find_or_create_many(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        names: &[String],
    ) -> AppResult<Vec<Topic>> {
        let mut topics = Vec::with_capacity(names.len());
        for name in names {
            let topic = sqlx::query_as::<_, Topic>(
                r#"
                INSERT INTO topics (name) VALUES ($1)
                ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                RETURNING id, name
                "#,
            )
            .bind(name)
            .fetch_one(&mut **tx)
            .await?;
            topics.push(topic);
        }
        Ok(topics)
    }

    /// Delete a topic. Books still referencing it keep it alive (RESTRICT).
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let referenced: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM book_topics WHERE topic_id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        if referenced {
            return Err(AppError::Conflict(format!(
                "Topic {} is still referenced by books",
                id
            )));
        }
        let result = sqlx::query("DELETE FROM topics WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Topic {} not found", id)));
        }
        Ok(())
    }
}

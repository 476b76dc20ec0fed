//! Books repository for database operations.
//!
//! The book row and its satellite tables (languages, keywords, images, topic
//! links) are always written inside a caller-supplied transaction so that a
//! book and its satellites commit or roll back as one unit. Reads go through
//! the pool and load satellites explicitly.

use rust_decimal::Decimal;
use sqlx::{Pool, Postgres, QueryBuilder, Transaction};
use std::collections::HashMap;

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookImage, BookKeyword, BookLanguage, BookQuery, Pagination},
        Topic,
    },
};

/// Column list shared by every book SELECT; `ref` is aliased because it is a
/// keyword on the Rust side.
const BOOK_COLUMNS: &str = "id, store_id, ref AS ref_, isbn, title, author, publication_place, \
     publisher, collection, year, size, weight, pages, condition, description, binding, \
     price, stock, private_note, status_id, location_id, sold_at, created_at, updated_at, \
     deleted_at";

/// Normalized book row ready for insertion. Built by the service after
/// validation and normalization; satellites travel separately.
#[derive(Debug, Clone)]
pub struct NewBookRow {
    pub ref_: i32,
    pub isbn: Option<String>,
    pub title: String,
    pub author: Option<String>,
    pub publication_place: Option<String>,
    pub publisher: Option<String>,
    pub collection: Option<String>,
    pub year: Option<i32>,
    pub size: Option<String>,
    pub weight: Option<i32>,
    pub pages: Option<i32>,
    pub condition: Option<String>,
    pub description: Option<String>,
    pub binding: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub private_note: Option<String>,
    pub status_id: i32,
    pub location_id: Option<i32>,
}

/// Scalar column patch applied by update; satellite replacement is driven by
/// the service through the `replace_*` methods.
#[derive(Debug, Clone, Default)]
pub struct BookPatch {
    pub ref_: Option<i32>,
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub publication_place: Option<String>,
    pub publisher: Option<String>,
    pub collection: Option<String>,
    pub year: Option<i32>,
    pub size: Option<String>,
    pub weight: Option<i32>,
    pub pages: Option<i32>,
    pub condition: Option<String>,
    pub description: Option<String>,
    pub binding: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub private_note: Option<String>,
    pub status_id: Option<i32>,
    pub location_id: Option<i32>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool {
        self.ref_.is_none()
            && self.isbn.is_none()
            && self.title.is_none()
            && self.author.is_none()
            && self.publication_place.is_none()
            && self.publisher.is_none()
            && self.collection.is_none()
            && self.year.is_none()
            && self.size.is_none()
            && self.weight.is_none()
            && self.pages.is_none()
            && self.condition.is_none()
            && self.description.is_none()
            && self.binding.is_none()
            && self.price.is_none()
            && self.stock.is_none()
            && self.private_note.is_none()
            && self.status_id.is_none()
            && self.location_id.is_none()
    }
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // CREATE
    // =========================================================================

    /// Insert one book row, returning its id.
    pub async fn insert_one(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        store_id: i32,
        row: &NewBookRow,
    ) -> AppResult<i32> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO books (
                store_id, ref, isbn, title, author, publication_place, publisher,
                collection, year, size, weight, pages, condition, description,
                binding, price, stock, private_note, status_id, location_id
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
            ) RETURNING id
            "#,
        )
        .bind(store_id)
        .bind(row.ref_)
        .bind(&row.isbn)
        .bind(&row.title)
        .bind(&row.author)
        .bind(&row.publication_place)
        .bind(&row.publisher)
        .bind(&row.collection)
        .bind(row.year)
        .bind(&row.size)
        .bind(row.weight)
        .bind(row.pages)
        .bind(&row.condition)
        .bind(&row.description)
        .bind(&row.binding)
        .bind(row.price)
        .bind(row.stock)
        .bind(&row.private_note)
        .bind(row.status_id)
        .bind(row.location_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(id)
    }

    /// Insert a chunk of book rows in one statement, returning the new ids in
    /// input order.
    pub async fn insert_chunk(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        store_id: i32,
        rows: &[NewBookRow],
    ) -> AppResult<Vec<i32>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::new(
            "INSERT INTO books (store_id, ref, isbn, title, author, publication_place, \
             publisher, collection, year, size, weight, pages, condition, description, \
             binding, price, stock, private_note, status_id, location_id) ",
        );
        qb.push_values(rows, |mut b, row| {
            b.push_bind(store_id)
                .push_bind(row.ref_)
                .push_bind(&row.isbn)
                .push_bind(&row.title)
                .push_bind(&row.author)
                .push_bind(&row.publication_place)
                .push_bind(&row.publisher)
                .push_bind(&row.collection)
                .push_bind(row.year)
                .push_bind(&row.size)
                .push_bind(row.weight)
                .push_bind(row.pages)
                .push_bind(&row.condition)
                .push_bind(&row.description)
                .push_bind(&row.binding)
                .push_bind(row.price)
                .push_bind(row.stock)
                .push_bind(&row.private_note)
                .push_bind(row.status_id)
                .push_bind(row.location_id);
        });
        qb.push(" RETURNING id");
        let ids = qb
            .build_query_scalar::<i32>()
            .fetch_all(&mut **tx)
            .await?;
        Ok(ids)
    }

    // =========================================================================
    // SATELLITES
    // =========================================================================

    /// Insert language rows as (book_id, code) pairs.
    pub async fn insert_languages(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        rows: &[(i32, String)],
    ) -> AppResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut qb = QueryBuilder::new("INSERT INTO book_languages (book_id, code) ");
        qb.push_values(rows, |mut b, (book_id, code)| {
            b.push_bind(book_id).push_bind(code);
        });
        qb.build().execute(&mut **tx).await?;
        Ok(())
    }

    /// Insert keyword rows as (book_id, keyword) pairs.
    pub async fn insert_keywords(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        rows: &[(i32, String)],
    ) -> AppResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut qb = QueryBuilder::new("INSERT INTO book_keywords (book_id, keyword) ");
        qb.push_values(rows, |mut b, (book_id, keyword)| {
            b.push_bind(book_id).push_bind(keyword);
        });
        qb.build().execute(&mut **tx).await?;
        Ok(())
    }

    /// Insert image rows as (book_id, url) pairs.
    pub async fn insert_images(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        rows: &[(i32, String)],
    ) -> AppResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut qb = QueryBuilder::new("INSERT INTO book_images (book_id, url) ");
        qb.push_values(rows, |mut b, (book_id, url)| {
            b.push_bind(book_id).push_bind(url);
        });
        qb.build().execute(&mut **tx).await?;
        Ok(())
    }

    /// Link books to interned topics as (book_id, topic_id) pairs.
    pub async fn link_topics(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        rows: &[(i32, i32)],
    ) -> AppResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut qb = QueryBuilder::new("INSERT INTO book_topics (book_id, topic_id) ");
        qb.push_values(rows, |mut b, (book_id, topic_id)| {
            b.push_bind(book_id).push_bind(topic_id);
        });
        qb.push(" ON CONFLICT (book_id, topic_id) DO NOTHING");
        qb.build().execute(&mut **tx).await?;
        Ok(())
    }

    /// Replace all language rows of a book.
    pub async fn replace_languages(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        book_id: i32,
        codes: &[String],
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM book_languages WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut **tx)
            .await?;
        let rows: Vec<(i32, String)> = codes.iter().map(|c| (book_id, c.clone())).collect();
        self.insert_languages(tx, &rows).await
    }

    /// Replace all keyword rows of a book.
    pub async fn replace_keywords(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        book_id: i32,
        keywords: &[String],
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM book_keywords WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut **tx)
            .await?;
        let rows: Vec<(i32, String)> = keywords.iter().map(|k| (book_id, k.clone())).collect();
        self.insert_keywords(tx, &rows).await
    }

    /// Replace all image rows of a book.
    pub async fn replace_images(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        book_id: i32,
        urls: &[String],
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM book_images WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut **tx)
            .await?;
        let rows: Vec<(i32, String)> = urls.iter().map(|u| (book_id, u.clone())).collect();
        self.insert_images(tx, &rows).await
    }

    /// Replace all topic links of a book.
    pub async fn replace_topic_links(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        book_id: i32,
        topic_ids: &[i32],
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM book_topics WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut **tx)
            .await?;
        let rows: Vec<(i32, i32)> = topic_ids.iter().map(|t| (book_id, *t)).collect();
        self.link_topics(tx, &rows).await
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Get book by internal id (global lookup, no store scoping).
    pub async fn find_by_id(&self, id: i32, with_deleted: bool) -> AppResult<Option<Book>> {
        let query = if with_deleted {
            format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS)
        } else {
            format!(
                "SELECT {} FROM books WHERE id = $1 AND deleted_at IS NULL",
                BOOK_COLUMNS
            )
        };
        let book = sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    /// Get book by (store, ref).
    pub async fn find_by_ref(
        &self,
        store_id: i32,
        ref_: i32,
        with_deleted: bool,
    ) -> AppResult<Option<Book>> {
        let query = if with_deleted {
            format!(
                "SELECT {} FROM books WHERE store_id = $1 AND ref = $2 \
                 ORDER BY deleted_at IS NOT NULL, id DESC LIMIT 1",
                BOOK_COLUMNS
            )
        } else {
            format!(
                "SELECT {} FROM books WHERE store_id = $1 AND ref = $2 AND deleted_at IS NULL",
                BOOK_COLUMNS
            )
        };
        let book = sqlx::query_as::<_, Book>(&query)
            .bind(store_id)
            .bind(ref_)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    /// Filtered, paginated search within one store. Satellites are not loaded
    /// here; callers go through `load_relations`.
    pub async fn search(
        &self,
        store_id: i32,
        pagination: &Pagination,
        filters: &BookQuery,
    ) -> AppResult<Vec<Book>> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {} FROM books WHERE deleted_at IS NULL AND store_id = ",
            BOOK_COLUMNS
        ));
        qb.push_bind(store_id);

        if let Some(ref isbn) = filters.isbn {
            qb.push(" AND isbn = ");
            qb.push_bind(crate::validation::normalize_isbn(isbn));
        }
        if let Some(ref title) = filters.title {
            qb.push(" AND title = ");
            qb.push_bind(title.clone());
        }
        if let Some(ref author) = filters.author {
            qb.push(" AND author = ");
            qb.push_bind(author.clone());
        }
        if let Some(ref publisher) = filters.publisher {
            qb.push(" AND publisher = ");
            qb.push_bind(publisher.clone());
        }
        if let Some(year) = filters.year {
            qb.push(" AND year = ");
            qb.push_bind(year);
        }
        if let Some(ref place) = filters.publication_place {
            qb.push(" AND publication_place = ");
            qb.push_bind(place.clone());
        }
        if let Some(ref collection) = filters.collection {
            qb.push(" AND collection = ");
            qb.push_bind(collection.clone());
        }
        if let Some(price_min) = filters.price_min {
            qb.push(" AND price >= ");
            qb.push_bind(price_min);
        }
        if let Some(price_max) = filters.price_max {
            qb.push(" AND price <= ");
            qb.push_bind(price_max);
        }
        if let Some(pages_min) = filters.pages_min {
            qb.push(" AND pages >= ");
            qb.push_bind(pages_min);
        }
        if let Some(pages_max) = filters.pages_max {
            qb.push(" AND pages <= ");
            qb.push_bind(pages_max);
        }
        if let Some(status_id) = filters.status_id {
            qb.push(" AND status_id = ");
            qb.push_bind(status_id);
        }
        if let Some(location_id) = filters.location_id {
            qb.push(" AND location_id = ");
            qb.push_bind(location_id);
        }
        if let Some(ref language) = filters.language {
            qb.push(
                " AND EXISTS (SELECT 1 FROM book_languages bl \
                 WHERE bl.book_id = books.id AND bl.code = ",
            );
            qb.push_bind(language.to_uppercase());
            qb.push(")");
        }
        if let Some(ref topics) = filters.topics {
            let lowered: Vec<String> = topics.iter().map(|t| t.to_lowercase()).collect();
            qb.push(
                " AND EXISTS (SELECT 1 FROM book_topics bt \
                 JOIN topics t ON t.id = bt.topic_id \
                 WHERE bt.book_id = books.id AND t.name = ANY(",
            );
            qb.push_bind(lowered);
            qb.push("))");
        }
        if let Some(ref keywords) = filters.keywords {
            let lowered: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
            qb.push(
                " AND EXISTS (SELECT 1 FROM book_keywords bk \
                 WHERE bk.book_id = books.id AND bk.keyword = ANY(",
            );
            qb.push_bind(lowered);
            qb.push("))");
        }

        // Stable order across repeated calls with the same filters.
        qb.push(" ORDER BY id LIMIT ");
        qb.push_bind(pagination.limit());
        qb.push(" OFFSET ");
        qb.push_bind(pagination.offset());

        let books = qb.build_query_as::<Book>().fetch_all(&self.pool).await?;
        Ok(books)
    }

    /// All live books of a store, ref order (export path).
    pub async fn find_all_for_store(&self, store_id: i32) -> AppResult<Vec<Book>> {
        let query = format!(
            "SELECT {} FROM books WHERE store_id = $1 AND deleted_at IS NULL ORDER BY ref",
            BOOK_COLUMNS
        );
        let books = sqlx::query_as::<_, Book>(&query)
            .bind(store_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// Fetch books by internal ids, id order.
    pub async fn find_by_ids(&self, ids: &[i32]) -> AppResult<Vec<Book>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {} FROM books WHERE id = ANY($1) ORDER BY id",
            BOOK_COLUMNS
        );
        let books = sqlx::query_as::<_, Book>(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// Batch-load satellite relations for the given books.
    pub async fn load_relations(&self, books: &mut [Book]) -> AppResult<()> {
        if books.is_empty() {
            return Ok(());
        }
        let ids: Vec<i32> = books.iter().map(|b| b.id).collect();

        let languages = sqlx::query_as::<_, BookLanguage>(
            "SELECT id, book_id, code FROM book_languages WHERE book_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let keywords = sqlx::query_as::<_, BookKeyword>(
            "SELECT id, book_id, keyword FROM book_keywords WHERE book_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let images = sqlx::query_as::<_, BookImage>(
            "SELECT id, book_id, url FROM book_images WHERE book_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let topic_rows: Vec<(i32, i32, String)> = sqlx::query_as(
            r#"
            SELECT bt.book_id, t.id, t.name
            FROM book_topics bt
            JOIN topics t ON t.id = bt.topic_id
            WHERE bt.book_id = ANY($1)
            ORDER BY t.name
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_book: HashMap<i32, &mut Book> = books.iter_mut().map(|b| (b.id, b)).collect();
        for lang in languages {
            if let Some(book) = by_book.get_mut(&lang.book_id) {
                book.languages.push(lang);
            }
        }
        for kw in keywords {
            if let Some(book) = by_book.get_mut(&kw.book_id) {
                book.keywords.push(kw);
            }
        }
        for img in images {
            if let Some(book) = by_book.get_mut(&img.book_id) {
                book.images.push(img);
            }
        }
        for (book_id, topic_id, name) in topic_rows {
            if let Some(book) = by_book.get_mut(&book_id) {
                book.topics.push(Topic { id: topic_id, name });
            }
        }
        Ok(())
    }

    /// Next free ref for a store: `1 + max(ref)` over live AND soft-deleted
    /// rows, so a deleted book's ref is never handed out again.
    pub async fn next_ref(&self, store_id: i32) -> AppResult<i32> {
        let next: i32 =
            sqlx::query_scalar("SELECT COALESCE(MAX(ref), 0) + 1 FROM books WHERE store_id = $1")
                .bind(store_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(next)
    }

    /// Same as `next_ref` but inside a transaction (bulk import assigns refs
    /// sequentially from this base).
    pub async fn next_ref_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        store_id: i32,
    ) -> AppResult<i32> {
        let next: i32 =
            sqlx::query_scalar("SELECT COALESCE(MAX(ref), 0) + 1 FROM books WHERE store_id = $1")
                .bind(store_id)
                .fetch_one(&mut **tx)
                .await?;
        Ok(next)
    }

    /// Count live books of a store.
    pub async fn count_for_store(&self, store_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM books WHERE store_id = $1 AND deleted_at IS NULL",
        )
        .bind(store_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    // =========================================================================
    // UPDATE
    // =========================================================================

    /// Apply a scalar column patch. Returns affected row count (0 when the
    /// book vanished between lookup and update).
    pub async fn update_one(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        book_id: i32,
        patch: &BookPatch,
    ) -> AppResult<u64> {
        let mut qb = QueryBuilder::new("UPDATE books SET updated_at = now()");
        if let Some(ref_) = patch.ref_ {
            qb.push(", ref = ");
            qb.push_bind(ref_);
        }
        if let Some(ref isbn) = patch.isbn {
            qb.push(", isbn = ");
            qb.push_bind(isbn.clone());
        }
        if let Some(ref title) = patch.title {
            qb.push(", title = ");
            qb.push_bind(title.clone());
        }
        if let Some(ref author) = patch.author {
            qb.push(", author = ");
            qb.push_bind(author.clone());
        }
        if let Some(ref place) = patch.publication_place {
            qb.push(", publication_place = ");
            qb.push_bind(place.clone());
        }
        if let Some(ref publisher) = patch.publisher {
            qb.push(", publisher = ");
            qb.push_bind(publisher.clone());
        }
        if let Some(ref collection) = patch.collection {
            qb.push(", collection = ");
            qb.push_bind(collection.clone());
        }
        if let Some(year) = patch.year {
            qb.push(", year = ");
            qb.push_bind(year);
        }
        if let Some(ref size) = patch.size {
            qb.push(", size = ");
            qb.push_bind(size.clone());
        }
        if let Some(weight) = patch.weight {
            qb.push(", weight = ");
            qb.push_bind(weight);
        }
        if let Some(pages) = patch.pages {
            qb.push(", pages = ");
            qb.push_bind(pages);
        }
        if let Some(ref condition) = patch.condition {
            qb.push(", condition = ");
            qb.push_bind(condition.clone());
        }
        if let Some(ref description) = patch.description {
            qb.push(", description = ");
            qb.push_bind(description.clone());
        }
        if let Some(ref binding) = patch.binding {
            qb.push(", binding = ");
            qb.push_bind(binding.clone());
        }
        if let Some(price) = patch.price {
            qb.push(", price = ");
            qb.push_bind(price);
        }
        if let Some(stock) = patch.stock {
            qb.push(", stock = ");
            qb.push_bind(stock);
        }
        if let Some(ref note) = patch.private_note {
            qb.push(", private_note = ");
            qb.push_bind(note.clone());
        }
        if let Some(status_id) = patch.status_id {
            qb.push(", status_id = ");
            qb.push_bind(status_id);
        }
        if let Some(location_id) = patch.location_id {
            qb.push(", location_id = ");
            qb.push_bind(location_id);
        }
        qb.push(" WHERE id = ");
        qb.push_bind(book_id);
        qb.push(" AND deleted_at IS NULL");

        let result = qb.build().execute(&mut **tx).await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    // DELETE / RESTORE
    // =========================================================================

    /// Soft-delete a live book. Returns affected row count.
    pub async fn soft_delete(&self, book_id: i32) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE books SET deleted_at = now(), updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(book_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Clear a book's deleted_at. Returns affected row count.
    pub async fn restore(&self, book_id: i32) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE books SET deleted_at = NULL, updated_at = now() \
             WHERE id = $1 AND deleted_at IS NOT NULL",
        )
        .bind(book_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Hard-delete a book; satellite rows go with it (ON DELETE CASCADE).
    pub async fn hard_delete(&self, book_id: i32) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(book_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Hard-delete every book of a store (bulk import with delete_previous).
    pub async fn delete_all_for_store(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        store_id: i32,
    ) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM books WHERE store_id = $1")
            .bind(store_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    // STOCK
    // =========================================================================

    /// Atomically decrement stock by one where stock is still positive.
    /// Returns the new stock value, or None when no row matched (already at
    /// zero, deleted, or gone) — the conditional update is what keeps two
    /// racing sales from driving stock negative.
    pub async fn decrement_stock(&self, book_id: i32) -> AppResult<Option<i32>> {
        let stock = sqlx::query_scalar::<_, i32>(
            "UPDATE books SET stock = stock - 1, updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL AND stock > 0 RETURNING stock",
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(stock)
    }

    /// Terminal sale step once stock reached zero: mark sold, drop the
    /// location and soft-delete. Returns affected row count.
    pub async fn finalize_sale(&self, book_id: i32, sold_status_id: i32) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE books SET status_id = $2, sold_at = now(), location_id = NULL, \
             deleted_at = now(), updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(book_id)
        .bind(sold_status_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Reversal of a terminal sale: set stock, flip status back to for-sale
    /// and clear sold_at/deleted_at. Returns affected row count.
    pub async fn restock(
        &self,
        book_id: i32,
        amount: i32,
        for_sale_status_id: i32,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE books SET stock = $2, status_id = $3, sold_at = NULL, \
             deleted_at = NULL, updated_at = now() WHERE id = $1",
        )
        .bind(book_id)
        .bind(amount)
        .bind(for_sale_status_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Plain stock increment for a live book.
    pub async fn increment_stock(&self, book_id: i32, amount: i32) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE books SET stock = stock + $2, updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(book_id)
        .bind(amount)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

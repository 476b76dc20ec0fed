//! Book aggregate model and related types.
//!
//! A `Book` owns its satellite collections (languages, topics, keywords,
//! images); satellites are persisted in the same transaction as the book row
//! and loaded explicitly by the read paths.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::taxonomy::Topic;
use crate::validation::{
    validate_image_urls, validate_isbn, validate_language_codes, validate_price, validate_year,
};

/// Maximum page size any list query is served with.
pub const MAX_PAGE_SIZE: i64 = 50;

/// Full book aggregate (DB row plus satellite relations).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i32,
    pub store_id: i32,
    /// Store-scoped external reference number, unique per store among
    /// non-deleted books.
    #[serde(rename = "ref")]
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
    /// Visible only to the owning store; never exported.
    pub private_note: Option<String>,
    pub status_id: i32,
    pub location_id: Option<i32>,
    pub sold_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    // Relations (loaded separately)
    #[sqlx(skip)]
    #[serde(default)]
    pub languages: Vec<BookLanguage>,
    #[sqlx(skip)]
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[sqlx(skip)]
    #[serde(default)]
    pub keywords: Vec<BookKeyword>,
    #[sqlx(skip)]
    #[serde(default)]
    pub images: Vec<BookImage>,
}

/// One language row per book; ISO 639-1 code, upper-cased.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookLanguage {
    pub id: i32,
    pub book_id: i32,
    pub code: String,
}

/// One keyword row per book; lower-cased, not interned across books.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookKeyword {
    pub id: i32,
    pub book_id: i32,
    pub keyword: String,
}

/// One image URL row per book; URLs are stored verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookImage {
    pub id: i32,
    pub book_id: i32,
    pub url: String,
}

/// Input for creating a book. Array-valued fields arrive raw and are
/// normalized by the service (topics/keywords lower-cased, languages
/// upper-cased) before persistence.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateBook {
    /// External reference; computed as the store's next ref when absent.
    #[serde(rename = "ref", default)]
    pub ref_: Option<i32>,
    /// Spreadsheet cells may carry a bare ISBN-13 as a number; accept both.
    #[serde(default, deserialize_with = "de_stringly")]
    #[validate(custom(function = "validate_isbn"))]
    pub isbn: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(max = 255))]
    pub author: Option<String>,
    #[validate(length(max = 255))]
    pub publication_place: Option<String>,
    #[validate(length(max = 255))]
    pub publisher: Option<String>,
    #[validate(length(max = 255))]
    pub collection: Option<String>,
    #[validate(custom(function = "validate_year"))]
    pub year: Option<i32>,
    #[validate(length(max = 100))]
    pub size: Option<String>,
    #[validate(range(min = 0))]
    pub weight: Option<i32>,
    #[validate(range(min = 0))]
    pub pages: Option<i32>,
    #[validate(length(max = 255))]
    pub condition: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub binding: Option<String>,
    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,
    /// Defaults to 1 when absent.
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    #[validate(length(max = 5000))]
    pub private_note: Option<String>,
    pub status_id: Option<i32>,
    pub location_id: Option<i32>,
    #[serde(default)]
    #[validate(custom(function = "validate_language_codes"))]
    pub languages: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_image_urls"))]
    pub images: Vec<String>,
}

/// Partial update for a book. `None` leaves the field unchanged; satellite
/// arrays, when present, fully replace the existing rows after the same
/// normalization as creation.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateBook {
    #[serde(rename = "ref", default)]
    pub ref_: Option<i32>,
    #[serde(default, deserialize_with = "de_stringly")]
    #[validate(custom(function = "validate_isbn"))]
    pub isbn: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(max = 255))]
    pub author: Option<String>,
    #[validate(length(max = 255))]
    pub publication_place: Option<String>,
    #[validate(length(max = 255))]
    pub publisher: Option<String>,
    #[validate(length(max = 255))]
    pub collection: Option<String>,
    #[validate(custom(function = "validate_year"))]
    pub year: Option<i32>,
    #[validate(length(max = 100))]
    pub size: Option<String>,
    #[validate(range(min = 0))]
    pub weight: Option<i32>,
    #[validate(range(min = 0))]
    pub pages: Option<i32>,
    #[validate(length(max = 255))]
    pub condition: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub binding: Option<String>,
    #[validate(custom(function = "validate_price"))]
    pub price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    #[validate(length(max = 5000))]
    pub private_note: Option<String>,
    pub status_id: Option<i32>,
    pub location_id: Option<i32>,
    #[validate(custom(function = "validate_language_codes"))]
    pub languages: Option<Vec<String>>,
    pub topics: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
    #[validate(custom(function = "validate_image_urls"))]
    pub images: Option<Vec<String>>,
}

/// Accept a string or a number where a text field is expected.
fn de_stringly<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {}",
            other
        ))),
    }
}

/// Filters for the paginated catalogue search. All filters are optional and
/// AND-combined; topic/keyword filters match books having at least one
/// satellite row in the given set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookQuery {
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<i32>,
    pub publication_place: Option<String>,
    pub collection: Option<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub pages_min: Option<i32>,
    pub pages_max: Option<i32>,
    pub status_id: Option<i32>,
    pub location_id: Option<i32>,
    pub language: Option<String>,
    pub topics: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
}

/// Offset-based pagination. `limit` is clamped to [`MAX_PAGE_SIZE`].
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

impl Pagination {
    /// Effective limit after clamping to [1, MAX_PAGE_SIZE].
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }

    /// Rows to skip: `(page - 1) * limit`, with page floored at 1.
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_clamp() {
        let p = Pagination { page: 2, limit: 10 };
        assert_eq!(p.limit(), 10);
        assert_eq!(p.offset(), 10);

        let oversized = Pagination { page: 1, limit: 500 };
        assert_eq!(oversized.limit(), MAX_PAGE_SIZE);
        assert_eq!(oversized.offset(), 0);

        let zero = Pagination { page: 0, limit: 0 };
        assert_eq!(zero.limit(), 1);
        assert_eq!(zero.offset(), 0);
    }

    #[test]
    fn test_create_book_deserializes_ref_alias() {
        let input: CreateBook = serde_json::from_value(serde_json::json!({
            "ref": 7,
            "title": "Dune",
            "price": "20.00",
            "topics": ["Fiction", "sci-fi"]
        }))
        .expect("deserialize");
        assert_eq!(input.ref_, Some(7));
        assert_eq!(input.topics.len(), 2);
        assert!(input.stock.is_none());
    }
}

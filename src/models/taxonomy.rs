//! Taxonomy models: statuses, locations and topics.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Global book status label ("for sale", "sold", "reserved").
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Status {
    pub id: i32,
    pub label: String,
}

/// Default status label applied to new books.
pub const STATUS_FOR_SALE: &str = "for sale";
/// Status label applied when stock reaches zero.
pub const STATUS_SOLD: &str = "sold";

/// Physical location of a book within a store (shelf, storeroom...).
/// Store-scoped; labels are unique per store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub id: i32,
    pub store_id: i32,
    pub label: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLocation {
    #[validate(length(min = 1, max = 255))]
    pub label: String,
}

/// Catalogue topic, shared across the whole catalogue and interned
/// case-insensitively (names are lower-cased at write time).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Topic {
    pub id: i32,
    pub name: String,
}

/// A store owning books. Kept minimal: the auth layer is an external
/// collaborator and only the user → store resolution path touches this table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Store {
    pub id: i32,
    pub name: String,
    pub user_id: Option<i32>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

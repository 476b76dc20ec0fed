//! Caller identity for store-scoped operations.

use serde::{Deserialize, Serialize};

/// The acting entity behind a book operation.
///
/// Every mutation and store-scoped read resolves this to a store id first;
/// a `User` that owns no store short-circuits the operation with `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Owner {
    /// The caller is the store itself; the id is the store id.
    Store(i32),
    /// The caller is a user owning exactly one store; the id is the user id.
    User(i32),
}

impl Owner {
    pub fn id(&self) -> i32 {
        match self {
            Owner::Store(id) | Owner::User(id) => *id,
        }
    }
}

impl std::fmt::Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Owner::Store(id) => write!(f, "store {}", id),
            Owner::User(id) => write!(f, "user {}", id),
        }
    }
}

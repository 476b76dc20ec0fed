//! Repository layer for database operations

pub mod books;
pub mod locations;
pub mod statuses;
pub mod stores;
pub mod topics;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub topics: topics::TopicsRepository,
    pub statuses: statuses::StatusesRepository,
    pub locations: locations::LocationsRepository,
    pub stores: stores::StoresRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            topics: topics::TopicsRepository::new(pool.clone()),
            statuses: statuses::StatusesRepository::new(pool.clone()),
            locations: locations::LocationsRepository::new(pool.clone()),
            stores: stores::StoresRepository::new(pool.clone()),
            pool,
        }
    }
}

//! Data models for Librería

pub mod book;
pub mod language;
pub mod owner;
pub mod taxonomy;

// Re-export commonly used types
pub use book::{Book, BookImage, BookKeyword, BookLanguage, BookQuery, CreateBook, Pagination, UpdateBook};
pub use owner::Owner;
pub use taxonomy::{Location, Status, Store, Topic};

//! Librería Inventory & Catalogue Server
//!
//! Backend core for a used & rare bookstore platform: store-scoped book
//! inventory with filtered search, taxonomy management, and the
//! CSV/TSV/JSON catalogue import/export pipeline.

pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod validation;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

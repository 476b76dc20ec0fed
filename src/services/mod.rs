//! Business logic services

pub mod books;
pub mod catalogue;
pub mod legacy;

use std::sync::Arc;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub catalogue: catalogue::CatalogueService,
    pub legacy: legacy::LegacyImporter,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        let stores = Arc::new(repository.stores.clone());
        let books = books::BooksService::new(
            repository.clone(),
            stores,
            config.catalogue.chunk_size,
        );
        Self {
            catalogue: catalogue::CatalogueService::new(
                books.clone(),
                config.catalogue.export_dir.clone(),
            ),
            legacy: legacy::LegacyImporter::new(repository, &config.legacy),
            books,
        }
    }
}

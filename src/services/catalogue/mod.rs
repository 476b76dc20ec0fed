//! Catalogue import/export service.
//!
//! Orchestrates the pipeline: file bytes -> format parser -> field
//! translation -> book aggregate service, and the reverse walk for export.

pub mod fields;
pub mod format;

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    error::{AppError, AppResult},
    models::{book::Book, CreateBook, Owner},
    services::books::BooksService,
};
use fields::TranslateOptions;
use format::DataFormat;

/// Options for a catalogue import run.
#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    pub format: DataFormat,
    /// Wipe the store's existing books before inserting, in the same
    /// transaction.
    pub delete_previous: bool,
    pub derive_topics_from_keywords: bool,
    pub clean_html: bool,
}

/// What an import run did.
#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub rows_read: usize,
    pub books_created: usize,
}

#[derive(Clone)]
pub struct CatalogueService {
    books: BooksService,
    export_dir: PathBuf,
}

impl CatalogueService {
    pub fn new(books: BooksService, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            books,
            export_dir: export_dir.into(),
        }
    }

    /// Import a Uniliber catalogue file into the caller's store.
    pub async fn import_file(
        &self,
        owner: Owner,
        path: &Path,
        options: ImportOptions,
    ) -> AppResult<ImportSummary> {
        let bytes = tokio::fs::read(path).await?;
        let text = decode_text(&bytes);
        tracing::info!(path = %path.display(), bytes = bytes.len(), "catalogue file read");

        let json = format::convert(&text, options.format, DataFormat::Json)?;
        let rows: Vec<Map<String, Value>> = serde_json::from_str(&json)?;
        let rows_read = rows.len();

        let translate = TranslateOptions {
            derive_topics_from_keywords: options.derive_topics_from_keywords,
            clean_html: options.clean_html,
        };
        let mut inputs = Vec::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            let mut db_row = fields::uniliber_to_db(row, translate);
            // Null marks an absent field; the DTO defaults take over from here.
            db_row.retain(|_, value| !value.is_null());
            let input: CreateBook = serde_json::from_value(Value::Object(db_row))
                .map_err(|e| AppError::BadRequest(format!("row {}: {}", idx + 1, e)))?;
            inputs.push(input);
        }

        let books = self
            .books
            .bulk_create_books(owner, inputs, options.delete_previous)
            .await?;
        tracing::info!(rows_read, created = books.len(), "catalogue import finished");
        Ok(ImportSummary {
            rows_read,
            books_created: books.len(),
        })
    }

    /// Export the caller's live catalogue in the ES spreadsheet schema.
    /// Returns the path of the written file, named
    /// `<epoch_ms>.<label>.<data_type>.<ext>`.
    pub async fn export_file(
        &self,
        owner: Owner,
        to: DataFormat,
        label: &str,
    ) -> AppResult<PathBuf> {
        let books = self.books.find_all_for_export(owner).await?;
        let rows: Vec<Value> = books
            .iter()
            .map(|book| Value::Object(fields::db_to_es(&book_to_db_row(book))))
            .collect();

        let json = serde_json::to_string(&rows)?;
        let output = format::convert(&json, DataFormat::Json, to)?;

        let epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock before 1970")
            .as_millis();
        let file_name = format!("{}.{}.books.{}", epoch_ms, label, to.extension());
        let path = self.export_dir.join(file_name);

        tokio::fs::create_dir_all(&self.export_dir).await?;
        tokio::fs::write(&path, output.as_bytes()).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o644);
            tokio::fs::set_permissions(&path, perms).await?;
        }

        tracing::info!(path = %path.display(), books = books.len(), "catalogue exported");
        Ok(path)
    }
}

/// Flatten a book aggregate into the DB-field-name row shape used by the
/// translation layer; satellite collections become arrays of strings.
pub fn book_to_db_row(book: &Book) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert("id".into(), Value::from(book.id));
    row.insert("store_id".into(), Value::from(book.store_id));
    row.insert("ref".into(), Value::from(book.ref_));
    row.insert("isbn".into(), opt_str(&book.isbn));
    row.insert("title".into(), Value::from(book.title.clone()));
    row.insert("author".into(), opt_str(&book.author));
    row.insert(
        "publication_place".into(),
        opt_str(&book.publication_place),
    );
    row.insert("publisher".into(), opt_str(&book.publisher));
    row.insert("collection".into(), opt_str(&book.collection));
    row.insert("year".into(), opt_num(book.year));
    row.insert("size".into(), opt_str(&book.size));
    row.insert("weight".into(), opt_num(book.weight));
    row.insert("pages".into(), opt_num(book.pages));
    row.insert("condition".into(), opt_str(&book.condition));
    row.insert("description".into(), opt_str(&book.description));
    row.insert("binding".into(), opt_str(&book.binding));
    row.insert("price".into(), Value::from(book.price.to_string()));
    row.insert("stock".into(), Value::from(book.stock));
    row.insert("private_note".into(), opt_str(&book.private_note));
    row.insert(
        "languages".into(),
        Value::Array(
            book.languages
                .iter()
                .map(|l| Value::from(l.code.clone()))
                .collect(),
        ),
    );
    row.insert(
        "topics".into(),
        Value::Array(
            book.topics
                .iter()
                .map(|t| Value::from(t.name.clone()))
                .collect(),
        ),
    );
    row.insert(
        "keywords".into(),
        Value::Array(
            book.keywords
                .iter()
                .map(|k| Value::from(k.keyword.clone()))
                .collect(),
        ),
    );
    row.insert(
        "images".into(),
        Value::Array(
            book.images
                .iter()
                .map(|i| Value::from(i.url.clone()))
                .collect(),
        ),
    );
    row
}

/// Decode catalogue bytes: UTF-8 when valid, otherwise Latin-1 so Spanish
/// accented characters in older spreadsheets survive.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn opt_str(value: &Option<String>) -> Value {
    value
        .as_ref()
        .map(|s| Value::from(s.clone()))
        .unwrap_or(Value::Null)
}

fn opt_num(value: Option<i32>) -> Value {
    value.map(Value::from).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text_utf8_passthrough() {
        assert_eq!(decode_text("Año".as_bytes()), "Año");
    }

    #[test]
    fn test_decode_text_latin1_fallback() {
        // "Año" in Latin-1: 0xF1 is ñ.
        let latin1 = [b'A', 0xF1_u8, b'o'];
        assert_eq!(decode_text(&latin1), "Año");
    }
}

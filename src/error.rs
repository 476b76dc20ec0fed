//! Error types for Librería server

use thiserror::Error;

/// Main application error type.
///
/// Soft outcomes (`NotFound`, `BadRequest`, `NotUpdated`, `NotDeleted`,
/// `NotRestored`, `InvalidStock`, `NotImplemented`, `Conflict`, `Validation`)
/// are returned, not panicked over, and callers are expected to match on
/// them. Storage failures (`Database`) and I/O failures propagate undecorated.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not updated: {0}")]
    NotUpdated(String),

    #[error("Not deleted: {0}")]
    NotDeleted(String),

    #[error("Not restored: {0}")]
    NotRestored(String),

    #[error("Invalid stock amount: {0}")]
    InvalidStock(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let codes: Vec<String> = errs.iter().map(|e| e.code.to_string()).collect();
                format!("{}: {}", field, codes.join(", "))
            })
            .collect();
        fields.sort();
        AppError::Validation(fields.join("; "))
    }
}

impl AppError {
    /// True for outcomes a caller may handle and retry; false for hard
    /// failures that should abort the unit of work.
    pub fn is_soft(&self) -> bool {
        !matches!(
            self,
            AppError::Database(_) | AppError::Io(_) | AppError::Csv(_) | AppError::Json(_)
        )
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

//! Librería Server - catalogue administration entry point.
//!
//! Boots configuration, tracing, the database pool and migrations, then
//! drives the catalogue services from the command line.

use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use libreria_server::{
    config::AppConfig,
    models::Owner,
    repository::Repository,
    services::{
        catalogue::{format::DataFormat, ImportOptions},
        Services,
    },
};

#[derive(Parser)]
#[command(name = "libreria-server", version, about = "Librería catalogue administration")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a Uniliber catalogue file into a store
    Import {
        /// Catalogue file (CSV/TSV/JSON)
        file: PathBuf,
        /// Store the books belong to
        #[arg(long)]
        store: i32,
        /// File format
        #[arg(long, default_value = "csv")]
        format: String,
        /// Wipe the store's existing books first (same transaction)
        #[arg(long)]
        wipe: bool,
        /// Reuse keywords as topics when a row has no topics
        #[arg(long)]
        topics_from_keywords: bool,
        /// Strip literal <p> markers from descriptions
        #[arg(long)]
        clean_html: bool,
    },
    /// Export a store's live catalogue to a timestamped file
    Export {
        /// Store to export
        #[arg(long)]
        store: i32,
        /// Output format
        #[arg(long, default_value = "csv")]
        format: String,
        /// Label embedded in the file name
        #[arg(long, default_value = "catalogue")]
        label: String,
    },
    /// Replace the legacy_books table from the configured legacy CSV file
    LegacyImport,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("libreria_server={}", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Librería Server v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    let repository = Repository::new(pool);
    let services = Services::new(repository, &config);

    match cli.command {
        Command::Import {
            file,
            store,
            format,
            wipe,
            topics_from_keywords,
            clean_html,
        } => {
            let options = ImportOptions {
                format: format.parse::<DataFormat>()?,
                delete_previous: wipe,
                derive_topics_from_keywords: topics_from_keywords,
                clean_html,
            };
            let summary = services
                .catalogue
                .import_file(Owner::Store(store), &file, options)
                .await?;
            println!(
                "Imported {} of {} rows into store {}",
                summary.books_created, summary.rows_read, store
            );
        }
        Command::Export {
            store,
            format,
            label,
        } => {
            let path = services
                .catalogue
                .export_file(Owner::Store(store), format.parse::<DataFormat>()?, &label)
                .await?;
            println!("Exported catalogue of store {} to {}", store, path.display());
        }
        Command::LegacyImport => {
            let rows = services.legacy.import().await?;
            println!("Replaced legacy catalogue with {} rows", rows);
        }
    }

    Ok(())
}

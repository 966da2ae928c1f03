//! Bookdb Import Library
//!
//! Batch CSV importer for the books catalog database.
//!
//! The importer reads a delimited export (goodbooks-style column names are
//! recognized, with fallbacks for common variants), assigns ids continuing
//! from the current maximum in the `books` table, and commits fixed-size
//! batches transactionally with idempotent inserts. A failed batch is rolled
//! back and, by default, skipped rather than aborting the run.
//!
//! # Example
//!
//! ```no_run
//! use bookdb_import::config::ImportConfig;
//! use bookdb_import::importer::Importer;
//! use bookdb_import::store::BookStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ImportConfig::load()?;
//!     let store = BookStore::connect(&config).await?;
//!     let report = Importer::new(&store, &config).run("books.csv".as_ref()).await?;
//!     println!("net new rows: {}", report.net_new());
//!     store.close().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dedup;
pub mod importer;
pub mod progress;
pub mod record;
pub mod store;

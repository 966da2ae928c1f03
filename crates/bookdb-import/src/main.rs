//! bookdb-import - books catalog CSV import tool

use anyhow::Result;
use bookdb_common::logging::{init_logging, LogConfig, LogLevel};
use bookdb_import::config::{BatchErrorPolicy, ImportConfig};
use bookdb_import::dedup;
use bookdb_import::importer::Importer;
use bookdb_import::progress;
use bookdb_import::store::BookStore;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "bookdb-import")]
#[command(author, version, about = "Books catalog CSV import tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Import a books CSV into the catalog database
    Import {
        /// Path to the CSV file
        #[arg(default_value = "books.csv")]
        csv: PathBuf,

        /// Records per transaction
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Abort the run on the first failed batch instead of continuing
        #[arg(long)]
        fail_fast: bool,

        /// Database connection string (defaults to DATABASE_URL)
        #[arg(long)]
        database_url: Option<String>,
    },

    /// Remove duplicate rows (by isbn13) from a books CSV, in place
    Clean {
        /// Path to the CSV file
        csv: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Environment configures output/format/dir; --verbose wins on level
    let mut log_config = LogConfig::from_env()?;
    log_config.log_file_prefix = "bookdb-import".to_string();
    if cli.verbose {
        log_config.level = LogLevel::Debug;
    }

    init_logging(&log_config)?;

    match cli.command {
        Command::Import {
            csv,
            batch_size,
            fail_fast,
            database_url,
        } => {
            let mut config = ImportConfig::load()?;
            if let Some(batch_size) = batch_size {
                config.batch_size = batch_size;
            }
            if fail_fast {
                config.on_batch_error = BatchErrorPolicy::FailFast;
            }
            if let Some(url) = database_url {
                config.database_url = url;
            }
            config.validate()?;

            let store = BookStore::connect(&config).await?;

            let spinner = progress::create_spinner("Importing records");
            let result = Importer::new(&store, &config).run(&csv).await;
            spinner.finish_and_clear();

            // The pool is released on failure paths too
            store.close().await;

            let report = result?;
            println!("\nImport complete!");
            println!("Initial count: {}", report.initial_count);
            println!("Records processed: {}", report.records_processed);
            println!("Final count: {}", report.final_count);
            println!("Net new records: {}", report.net_new());
            if report.batches_failed > 0 {
                println!(
                    "Warning: {} batch(es) rolled back; see logs",
                    report.batches_failed
                );
            }
        },
        Command::Clean { csv } => {
            info!(path = %csv.display(), "Cleaning CSV");
            let report = dedup::dedup_by_isbn(&csv)?;
            println!("Initial number of records: {}", report.initial_records);
            println!("Final number of records: {}", report.kept_records);
            println!("Removed {} duplicate records", report.removed());
            println!("Original saved to {}", report.backup_path.display());
        },
    }

    Ok(())
}

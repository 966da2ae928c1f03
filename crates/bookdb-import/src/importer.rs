//! Batch import pipeline
//!
//! Sequential, pull-based pipeline: one CSV record is read at a time, mapped,
//! and accumulated; when a batch fills, the reader stays paused while the
//! batch commits. At most one batch transaction is open at any time and
//! memory is bounded to one batch of mapped records.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use tracing::{debug, error, info};

use crate::config::{BatchErrorPolicy, ImportConfig};
use crate::record::{BookRecord, FieldMapper};
use crate::store::BookStore;

/// Reconciliation summary for one import run.
///
/// `records_processed` counts rows read from the input regardless of whether
/// they persisted; `net_new()` is what actually landed. The two diverge when
/// inserts were skipped as duplicates or a batch failed, which is the
/// primary observable signal of partial failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub initial_count: i64,
    pub records_processed: u64,
    pub batches_committed: u32,
    pub batches_failed: u32,
    pub final_count: i64,
}

impl ImportReport {
    /// Rows added to the store by this run.
    pub fn net_new(&self) -> i64 {
        self.final_count - self.initial_count
    }
}

/// Batch importer over a [`BookStore`].
pub struct Importer<'a> {
    store: &'a BookStore,
    config: &'a ImportConfig,
}

impl<'a> Importer<'a> {
    pub fn new(store: &'a BookStore, config: &'a ImportConfig) -> Self {
        Self { store, config }
    }

    /// Run the import end to end and return the reconciliation report.
    ///
    /// Ids are assigned in input order starting at `max(id) + 1`, with no
    /// gaps, before any batching decision. The anchor is recomputed fresh on
    /// every run; nothing coordinates with concurrent writers, so the id
    /// range of a re-run only lines up if the table was untouched in
    /// between. This is a single-writer operational tool.
    ///
    /// A mid-stream CSV parse error aborts the remainder of the run;
    /// batches committed before it stay committed.
    pub async fn run(&self, csv_path: &Path) -> Result<ImportReport> {
        // Setup phase: both reads must succeed before any input is consumed.
        let initial_count = self.store.count().await?;
        let start_id = self.store.max_id().await? + 1;

        info!(
            path = %csv_path.display(),
            initial_count,
            start_id,
            batch_size = self.config.batch_size,
            "Starting import"
        );

        let file = File::open(csv_path)
            .with_context(|| format!("Failed to open input file: {}", csv_path.display()))?;
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(file);

        let headers = reader
            .headers()
            .context("Failed to read CSV header row")?
            .clone();
        let mapper = FieldMapper::new(&headers);

        let mut batch: Vec<BookRecord> = Vec::with_capacity(self.config.batch_size);
        let mut processed: u64 = 0;
        let mut batches_committed: u32 = 0;
        let mut batches_failed: u32 = 0;

        for row in reader.records() {
            let row = row.context("Failed to parse CSV record")?;
            let record = mapper.map(start_id + processed as i64, &row);
            debug!(
                id = record.id,
                title = %record.title,
                year = ?record.publication_year,
                "Mapped record"
            );
            processed += 1;
            batch.push(record);

            if batch.len() >= self.config.batch_size {
                self.flush(&mut batch, &mut batches_committed, &mut batches_failed)
                    .await?;
            }
        }

        // Partial batch left over when the input ends
        if !batch.is_empty() {
            self.flush(&mut batch, &mut batches_committed, &mut batches_failed)
                .await?;
        }

        let final_count = self.store.count().await?;

        let report = ImportReport {
            initial_count,
            records_processed: processed,
            batches_committed,
            batches_failed,
            final_count,
        };

        info!(
            initial_count = report.initial_count,
            records_processed = report.records_processed,
            batches_committed = report.batches_committed,
            batches_failed = report.batches_failed,
            final_count = report.final_count,
            net_new = report.net_new(),
            "Import complete"
        );

        Ok(report)
    }

    /// Commit the accumulated batch and clear it.
    ///
    /// A failed batch has already been rolled back by the store; under
    /// `Continue` it is counted, logged, and skipped. Under `FailFast` the
    /// error propagates and ends the run.
    async fn flush(
        &self,
        batch: &mut Vec<BookRecord>,
        batches_committed: &mut u32,
        batches_failed: &mut u32,
    ) -> Result<()> {
        let records = batch.len();

        match self.store.insert_batch(batch).await {
            Ok(()) => {
                *batches_committed += 1;
                info!(records, "Batch committed");
            },
            Err(err) => {
                *batches_failed += 1;
                error!(error = ?err, records, "Batch rolled back");
                if self.config.on_batch_error == BatchErrorPolicy::FailFast {
                    batch.clear();
                    return Err(err.context("Aborting import after failed batch"));
                }
            },
        }

        batch.clear();
        Ok(())
    }
}

//! Importer configuration

use bookdb_common::{BookdbError, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// Importer Configuration Constants
// ============================================================================

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/bookdb";

/// Default maximum database connections in the pool. The pipeline is
/// sequential and holds a single transactional connection at a time.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default number of records committed per transaction.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// What to do when a batch transaction fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BatchErrorPolicy {
    /// Roll back the batch, log it, and continue with the next one.
    ///
    /// This is the historical behavior: one bad batch does not stop the
    /// import, but its rows are missing from the final count. The
    /// reconciliation summary is the place that divergence shows up.
    #[default]
    Continue,
    /// Roll back the batch and abort the run.
    FailFast,
}

impl std::str::FromStr for BatchErrorPolicy {
    type Err = BookdbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "continue" => Ok(BatchErrorPolicy::Continue),
            "fail-fast" | "failfast" => Ok(BatchErrorPolicy::FailFast),
            other => Err(BookdbError::Config(format!(
                "invalid batch error policy '{other}' (expected 'continue' or 'fail-fast')"
            ))),
        }
    }
}

/// Importer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
    pub batch_size: usize,
    pub on_batch_error: BatchErrorPolicy,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
            connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            batch_size: DEFAULT_BATCH_SIZE,
            on_batch_error: BatchErrorPolicy::Continue,
        }
    }
}

impl ImportConfig {
    /// Load configuration from environment and defaults
    ///
    /// Recognized variables: `DATABASE_URL`, `BOOKDB_MAX_CONNECTIONS`,
    /// `BOOKDB_CONNECT_TIMEOUT`, `BOOKDB_BATCH_SIZE`, `BOOKDB_ON_BATCH_ERROR`.
    /// A `.env` file is honored if present.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }
        if let Ok(val) = std::env::var("BOOKDB_MAX_CONNECTIONS") {
            config.max_connections = val
                .parse()
                .map_err(|_| BookdbError::Config(format!("invalid BOOKDB_MAX_CONNECTIONS: {val}")))?;
        }
        if let Ok(val) = std::env::var("BOOKDB_CONNECT_TIMEOUT") {
            config.connect_timeout_secs = val
                .parse()
                .map_err(|_| BookdbError::Config(format!("invalid BOOKDB_CONNECT_TIMEOUT: {val}")))?;
        }
        if let Ok(val) = std::env::var("BOOKDB_BATCH_SIZE") {
            config.batch_size = val
                .parse()
                .map_err(|_| BookdbError::Config(format!("invalid BOOKDB_BATCH_SIZE: {val}")))?;
        }
        if let Ok(val) = std::env::var("BOOKDB_ON_BATCH_ERROR") {
            config.on_batch_error = val.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the importer cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(BookdbError::Config("batch size must be at least 1".into()));
        }
        if self.max_connections == 0 {
            return Err(BookdbError::Config(
                "max connections must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

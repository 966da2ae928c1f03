//! Bookdb Common Library
//!
//! Shared error handling and logging initialization for the bookdb workspace.
//!
//! # Example
//!
//! ```no_run
//! use bookdb_common::{Result, BookdbError};
//!
//! fn parse_year(raw: &str) -> Result<i32> {
//!     raw.trim()
//!         .parse()
//!         .map_err(|_| BookdbError::Parse(format!("invalid year: {raw}")))
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{BookdbError, Result};

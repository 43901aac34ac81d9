//! Error types for the Stockroom engine.
//!
//! Only genuine backend failures are errors. A missing record is reported
//! through `Option`/`bool` return values, never through this enum.

use thiserror::Error;

/// Failures raised by a storage backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("storage failure: {0}")]
    Storage(String),

    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

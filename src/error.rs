//! Binary Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A run error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for a run.
pub type Result<T> = std::result::Result<T, Error>;

/// Which stage of a run failed before any snippet could be written.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("invalid configuration")]
    Config,
    #[display("could not open the catalog")]
    Catalog,
    #[display("could not open the project directory")]
    Storage,
    #[display("snippet templates unavailable")]
    Template,
    #[display("build aborted")]
    Build,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Build)
    }
}

//! Snippet Build Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A build error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for build operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies which part of a build failed.
///
/// ### Fatal (the build stream ends)
/// - [`ErrorKind::Fetch`]
/// - [`ErrorKind::Clean`]
///
/// ### Local to one file (the build carries on)
/// - [`ErrorKind::Write`]
/// - [`ErrorKind::Evict`]
/// - [`ErrorKind::Manifest`]
///
/// ### Construction
/// - [`ErrorKind::Template`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The catalog could not be fetched or parsed.
    #[display("could not fetch the catalog")]
    Fetch,
    /// Snippets from a previous run could not be removed.
    #[display("could not clean the snippet directory")]
    Clean,
    /// A snippet template is missing, does not compile, or failed to render.
    #[display("snippet template error")]
    Template,
    #[display("could not write snippet {}", _0.display())]
    Write(#[error(not(source))] PathBuf),
    #[display("could not remove stale snippet {}", _0.display())]
    Evict(#[error(not(source))] PathBuf),
    #[display("could not write manifest {}", _0.display())]
    Manifest(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Template => false,
            _ => true,
        }
    }

    /// Returns `true` if the build stopped because of this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fetch | Self::Clean)
    }
}

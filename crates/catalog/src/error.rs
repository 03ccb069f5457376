//! Catalog Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A catalog error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The catalog URL is not something we can request.
    #[display("invalid catalog url: {_0}")]
    InvalidUrl(#[error(not(source))] String),
    /// The request never produced a response (DNS, TLS, connection, timeout).
    #[display("could not reach catalog at {_0}")]
    Network(#[error(not(source))] String),
    /// The catalog answered with a non-success status code.
    #[display("catalog responded with HTTP {_0}")]
    Status(#[error(not(source))] u16),
    /// The response body is not a catalog document.
    #[display("malformed catalog document")]
    Parse,
    /// A saved catalog document could not be read.
    #[display("could not read catalog file {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Nothing in this crate retries; this only informs the caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status(code) => *code >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::Network("https://api.cdnjs.com".into()), true)]
    #[case(ErrorKind::Status(503), true)]
    #[case(ErrorKind::Status(404), false)]
    #[case(ErrorKind::Parse, false)]
    fn test_is_retryable(#[case] kind: ErrorKind, #[case] expected: bool) {
        assert_eq!(kind.is_retryable(), expected);
    }
}

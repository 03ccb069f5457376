//! Path validation.
//!
//! Every path handed to a backend is relative to the project root. Library
//! names come straight from a remote catalog, so paths built from them must
//! never be able to climb out of that root.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates and normalizes a storage path.
///
/// `.` components and repeated or trailing separators are dropped, `..` is
/// resolved as long as it never leaves the root. Null bytes are rejected.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use lcdnjs_storage::validate_path;
///
/// assert!(validate_path("snippets/jquery.sublime-snippet").is_ok());
/// assert!(validate_path("snippets/../.log").is_ok());
/// assert!(validate_path("../.log").is_err());
/// assert!(validate_path("snippets/a\0b").is_err());
/// assert_eq!(
///     validate_path("./snippets//vue.sublime-snippet").unwrap(),
///     Path::new("snippets/vue.sublime-snippet"),
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(path.to_path_buf());
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but
                // truncate the path in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(invalid());
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    if components.is_empty() {
        exn::bail!(invalid());
    }
    Ok(components.into_iter().collect())
}

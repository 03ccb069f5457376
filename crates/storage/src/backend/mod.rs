//! Storage backend trait and implementations.
//!
//! [`StorageBackend`] is the filesystem collaborator of the build pipeline:
//! list what a previous run left behind, write snippets and the manifest, and
//! delete snippets that are stale.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::{MockBackend, Operation};
use crate::error::Result;
use crate::models::FileInfo;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::ops::Deref;
use std::path::Path;
use std::pin::Pin;

pub(crate) type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;

/// Unified interface for storage backends.
///
/// All paths are relative to the backend's root and are validated with
/// [`validate_path`](crate::validate_path) before use. Implementations must
/// enforce this.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use lcdnjs_storage::{StorageBackend, error::Result};
///
/// async fn snippet_bytes(backend: &dyn StorageBackend) -> Result<u64> {
///     let files = backend.list(Some(Path::new("snippets"))).await?;
///     Ok(files.iter().map(|f| f.size).sum())
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the backend, used for logging only.
    fn name(&self) -> &str;

    /// List all files under an optional prefix.
    ///
    /// Collects [`list_stream()`](Self::list_stream) into a [`Vec`].
    async fn list(&self, prefix: Option<&Path>) -> Result<Vec<FileInfo>> {
        self.list_stream(prefix).try_collect().await
    }

    /// Stream metadata for every file under an optional prefix, recursing
    /// into sub-directories.
    ///
    /// A prefix that doesn't exist yields an empty stream, not an error.
    /// Prefix matching is component-based: `snippets` matches
    /// `snippets/a.sublime-snippet` but not `snippets-old/a.sublime-snippet`.
    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a>;

    /// Create or overwrite a file, creating parent directories as needed.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Delete a file.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn delete(&self, path: &Path) -> Result<()>;

    /// Delete a file, treating a missing file as success.
    ///
    /// Returns whether a file was actually removed.
    async fn delete_if_exists(&self, path: &Path) -> Result<bool> {
        match self.delete(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.deref().is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

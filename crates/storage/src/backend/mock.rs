//! In-memory storage backend for testing.

use super::FileInfoStream;
use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::models::FileInfo;
use crate::path::validate as validate_path;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Operations recorded by [`MockBackend`], in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Write(PathBuf),
    Delete(PathBuf),
}

/// In-memory storage backend for testing.
///
/// Files are kept in a sorted map behind a [`RwLock`]. Every successful write
/// and delete is appended to a journal so tests can assert on the exact
/// sequence of filesystem operations a run performed. Paths can be marked as
/// failing to simulate per-file write errors.
///
/// # Examples
///
/// ```
/// use lcdnjs_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([
///     ("snippets/old.sublime-snippet", b"<snippet/>"),
/// ]);
/// assert!(backend.delete_if_exists(Path::new("snippets/old.sublime-snippet")).await?);
/// assert!(backend.contents("snippets/old.sublime-snippet").await.is_none());
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    storage: RwLock<BTreeMap<PathBuf, Vec<u8>>>,
    journal: RwLock<Vec<Operation>>,
    failing: Vec<PathBuf>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files.
    ///
    /// Panics if any path fails validation. If test setup is wrong, then the
    /// test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = BTreeMap::new();
        for (path, data) in files {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                panic!("MockBackend::with_files: invalid path {}", path.display());
            };
            map.insert(validated, data.into());
        }
        Self {
            name: "mock".to_string(),
            storage: RwLock::new(map),
            journal: RwLock::new(Vec::new()),
            failing: Vec::new(),
        }
    }

    /// Make every write to `path` fail with a permission error.
    pub fn with_failing_write(mut self, path: impl Into<PathBuf>) -> Self {
        self.failing.push(path.into());
        self
    }

    /// Successful writes and deletes, oldest first.
    pub async fn journal(&self) -> Vec<Operation> {
        self.journal.read().await.clone()
    }

    /// Contents of a file as UTF-8, if it exists.
    pub async fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        let guard = self.storage.read().await;
        guard.get(path.as_ref()).map(|data| String::from_utf8_lossy(data).into_owned())
    }

    /// All stored paths, sorted.
    pub async fn paths(&self) -> Vec<PathBuf> {
        self.storage.read().await.keys().cloned().collect()
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        let validated_prefix = match prefix.map(validate_path).transpose() {
            Ok(pfx) => pfx,
            Err(e) => return Box::pin(futures::stream::once(async { Err(e) })),
        };

        Box::pin(stream! {
            // Snapshot under the read lock, then drop it before yielding.
            let entries: Vec<FileInfo> = {
                let guard = self.storage.read().await;
                guard
                    .iter()
                    .filter(|(path, _)| validated_prefix.as_ref().is_none_or(|pfx| path.starts_with(pfx)))
                    .map(|(path, data)| FileInfo::new(path.clone(), data.len() as u64))
                    .collect()
            };
            for info in entries {
                yield Ok(info);
            }
        })
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        if self.failing.contains(&path) {
            exn::bail!(ErrorKind::PermissionDenied(path));
        }
        self.storage.write().await.insert(path.clone(), data.to_vec());
        self.journal.write().await.push(Operation::Write(path));
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        if self.storage.write().await.remove(&path).is_none() {
            exn::bail!(ErrorKind::NotFound(path));
        }
        self.journal.write().await.push(Operation::Delete(path));
        Ok(())
    }
}

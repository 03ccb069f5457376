//! Local filesystem storage backend.
//!
//! Files live under a project root directory and are accessed through
//! `tokio::fs`.

use crate::backend::FileInfoStream;
use crate::error::{ErrorKind, Result};
use crate::{FileInfo, StorageBackend, path::validate as validate_path};
use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use std::fs::create_dir_all as sync_create_dir;
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry};

enum WalkEntry {
    File(FileInfo),
    Descend(PathBuf),
    Skip,
}

/// Local filesystem storage backend.
///
/// All paths are relative to the configured root directory, which is usually
/// the project checkout containing the `snippets/` directory and the
/// manifest.
///
/// # Examples
///
/// ```no_run
/// use lcdnjs_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("project", "/home/me/lcdnjs")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    name: String,
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend, creating `root` if it doesn't
    /// exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPath`](ErrorKind::InvalidPath) if `root` is not
    /// absolute or exists but is not a directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root));
            }
        } else {
            // Non-async: happens once at startup, not worth an async constructor.
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root))?;
        }
        Ok(Self { name: name.into(), root })
    }

    fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    fn relative_path(&self, absolute: impl AsRef<Path>) -> Result<PathBuf> {
        let absolute = absolute.as_ref();
        let relative = absolute.strip_prefix(&self.root).or_raise(|| {
            ErrorKind::BackendError(format!("path `{}` is not within root `{}`", absolute.display(), self.root.display()))
        })?;
        validate_path(relative)
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    /// Classify one directory entry. Pulled out of the stream loop so that `?`
    /// can be used.
    async fn process_entry(&self, entry: DirEntry, prefix: Option<&Path>) -> Result<WalkEntry> {
        let path = entry.path();
        let metadata = entry.metadata().await.map_err(|e| Self::map_io_error(e, &path))?;
        let relative = self.relative_path(&path)?;
        if metadata.is_dir() {
            // Descend into directories that lead towards the prefix, or are
            // already inside it.
            let wanted = prefix.is_none_or(|pfx| relative.starts_with(pfx) || pfx.starts_with(&relative));
            return Ok(if wanted { WalkEntry::Descend(path) } else { WalkEntry::Skip });
        }
        if let Some(pfx) = prefix
            && !relative.starts_with(pfx)
        {
            return Ok(WalkEntry::Skip);
        }
        if metadata.is_file() {
            return Ok(WalkEntry::File(FileInfo::new(relative, metadata.len())));
        }
        // Most likely a broken symlink.
        Ok(WalkEntry::Skip)
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        let validated_prefix = match prefix.map(validate_path).transpose() {
            Ok(pfx) => pfx,
            Err(e) => return Box::pin(futures::stream::once(async { Err(e) })),
        };
        let mut stack = vec![self.root.clone()];

        Box::pin(stream! {
            while let Some(current) = stack.pop() {
                let mut entries = match fs::read_dir(&current).await {
                    Ok(entries) => entries,
                    // Listing a directory that doesn't exist is an empty list.
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                    Err(err) => {
                        yield Err(exn::Exn::from(Self::map_io_error(err, &current)));
                        continue;
                    }
                };
                loop {
                    let entry = match entries.next_entry().await {
                        Ok(Some(entry)) => entry,
                        Ok(None) => break,
                        Err(e) => {
                            yield Err(exn::Exn::from(Self::map_io_error(e, &current)));
                            break;
                        },
                    };
                    match self.process_entry(entry, validated_prefix.as_deref()).await {
                        Ok(WalkEntry::File(f)) => yield Ok(f),
                        Ok(WalkEntry::Descend(d)) => stack.push(d),
                        Ok(WalkEntry::Skip) => {},
                        Err(e) => yield Err(e),
                    };
                }
            }
        })
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        if let Some(parent) = abs_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, path))?;
        }
        Ok(fs::write(&abs_path, data).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::remove_file(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> (tempfile::TempDir, LocalBackend) {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("project", temp_dir.path()).unwrap();
        (temp_dir, backend)
    }

    #[test]
    fn test_new_requires_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalBackend::new("project", temp_dir.path()).is_ok());
        assert!(LocalBackend::new("project", "relative/path").is_err());
    }

    #[test]
    fn test_new_creates_missing_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("nested/project");
        LocalBackend::new("project", &root).unwrap();
        assert!(root.is_dir());
    }

    #[test]
    fn test_absolute_and_relative_paths() {
        let (temp_dir, backend) = backend();
        let expected = temp_dir.path().join("snippets/vue.sublime-snippet");
        assert_eq!(backend.absolute_path("snippets/vue.sublime-snippet").unwrap(), expected);
        assert_eq!(backend.relative_path(&expected).unwrap(), Path::new("snippets/vue.sublime-snippet"));
        assert!(backend.absolute_path("../outside").is_err());
        assert!(backend.relative_path("/somewhere/else").is_err());
    }

    #[tokio::test]
    async fn test_write_creates_directories() {
        let (dir, backend) = backend();
        backend.write(Path::new("snippets/a.sublime-snippet"), b"<snippet/>").await.unwrap();
        assert_eq!(std::fs::read(dir.path().join("snippets/a.sublime-snippet")).unwrap(), b"<snippet/>");
    }

    #[tokio::test]
    async fn test_delete() {
        let (dir, backend) = backend();
        backend.write(Path::new("snippets/a.sublime-snippet"), b"x").await.unwrap();
        backend.delete(Path::new("snippets/a.sublime-snippet")).await.unwrap();
        assert!(!dir.path().join("snippets/a.sublime-snippet").exists());
        let err = backend.delete(Path::new("snippets/a.sublime-snippet")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_if_exists() {
        let (_dir, backend) = backend();
        backend.write(Path::new("a.txt"), b"x").await.unwrap();
        assert!(backend.delete_if_exists(Path::new("a.txt")).await.unwrap());
        assert!(!backend.delete_if_exists(Path::new("a.txt")).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_reports_size() {
        let (_dir, backend) = backend();
        backend.write(Path::new(".log"), b"* a\n* b").await.unwrap();
        assert_eq!(backend.list(None).await.unwrap(), vec![FileInfo::new(".log", 7)]);
    }

    #[tokio::test]
    async fn test_list_with_prefix() {
        let (_dir, backend) = backend();
        backend.write(Path::new("snippets/a.sublime-snippet"), b"a").await.unwrap();
        backend.write(Path::new("snippets/nested/b.sublime-snippet"), b"b").await.unwrap();
        backend.write(Path::new("snippets-old/c.sublime-snippet"), b"c").await.unwrap();
        backend.write(Path::new(".log"), b"* a").await.unwrap();

        let mut paths: Vec<_> =
            backend.list(Some(Path::new("snippets"))).await.unwrap().into_iter().map(|f| f.path).collect();
        paths.sort();
        assert_eq!(
            paths,
            vec![PathBuf::from("snippets/a.sublime-snippet"), PathBuf::from("snippets/nested/b.sublime-snippet")]
        );
        assert_eq!(backend.list(None).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_list_missing_prefix_is_empty() {
        let (_dir, backend) = backend();
        assert!(backend.list(Some(Path::new("snippets"))).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_path_security() {
        let (_dir, backend) = backend();
        assert!(backend.list(Some(Path::new("../etc"))).await.is_err());
        assert!(backend.write(Path::new("snippets/../../x"), b"x").await.is_err());
        assert!(backend.delete(Path::new("../../x")).await.is_err());
    }
}

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use lcdnjs_storage::BackendHandle;
use std::path::Path;
use tracing::instrument;

/// Delete every file under `dir`, returning how many were removed.
///
/// The listing is taken in full before anything is deleted. A directory that
/// does not exist counts as empty.
#[instrument(skip_all, fields(backend = backend.name(), dir = %dir.display()))]
pub async fn clean(backend: &BackendHandle, dir: &Path) -> Result<u64> {
    let files = backend.list(Some(dir)).await.or_raise(|| ErrorKind::Clean)?;
    let mut removed = 0;
    for file in &files {
        if backend.delete_if_exists(&file.path).await.or_raise(|| ErrorKind::Clean)? {
            tracing::debug!(path = %file.path.display(), bytes = file.size, "Removed previous snippet");
            removed += 1;
        }
    }
    tracing::info!(removed, "Snippet directory cleaned");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lcdnjs_storage::backend::{MockBackend, Operation};
    use std::path::PathBuf;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_clean_only_touches_snippet_dir() {
        let mock = Arc::new(MockBackend::with_files([
            ("snippets/a.sublime-snippet", "a"),
            ("snippets/nested/b.sublime-snippet", "b"),
            ("snippets-old/c.sublime-snippet", "c"),
            (".log", "* a"),
        ]));
        let backend: BackendHandle = mock.clone();
        assert_eq!(clean(&backend, Path::new("snippets")).await.unwrap(), 2);
        assert_eq!(mock.paths().await, vec![PathBuf::from(".log"), PathBuf::from("snippets-old/c.sublime-snippet")]);
        assert!(mock.journal().await.iter().all(|op| matches!(op, Operation::Delete(_))));
    }

    #[tokio::test]
    async fn test_clean_missing_dir() {
        let backend: BackendHandle = Arc::new(MockBackend::default());
        assert_eq!(clean(&backend, Path::new("snippets")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_clean_local_dir() {
        let dir = tempfile::tempdir().unwrap();
        let backend: BackendHandle = Arc::new(lcdnjs_storage::backend::LocalBackend::new("local", dir.path()).unwrap());
        backend.write(Path::new("snippets/a.sublime-snippet"), b"a").await.unwrap();
        backend.write(Path::new(".log"), b"* a").await.unwrap();
        assert_eq!(clean(&backend, Path::new("snippets")).await.unwrap(), 1);
        assert!(!dir.path().join("snippets/a.sublime-snippet").exists());
        assert!(dir.path().join(".log").exists());
    }
}

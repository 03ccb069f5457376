use crate::error::{ErrorKind, Result};
use crate::plan::{Artifact, Eviction, Rejection, Skip, Step, plan};
use crate::{Context, clean, manifest};
use async_stream::stream;
use exn::ResultExt;
use futures::Stream;
use lcdnjs_catalog::CatalogSource;
use lcdnjs_storage::BackendHandle;
use std::collections::HashSet;
use std::path::PathBuf;

/// Progress events emitted by [`build`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started), exactly once.
/// 2. [`Fetched`](Self::Fetched) with the number of catalog records.
/// 3. [`Cleaned`](Self::Cleaned) with the number of files removed.
/// 4. [`Planned`](Self::Planned) with the step counts.
/// 5. One of [`Written`](Self::Written), [`Evicted`](Self::Evicted),
///    [`Skipped`](Self::Skipped) or [`Rejected`](Self::Rejected) per step,
///    in plan order.
/// 6. [`ManifestWritten`](Self::ManifestWritten).
/// 7. [`Complete`](Self::Complete), exactly once.
///
/// A failed fetch or clean ends the stream after yielding the error, so
/// [`Complete`](Self::Complete) is never emitted. A failed write, eviction or
/// manifest write replaces its own event with an `Err` item and the build
/// carries on.
#[derive(Debug)]
pub enum BuildEvent {
    Started,
    Fetched(u64),
    Cleaned(u64),
    Planned {
        writes: u64,
        evictions: u64,
        skips: u64,
        rejections: u64,
    },
    Written(Artifact),
    Evicted(Eviction),
    Skipped(Skip),
    Rejected(Rejection),
    ManifestWritten(PathBuf),
    Complete,
}

fn count(n: usize) -> u64 {
    // Infallible: a usize (either 32- or 64-bit) will always fit in a u64.
    u64::try_from(n).unwrap_or(0)
}

/// Fetch the catalog, empty the snippet directory, then write one snippet per
/// library and the manifest.
///
/// The snippet directory is only emptied once the catalog has been fetched
/// and parsed, so a network failure leaves the previous output in place. The
/// manifest lists the libraries whose snippet is on disk when the build
/// finishes.
pub fn build<'a>(
    source: &'a dyn CatalogSource,
    backend: &'a BackendHandle,
    ctx: &'a Context,
) -> impl Stream<Item = Result<BuildEvent>> + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield Ok(BuildEvent::Started);

        let document = match source.fetch().await.or_raise(|| ErrorKind::Fetch) {
            Ok(document) => document,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        tracing::info!(location = source.location(), records = document.len(), "Catalog fetched");
        yield Ok(BuildEvent::Fetched(count(document.len())));

        match clean(backend, ctx.layout.snippet_dir()).await {
            Ok(removed) => yield Ok(BuildEvent::Cleaned(removed)),
            Err(e) => {
                yield Err(e);
                return;
            },
        }

        let plan = plan(&document.results, ctx);
        yield Ok(BuildEvent::Planned {
            writes: count(plan.writes()),
            evictions: count(plan.evictions()),
            skips: count(plan.skips()),
            rejections: count(plan.rejections()),
        });

        let planned = plan.written().to_vec();
        let mut succeeded = HashSet::new();
        for step in plan.into_steps() {
            match step {
                Step::Write(artifact) => {
                    let path = artifact.path.clone();
                    match backend.write(&path, artifact.content.as_bytes()).await.or_raise(|| ErrorKind::Write(path)) {
                        Ok(()) => {
                            tracing::debug!(name = %artifact.name, version = %artifact.version, kind = %artifact.kind, "Snippet written");
                            succeeded.insert(artifact.name.clone());
                            yield Ok(BuildEvent::Written(artifact));
                        },
                        Err(e) => yield Err(e),
                    }
                },
                Step::Evict(eviction) => {
                    let path = eviction.path.clone();
                    // The stale write may itself have failed; nothing to remove then.
                    match backend.delete_if_exists(&path).await.or_raise(|| ErrorKind::Evict(path)) {
                        Ok(_) => {
                            tracing::debug!(name = %eviction.name, stale = %eviction.stale, "Stale snippet removed");
                            // Listed again only once the replacement is written.
                            succeeded.remove(&eviction.name);
                            yield Ok(BuildEvent::Evicted(eviction));
                        },
                        Err(e) => yield Err(e),
                    }
                },
                Step::Skip(skip) => {
                    yield Ok(BuildEvent::Skipped(skip));
                },
                Step::Reject(rejection) => {
                    yield Ok(BuildEvent::Rejected(rejection));
                },
            }
        }

        let path = ctx.layout.manifest().to_path_buf();
        let listing = manifest::render(planned.iter().filter(|name| succeeded.contains(*name)));
        match backend.write(&path, listing.as_bytes()).await.or_raise(|| ErrorKind::Manifest(path.clone())) {
            Ok(()) => {
                tracing::info!(path = %path.display(), libraries = succeeded.len(), "Manifest written");
                yield Ok(BuildEvent::ManifestWritten(path));
            },
            Err(e) => yield Err(e),
        }

        yield Ok(BuildEvent::Complete);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Layout, SnippetRenderer};
    use async_trait::async_trait;
    use futures::StreamExt;
    use lcdnjs_catalog::models::{CatalogDocument, LibraryRecord, UnknownExtension};
    use lcdnjs_catalog::{StaticCatalog, error as catalog};
    use lcdnjs_storage::backend::{LocalBackend, MockBackend, Operation};
    use lcdnjs_storage::{FileInfo, StorageBackend, error as storage};
    use std::path::Path;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Offline;

    #[async_trait]
    impl CatalogSource for Offline {
        fn location(&self) -> &str {
            "offline"
        }

        async fn fetch(&self) -> catalog::Result<CatalogDocument> {
            exn::bail!(catalog::ErrorKind::Network("offline".to_string()))
        }
    }

    /// Fails exactly one write attempt, counting from 1.
    struct FailNthWrite {
        inner: MockBackend,
        attempts: AtomicUsize,
        fail_on: usize,
    }

    #[async_trait]
    impl StorageBackend for FailNthWrite {
        fn name(&self) -> &str {
            self.inner.name()
        }

        fn list_stream<'a>(
            &'a self,
            prefix: Option<&'a Path>,
        ) -> Pin<Box<dyn futures::Stream<Item = storage::Result<FileInfo>> + Send + 'a>> {
            self.inner.list_stream(prefix)
        }

        async fn write(&self, path: &Path, data: &[u8]) -> storage::Result<()> {
            if self.attempts.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_on {
                exn::bail!(storage::ErrorKind::PermissionDenied(path.to_path_buf()));
            }
            self.inner.write(path, data).await
        }

        async fn delete(&self, path: &Path) -> storage::Result<()> {
            self.inner.delete(path).await
        }
    }

    fn ctx() -> Context {
        Context::new(SnippetRenderer::new("lcjs").unwrap(), Layout::default(), UnknownExtension::Stylesheet)
    }

    fn scenario() -> StaticCatalog {
        StaticCatalog::from_records([
            LibraryRecord::new("a", "1.0.0", "https://x/x.js"),
            LibraryRecord::new("a", "2.0.0", "https://x/x.js"),
            LibraryRecord::new("b", "1.0.0", "https://x/y.css"),
        ])
    }

    async fn run(source: &dyn CatalogSource, backend: &BackendHandle, ctx: &Context) -> Vec<Result<BuildEvent>> {
        build(source, backend, ctx).collect().await
    }

    fn label(event: &Result<BuildEvent>) -> String {
        match event {
            Ok(BuildEvent::Started) => "started".into(),
            Ok(BuildEvent::Fetched(n)) => format!("fetched:{n}"),
            Ok(BuildEvent::Cleaned(n)) => format!("cleaned:{n}"),
            Ok(BuildEvent::Planned { writes, evictions, skips, rejections }) => {
                format!("planned:{writes}/{evictions}/{skips}/{rejections}")
            },
            Ok(BuildEvent::Written(a)) => format!("written:{}", a.name),
            Ok(BuildEvent::Evicted(e)) => format!("evicted:{}", e.name),
            Ok(BuildEvent::Skipped(s)) => format!("skipped:{}", s.name),
            Ok(BuildEvent::Rejected(r)) => format!("rejected:{}", r.library),
            Ok(BuildEvent::ManifestWritten(_)) => "manifest".into(),
            Ok(BuildEvent::Complete) => "complete".into(),
            Err(e) => format!("error:{}", &**e),
        }
    }

    fn labels(events: &[Result<BuildEvent>]) -> Vec<String> {
        events.iter().map(label).collect()
    }

    #[tokio::test]
    async fn test_scenario() {
        let mock = Arc::new(MockBackend::with_files([("snippets/old.sublime-snippet", "old")]));
        let backend: BackendHandle = mock.clone();
        let events = run(&scenario(), &backend, &ctx()).await;
        assert_eq!(
            labels(&events),
            [
                "started",
                "fetched:3",
                "cleaned:1",
                "planned:3/1/0/0",
                "written:a",
                "evicted:a",
                "written:a",
                "written:b",
                "manifest",
                "complete"
            ]
        );
        assert_eq!(
            mock.journal().await,
            vec![
                Operation::Delete("snippets/old.sublime-snippet".into()),
                Operation::Write("snippets/a.sublime-snippet".into()),
                Operation::Delete("snippets/a.sublime-snippet".into()),
                Operation::Write("snippets/a.sublime-snippet".into()),
                Operation::Write("snippets/b.sublime-snippet".into()),
                Operation::Write(".log".into()),
            ]
        );
        assert_eq!(mock.contents(".log").await.as_deref(), Some("* a\n* b"));
        let b = mock.contents("snippets/b.sublime-snippet").await.unwrap();
        assert!(b.contains("<link rel=\"stylesheet\" type=\"text/css\" href=\"https://x/y.css\">"));
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_previous_output() {
        let mock = Arc::new(MockBackend::with_files([("snippets/old.sublime-snippet", "old")]));
        let backend: BackendHandle = mock.clone();
        let events = run(&Offline, &backend, &ctx()).await;
        assert_eq!(events.len(), 2);
        match &events[1] {
            Err(e) => assert!(matches!(&**e, ErrorKind::Fetch)),
            Ok(other) => panic!("expected a fetch error, got {other:?}"),
        }
        assert!(mock.journal().await.is_empty());
        assert_eq!(mock.contents("snippets/old.sublime-snippet").await.as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_write_failure_carries_on() {
        let mock = Arc::new(MockBackend::default().with_failing_write("snippets/a.sublime-snippet"));
        let backend: BackendHandle = mock.clone();
        let events = run(&scenario(), &backend, &ctx()).await;
        assert_eq!(
            labels(&events)[4..],
            [
                "error:could not write snippet snippets/a.sublime-snippet",
                // Nothing was there to remove, which is fine.
                "evicted:a",
                "error:could not write snippet snippets/a.sublime-snippet",
                "written:b",
                "manifest",
                "complete"
            ]
        );
        assert_eq!(mock.contents(".log").await.as_deref(), Some("* b"));
        assert_eq!(mock.paths().await, [Path::new(".log"), Path::new("snippets/b.sublime-snippet")]);
    }

    #[tokio::test]
    async fn test_failed_replacement_is_left_out_of_manifest() {
        let flaky = Arc::new(FailNthWrite {
            inner: MockBackend::default(),
            attempts: AtomicUsize::new(0),
            fail_on: 2,
        });
        let backend: BackendHandle = flaky.clone();
        let events = run(&scenario(), &backend, &ctx()).await;
        assert_eq!(
            labels(&events)[4..],
            [
                "written:a",
                "evicted:a",
                "error:could not write snippet snippets/a.sublime-snippet",
                "written:b",
                "manifest",
                "complete"
            ]
        );
        assert_eq!(flaky.inner.paths().await, [Path::new(".log"), Path::new("snippets/b.sublime-snippet")]);
        assert_eq!(flaky.inner.contents(".log").await.as_deref(), Some("* b"));
    }

    #[tokio::test]
    async fn test_manifest_failure_still_completes() {
        let mock = Arc::new(MockBackend::default().with_failing_write(".log"));
        let backend: BackendHandle = mock.clone();
        let events = run(&scenario(), &backend, &ctx()).await;
        let tail: Vec<_> = labels(&events).into_iter().rev().take(2).collect();
        assert_eq!(tail, ["complete", "error:could not write manifest .log"]);
        match &events[events.len() - 2] {
            Err(e) => assert!(!e.is_fatal()),
            Ok(other) => panic!("expected a manifest error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejections_and_skips_are_reported() {
        let source = StaticCatalog::from_records([
            LibraryRecord::new("a", "2.0.0", "https://x/a.js"),
            LibraryRecord::new("a", "1.0.0", "https://x/a.js"),
            LibraryRecord::new("x/y", "1.0.0", "https://x/xy.js"),
        ]);
        let backend: BackendHandle = Arc::new(MockBackend::default());
        let events = run(&source, &backend, &ctx()).await;
        assert_eq!(labels(&events)[3..6], ["planned:1/0/1/1", "written:a", "skipped:a"]);
        assert_eq!(label(&events[6]), "rejected:x/y");
    }

    #[tokio::test]
    async fn test_runs_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let backend: BackendHandle = Arc::new(LocalBackend::new("local", dir.path()).unwrap());
        let ctx = ctx();
        let snapshot = || {
            ["snippets/a.sublime-snippet", "snippets/b.sublime-snippet", ".log"]
                .map(|p| std::fs::read(dir.path().join(p)).unwrap())
        };

        let first = run(&scenario(), &backend, &ctx).await;
        assert!(first.iter().all(Result::is_ok));
        let before = snapshot();
        let second = run(&scenario(), &backend, &ctx).await;
        assert!(second.iter().all(Result::is_ok));
        assert_eq!(label(&second[2]), "cleaned:2");
        assert_eq!(before, snapshot());
        assert_eq!(std::fs::read_to_string(dir.path().join(".log")).unwrap(), "* a\n* b");
    }
}

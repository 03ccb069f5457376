use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use futures::StreamExt;
use lcdnjs_catalog::{CatalogSource, HttpCatalog, StaticCatalog};
use lcdnjs_config::Config;
use lcdnjs_snippets::{BuildEvent, Context, Layout, SnippetRenderer, build};
use lcdnjs_storage::BackendHandle;
use lcdnjs_storage::backend::LocalBackend;
use std::path::PathBuf;
use std::sync::Arc;

/// Command-line overrides for a single run.
#[derive(Debug, Default)]
pub struct Options {
    pub config: Option<PathBuf>,
    pub root: Option<PathBuf>,
    pub from_file: Option<PathBuf>,
}

/// What a completed run did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub written: u64,
    pub evicted: u64,
    pub skipped: u64,
    pub rejected: u64,
    /// Per-file failures; these do not fail the run.
    pub failed: u64,
}

/// Load configuration, then drive one build to completion.
///
/// Only failures that stop the build are returned as errors. Failures local to
/// one file are logged and counted in the [`Summary`].
pub async fn run(options: Options) -> Result<Summary> {
    let config = Config::load(options.config.as_deref()).or_raise(|| ErrorKind::Config)?;

    let root = match options.root.or_else(|| config.output.root.clone()) {
        Some(root) => root,
        None => std::env::current_dir().or_raise(|| ErrorKind::Storage)?,
    };
    let root = std::path::absolute(&root).or_raise(|| ErrorKind::Storage)?;
    let backend: BackendHandle = Arc::new(LocalBackend::new("project", &root).or_raise(|| ErrorKind::Storage)?);

    let source: Box<dyn CatalogSource> = match &options.from_file {
        Some(path) => Box::new(StaticCatalog::from_file(path).or_raise(|| ErrorKind::Catalog)?),
        None => Box::new(
            HttpCatalog::new(config.catalog.url.clone(), config.catalog.timeout()).or_raise(|| ErrorKind::Catalog)?,
        ),
    };

    let renderer = SnippetRenderer::new(config.output.trigger_prefix.clone()).or_raise(|| ErrorKind::Template)?;
    let layout = Layout::new(
        config.snippet_dir().or_raise(|| ErrorKind::Config)?,
        config.manifest_path().or_raise(|| ErrorKind::Config)?,
        config.output.extension(),
    );
    let ctx = Context::new(renderer, layout, config.policy.unknown_extension);

    let mut summary = Summary::default();
    let mut events = std::pin::pin!(build(source.as_ref(), &backend, &ctx));
    while let Some(event) = events.next().await {
        match event {
            Ok(BuildEvent::Started) => {
                tracing::info!(root = %root.display(), catalog = source.location(), "Build started");
            },
            Ok(BuildEvent::Fetched(records)) => tracing::debug!(records, "Fetched"),
            Ok(BuildEvent::Cleaned(removed)) => tracing::debug!(removed, "Cleaned"),
            Ok(BuildEvent::Planned {
                writes,
                evictions,
                skips,
                rejections,
            }) => tracing::debug!(writes, evictions, skips, rejections, "Planned"),
            Ok(BuildEvent::Written(_)) => summary.written += 1,
            Ok(BuildEvent::Evicted(_)) => summary.evicted += 1,
            Ok(BuildEvent::Skipped(_)) => summary.skipped += 1,
            Ok(BuildEvent::Rejected(_)) => summary.rejected += 1,
            Ok(BuildEvent::ManifestWritten(path)) => tracing::debug!(path = %path.display(), "Manifest written"),
            Ok(BuildEvent::Complete) => {
                tracing::info!(
                    written = summary.written,
                    evicted = summary.evicted,
                    skipped = summary.skipped,
                    rejected = summary.rejected,
                    failed = summary.failed,
                    "Build complete"
                );
            },
            Err(e) if e.is_fatal() => return Err(e).or_raise(|| ErrorKind::Build),
            Err(e) => {
                tracing::error!("{e:?}");
                summary.failed += 1;
            },
        }
    }
    Ok(summary)
}

//! Turns the cdnjs catalog into one editor snippet per library.
//!
//! The catalog lists many records per library; [`plan`] keeps the highest
//! version of each canonical name, [`build`] then applies that plan against a
//! [`StorageBackend`](lcdnjs_storage::StorageBackend) and writes the manifest.

mod build;
mod clean;
pub mod error;
mod manifest;
mod plan;
mod template;

pub use crate::build::{BuildEvent, build};
pub use crate::clean::clean;
pub use crate::plan::{Artifact, DedupTable, Eviction, Plan, RejectReason, Rejection, Skip, Step, Verdict, plan};
pub use crate::template::{DEFAULT_TRIGGER_PREFIX, SnippetRenderer};
use lcdnjs_catalog::models::{CanonicalName, UnknownExtension};
use std::path::{Path, PathBuf};

pub const DEFAULT_EXTENSION: &str = "sublime-snippet";

/// Where a build puts its files, relative to the backend root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    snippets: PathBuf,
    manifest: PathBuf,
    extension: String,
}
impl Layout {
    pub fn new(snippets: impl Into<PathBuf>, manifest: impl Into<PathBuf>, extension: impl AsRef<str>) -> Self {
        Self {
            snippets: snippets.into(),
            manifest: manifest.into(),
            extension: extension.as_ref().trim().trim_matches('.').to_string(),
        }
    }

    pub fn snippet_dir(&self) -> &Path {
        &self.snippets
    }

    pub fn manifest(&self) -> &Path {
        &self.manifest
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// `<snippets>/<name>.<extension>`
    pub fn artifact_path(&self, name: &CanonicalName) -> PathBuf {
        self.snippets.join(format!("{name}.{}", self.extension))
    }
}
impl Default for Layout {
    fn default() -> Self {
        Self::new("snippets", ".log", DEFAULT_EXTENSION)
    }
}

/// Everything a build needs besides its collaborators.
pub struct Context {
    pub renderer: SnippetRenderer,
    pub layout: Layout,
    pub unknown_extension: UnknownExtension,
}
impl Context {
    pub fn new(renderer: SnippetRenderer, layout: Layout, unknown_extension: UnknownExtension) -> Self {
        Self {
            renderer,
            layout,
            unknown_extension,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain("sublime-snippet", "snippets/jquery.sublime-snippet")]
    #[case::leading_dot(".sublime-snippet", "snippets/jquery.sublime-snippet")]
    #[case::trailing_dot("sublime-snippet. ", "snippets/jquery.sublime-snippet")]
    #[case::other("snip", "snippets/jquery.snip")]
    fn test_artifact_path(#[case] extension: &str, #[case] expected: &str) {
        let layout = Layout::new("snippets", ".log", extension);
        assert_eq!(layout.artifact_path(&CanonicalName::from_name("jquery")), Path::new(expected));
    }

    #[test]
    fn test_default_layout() {
        let layout = Layout::default();
        assert_eq!(layout.snippet_dir(), Path::new("snippets"));
        assert_eq!(layout.manifest(), Path::new(".log"));
        assert_eq!(
            layout.artifact_path(&CanonicalName::from_name("highlight.js")),
            Path::new("snippets/highlightjs.sublime-snippet")
        );
    }
}

use super::CatalogSource;
use crate::error::{ErrorKind, Result};
use crate::models::{CatalogDocument, LibraryRecord};
use async_trait::async_trait;
use exn::ResultExt;
use std::path::Path;

/// A catalog that is already in memory: a saved API response for offline
/// runs, or hand-built records in tests.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    location: String,
    document: CatalogDocument,
}
impl StaticCatalog {
    pub fn new(document: CatalogDocument) -> Self {
        Self {
            location: "memory".to_string(),
            document,
        }
    }

    pub fn from_records(records: impl IntoIterator<Item = LibraryRecord>) -> Self {
        Self::new(records.into_iter().collect::<Vec<_>>().into())
    }

    /// Load a catalog previously saved from the API.
    ///
    /// Reads synchronously: it happens once at startup.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).or_raise(|| ErrorKind::Io(path.to_path_buf()))?;
        let document = CatalogDocument::from_slice(&bytes)?;
        Ok(Self {
            location: path.display().to_string(),
            document,
        })
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    fn location(&self) -> &str {
        &self.location
    }

    async fn fetch(&self) -> Result<CatalogDocument> {
        Ok(self.document.clone())
    }
}

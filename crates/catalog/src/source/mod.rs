//! Where a catalog comes from.

mod fixed;
mod http;

pub use self::fixed::StaticCatalog;
pub use self::http::{DEFAULT_CATALOG_URL, HttpCatalog};
use crate::error::Result;
use crate::models::CatalogDocument;
use async_trait::async_trait;

/// The fetch stage of a build.
///
/// Implementations buffer the whole catalog before returning; there is no
/// partial or streamed delivery, and no retrying.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Where the catalog is being read from, for logging.
    fn location(&self) -> &str;

    async fn fetch(&self) -> Result<CatalogDocument>;
}

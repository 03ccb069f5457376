use super::CatalogSource;
use crate::error::{ErrorKind, Result};
use crate::models::CatalogDocument;
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::Client;
use std::time::Duration;
use tracing::instrument;

/// The cdnjs libraries endpoint. `fields=version` is needed for the API to
/// include each library's version alongside `name` and `latest`.
pub const DEFAULT_CATALOG_URL: &str = "https://api.cdnjs.com/libraries?fields=version";

/// Fetches the catalog over HTTP(S).
pub struct HttpCatalog {
    client: Client,
    url: String,
}
impl HttpCatalog {
    /// Build a client for `url`, optionally bounding the whole request by
    /// `timeout`.
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let url = url.into();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            exn::bail!(ErrorKind::InvalidUrl(url));
        }
        let mut builder = Client::builder().user_agent(concat!("lcdnjs/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().or_raise(|| ErrorKind::Network(url.clone()))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    fn location(&self) -> &str {
        &self.url
    }

    #[instrument(skip_all, fields(url = %self.url))]
    async fn fetch(&self) -> Result<CatalogDocument> {
        let network = || ErrorKind::Network(self.url.clone());
        let response = self.client.get(&self.url).send().await.or_raise(network)?;
        let status = response.status();
        if !status.is_success() {
            exn::bail!(ErrorKind::Status(status.as_u16()));
        }
        let body = response.bytes().await.or_raise(network)?;
        tracing::debug!(bytes = body.len(), "Catalog response buffered");
        CatalogDocument::from_slice(&body)
    }
}

use super::{CanonicalName, LibraryVersion, describe};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::{Deserialize, Serialize};

/// The catalog as returned by `GET /libraries`.
///
/// Only `results` is required; anything else cdnjs adds is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub results: Vec<LibraryRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}
impl CatalogDocument {
    /// Parse a fully buffered response body.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).or_raise(|| ErrorKind::Parse)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
impl From<Vec<LibraryRecord>> for CatalogDocument {
    fn from(results: Vec<LibraryRecord>) -> Self {
        let total = u64::try_from(results.len()).ok();
        Self { results, total }
    }
}

/// One library in the catalog.
///
/// `version` and `latest` are tolerated as missing or `null`: cdnjs carries a
/// handful of libraries with no published asset, and one of those must not
/// fail the whole catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryRecord {
    pub name: String,
    #[serde(default)]
    pub version: LibraryVersion,
    /// URL of the primary asset.
    #[serde(default)]
    pub latest: Option<String>,
}
impl LibraryRecord {
    pub fn new(name: impl Into<String>, version: impl Into<LibraryVersion>, latest: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            latest: Some(latest.into()),
        }
    }

    pub fn canonical_name(&self) -> CanonicalName {
        CanonicalName::from_name(&self.name)
    }

    pub fn description(&self) -> String {
        describe(&self.name)
    }

    /// The primary asset URL, if the catalog provided a non-blank one.
    pub fn asset_url(&self) -> Option<&str> {
        self.latest.as_deref().map(str::trim).filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "results": [
            {"name": "jquery", "latest": "https://cdnjs.cloudflare.com/ajax/libs/jquery/3.7.1/jquery.min.js", "version": "3.7.1"},
            {"name": "highlight.js", "latest": "https://cdnjs.cloudflare.com/ajax/libs/highlight.js/11.9.0/highlight.min.js", "version": "11.9.0"},
            {"name": "broken", "latest": null, "version": null},
            {"name": "bare"}
        ],
        "total": 4,
        "available": 4
    }"#;

    #[test]
    fn test_parse_document() {
        let document = CatalogDocument::from_slice(SAMPLE.as_bytes()).unwrap();
        assert_eq!(document.len(), 4);
        assert_eq!(document.total, Some(4));

        let jquery = &document.results[0];
        assert_eq!(jquery.canonical_name().as_str(), "jquery");
        assert_eq!(jquery.version, LibraryVersion::from("3.7.1"));

        let highlight = &document.results[1];
        assert_eq!(highlight.canonical_name().as_str(), "highlightjs");
        assert_eq!(highlight.description(), "Highlight.Js");

        assert_eq!(document.results[2].asset_url(), None);
        assert_eq!(document.results[2].version, LibraryVersion::default());
        assert_eq!(document.results[3].asset_url(), None);
    }

    #[test]
    fn test_parse_rejects_malformed_document() {
        let err = CatalogDocument::from_slice(b"<html>rate limited</html>").unwrap_err();
        assert!(matches!(&*err, ErrorKind::Parse));
        let err = CatalogDocument::from_slice(br#"{"libraries": []}"#).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Parse));
        let err = CatalogDocument::from_slice(br#"{"results": [{"version": "1.0.0"}]}"#).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Parse));
    }

    #[test]
    fn test_blank_asset_url() {
        let record = LibraryRecord::new("a", "1.0.0", "   ");
        assert_eq!(record.asset_url(), None);
    }

    #[test]
    fn test_from_records() {
        let document = CatalogDocument::from(vec![LibraryRecord::new("a", "1.0.0", "x.js")]);
        assert_eq!(document.total, Some(1));
        assert!(!document.is_empty());
    }
}

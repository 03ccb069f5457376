use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// What a library's primary asset is, judged purely by its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Loaded with a `<script>` tag (`.js`, `.mjs`, `.cjs`).
    Script,
    /// Loaded with a `<link rel="stylesheet">` tag (`.css`).
    Stylesheet,
}
impl AssetKind {
    /// Classify an asset URL. Returns `None` when the extension is missing or
    /// not recognized; what to do then is the caller's policy.
    ///
    /// ```
    /// use lcdnjs_catalog::models::AssetKind;
    ///
    /// let url = "https://cdnjs.cloudflare.com/ajax/libs/jquery/3.7.1/jquery.min.js";
    /// assert_eq!(AssetKind::from_url(url), Some(AssetKind::Script));
    /// assert_eq!(AssetKind::from_url("https://x/a.CSS?v=2"), Some(AssetKind::Stylesheet));
    /// assert_eq!(AssetKind::from_url("https://x/font.woff2"), None);
    /// ```
    pub fn from_url(url: impl AsRef<str>) -> Option<Self> {
        match extension(url.as_ref())?.as_str() {
            "js" | "mjs" | "cjs" => Some(Self::Script),
            "css" => Some(Self::Stylesheet),
            _ => None,
        }
    }

    /// Classify an asset URL, applying `policy` when the extension is not
    /// recognized. `None` means the record should be rejected.
    pub fn resolve(url: impl AsRef<str>, policy: UnknownExtension) -> Option<Self> {
        Self::from_url(url).or(match policy {
            UnknownExtension::Stylesheet => Some(Self::Stylesheet),
            UnknownExtension::Reject => None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Stylesheet => "stylesheet",
        }
    }
}
impl Display for AssetKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// What to do with an asset whose extension is neither a script nor a
/// stylesheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownExtension {
    /// Render it with the stylesheet template, like every non-script asset
    /// used to be.
    #[default]
    Stylesheet,
    /// Skip the library.
    Reject,
}

/// Lowercased extension of the last path segment of a URL, ignoring any
/// query string or fragment.
pub(crate) fn extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let segment = path.rsplit('/').next().unwrap_or_default();
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

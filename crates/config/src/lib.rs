//! Layered configuration for lcdnjs.
//!
//! Everything has a default, so a run with no config at all fetches the live
//! cdnjs catalog and writes to `./snippets` and `./.log`. Sources are merged
//! in order, later ones winning:
//!
//! 1. Built-in defaults
//! 2. `config.toml` in the user config directory (e.g. `~/.config/lcdnjs/`)
//! 3. `lcdnjs.toml` in the working directory
//! 4. An explicitly passed file (`toml`, `yaml`/`yml` or `json`)
//! 5. `LCDNJS_` environment variables, `__` separating nested keys
//!    (`LCDNJS_OUTPUT__SNIPPETS=out`)
//!
//! ```toml
//! [catalog]
//! url = "https://api.cdnjs.com/libraries?fields=version"
//! timeout = 30
//!
//! [output]
//! snippets = "snippets"
//! manifest = ".log"
//! extension = "sublime-snippet"
//! trigger_prefix = "lcjs"
//!
//! [policy]
//! unknown_extension = "stylesheet"   # or "reject"
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use lcdnjs_catalog::DEFAULT_CATALOG_URL;
use lcdnjs_catalog::models::UnknownExtension;
use lcdnjs_storage::validate_path;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "LCDNJS_";
pub const LOCAL_CONFIG_FILE: &str = "lcdnjs.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub output: OutputConfig,
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub url: String,
    /// Whole-request timeout, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}
impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CATALOG_URL.to_string(),
            timeout: None,
        }
    }
}
impl CatalogConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Project root every other output path is relative to. Defaults to the
    /// working directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// Directory holding one snippet per library. Emptied before every run.
    pub snippets: PathBuf,
    /// File listing the libraries written by the last run.
    pub manifest: PathBuf,
    /// Snippet file extension. Surrounding dots and whitespace are ignored.
    pub extension: String,
    /// Prepended to the canonical name to form the tab trigger.
    pub trigger_prefix: String,
}
impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: None,
            snippets: PathBuf::from("snippets"),
            manifest: PathBuf::from(".log"),
            extension: "sublime-snippet".to_string(),
            trigger_prefix: "lcjs".to_string(),
        }
    }
}
impl OutputConfig {
    /// The extension as it appears in snippet file names.
    pub fn extension(&self) -> &str {
        self.extension.trim().trim_matches('.')
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    pub unknown_extension: UnknownExtension,
}

impl Config {
    /// Merge every source and validate the result.
    ///
    /// `explicit` must exist if given; the implicit files are optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = Self::extract(Self::figment(explicit)?)?;
        tracing::debug!(?config, "Configuration loaded");
        Ok(config)
    }

    /// All sources, merged but not yet extracted.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(dirs) = ProjectDirs::from("", "", "lcdnjs") {
            figment = figment.merge(Toml::file(dirs.config_dir().join("config.toml")));
        }
        figment = figment.merge(Toml::file(LOCAL_CONFIG_FILE));
        if let Some(path) = explicit {
            figment = Self::merge_file(figment, path)?;
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract and validate a config from an arbitrary figment.
    pub fn extract(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Extract)?;
        config.validate()?;
        Ok(config)
    }

    fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
        if !path.is_file() {
            exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
        }
        let ext = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
        Ok(match ext.as_deref() {
            Some("toml") => figment.merge(Toml::file(path)),
            Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
            Some("json") => figment.merge(Json::file(path)),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
        })
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.catalog.url.trim();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            exn::bail!(ErrorKind::Invalid {
                field: "catalog.url",
                reason: format!("expected an http(s) URL, got {url:?}"),
            });
        }
        if self.catalog.timeout == Some(0) {
            exn::bail!(ErrorKind::Invalid {
                field: "catalog.timeout",
                reason: "must be at least one second".to_string(),
            });
        }
        let extension = self.output.extension();
        if extension.is_empty() || extension.contains(['/', '\\']) || extension.contains(char::is_whitespace) {
            exn::bail!(ErrorKind::Invalid {
                field: "output.extension",
                reason: format!("{:?} is not a file extension", self.output.extension),
            });
        }
        if self.output.trigger_prefix.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid {
                field: "output.trigger_prefix",
                reason: "must not be empty".to_string(),
            });
        }
        let snippets = Self::relative("output.snippets", &self.output.snippets)?;
        let manifest = Self::relative("output.manifest", &self.output.manifest)?;
        // Everything under the snippet directory is deleted before a run.
        if manifest.starts_with(&snippets) {
            exn::bail!(ErrorKind::Invalid {
                field: "output.manifest",
                reason: format!("must not be inside the snippet directory {}", snippets.display()),
            });
        }
        Ok(())
    }

    fn relative(field: &'static str, path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            exn::bail!(ErrorKind::Invalid { field, reason: "must be relative to output.root".to_string() });
        }
        validate_path(path).or_raise(|| ErrorKind::Invalid {
            field,
            reason: format!("{} escapes the project root", path.display()),
        })
    }

    /// Snippet directory, normalized.
    pub fn snippet_dir(&self) -> Result<PathBuf> {
        Self::relative("output.snippets", &self.output.snippets)
    }

    /// Manifest path, normalized.
    pub fn manifest_path(&self) -> Result<PathBuf> {
        Self::relative("output.manifest", &self.output.manifest)
    }
}

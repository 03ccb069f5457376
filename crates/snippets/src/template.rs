//! Snippet rendering.
//!
//! Exactly two templates exist, one per [`AssetKind`], both compiled once by
//! [`SnippetRenderer`] with [upon]'s `{{ variable }}` syntax. The builtin
//! templates are embedded from `assets/templates/` at compile time.
//!
//! # Template Variables
//!
//! | Variable      | Description                                       |
//! |---------------|---------------------------------------------------|
//! | `name`        | Canonical library name (`highlightjs`)            |
//! | `latest`      | Primary asset URL                                 |
//! | `description` | Title-cased label (`Highlight.Js`)                |
//! | `prefix`      | Tab trigger prefix (`lcjs`)                       |
//!
//! Values are inserted verbatim. The same input always renders to the same
//! bytes.

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use lcdnjs_catalog::models::{AssetKind, CanonicalName};
use rust_embed::Embed;
use upon::{Engine, Template};

pub const SCRIPT_TEMPLATE: &str = "script.sublime-snippet";
pub const STYLESHEET_TEMPLATE: &str = "stylesheet.sublime-snippet";
pub const DEFAULT_TRIGGER_PREFIX: &str = "lcjs";

#[derive(Embed)]
#[folder = "../../assets/templates/"]
struct Builtins;
impl Builtins {
    fn load(name: &str) -> Result<String> {
        let file = Self::get(name).ok_or_raise(|| ErrorKind::Template)?;
        String::from_utf8(file.data.into_owned()).or_raise(|| ErrorKind::Template)
    }
}

/// Renders snippet documents for either kind of asset.
///
/// Templates are compiled at construction so a broken template fails before
/// any file is touched.
pub struct SnippetRenderer {
    engine: Engine<'static>,
    script: Template<'static>,
    stylesheet: Template<'static>,
    trigger_prefix: String,
}
impl SnippetRenderer {
    /// Renderer using the builtin templates.
    pub fn new(trigger_prefix: impl Into<String>) -> Result<Self> {
        Self::from_sources(Builtins::load(SCRIPT_TEMPLATE)?, Builtins::load(STYLESHEET_TEMPLATE)?, trigger_prefix)
    }

    /// Renderer using caller-supplied template sources.
    pub fn from_sources(
        script: impl Into<String>,
        stylesheet: impl Into<String>,
        trigger_prefix: impl Into<String>,
    ) -> Result<Self> {
        let engine = Engine::new();
        let script = engine.compile(script.into()).or_raise(|| ErrorKind::Template)?;
        let stylesheet = engine.compile(stylesheet.into()).or_raise(|| ErrorKind::Template)?;
        Ok(Self {
            engine,
            script,
            stylesheet,
            trigger_prefix: trigger_prefix.into(),
        })
    }

    /// Render the snippet for one library.
    pub fn render(&self, kind: AssetKind, name: &CanonicalName, latest: &str, description: &str) -> Result<String> {
        let template = match kind {
            AssetKind::Script => &self.script,
            AssetKind::Stylesheet => &self.stylesheet,
        };
        let values = upon::value! {
            name: name.as_str(),
            latest: latest,
            description: description,
            prefix: self.trigger_prefix.as_str(),
        };
        template.render(&self.engine, values).to_string().or_raise(|| ErrorKind::Template)
    }
}

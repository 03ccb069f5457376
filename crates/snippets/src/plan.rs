//! Deduplication of catalog records into file operations.
//!
//! cdnjs lists several records that collapse onto the same canonical name
//! (`highlight.js` and `highlightjs`, or the same library listed twice).
//! [`plan`] walks the records in catalog order and keeps, for every canonical
//! name, the record with the highest [`LibraryVersion`]:
//!
//! - first sighting: write the snippet
//! - strictly newer than what was kept: evict the old snippet, write the new one
//! - equal or older: skip
//!
//! Nothing here touches storage. The resulting [`Plan`] is an ordered list of
//! [`Step`]s that [`build`](crate::build) applies.

use crate::Context;
use crate::manifest;
use derive_more::Display;
use lcdnjs_catalog::models::{AssetKind, CanonicalName, LibraryRecord, LibraryVersion};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::instrument;

/// Highest version accepted so far for each canonical name.
///
/// Lives only as long as one planning pass.
#[derive(Debug, Clone, Default)]
pub struct DedupTable(HashMap<CanonicalName, LibraryVersion>);

/// How an incoming record relates to the [`DedupTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Name not seen yet.
    Absent,
    /// Incoming version is strictly greater than the stored one.
    Upgrade { stale: LibraryVersion },
    /// Stored version is greater than or equal to the incoming one.
    Keep { kept: LibraryVersion },
}

impl DedupTable {
    pub fn check(&self, name: &CanonicalName, incoming: &LibraryVersion) -> Verdict {
        match self.0.get(name) {
            None => Verdict::Absent,
            Some(stored) if stored < incoming => Verdict::Upgrade { stale: stored.clone() },
            Some(stored) => Verdict::Keep { kept: stored.clone() },
        }
    }

    pub fn record(&mut self, name: CanonicalName, version: LibraryVersion) {
        self.0.insert(name, version);
    }

    pub fn get(&self, name: &str) -> Option<&LibraryVersion> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A rendered snippet and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: CanonicalName,
    pub version: LibraryVersion,
    pub kind: AssetKind,
    pub path: PathBuf,
    pub content: String,
}

/// Removal of a snippet superseded later in the same catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eviction {
    pub name: CanonicalName,
    pub path: PathBuf,
    pub stale: LibraryVersion,
    pub fresh: LibraryVersion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    pub name: CanonicalName,
    pub kept: LibraryVersion,
    pub incoming: LibraryVersion,
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum RejectReason {
    #[display("name cannot be used as a file name")]
    UnsafeName,
    #[display("no asset URL")]
    MissingAsset,
    #[display("unrecognized asset extension in {_0}")]
    UnknownExtension(String),
    #[display("template failed: {_0}")]
    Template(String),
}

/// A record that produced nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Library name as it appeared in the catalog.
    pub library: String,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Write(Artifact),
    Evict(Eviction),
    Skip(Skip),
    Reject(Rejection),
}

/// Ordered outcome of a planning pass.
#[derive(Debug, Default)]
pub struct Plan {
    steps: Vec<Step>,
    written: Vec<CanonicalName>,
    table: DedupTable,
}
impl Plan {
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }

    /// Names with a write, in first-write order, each listed once.
    pub fn written(&self) -> &[CanonicalName] {
        &self.written
    }

    pub fn table(&self) -> &DedupTable {
        &self.table
    }

    /// Manifest text, assuming every write succeeds.
    pub fn manifest(&self) -> String {
        manifest::render(&self.written)
    }

    pub fn writes(&self) -> usize {
        self.count(|s| matches!(s, Step::Write(_)))
    }

    pub fn evictions(&self) -> usize {
        self.count(|s| matches!(s, Step::Evict(_)))
    }

    pub fn skips(&self) -> usize {
        self.count(|s| matches!(s, Step::Skip(_)))
    }

    pub fn rejections(&self) -> usize {
        self.count(|s| matches!(s, Step::Reject(_)))
    }

    fn count(&self, f: impl Fn(&Step) -> bool) -> usize {
        self.steps.iter().filter(|s| f(s)).count()
    }

    fn consider(&mut self, record: &LibraryRecord, ctx: &Context) {
        let name = record.canonical_name();
        if !name.is_file_safe() {
            return self.reject(record, RejectReason::UnsafeName);
        }
        let Some(url) = record.asset_url() else {
            return self.reject(record, RejectReason::MissingAsset);
        };
        let stale = match self.table.check(&name, &record.version) {
            Verdict::Absent => None,
            Verdict::Upgrade { stale } => Some(stale),
            Verdict::Keep { kept } => {
                tracing::debug!(%name, %kept, incoming = %record.version, "Keeping earlier record");
                self.steps.push(Step::Skip(Skip {
                    name,
                    kept,
                    incoming: record.version.clone(),
                }));
                return;
            },
        };
        let kind = match AssetKind::from_url(url) {
            Some(kind) => kind,
            None => {
                let Some(kind) = AssetKind::resolve(url, ctx.unknown_extension) else {
                    return self.reject(record, RejectReason::UnknownExtension(url.to_string()));
                };
                tracing::warn!(%name, url, fallback = %kind, "Unrecognized asset extension");
                kind
            },
        };
        let content = match ctx.renderer.render(kind, &name, url, &record.description()) {
            Ok(content) => content,
            Err(e) => return self.reject(record, RejectReason::Template(e.to_string())),
        };

        let path = ctx.layout.artifact_path(&name);
        match stale {
            Some(stale) => {
                tracing::debug!(%name, %stale, fresh = %record.version, "Replacing earlier record");
                self.steps.push(Step::Evict(Eviction {
                    name: name.clone(),
                    path: path.clone(),
                    stale,
                    fresh: record.version.clone(),
                }));
            },
            // Replacements keep the position of the first write.
            None => self.written.push(name.clone()),
        }
        self.table.record(name.clone(), record.version.clone());
        self.steps.push(Step::Write(Artifact {
            name,
            version: record.version.clone(),
            kind,
            path,
            content,
        }));
    }

    fn reject(&mut self, record: &LibraryRecord, reason: RejectReason) {
        tracing::warn!(library = %record.name, %reason, "Skipping library");
        self.steps.push(Step::Reject(Rejection {
            library: record.name.clone(),
            reason,
        }));
    }
}

/// Plan the file operations for a catalog, in catalog order.
///
/// Pure apart from logging: the same records and context always give the
/// same plan.
#[instrument(skip_all, fields(records = records.len()))]
pub fn plan(records: &[LibraryRecord], ctx: &Context) -> Plan {
    let mut plan = Plan::default();
    for record in records {
        plan.consider(record, ctx);
    }
    tracing::info!(
        libraries = plan.table.len(),
        writes = plan.writes(),
        evictions = plan.evictions(),
        skips = plan.skips(),
        rejections = plan.rejections(),
        "Catalog planned"
    );
    plan
}

//! Artifact publishing.
//!
//! [`Publisher`] renders gift pages, gift JSON and collection indexes and
//! hands them to an [`ArtifactSink`]. [`LocalDirSink`] writes under a root
//! directory with the `.giftsync.tmp` + rename protocol, so a reader never
//! sees a half-written file.
//!
//! | Artifact         | Relative path                 |
//! |------------------|-------------------------------|
//! | Gift page        | `{gifts_folder}/{key}.html`   |
//! | Gift JSON        | `{json_folder}/{key}.json`    |
//! | Collection index | `{collection}.html`           |

use std::path::{Path, PathBuf};

use giftsync_core::{EntityKey, GiftRecord, OutputConfig};
use giftsync_renderer::{IndexContext, Renderer};

use crate::error::{io_err, SyncError};

// ---------------------------------------------------------------------------
// ArtifactLayout
// ---------------------------------------------------------------------------

/// Relative artifact locations. Paths use `/` so they double as links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    pub gifts_folder: String,
    pub json_folder: String,
}

impl ArtifactLayout {
    pub fn from_config(output: &OutputConfig) -> Self {
        Self {
            gifts_folder: output.gifts_folder.clone(),
            json_folder: output.json_folder.clone(),
        }
    }

    pub fn gift_page(&self, key: &EntityKey) -> String {
        format!("{}/{key}.html", self.gifts_folder.trim_end_matches('/'))
    }

    pub fn gift_json(&self, key: &EntityKey) -> String {
        format!("{}/{key}.json", self.json_folder.trim_end_matches('/'))
    }

    pub fn collection_index(&self, collection: &str) -> String {
        format!("{collection}.html")
    }
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self::from_config(&OutputConfig::default())
    }
}

// ---------------------------------------------------------------------------
// ArtifactSink
// ---------------------------------------------------------------------------

/// Destination for published artifacts.
pub trait ArtifactSink: Send + Sync {
    /// Store `content` at `relative`, returning where it landed.
    fn put(&self, relative: &str, content: &str) -> Result<PathBuf, SyncError>;
}

/// Writes artifacts below a local root directory.
#[derive(Debug, Clone)]
pub struct LocalDirSink {
    root: PathBuf,
}

impl LocalDirSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|seg| !seg.is_empty())
            .fold(self.root.clone(), |path, seg| path.join(seg))
    }
}

impl ArtifactSink for LocalDirSink {
    fn put(&self, relative: &str, content: &str) -> Result<PathBuf, SyncError> {
        let path = self.resolve(relative);
        atomic_write(&path, content)?;
        Ok(path)
    }
}

pub(crate) fn tmp_path_for(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.giftsync.tmp", path.display()))
}

fn atomic_write(path: &Path, content: &str) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let tmp = tmp_path_for(path);
    std::fs::write(&tmp, content).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }

    tracing::debug!("wrote: {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

/// Outcome of publishing one collection.
#[derive(Debug, Default)]
pub struct PublishReport {
    pub written: Vec<PathBuf>,
    /// `(artifact, error)` for every artifact that could not be published.
    pub failures: Vec<(String, String)>,
}

/// Renders artifacts and writes them through a sink.
pub struct Publisher {
    renderer: Renderer,
    sink: Box<dyn ArtifactSink>,
    layout: ArtifactLayout,
}

impl Publisher {
    pub fn new(renderer: Renderer, sink: Box<dyn ArtifactSink>, layout: ArtifactLayout) -> Self {
        Self {
            renderer,
            sink,
            layout,
        }
    }

    /// Publisher writing to `output.publish_root` with optional template overrides.
    pub fn from_config(output: &OutputConfig) -> Result<Self, SyncError> {
        let renderer = Renderer::with_overrides(output.templates_dir.as_deref())?;
        Ok(Self::new(
            renderer,
            Box::new(LocalDirSink::new(&output.publish_root)),
            ArtifactLayout::from_config(output),
        ))
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Write the gift page and gift JSON for `record`.
    pub fn publish_gift(&self, record: &GiftRecord) -> Result<Vec<PathBuf>, SyncError> {
        let key = record.key();
        let page = self.renderer.render_gift_page(record)?;
        let json = self.renderer.render_gift_json(record)?;
        Ok(vec![
            self.sink.put(&self.layout.gift_page(&key), &page)?,
            self.sink.put(&self.layout.gift_json(&key), &json)?,
        ])
    }

    pub fn publish_index(&self, index: &IndexContext) -> Result<PathBuf, SyncError> {
        let html = self.renderer.render_index(index)?;
        self.sink
            .put(&self.layout.collection_index(&index.collection), &html)
    }

    /// Publish every changed gift, then the index when anything changed.
    ///
    /// One failing artifact never stops the others.
    pub fn publish_collection(&self, changed: &[GiftRecord], index: &IndexContext) -> PublishReport {
        let mut report = PublishReport::default();
        if changed.is_empty() {
            return report;
        }

        for record in changed {
            match self.publish_gift(record) {
                Ok(paths) => report.written.extend(paths),
                Err(e) => {
                    tracing::warn!("publish failed for {}: {e}", record.key());
                    report.failures.push((record.key().0, e.to_string()));
                }
            }
        }

        match self.publish_index(index) {
            Ok(path) => report.written.push(path),
            Err(e) => {
                tracing::warn!("index publish failed for {}: {e}", index.collection);
                report
                    .failures
                    .push((self.layout.collection_index(&index.collection), e.to_string()));
            }
        }
        report
    }
}

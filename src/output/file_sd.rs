//! Prometheus file_sd writer
//!
//! Keeps the latest target group per source and renders them into the JSON
//! document read by Prometheus' file-based service discovery. The output
//! file is only ever replaced atomically, and only when its content changes.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::discovery::{LabelSet, TargetGroup};
use crate::error::Result;

/// One entry of a file_sd document
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileSdEntry {
    pub targets: Vec<String>,
    pub labels: LabelSet,
}

impl From<&TargetGroup> for FileSdEntry {
    fn from(group: &TargetGroup) -> Self {
        let targets: BTreeSet<&str> = group.addresses().collect();
        Self {
            targets: targets.into_iter().map(str::to_string).collect(),
            labels: group.labels.clone(),
        }
    }
}

/// Sink that persists target group batches as a file_sd JSON file
pub struct FileSdWriter {
    path: PathBuf,
    groups: BTreeMap<String, TargetGroup>,
    last_written: Option<Vec<u8>>,
}

impl FileSdWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            groups: BTreeMap::new(),
            last_written: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Merge a batch into the current groups.
    ///
    /// Groups with targets replace whatever was known for their source;
    /// groups without targets remove their source.
    pub fn apply(&mut self, batch: Vec<TargetGroup>) {
        for group in batch {
            if group.is_empty() {
                if self.groups.remove(&group.source).is_some() {
                    debug!("Removed source {}", group.source);
                }
            } else {
                self.groups.insert(group.source.clone(), group);
            }
        }
    }

    /// Current file_sd entries, ordered by source
    pub fn entries(&self) -> Vec<FileSdEntry> {
        self.groups.values().map(FileSdEntry::from).collect()
    }

    /// Render the current entries as pretty-printed JSON
    pub fn render(&self) -> Result<Vec<u8>> {
        let mut rendered = serde_json::to_vec_pretty(&self.entries())?;
        rendered.push(b'\n');
        Ok(rendered)
    }

    /// Write the file if its content changed since the last write.
    ///
    /// Returns whether the file was replaced.
    pub fn flush(&mut self) -> Result<bool> {
        let rendered = self.render()?;
        if self.last_written.as_ref() == Some(&rendered) {
            return Ok(false);
        }

        write_atomically(&self.path, &rendered)?;
        self.last_written = Some(rendered);
        Ok(true)
    }

    /// Apply every batch from `batches` until the sender side closes
    pub async fn run(mut self, mut batches: mpsc::Receiver<Vec<TargetGroup>>) {
        info!("Writing file_sd targets to {}", self.path.display());

        while let Some(batch) = batches.recv().await {
            self.apply(batch);
            match self.flush() {
                Ok(true) => info!(
                    "Wrote {} target groups to {}",
                    self.groups.len(),
                    self.path.display()
                ),
                Ok(false) => debug!("Targets unchanged, skipping write"),
                Err(e) => error!("Failed to write {}: {}", self.path.display(), e),
            }
        }

        info!("Target group stream closed, file_sd writer stopped");
    }
}

/// Replace `path` with `contents` via a synced temporary file in the same directory
fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

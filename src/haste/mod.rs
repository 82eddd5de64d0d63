// src/haste/mod.rs

//! File index and dependency graph ("haste map").
//!
//! - [`index`]: crawls a project's roots into a [`FileIndex`] and keeps it
//!   current as files change.
//! - [`graph`]: the petgraph-backed import graph and its inverse closure.
//! - [`deps`]: import specifier extraction and relative resolution.
//! - [`hash`]: blake3 content hashes used to drop no-op modify events.
//! - [`watcher`]: notify-based watcher turning FS events into change batches.

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod deps;
pub mod graph;
pub mod hash;
pub mod index;
pub mod watcher;

pub use graph::DependencyGraph;
pub use index::FileIndex;
pub use watcher::{spawn_watcher, WatcherHandle};

pub const SNAPSHOT_EXTENSION: &str = "snap";
pub const SNAPSHOT_DIR: &str = "__snapshots__";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

/// One file-level change inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(path: PathBuf, kind: ChangeKind) -> Self {
        Self { path, kind }
    }
}

/// A batch of changes for one project, with the index they produced.
#[derive(Debug, Clone)]
pub struct HasteChange {
    pub events: Vec<ChangeEvent>,
    pub index: Arc<FileIndex>,
}

pub fn is_snapshot_path(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(SNAPSHOT_EXTENSION)
}

/// Map `dir/__snapshots__/name.snap` back to `dir/name`.
pub fn snapshot_source_path(path: &Path) -> Option<PathBuf> {
    if !is_snapshot_path(path) {
        return None;
    }
    let snap_dir = path.parent()?;
    if snap_dir.file_name()? != SNAPSHOT_DIR {
        return None;
    }
    let test_name = path.file_stem()?;
    Some(snap_dir.parent()?.join(test_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_maps_back_to_its_test() {
        assert_eq!(
            snapshot_source_path(Path::new("/r/src/__snapshots__/a.test.js.snap")),
            Some(PathBuf::from("/r/src/a.test.js"))
        );
        assert_eq!(snapshot_source_path(Path::new("/r/src/a.snap")), None);
        assert_eq!(snapshot_source_path(Path::new("/r/src/a.test.js")), None);
    }
}
